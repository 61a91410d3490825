//! Utility functions shared by the trainers

use crate::algebra::SparseColMatrix;

/// Label validation helpers
pub mod validation {
    /// Validate that all labels are binary (-1 or +1)
    pub fn validate_binary_labels(labels: &[f64]) -> Result<(), (usize, f64)> {
        match labels
            .iter()
            .enumerate()
            .find(|(_, &label)| label != 1.0 && label != -1.0)
        {
            Some((i, &label)) => Err((i, label)),
            None => Ok(()),
        }
    }

    /// Count positive and negative labels and their ratio
    pub fn check_label_balance(labels: &[f64]) -> (usize, usize, f64) {
        let positive_count = labels.iter().filter(|&&l| l > 0.0).count();
        let negative_count = labels.len() - positive_count;
        let balance_ratio = if negative_count == 0 {
            f64::INFINITY
        } else {
            positive_count as f64 / negative_count as f64
        };
        (positive_count, negative_count, balance_ratio)
    }
}

/// Statistical utilities for feature matrices
pub mod stats {
    use super::*;

    /// Non-zero statistics over the columns of a matrix
    pub fn matrix_stats(matrix: &SparseColMatrix) -> SparseMatrixStats {
        if matrix.is_empty() {
            return SparseMatrixStats {
                rows: matrix.rows(),
                ..SparseMatrixStats::default()
            };
        }

        let nnz: Vec<usize> = matrix.iter().map(|c| c.nnz()).collect();
        let total: usize = nnz.iter().sum();

        SparseMatrixStats {
            rows: matrix.rows(),
            cols: matrix.cols(),
            mean_nnz: total as f64 / nnz.len() as f64,
            min_nnz: nnz.iter().copied().min().unwrap_or(0),
            max_nnz: nnz.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Column statistics of a sparse feature matrix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseMatrixStats {
    pub rows: usize,
    pub cols: usize,
    pub mean_nnz: f64,
    pub min_nnz: usize,
    pub max_nnz: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SparseVector;

    #[test]
    fn test_validate_binary_labels() {
        assert!(validation::validate_binary_labels(&[1.0, -1.0, 1.0]).is_ok());
        assert_eq!(
            validation::validate_binary_labels(&[1.0, 0.0, 2.0]),
            Err((1, 0.0))
        );
        assert!(validation::validate_binary_labels(&[]).is_ok());
    }

    #[test]
    fn test_label_balance() {
        let (pos, neg, ratio) = validation::check_label_balance(&[1.0, 1.0, -1.0, 1.0]);
        assert_eq!(pos, 3);
        assert_eq!(neg, 1);
        assert_eq!(ratio, 3.0);

        let (_, _, ratio) = validation::check_label_balance(&[1.0]);
        assert!(ratio.is_infinite());
    }

    #[test]
    fn test_matrix_stats() {
        let matrix = SparseColMatrix::from_columns(
            4,
            vec![
                SparseVector::new(vec![0, 1], vec![1.0, 1.0]),
                SparseVector::new(vec![3], vec![2.0]),
                SparseVector::empty(),
            ],
        );
        let stats = stats::matrix_stats(&matrix);
        assert_eq!(stats.cols, 3);
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.min_nnz, 0);
        assert_eq!(stats.max_nnz, 2);
        assert!((stats.mean_nnz - 1.0).abs() < 1e-12);

        let empty = stats::matrix_stats(&SparseColMatrix::new(2));
        assert_eq!(empty.cols, 0);
        assert_eq!(empty.rows, 2);
    }
}
