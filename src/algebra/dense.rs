//! Dense helpers on `ndarray` types

use crate::core::{AnalyticsError, Result};
use ndarray::{Array1, Array2, Axis};

/// Sorted values together with the permutation that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct SortedPerm {
    pub values: Vec<f64>,
    pub perm: Vec<usize>,
}

/// Stable sort of `values`, returning sorted values and the permutation
///
/// `perm[i]` is the original position of `values[i]` after sorting. Equal
/// values keep their input order. NaN compares equal to everything.
pub fn sort_perm(values: &[f64], ascending: bool) -> SortedPerm {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| {
        let ord = values[a]
            .partial_cmp(&values[b])
            .unwrap_or(std::cmp::Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    SortedPerm {
        values: perm.iter().map(|&i| values[i]).collect(),
        perm,
    }
}

/// Row index of the maximum of every column; the first maximum wins
pub fn find_max_idx(matrix: &Array2<f64>) -> Vec<usize> {
    matrix
        .axis_iter(Axis(1))
        .map(|col| {
            let mut best = 0;
            for (i, &v) in col.iter().enumerate() {
                if v > col[best] {
                    best = i;
                }
            }
            best
        })
        .collect()
}

/// L2 norm of every column
pub fn col_norms(matrix: &Array2<f64>) -> Array1<f64> {
    matrix
        .axis_iter(Axis(1))
        .map(|col| col.dot(&col).sqrt())
        .collect()
}

/// Solve the square system `a·x = b` by Gaussian elimination with partial pivoting
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(AnalyticsError::DimensionMismatch {
            expected: n,
            actual: a.ncols(),
        });
    }
    if b.len() != n {
        return Err(AnalyticsError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }

    let mut m = a.clone();
    let mut rhs = b.clone();
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);

    for k in 0..n {
        let mut pivot = k;
        for i in (k + 1)..n {
            if m[[i, k]].abs() > m[[pivot, k]].abs() {
                pivot = i;
            }
        }
        if m[[pivot, k]].abs() <= f64::EPSILON * scale * n as f64 {
            return Err(AnalyticsError::SingularMatrix);
        }
        if pivot != k {
            for j in 0..n {
                m.swap([k, j], [pivot, j]);
            }
            rhs.swap(k, pivot);
        }
        for i in (k + 1)..n {
            let factor = m[[i, k]] / m[[k, k]];
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                m[[i, j]] -= factor * m[[k, j]];
            }
            rhs[i] -= factor * rhs[k];
        }
    }

    let mut x = Array1::zeros(n);
    for k in (0..n).rev() {
        let mut sum = rhs[k];
        for j in (k + 1)..n {
            sum -= m[[k, j]] * x[j];
        }
        x[k] = sum / m[[k, k]];
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sort_perm_is_stable() {
        let sorted = sort_perm(&[0.3, 0.1, 0.3, 0.2], true);
        assert_eq!(sorted.values, vec![0.1, 0.2, 0.3, 0.3]);
        assert_eq!(sorted.perm, vec![1, 3, 0, 2]);

        let desc = sort_perm(&[0.3, 0.1, 0.3, 0.2], false);
        assert_eq!(desc.perm, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_find_max_idx() {
        let m = array![[1.0, 5.0, 2.0], [3.0, 5.0, 0.0]];
        assert_eq!(find_max_idx(&m), vec![1, 0, 0]);
    }

    #[test]
    fn test_col_norms() {
        let m = array![[3.0, 0.0], [4.0, 2.0]];
        assert_eq!(col_norms(&m), array![5.0, 2.0]);
    }

    #[test]
    fn test_solve() {
        let a = array![[0.0, 2.0], [1.0, 1.0]];
        let b = array![4.0, 3.0];
        let x = solve(&a, &b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_solve_singular() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(matches!(solve(&a, &b), Err(AnalyticsError::SingularMatrix)));
    }
}
