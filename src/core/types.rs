//! Core type definitions

use serde::{Deserialize, Serialize};

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a prediction from a raw margin
    pub fn from_margin(decision_value: f64) -> Self {
        let label = if decision_value > 0.0 { 1.0 } else { -1.0 };
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Binary label given to an example
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    /// Numeric value used as a training target
    pub fn value(self) -> f64 {
        match self {
            Label::Positive => 1.0,
            Label::Negative => -1.0,
        }
    }
}

impl From<bool> for Label {
    fn from(positive: bool) -> Self {
        if positive {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

/// Whether a linear model separates classes or fits a real-valued target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Classification,
    Regression,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Classification => write!(f, "classification"),
            ModelKind::Regression => write!(f, "regression"),
        }
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build a sparse vector from the non-zero entries of a dense slice
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values) = dense
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Expand into a dense vector of length `dim`; entries beyond `dim` are dropped
    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            if i < dim {
                dense[i] = v;
            }
        }
        dense
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Scale to unit L2 norm; zero vectors are left unchanged
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            self.scale(1.0 / norm);
        }
    }

    /// Multiply every stored value by `factor`
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }

    /// Inner product with another sparse vector
    ///
    /// Both index lists are sorted, so this is a single merge pass in
    /// O(nnz(x) + nnz(y)).
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        let mut i = 0;
        let mut j = 0;

        while i < self.indices.len() && j < other.indices.len() {
            let x_idx = self.indices[i];
            let y_idx = other.indices[j];

            if x_idx == y_idx {
                result += self.values[i] * other.values[j];
                i += 1;
                j += 1;
            } else if x_idx < y_idx {
                i += 1;
            } else {
                j += 1;
            }
        }

        result
    }

    /// Inner product with a dense vector; indices past its end contribute nothing
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .filter(|(&i, _)| i < dense.len())
            .map(|(&i, &v)| v * dense[i])
            .sum()
    }

    /// Accumulate `factor * self` into a dense vector
    pub fn add_to_dense(&self, dense: &mut [f64], factor: f64) {
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            if i < dense.len() {
                dense[i] += factor * v;
            }
        }
    }

    /// Largest stored index plus one (0 for an empty vector)
    pub fn min_dim(&self) -> usize {
        self.indices.last().map(|&i| i + 1).unwrap_or(0)
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Configuration for the linear classifier trainer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Regularization parameter (cost of a margin violation)
    pub c: f64,
    /// Cost ratio of positive to negative violations
    pub j: f64,
    /// Examples per sub-gradient step
    pub batch_size: usize,
    /// Maximum number of sub-gradient steps
    pub max_iterations: usize,
    /// Wall-clock budget in seconds
    pub max_time: f64,
    /// Stop once the relative change of the weights falls below this
    pub min_diff: f64,
    /// Width of the insensitive tube for regression
    pub epsilon: f64,
    /// Seed for mini-batch sampling
    pub seed: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            j: 1.0,
            batch_size: 10_000,
            max_iterations: 10_000,
            max_time: 1.0,
            min_diff: 1e-6,
            epsilon: 0.1,
            seed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_vector_creation() {
        let sv = SparseVector::new(vec![2, 0, 4], vec![2.0, 1.0, 3.0]);

        assert_eq!(sv.indices, vec![0, 2, 4]);
        assert_eq!(sv.values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_sparse_vector_get() {
        let sv = SparseVector::new(vec![1, 3, 5], vec![1.0, 2.0, 3.0]);

        assert_eq!(sv.get(0), 0.0);
        assert_eq!(sv.get(3), 2.0);
        assert_eq!(sv.get(6), 0.0);
    }

    #[test]
    fn test_sparse_vector_normalize() {
        let mut sv = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        assert_eq!(sv.norm(), 5.0);
        sv.normalize();
        assert!((sv.norm() - 1.0).abs() < 1e-12);
        assert!((sv.get(0) - 0.6).abs() < 1e-12);

        let mut zero = SparseVector::empty();
        zero.normalize();
        assert!(zero.is_empty());
    }

    #[test]
    fn test_dot_product_sparse() {
        let x = SparseVector::new(vec![0, 2, 5], vec![1.0, 3.0, 2.0]);
        let y = SparseVector::new(vec![2, 3, 5], vec![2.0, 1.0, 4.0]);

        // overlap at 2 and 5: 3*2 + 2*4
        assert_eq!(x.dot(&y), 14.0);
        assert_eq!(SparseVector::empty().dot(&y), 0.0);
    }

    #[test]
    fn test_dense_conversions() {
        let sv = SparseVector::from_dense(&[0.0, 2.0, 0.0, -1.0]);
        assert_eq!(sv.indices, vec![1, 3]);
        assert_eq!(sv.to_dense(4), vec![0.0, 2.0, 0.0, -1.0]);
        assert_eq!(sv.dot_dense(&[1.0, 1.0, 1.0, 1.0]), 1.0);
        assert_eq!(sv.min_dim(), 4);

        let mut acc = vec![0.0; 4];
        sv.add_to_dense(&mut acc, 2.0);
        assert_eq!(acc, vec![0.0, 4.0, 0.0, -2.0]);
    }

    #[test]
    fn test_prediction_from_margin() {
        let pred = Prediction::from_margin(-1.8);
        assert_eq!(pred.label, -1.0);
        assert_eq!(pred.confidence(), 1.8);
        assert_eq!(Prediction::from_margin(0.0).label, -1.0);
    }

    #[test]
    fn test_label_values() {
        assert_eq!(Label::from(true).value(), 1.0);
        assert_eq!(Label::Negative.value(), -1.0);
        assert_eq!(ModelKind::Regression.to_string(), "regression");
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.c, 1.0);
        assert_eq!(config.j, 1.0);
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.max_iterations, 10_000);
        assert_eq!(config.min_diff, 1e-6);

        let partial: SolverConfig = serde_json::from_str(r#"{"c": 10.0}"#).unwrap();
        assert_eq!(partial.c, 10.0);
        assert_eq!(partial.max_time, 1.0);
    }

    #[test]
    #[should_panic(expected = "Indices and values must have same length")]
    fn test_sparse_vector_length_mismatch() {
        SparseVector::new(vec![0, 1], vec![1.0, 2.0, 3.0]);
    }
}
