//! Recursive least squares with exponential forgetting

use crate::core::{AnalyticsError, Result};
use ndarray::{Array1, Array2};

/// Linear regression updated one example at a time in `O(d²)`
///
/// Tracks the weights and the inverse of the (forgetting-weighted)
/// covariance `P`, starting from `P = I / regularization`.
#[derive(Debug, Clone)]
pub struct RecursiveLinearRegression {
    forget_factor: f64,
    weights: Array1<f64>,
    inverse_cov: Array2<f64>,
}

impl RecursiveLinearRegression {
    /// `forget_factor` must lie in `(0, 1]`; 1 weighs every example equally
    pub fn new(dim: usize, regularization: f64, forget_factor: f64) -> Result<Self> {
        if regularization <= 0.0 {
            return Err(AnalyticsError::InvalidParameter(format!(
                "regularization must be positive, got {}",
                regularization
            )));
        }
        if !(forget_factor > 0.0 && forget_factor <= 1.0) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "forget factor must be in (0, 1], got {}",
                forget_factor
            )));
        }
        Ok(Self {
            forget_factor,
            weights: Array1::zeros(dim),
            inverse_cov: Array2::eye(dim) / regularization,
        })
    }

    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    pub fn learn(&mut self, x: &Array1<f64>, target: f64) -> Result<()> {
        if x.len() != self.dim() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.dim(),
                actual: x.len(),
            });
        }
        let px = self.inverse_cov.dot(x);
        let gain = &px / (self.forget_factor + x.dot(&px));
        let error = target - self.weights.dot(x);
        self.weights.scaled_add(error, &gain);

        let n = self.dim();
        let outer = Array2::from_shape_fn((n, n), |(i, j)| gain[i] * px[j]);
        self.inverse_cov = (&self.inverse_cov - &outer) / self.forget_factor;
        Ok(())
    }

    pub fn predict(&self, x: &Array1<f64>) -> f64 {
        self.weights.dot(x)
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }
}
