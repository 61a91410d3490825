//! Ridge regression over a sliding window of examples

use crate::algebra::solve;
use crate::core::{AnalyticsError, Result};
use log::debug;
use ndarray::{Array1, Array2};
use std::collections::VecDeque;

/// Regularized least squares, refit from scratch on every [`update`](Self::update)
///
/// Solves `(XᵀX + κI)·w = Xᵀy` over the examples currently held. With a
/// buffer bound, the oldest examples are dropped first.
#[derive(Debug, Clone)]
pub struct RidgeRegression {
    kappa: f64,
    dim: usize,
    buffer: Option<usize>,
    examples: VecDeque<(Array1<f64>, f64)>,
    weights: Array1<f64>,
}

impl RidgeRegression {
    /// `buffer` caps the number of examples kept; `None` or 0 keeps all
    pub fn new(kappa: f64, dim: usize, buffer: Option<usize>) -> Self {
        Self {
            kappa,
            dim,
            buffer: buffer.filter(|&b| b > 0),
            examples: VecDeque::new(),
            weights: Array1::zeros(dim),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Add an example without refitting
    pub fn add(&mut self, x: Array1<f64>, target: f64) -> Result<()> {
        if x.len() != self.dim {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.dim,
                actual: x.len(),
            });
        }
        self.examples.push_back((x, target));
        if let Some(buffer) = self.buffer {
            if self.examples.len() > buffer {
                self.forget(self.examples.len() - buffer);
            }
        }
        Ok(())
    }

    /// Add an example and refit
    pub fn add_update(&mut self, x: Array1<f64>, target: f64) -> Result<()> {
        self.add(x, target)?;
        self.update()
    }

    /// Drop the `n` oldest examples
    pub fn forget(&mut self, n: usize) {
        let n = n.min(self.examples.len());
        self.examples.drain(..n);
    }

    /// Refit the weights on the current window
    pub fn update(&mut self) -> Result<()> {
        if self.examples.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let n = self.examples.len();
        let x = Array2::from_shape_fn((n, self.dim), |(i, j)| self.examples[i].0[j]);
        let y: Array1<f64> = self.examples.iter().map(|(_, t)| *t).collect();

        let gram = x.t().dot(&x) + Array2::<f64>::eye(self.dim) * self.kappa;
        let rhs = x.t().dot(&y);
        self.weights = solve(&gram, &rhs)?;
        debug!("ridge regression refit on {} examples", n);
        Ok(())
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn predict(&self, x: &Array1<f64>) -> f64 {
        self.weights.dot(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_buffer_evicts_oldest() {
        let mut model = RidgeRegression::new(0.0, 1, Some(2));
        model.add(array![1.0], 10.0).unwrap();
        model.add(array![1.0], 20.0).unwrap();
        model.add(array![1.0], 30.0).unwrap();
        assert_eq!(model.len(), 2);

        model.update().unwrap();
        // mean of the two newest targets
        assert_abs_diff_eq!(model.weights()[0], 25.0, epsilon = 1e-9);

        model.forget(5);
        assert!(model.is_empty());
        assert!(matches!(model.update(), Err(AnalyticsError::EmptyDataset)));
    }

    #[test]
    fn test_regularization_shrinks() {
        let mut plain = RidgeRegression::new(0.0, 1, None);
        let mut shrunk = RidgeRegression::new(10.0, 1, None);
        for i in 1..=5 {
            let x = array![i as f64];
            plain.add(x.clone(), 2.0 * i as f64).unwrap();
            shrunk.add(x, 2.0 * i as f64).unwrap();
        }
        plain.update().unwrap();
        shrunk.update().unwrap();
        assert_abs_diff_eq!(plain.weights()[0], 2.0, epsilon = 1e-9);
        // 2·55 / (55 + 10)
        assert_abs_diff_eq!(shrunk.weights()[0], 110.0 / 65.0, epsilon = 1e-9);
    }

    #[test]
    fn test_dimension_check() {
        let mut model = RidgeRegression::new(1.0, 3, None);
        assert!(matches!(
            model.add(array![1.0, 2.0], 1.0),
            Err(AnalyticsError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_underdetermined_without_regularization() {
        let mut model = RidgeRegression::new(0.0, 2, None);
        model.add(array![1.0, 1.0], 1.0).unwrap();
        assert!(matches!(model.update(), Err(AnalyticsError::SingularMatrix)));
    }
}
