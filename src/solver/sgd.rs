//! Mini-batch sub-gradient solver

use crate::algebra::SparseColMatrix;
use crate::core::{AnalyticsError, ModelKind, Result, SolverConfig};
use crate::solver::LinearModel;
use crate::utils::validation::{check_label_balance, validate_binary_labels};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Loss {
    Hinge,
    EpsilonInsensitive,
}

/// Trains linear models on a column-per-example feature matrix
///
/// The bias is handled as an extra constant feature, so it is regularized
/// and projected together with the weights.
#[derive(Debug, Clone, Default)]
pub struct LinearSolver {
    config: SolverConfig,
}

impl LinearSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Train a binary classifier; `labels` must be +1 or -1 per column
    pub fn train_classify(&self, matrix: &SparseColMatrix, labels: &[f64]) -> Result<LinearModel> {
        self.check_input(matrix, labels)?;
        if let Err((index, label)) = validate_binary_labels(labels) {
            debug!("invalid label {} at column {}", label, index);
            return Err(AnalyticsError::InvalidLabel(label));
        }

        let (positives, negatives, _) = check_label_balance(labels);
        debug!(
            "training classifier: {} examples ({} positive, {} negative), dim = {}",
            labels.len(),
            positives,
            negatives,
            matrix.rows()
        );
        self.optimize(matrix, labels, Loss::Hinge)
    }

    /// Train an ε-insensitive regressor on real-valued targets
    pub fn train_regression(&self, matrix: &SparseColMatrix, targets: &[f64]) -> Result<LinearModel> {
        self.check_input(matrix, targets)?;
        if let Some(&bad) = targets.iter().find(|t| !t.is_finite()) {
            return Err(AnalyticsError::InvalidDataset(format!(
                "regression target is not finite: {bad}"
            )));
        }

        debug!(
            "training regressor: {} examples, dim = {}",
            targets.len(),
            matrix.rows()
        );
        self.optimize(matrix, targets, Loss::EpsilonInsensitive)
    }

    fn check_input(&self, matrix: &SparseColMatrix, targets: &[f64]) -> Result<()> {
        if matrix.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }
        if targets.len() != matrix.cols() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: matrix.cols(),
                actual: targets.len(),
            });
        }
        if self.config.c <= 0.0 {
            return Err(AnalyticsError::InvalidParameter(
                "C must be positive".to_string(),
            ));
        }
        if self.config.j <= 0.0 {
            return Err(AnalyticsError::InvalidParameter(
                "j must be positive".to_string(),
            ));
        }
        if self.config.batch_size == 0 {
            return Err(AnalyticsError::InvalidParameter(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.config.epsilon < 0.0 {
            return Err(AnalyticsError::InvalidParameter(
                "epsilon must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    fn optimize(&self, matrix: &SparseColMatrix, targets: &[f64], loss: Loss) -> Result<LinearModel> {
        let n = matrix.cols();
        let dim = matrix.rows();
        let lambda = 1.0 / (self.config.c * n as f64);
        let radius = 1.0 / lambda.sqrt();

        let full_batch = self.config.batch_size >= n;
        let batch_len = if full_batch { n } else { self.config.batch_size };
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let budget = Duration::from_secs_f64(self.config.max_time.max(0.0));
        let start = Instant::now();

        let mut weights = vec![0.0; dim];
        let mut bias = 0.0;
        let mut step_buf = vec![0.0; dim];
        let mut iterations = 0;

        for t in 1..=self.config.max_iterations {
            iterations = t;
            step_buf.iter_mut().for_each(|g| *g = 0.0);
            let mut bias_gradient = 0.0;

            for k in 0..batch_len {
                let i = if full_batch { k } else { rng.gen_range(0..n) };
                let x = matrix.col(i);
                let y = targets[i];
                let score = x.dot_dense(&weights) + bias;

                let coef = match loss {
                    Loss::Hinge if y * score < 1.0 => {
                        if y > 0.0 {
                            self.config.j * y
                        } else {
                            y
                        }
                    }
                    Loss::Hinge => 0.0,
                    Loss::EpsilonInsensitive => {
                        let residual = y - score;
                        if residual > self.config.epsilon {
                            1.0
                        } else if residual < -self.config.epsilon {
                            -1.0
                        } else {
                            0.0
                        }
                    }
                };

                if coef != 0.0 {
                    x.add_to_dense(&mut step_buf, coef);
                    bias_gradient += coef;
                }
            }

            // w ← (1 - ηλ)·w + (η/|B|)·g with η = 1/(λt)
            let eta = 1.0 / (lambda * t as f64);
            let shrink = 1.0 - eta * lambda;
            let step = eta / batch_len as f64;

            let mut norm_sq = 0.0;
            for (raw, &w) in step_buf.iter_mut().zip(&weights) {
                *raw = shrink * w + step * *raw;
                norm_sq += *raw * *raw;
            }
            let raw_bias = shrink * bias + step * bias_gradient;
            norm_sq += raw_bias * raw_bias;

            let norm = norm_sq.sqrt();
            let scale = if norm > radius { radius / norm } else { 1.0 };

            let mut diff_sq = 0.0;
            for (w, &raw) in weights.iter_mut().zip(&step_buf) {
                let updated = scale * raw;
                diff_sq += (updated - *w) * (updated - *w);
                *w = updated;
            }
            let updated_bias = scale * raw_bias;
            diff_sq += (updated_bias - bias) * (updated_bias - bias);
            bias = updated_bias;

            let new_norm = norm * scale;
            let change = if new_norm > 0.0 {
                diff_sq.sqrt() / new_norm
            } else {
                diff_sq.sqrt()
            };
            if change < self.config.min_diff {
                debug!("converged after {} iterations (change {:.3e})", t, change);
                break;
            }
            if start.elapsed() > budget {
                debug!("time budget exhausted after {} iterations", t);
                break;
            }
        }

        let kind = match loss {
            Loss::Hinge => ModelKind::Classification,
            Loss::EpsilonInsensitive => ModelKind::Regression,
        };
        Ok(LinearModel::new(kind, weights, bias, iterations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Predictor, SparseVector};

    fn separable() -> (SparseColMatrix, Vec<f64>) {
        let mut matrix = SparseColMatrix::new(2);
        let mut labels = Vec::new();
        for k in 0..10 {
            let offset = 0.1 * k as f64;
            matrix.push(SparseVector::new(vec![0, 1], vec![1.0 + offset, 0.5]));
            labels.push(1.0);
            matrix.push(SparseVector::new(vec![0, 1], vec![-1.0 - offset, 0.5]));
            labels.push(-1.0);
        }
        (matrix, labels)
    }

    #[test]
    fn test_separable_data() {
        let (matrix, labels) = separable();
        let model = LinearSolver::default().train_classify(&matrix, &labels).unwrap();

        assert_eq!(model.kind(), ModelKind::Classification);
        assert!(model.weights()[0] > 0.0);
        for (x, &y) in matrix.iter().zip(&labels) {
            assert_eq!(model.classify(x).label, y);
        }
    }

    #[test]
    fn test_input_validation() {
        let (matrix, mut labels) = separable();
        let solver = LinearSolver::default();

        assert!(matches!(
            solver.train_classify(&SparseColMatrix::new(2), &[]),
            Err(AnalyticsError::EmptyDataset)
        ));
        assert!(matches!(
            solver.train_classify(&matrix, &labels[..3]),
            Err(AnalyticsError::DimensionMismatch {
                expected: 20,
                actual: 3
            })
        ));

        labels[4] = 0.0;
        assert!(matches!(
            solver.train_classify(&matrix, &labels),
            Err(AnalyticsError::InvalidLabel(l)) if l == 0.0
        ));

        let bad_c = LinearSolver::new(SolverConfig {
            c: 0.0,
            ..SolverConfig::default()
        });
        assert!(matches!(
            bad_c.train_regression(&matrix, &labels),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_positive_cost_ratio_shifts_boundary() {
        // identical examples with conflicting labels
        let x = SparseVector::new(vec![0], vec![1.0]);
        let matrix = SparseColMatrix::from_columns(1, vec![x.clone(); 20]);
        let labels: Vec<f64> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();

        let even = LinearSolver::default().train_classify(&matrix, &labels).unwrap();
        let skewed = LinearSolver::new(SolverConfig {
            j: 5.0,
            ..SolverConfig::default()
        })
        .train_classify(&matrix, &labels)
        .unwrap();

        assert!(skewed.predict(&x) > even.predict(&x));
        assert!(skewed.predict(&x) > 0.0);
    }

    #[test]
    fn test_regression_fits_slope() {
        let mut matrix = SparseColMatrix::new(1);
        let mut targets = Vec::new();
        for k in 1..=10 {
            let x = 0.1 * k as f64;
            matrix.push(SparseVector::new(vec![0], vec![x]));
            targets.push(2.0 * x);
        }

        let model = LinearSolver::new(SolverConfig {
            c: 100.0,
            epsilon: 0.01,
            ..SolverConfig::default()
        })
        .train_regression(&matrix, &targets)
        .unwrap();

        assert_eq!(model.kind(), ModelKind::Regression);
        let low = model.predict(&SparseVector::new(vec![0], vec![0.1]));
        let mid = model.predict(&SparseVector::new(vec![0], vec![0.5]));
        let high = model.predict(&SparseVector::new(vec![0], vec![1.0]));
        assert!(low < mid && mid < high);
        assert!((mid - 1.0).abs() < 0.5);
    }

    #[test]
    fn test_mini_batches_are_seeded() {
        let (matrix, labels) = separable();
        let config = SolverConfig {
            batch_size: 4,
            max_iterations: 200,
            max_time: 60.0,
            seed: 7,
            ..SolverConfig::default()
        };

        let first = LinearSolver::new(config.clone()).train_classify(&matrix, &labels).unwrap();
        let second = LinearSolver::new(config).train_classify(&matrix, &labels).unwrap();
        assert_eq!(first, second);
    }
}
