//! Learning from positive and unlabeled examples

use super::rocchio::{Rocchio, DEFAULT_ALPHA, DEFAULT_BETA};
use crate::algebra::SparseColMatrix;
use crate::core::{AnalyticsError, Predictor, Result, SolverConfig};
use crate::solver::{LinearModel, LinearSolver};
use log::{info, warn};

#[derive(Debug, Clone)]
pub struct PuResult {
    /// Final +1/−1 label of every column
    pub labels: Vec<f64>,
    /// Unlabeled columns promoted to negatives by the first stage
    pub reliable_negatives: Vec<usize>,
    /// Second-stage classifier
    pub classifier: LinearModel,
}

/// Two-stage PU learner
///
/// Stage one fits Rocchio with every unlabeled column as a provisional
/// negative and keeps the unlabeled columns it scores non-positive as
/// reliable negatives. Stage two trains a linear classifier on the
/// positives plus the reliable negatives and relabels every column.
#[derive(Debug, Clone)]
pub struct PuLearning {
    alpha: f64,
    beta: f64,
    solver: LinearSolver,
}

impl Default for PuLearning {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

impl PuLearning {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            solver: LinearSolver::new(config),
        }
    }

    /// Rocchio coefficients of the first stage
    pub fn with_rocchio(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = alpha;
        self.beta = beta;
        self
    }

    /// `positive[i]` marks column `i` as a known positive; the rest are unlabeled
    ///
    /// Returns `Ok(None)` when either stage has only one class to learn from.
    pub fn fit(&self, matrix: &SparseColMatrix, positive: &[bool]) -> Result<Option<PuResult>> {
        if positive.len() != matrix.cols() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: matrix.cols(),
                actual: positive.len(),
            });
        }

        let provisional: Vec<f64> = positive.iter().map(|&p| if p { 1.0 } else { -1.0 }).collect();
        let rocchio = match Rocchio::train_with(matrix, &provisional, self.alpha, self.beta)? {
            Some(model) => model,
            None => return Ok(None),
        };

        let reliable_negatives: Vec<usize> = (0..matrix.cols())
            .filter(|&i| !positive[i] && rocchio.predict(matrix.col(i)) <= 0.0)
            .collect();
        if reliable_negatives.is_empty() {
            warn!("no reliable negatives among the unlabeled examples");
            return Ok(None);
        }

        let mut train_idx: Vec<usize> = (0..matrix.cols()).filter(|&i| positive[i]).collect();
        let positives = train_idx.len();
        train_idx.extend_from_slice(&reliable_negatives);
        let labels: Vec<f64> = train_idx
            .iter()
            .map(|&i| if positive[i] { 1.0 } else { -1.0 })
            .collect();
        info!(
            "PU second stage: {} positives, {} reliable negatives",
            positives,
            reliable_negatives.len()
        );

        let classifier = self
            .solver
            .train_classify(&matrix.select_cols(&train_idx), &labels)?;
        let labels = classifier
            .predict_batch(matrix)
            .into_iter()
            .map(|score| if score > 0.0 { 1.0 } else { -1.0 })
            .collect();

        Ok(Some(PuResult {
            labels,
            reliable_negatives,
            classifier,
        }))
    }
}
