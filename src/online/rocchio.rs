//! Rocchio centroid classifier

use crate::algebra::SparseColMatrix;
use crate::core::{AnalyticsError, Predictor, Result, SparseVector};
use crate::utils::validation::validate_binary_labels;
use log::{debug, warn};

pub const DEFAULT_ALPHA: f64 = 16.0;
pub const DEFAULT_BETA: f64 = 4.0;

/// Mean of the L2-normalized columns listed in `members`
fn class_mean(matrix: &SparseColMatrix, members: &[usize]) -> Vec<f64> {
    let mut mean = vec![0.0; matrix.rows()];
    let factor = 1.0 / members.len() as f64;
    for &i in members {
        let mut doc = matrix.col(i).clone();
        doc.normalize();
        doc.add_to_dense(&mut mean, factor);
    }
    mean
}

fn normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Two-class centroid model
///
/// Each class centroid is `α·own − β·other` over normalized documents,
/// normalized in turn. The score of a document is its inner product with
/// the positive centroid minus that with the negative one.
#[derive(Debug, Clone, PartialEq)]
pub struct Rocchio {
    positive: Vec<f64>,
    negative: Vec<f64>,
}

impl Rocchio {
    /// Train with `α = 16`, `β = 4`
    ///
    /// Returns `Ok(None)` when either class has no examples.
    pub fn train(matrix: &SparseColMatrix, labels: &[f64]) -> Result<Option<Self>> {
        Self::train_with(matrix, labels, DEFAULT_ALPHA, DEFAULT_BETA)
    }

    pub fn train_with(
        matrix: &SparseColMatrix,
        labels: &[f64],
        alpha: f64,
        beta: f64,
    ) -> Result<Option<Self>> {
        if labels.len() != matrix.cols() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: matrix.cols(),
                actual: labels.len(),
            });
        }
        if let Err((_, label)) = validate_binary_labels(labels) {
            return Err(AnalyticsError::InvalidLabel(label));
        }

        let (pos, neg): (Vec<usize>, Vec<usize>) = (0..labels.len()).partition(|&i| labels[i] > 0.0);
        if pos.is_empty() || neg.is_empty() {
            warn!(
                "Rocchio needs both classes: {} positive, {} negative",
                pos.len(),
                neg.len()
            );
            return Ok(None);
        }
        debug!("Rocchio on {} positive and {} negative", pos.len(), neg.len());

        let pos_mean = class_mean(matrix, &pos);
        let neg_mean = class_mean(matrix, &neg);
        let mut positive: Vec<f64> = pos_mean
            .iter()
            .zip(&neg_mean)
            .map(|(p, n)| alpha * p - beta * n)
            .collect();
        let mut negative: Vec<f64> = neg_mean
            .iter()
            .zip(&pos_mean)
            .map(|(n, p)| alpha * n - beta * p)
            .collect();
        normalize(&mut positive);
        normalize(&mut negative);

        Ok(Some(Self { positive, negative }))
    }

    pub fn positive_centroid(&self) -> &[f64] {
        &self.positive
    }

    pub fn negative_centroid(&self) -> &[f64] {
        &self.negative
    }

    /// Whether `x` is closer to the positive centroid
    pub fn classify(&self, x: &SparseVector) -> bool {
        self.predict(x) > 0.0
    }
}

impl Predictor for Rocchio {
    fn predict(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.positive) - x.dot_dense(&self.negative)
    }
}
