//! Core traits

use crate::algebra::SparseColMatrix;
use crate::core::SparseVector;

/// A trained model producing a real-valued score for a sparse feature vector.
///
/// For classifiers the score is a margin: its sign is the class and its
/// magnitude the confidence.
pub trait Predictor {
    /// Score a single feature vector
    fn predict(&self, x: &SparseVector) -> f64;

    /// Score every column of a feature matrix
    fn predict_batch(&self, matrix: &SparseColMatrix) -> Vec<f64> {
        matrix.iter().map(|x| self.predict(x)).collect()
    }
}
