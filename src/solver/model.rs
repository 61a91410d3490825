//! Trained linear model

use crate::core::{ModelKind, Prediction, Predictor, Result, SparseVector};
use crate::persistence::{read_json_line, write_json_line};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Weight vector plus bias produced by [`LinearSolver`](crate::solver::LinearSolver)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    kind: ModelKind,
    weights: Vec<f64>,
    bias: f64,
    iterations: usize,
}

impl LinearModel {
    pub(crate) fn new(kind: ModelKind, weights: Vec<f64>, bias: f64, iterations: usize) -> Self {
        Self {
            kind,
            weights,
            bias,
            iterations,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Number of sub-gradient steps taken during training
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Dimensionality of the weight vector
    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Margin and sign for a classifier
    pub fn classify(&self, x: &SparseVector) -> Prediction {
        Prediction::from_margin(self.predict(x))
    }

    /// Write the model as one JSON line
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_json_line(writer, self)
    }

    /// Read a model written by [`save`](Self::save)
    pub fn load<R: BufRead>(reader: &mut R) -> Result<Self> {
        read_json_line(reader)
    }
}

impl Predictor for LinearModel {
    fn predict(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.weights) + self.bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_predict_ignores_unknown_dimensions() {
        let model = LinearModel::new(ModelKind::Classification, vec![1.0, -2.0], 0.5, 3);
        let x = SparseVector::new(vec![0, 1, 7], vec![1.0, 1.0, 100.0]);
        assert_eq!(model.predict(&x), -0.5);
        assert_eq!(model.classify(&x).label, -1.0);
    }

    #[test]
    fn test_save_load() {
        let model = LinearModel::new(ModelKind::Regression, vec![0.1, 0.7, -3.25], -1.0, 42);
        let mut buf = Vec::new();
        model.save(&mut buf).unwrap();
        let loaded = LinearModel::load(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.kind(), ModelKind::Regression);
    }
}
