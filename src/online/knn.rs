//! k-nearest-neighbor regression over a bounded example log

use crate::algebra::sort_perm;
use crate::core::{AnalyticsError, Result};
use ndarray::Array1;
use std::collections::VecDeque;

/// How the targets of the nearest neighbors are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KnnAveraging {
    /// Plain mean of the k targets
    #[default]
    Uniform,
    /// Mean weighted by inverse Euclidean distance; exact matches take over
    InverseDistance,
}

#[derive(Debug, Clone)]
pub struct KnnRegression {
    k: usize,
    buffer: Option<usize>,
    averaging: KnnAveraging,
    examples: VecDeque<(Array1<f64>, f64)>,
}

impl KnnRegression {
    /// `buffer` caps the number of stored examples; `None` or 0 keeps all
    pub fn new(k: usize, buffer: Option<usize>) -> Self {
        Self {
            k,
            buffer: buffer.filter(|&b| b > 0),
            averaging: KnnAveraging::default(),
            examples: VecDeque::new(),
        }
    }

    pub fn with_averaging(mut self, averaging: KnnAveraging) -> Self {
        self.averaging = averaging;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Store an example, evicting the oldest past the buffer bound
    pub fn update(&mut self, x: Array1<f64>, target: f64) -> Result<()> {
        if let Some((first, _)) = self.examples.front() {
            if first.len() != x.len() {
                return Err(AnalyticsError::DimensionMismatch {
                    expected: first.len(),
                    actual: x.len(),
                });
            }
        }
        self.examples.push_back((x, target));
        if let Some(buffer) = self.buffer {
            while self.examples.len() > buffer {
                self.examples.pop_front();
            }
        }
        Ok(())
    }

    /// Predicted target, or `None` while fewer than `k` examples are stored
    ///
    /// The query must have the dimension of the stored examples.
    pub fn predict(&self, x: &Array1<f64>) -> Result<Option<f64>> {
        if let Some((first, _)) = self.examples.front() {
            if first.len() != x.len() {
                return Err(AnalyticsError::DimensionMismatch {
                    expected: first.len(),
                    actual: x.len(),
                });
            }
        }
        if self.k == 0 || self.examples.len() < self.k {
            return Ok(None);
        }

        let distances: Vec<f64> = self
            .examples
            .iter()
            .map(|(e, _)| {
                let diff = e - x;
                diff.dot(&diff).sqrt()
            })
            .collect();
        let nearest = sort_perm(&distances, true);
        let neighbors = nearest
            .perm
            .iter()
            .zip(&nearest.values)
            .take(self.k)
            .map(|(&i, &d)| (self.examples[i].1, d));

        let prediction = match self.averaging {
            KnnAveraging::Uniform => neighbors.map(|(t, _)| t).sum::<f64>() / self.k as f64,
            KnnAveraging::InverseDistance => {
                let neighbors: Vec<(f64, f64)> = neighbors.collect();
                let exact: Vec<f64> = neighbors
                    .iter()
                    .filter(|(_, d)| *d == 0.0)
                    .map(|(t, _)| *t)
                    .collect();
                if exact.is_empty() {
                    let (weighted, total) = neighbors
                        .iter()
                        .fold((0.0, 0.0), |(w, s), (t, d)| (w + t / d, s + 1.0 / d));
                    weighted / total
                } else {
                    exact.iter().sum::<f64>() / exact.len() as f64
                }
            }
        };
        Ok(Some(prediction))
    }
}
