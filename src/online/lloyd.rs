//! Online k-means (Lloyd's algorithm, one point at a time)

use crate::core::{AnalyticsError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct Lloyd {
    dim: usize,
    k: usize,
    centroids: Array2<f64>,
    counts: Array1<f64>,
    half_norms: Array1<f64>,
    rng: StdRng,
}

impl Lloyd {
    /// `k` random centroids in the unit cube of dimension `dim`
    pub fn new(dim: usize, k: usize, seed: u64) -> Self {
        let mut model = Self {
            dim,
            k,
            centroids: Array2::zeros((dim, k)),
            counts: Array1::ones(k),
            half_norms: Array1::zeros(k),
            rng: StdRng::seed_from_u64(seed),
        };
        model.init();
        model
    }

    /// Re-randomize the centroids and reset every count to one
    pub fn init(&mut self) {
        let rng = &mut self.rng;
        self.centroids = Array2::from_shape_simple_fn((self.dim, self.k), || rng.gen::<f64>());
        self.counts = Array1::ones(self.k);
        self.refresh_norms();
    }

    fn refresh_norms(&mut self) {
        self.half_norms = self
            .centroids
            .columns()
            .into_iter()
            .map(|c| 0.5 * c.dot(&c))
            .collect();
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    /// Replace the centroids; the shape must stay `dim × k`
    pub fn set_centroids(&mut self, centroids: Array2<f64>) -> Result<()> {
        if centroids.dim() != (self.dim, self.k) {
            return Err(AnalyticsError::InvalidParameter(format!(
                "expected {}x{} centroids, got {}x{}",
                self.dim,
                self.k,
                centroids.nrows(),
                centroids.ncols()
            )));
        }
        self.centroids = centroids;
        self.refresh_norms();
        Ok(())
    }

    /// Points absorbed by each centroid, starting from one
    pub fn counts(&self) -> &Array1<f64> {
        &self.counts
    }

    fn check_dim(&self, x: &Array1<f64>) -> Result<()> {
        if x.len() != self.dim {
            return Err(AnalyticsError::DimensionMismatch {
                expected: self.dim,
                actual: x.len(),
            });
        }
        Ok(())
    }

    /// Index of the nearest centroid
    pub fn centroid_index(&self, x: &Array1<f64>) -> Result<usize> {
        self.check_dim(x)?;
        let scores = self.centroids.t().dot(x) - &self.half_norms;
        let mut best = 0;
        for (i, &s) in scores.iter().enumerate() {
            if s > scores[best] {
                best = i;
            }
        }
        Ok(best)
    }

    /// Nearest centroid
    pub fn centroid(&self, x: &Array1<f64>) -> Result<ArrayView1<'_, f64>> {
        let idx = self.centroid_index(x)?;
        Ok(self.centroids.column(idx))
    }

    /// Move the nearest centroid toward `x` as a running mean
    ///
    /// Returns the index of the updated centroid.
    pub fn update(&mut self, x: &Array1<f64>) -> Result<usize> {
        let idx = self.centroid_index(x)?;
        let count = self.counts[idx];
        let mut column = self.centroids.column_mut(idx);
        column.zip_mut_with(x, |c, &v| *c = (count * *c + v) / (count + 1.0));
        self.half_norms[idx] = 0.5 * column.dot(&column);
        self.counts[idx] += 1.0;
        Ok(idx)
    }
}
