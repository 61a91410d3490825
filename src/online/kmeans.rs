//! Batch k-means with smoothed centroid updates

use crate::algebra::{col_norms, find_max_idx, SparseColMatrix};
use log::debug;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Outcome of a k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// One centroid per column
    pub centroids: Array2<f64>,
    /// Centroid index of every input column
    pub assignments: Vec<usize>,
    /// Assignment passes performed
    pub iterations: usize,
    /// Whether the last pass reproduced the previous assignment
    pub converged: bool,
}

/// k-means over the columns of a dense matrix
///
/// Centroids start at `k` distinct random columns. Each update blends the
/// previous centroid into the cluster mean, `C ← (X·Ind + C_old)·diag(1/(1+size))`,
/// so a cluster that loses every point keeps its position instead of
/// collapsing.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    k: usize,
    max_iterations: usize,
    seed: u64,
}

impl KMeans {
    pub fn new(k: usize, max_iterations: usize) -> Self {
        Self {
            k,
            max_iterations,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Cluster the columns of `x`
    ///
    /// # Panics
    /// Panics if `k` is zero or larger than the number of columns
    pub fn fit(&self, x: &Array2<f64>) -> KMeansResult {
        let n = x.ncols();
        assert!(self.k > 0, "k must be positive");
        assert!(self.k <= n, "k <= X.cols");

        let mut rng = StdRng::seed_from_u64(self.seed);
        let init = index::sample(&mut rng, n, self.k).into_vec();
        let mut centroids = x.select(Axis(1), &init);

        let half_norm_x: Array1<f64> = col_norms(x).mapv(|v| 0.5 * v * v);
        let mut previous: Option<Vec<usize>> = None;
        let mut iterations = 0;
        let mut converged = false;

        for i in 0..self.max_iterations {
            iterations = i + 1;
            let assignments = assign(&centroids, x, &half_norm_x);
            if previous.as_ref() == Some(&assignments) {
                debug!("k-means converged after {} iterations", iterations);
                converged = true;
                break;
            }
            centroids = smoothed_centroids(x, &assignments, &centroids);
            previous = Some(assignments);
        }

        let assignments = match previous {
            Some(a) => a,
            None => assign(&centroids, x, &half_norm_x),
        };
        KMeansResult {
            centroids,
            assignments,
            iterations,
            converged,
        }
    }

    /// Cluster the columns of a sparse matrix
    pub fn fit_sparse(&self, x: &SparseColMatrix) -> KMeansResult {
        self.fit(&x.to_dense())
    }
}

/// Nearest centroid of every column via `CᵀX − ½‖C‖² − ½‖X‖²`
fn assign(centroids: &Array2<f64>, x: &Array2<f64>, half_norm_x: &Array1<f64>) -> Vec<usize> {
    let half_norm_c: Array1<f64> = col_norms(centroids).mapv(|v| 0.5 * v * v);
    let mut d = centroids.t().dot(x);
    for ((c, j), v) in d.indexed_iter_mut() {
        *v -= half_norm_c[c] + half_norm_x[j];
    }
    find_max_idx(&d)
}

fn smoothed_centroids(x: &Array2<f64>, assignments: &[usize], old: &Array2<f64>) -> Array2<f64> {
    let mut sums = old.clone();
    let mut sizes = vec![0usize; old.ncols()];
    for (j, &c) in assignments.iter().enumerate() {
        let mut column = sums.column_mut(c);
        column += &x.column(j);
        sizes[c] += 1;
    }
    for (c, size) in sizes.into_iter().enumerate() {
        let factor = 1.0 / (1.0 + size as f64);
        sums.column_mut(c).mapv_inplace(|v| v * factor);
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separated_points() {
        let x = array![[0.0, 0.1, 5.0, 5.1], [0.0, 0.0, 5.0, 5.0]];
        let result = KMeans::new(2, 20).with_seed(1).fit(&x);
        assert!(result.converged);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_eq!(result.assignments[2], result.assignments[3]);
        assert_ne!(result.assignments[0], result.assignments[2]);
        assert_eq!(result.centroids.dim(), (2, 2));
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let x = array![[1.0, 3.0]];
        let old = array![[2.0, 100.0]];
        let updated = smoothed_centroids(&x, &[0, 0], &old);
        // (1 + 3 + 2) / 3
        assert!((updated[[0, 0]] - 2.0).abs() < 1e-12);
        assert_eq!(updated[[0, 1]], 100.0);
    }

    #[test]
    #[should_panic(expected = "k <= X.cols")]
    fn test_too_many_centroids() {
        let x = array![[1.0, 2.0]];
        KMeans::new(3, 10).fit(&x);
    }

    #[test]
    fn test_sparse_input() {
        let sparse = SparseColMatrix::from_columns(
            1,
            vec![
                crate::core::SparseVector::from_dense(&[1.0]),
                crate::core::SparseVector::from_dense(&[1.2]),
                crate::core::SparseVector::from_dense(&[9.0]),
            ],
        );
        let result = KMeans::new(2, 10).fit_sparse(&sparse);
        assert_eq!(result.assignments[0], result.assignments[1]);
        assert_ne!(result.assignments[0], result.assignments[2]);
    }
}
