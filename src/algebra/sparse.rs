//! Column-oriented sparse matrix

use crate::core::SparseVector;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Sparse matrix stored as a list of columns, one column per example
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseColMatrix {
    rows: usize,
    columns: Vec<SparseVector>,
}

impl SparseColMatrix {
    /// Create an empty matrix with the given number of rows
    pub fn new(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    /// Build a matrix from columns; the row count grows to fit every column
    pub fn from_columns(rows: usize, columns: Vec<SparseVector>) -> Self {
        let rows = columns.iter().map(|c| c.min_dim()).fold(rows, usize::max);
        Self { rows, columns }
    }

    /// Append a column
    pub fn push(&mut self, column: SparseVector) {
        self.rows = self.rows.max(column.min_dim());
        self.columns.push(column);
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get a column by index
    ///
    /// # Panics
    /// Panics if `i >= cols()`
    pub fn col(&self, i: usize) -> &SparseVector {
        &self.columns[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SparseVector> {
        self.columns.iter()
    }

    /// L2 norm of every column
    pub fn col_norms(&self) -> Vec<f64> {
        self.columns.iter().map(SparseVector::norm).collect()
    }

    /// Scale every non-zero column to unit L2 norm
    pub fn normalize_cols(&mut self) {
        for column in &mut self.columns {
            column.normalize();
        }
    }

    /// Compute `Mᵀ·x`: the inner product of every column with `x`
    pub fn multiply_t(&self, x: &SparseVector) -> Vec<f64> {
        self.columns.iter().map(|c| c.dot(x)).collect()
    }

    /// Compute `Mᵀ·x` for a dense `x`
    pub fn multiply_t_dense(&self, x: &[f64]) -> Vec<f64> {
        self.columns.iter().map(|c| c.dot_dense(x)).collect()
    }

    /// New matrix holding the selected columns, in the given order
    pub fn select_cols(&self, indices: &[usize]) -> Self {
        Self {
            rows: self.rows,
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
        }
    }

    /// Dense `rows × cols` copy
    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::zeros((self.rows, self.columns.len()));
        for (j, column) in self.columns.iter().enumerate() {
            for (&i, &v) in column.indices.iter().zip(&column.values) {
                dense[[i, j]] = v;
            }
        }
        dense
    }
}

impl<'a> IntoIterator for &'a SparseColMatrix {
    type Item = &'a SparseVector;
    type IntoIter = std::slice::Iter<'a, SparseVector>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
