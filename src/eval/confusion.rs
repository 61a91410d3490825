//! Confusion matrix over a fixed category list

use log::warn;
use ndarray::Array2;
use std::fmt::Write as _;

/// Square count matrix; rows are correct categories, columns predicted ones
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    categories: Vec<String>,
    matrix: Array2<u64>,
}

impl ConfusionMatrix {
    pub fn new<S: AsRef<str>>(categories: &[S]) -> Self {
        let categories: Vec<String> = categories.iter().map(|c| c.as_ref().to_string()).collect();
        let n = categories.len();
        Self {
            categories,
            matrix: Array2::zeros((n, n)),
        }
    }

    fn index_of(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }

    /// Count one (correct, predicted) pair; unknown names are reported and skipped
    pub fn count(&mut self, correct: &str, predicted: &str) {
        let Some(row) = self.index_of(correct) else {
            warn!("confusion matrix: unknown category '{}'", correct);
            return;
        };
        let Some(col) = self.index_of(predicted) else {
            warn!("confusion matrix: unknown category '{}'", predicted);
            return;
        };
        self.matrix[[row, col]] += 1;
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn matrix(&self) -> &Array2<u64> {
        &self.matrix
    }

    /// Count for a (correct, predicted) pair of names
    pub fn get(&self, correct: &str, predicted: &str) -> Option<u64> {
        Some(self.matrix[[self.index_of(correct)?, self.index_of(predicted)?]])
    }

    pub fn total(&self) -> u64 {
        self.matrix.sum()
    }

    /// Share of counts on the diagonal
    pub fn accuracy(&self) -> f64 {
        self.matrix.diag().sum() as f64 / self.total() as f64
    }

    /// Human-readable table, correct categories down the side
    pub fn report(&self) -> String {
        let width = self
            .categories
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max(8);
        let mut out = format!("{:<width$}", "");
        for name in &self.categories {
            let _ = write!(out, " {name:>width$}");
        }
        out.push('\n');
        for (name, row) in self.categories.iter().zip(self.matrix.rows()) {
            let _ = write!(out, "{name:<width$}");
            for value in row {
                let _ = write!(out, " {value:>width$}");
            }
            out.push('\n');
        }
        out
    }

    /// CSV with a header row of predicted categories
    pub fn to_csv(&self) -> String {
        let mut out = String::from("correct");
        for name in &self.categories {
            let _ = write!(out, ",{name}");
        }
        out.push('\n');
        for (name, row) in self.categories.iter().zip(self.matrix.rows()) {
            out.push_str(name);
            for value in row {
                let _ = write!(out, ",{value}");
            }
            out.push('\n');
        }
        out
    }
}
