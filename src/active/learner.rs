//! Two-phase active learner
//!
//! The learner starts in query mode, where it offers the records most and
//! least similar to a text query until enough positive and negative labels
//! have been collected. It then switches to margin mode for good: every
//! question retrains a linear classifier on the labels so far and offers the
//! unlabeled record closest to its decision boundary.
//!
//! [`select_question`](ActiveLearner::select_question) and
//! [`get_answer`](ActiveLearner::get_answer) are separate calls so the host
//! decides how a record is shown and how the answer is collected.

use crate::algebra::{sort_perm, SparseColMatrix};
use crate::core::{AnalyticsError, Label, Predictor, Result, SolverConfig, SparseVector};
use crate::data::Record;
use crate::features::FeatureSpace;
use crate::solver::{LinearModel, LinearSolver};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use std::collections::HashSet;
use std::io::Write;

/// Settings of an [`ActiveLearner`]
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveLearnerSettings {
    /// Positive labels required before leaving query mode
    pub n_pos: usize,
    /// Negative labels required before leaving query mode
    pub n_neg: usize,
    /// Record field the query text is matched against
    pub text_field: String,
    /// Records drawn from the query candidate set
    pub query_sample_size: usize,
    /// Records drawn from the general set
    pub random_sample_size: usize,
    /// Extract features with the feature space; otherwise use precomputed ones
    pub extract_features: bool,
    pub solver: SolverConfig,
    pub seed: u64,
}

impl Default for ActiveLearnerSettings {
    fn default() -> Self {
        Self {
            n_pos: 2,
            n_neg: 2,
            text_field: "text".to_string(),
            query_sample_size: 1000,
            random_sample_size: 1000,
            extract_features: true,
            solver: SolverConfig::default(),
            seed: 0,
        }
    }
}

/// Features computed ahead of time for the working set
#[derive(Debug, Clone, Default)]
pub struct PrecomputedFeatures {
    /// One column per candidate record
    pub matrix: Option<SparseColMatrix>,
    pub candidates: Option<Vec<Record>>,
    pub query_vector: Option<SparseVector>,
}

/// Everything an [`ActiveLearner`] is built from
#[derive(Debug, Clone, Default)]
pub struct LearnerInput<'a> {
    pub query: &'a str,
    pub query_set: &'a [Record],
    pub general_set: &'a [Record],
    pub feature_space: Option<&'a FeatureSpace>,
    pub precomputed: PrecomputedFeatures,
}

/// Sequential labeling controller
#[derive(Debug, Clone)]
pub struct ActiveLearner {
    settings: ActiveLearnerSettings,
    records: Vec<Record>,
    matrix: SparseColMatrix,
    /// Working-set positions in ascending order of query similarity
    similarity_perm: Vec<usize>,
    similarities: Vec<f64>,
    query_mode: bool,
    offer_positive: bool,
    high_cursor: usize,
    low_cursor: usize,
    labeled: Vec<bool>,
    positives: Vec<usize>,
    negatives: Vec<usize>,
    positive_ids: Vec<u64>,
    negative_ids: Vec<u64>,
    train_matrix: SparseColMatrix,
    train_labels: Vec<f64>,
    classifier: Option<LinearModel>,
}

impl ActiveLearner {
    /// Build the working set and rank it by similarity to the query
    pub fn new(input: LearnerInput<'_>, settings: ActiveLearnerSettings) -> Result<Self> {
        let (records, mut matrix, mut query_vector) = if settings.extract_features {
            let space = input.feature_space.ok_or_else(|| {
                AnalyticsError::MissingFeatures("feature space".to_string())
            })?;
            let records = working_set(input.query_set, input.general_set, &settings);
            let matrix = space.extract_matrix(&records);
            let query = Record::new(0).with_field(&settings.text_field, input.query);
            (records, matrix, space.extract_vector(&query))
        } else {
            let PrecomputedFeatures {
                matrix,
                candidates,
                query_vector,
            } = input.precomputed;
            let mut missing = Vec::new();
            if matrix.is_none() {
                missing.push("feature matrix");
            }
            if candidates.is_none() {
                missing.push("candidate set");
            }
            if query_vector.is_none() {
                missing.push("query vector");
            }
            match (matrix, candidates, query_vector) {
                (Some(m), Some(c), Some(q)) => (c, m, q),
                _ => return Err(AnalyticsError::MissingFeatures(missing.join(", "))),
            }
        };

        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }
        if matrix.cols() != records.len() {
            return Err(AnalyticsError::DimensionMismatch {
                expected: records.len(),
                actual: matrix.cols(),
            });
        }

        query_vector.normalize();
        matrix.normalize_cols();
        let sorted = sort_perm(&matrix.multiply_t(&query_vector), true);
        info!(
            "active learner: {} records in working set, best similarity {:.4}",
            records.len(),
            sorted.values.last().copied().unwrap_or(0.0)
        );

        let n = records.len();
        let rows = matrix.rows();
        Ok(Self {
            settings,
            records,
            matrix,
            similarity_perm: sorted.perm,
            similarities: sorted.values,
            query_mode: true,
            offer_positive: true,
            high_cursor: 0,
            low_cursor: 0,
            labeled: vec![false; n],
            positives: Vec::new(),
            negatives: Vec::new(),
            positive_ids: Vec::new(),
            negative_ids: Vec::new(),
            train_matrix: SparseColMatrix::new(rows),
            train_labels: Vec::new(),
            classifier: None,
        })
    }

    pub fn settings(&self) -> &ActiveLearnerSettings {
        &self.settings
    }

    pub fn query_mode(&self) -> bool {
        self.query_mode
    }

    /// The working set questions index into
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Query similarities in ascending order
    pub fn similarities(&self) -> &[f64] {
        &self.similarities
    }

    pub fn positives(&self) -> &[usize] {
        &self.positives
    }

    pub fn negatives(&self) -> &[usize] {
        &self.negatives
    }

    pub fn positive_ids(&self) -> &[u64] {
        &self.positive_ids
    }

    pub fn negative_ids(&self) -> &[u64] {
        &self.negative_ids
    }

    /// Classifier from the latest margin-mode question
    pub fn classifier(&self) -> Option<&LinearModel> {
        self.classifier.as_ref()
    }

    /// Working-set index of the next record to label
    ///
    /// Returns `None` once no unlabeled record is left to offer.
    pub fn select_question(&mut self) -> Result<Option<usize>> {
        self.update_mode();
        if self.query_mode {
            Ok(self.next_query())
        } else {
            self.closest_to_margin()
        }
    }

    /// Record the label of the working-set record at `index`
    pub fn get_answer(&mut self, label: Label, index: usize) -> Result<()> {
        if index >= self.records.len() {
            return Err(AnalyticsError::InvalidParameter(format!(
                "question index {} out of range ({} records)",
                index,
                self.records.len()
            )));
        }
        if self.labeled[index] {
            return Err(AnalyticsError::InvalidParameter(format!(
                "record at index {index} is already labeled"
            )));
        }

        let id = self.records[index].id;
        match label {
            Label::Positive => {
                self.positives.push(index);
                self.positive_ids.push(id);
            }
            Label::Negative => {
                self.negatives.push(index);
                self.negative_ids.push(id);
            }
        }
        self.labeled[index] = true;
        self.train_matrix.push(self.matrix.col(index).clone());
        self.train_labels.push(label.value());
        debug!("record {} labeled {:?}", id, label);

        self.update_mode();
        Ok(())
    }

    /// Save the classifier; fails while still in query mode
    pub fn save_model<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        self.update_mode();
        if self.query_mode {
            warn!("active learner model cannot be saved in query mode");
            return Err(AnalyticsError::QueryModeActive);
        }
        if self.classifier.is_none() {
            self.retrain()?;
        }
        match &self.classifier {
            Some(classifier) => classifier.save(writer),
            None => Err(AnalyticsError::ModelNotTrained),
        }
    }

    /// Margin mode needs at least one label to train on, even with zero quotas
    fn update_mode(&mut self) {
        if self.query_mode
            && !self.train_labels.is_empty()
            && self.positives.len() >= self.settings.n_pos
            && self.negatives.len() >= self.settings.n_neg
        {
            info!(
                "switching to margin mode with {} positive and {} negative labels",
                self.positives.len(),
                self.negatives.len()
            );
            self.query_mode = false;
        }
    }

    fn next_query(&mut self) -> Option<usize> {
        let unlabeled = self.train_labels.is_empty();
        let need_pos = unlabeled || self.positives.len() < self.settings.n_pos;
        let need_neg = unlabeled || self.negatives.len() < self.settings.n_neg;
        let sides = if need_pos && (self.offer_positive || !need_neg) {
            [true, false]
        } else {
            [false, true]
        };

        for positive_side in sides {
            let found = match positive_side {
                true if need_pos => self.advance_high(),
                false if need_neg => self.advance_low(),
                _ => None,
            };
            if let Some(idx) = found {
                self.offer_positive = !positive_side;
                return Some(idx);
            }
        }
        None
    }

    fn advance_high(&mut self) -> Option<usize> {
        let n = self.similarity_perm.len();
        while self.high_cursor < n {
            let idx = self.similarity_perm[n - 1 - self.high_cursor];
            self.high_cursor += 1;
            if !self.labeled[idx] {
                return Some(idx);
            }
        }
        None
    }

    fn advance_low(&mut self) -> Option<usize> {
        while self.low_cursor < self.similarity_perm.len() {
            let idx = self.similarity_perm[self.low_cursor];
            self.low_cursor += 1;
            if !self.labeled[idx] {
                return Some(idx);
            }
        }
        None
    }

    fn retrain(&mut self) -> Result<()> {
        let solver = LinearSolver::new(self.settings.solver.clone());
        self.classifier = Some(solver.train_classify(&self.train_matrix, &self.train_labels)?);
        Ok(())
    }

    fn closest_to_margin(&mut self) -> Result<Option<usize>> {
        self.retrain()?;
        let Some(classifier) = self.classifier.as_ref() else {
            return Err(AnalyticsError::ModelNotTrained);
        };

        // labeled records are never offered again
        let mut distances = vec![f64::INFINITY; self.records.len()];
        let mut predicted_pos = 0;
        let mut predicted_neg = 0;
        for (i, distance) in distances.iter_mut().enumerate() {
            if self.labeled[i] {
                continue;
            }
            let margin = classifier.predict(self.matrix.col(i));
            if margin > 0.0 {
                predicted_pos += 1;
            } else {
                predicted_neg += 1;
            }
            *distance = margin.abs();
        }

        let sorted = sort_perm(&distances, true);
        let closest = sorted.values.first().copied().unwrap_or(f64::INFINITY);
        info!(
            "margin mode: closest margin {:.4}, predicted {} positive, {} negative",
            closest,
            self.positives.len() + predicted_pos,
            self.negatives.len() + predicted_neg
        );

        Ok(sorted
            .perm
            .first()
            .copied()
            .filter(|&i| distances[i].is_finite()))
    }
}

/// Union of a sample of the query set and a sample of the general set
fn working_set(
    query_set: &[Record],
    general_set: &[Record],
    settings: &ActiveLearnerSettings,
) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for (set, size) in [
        (query_set, settings.query_sample_size),
        (general_set, settings.random_sample_size),
    ] {
        let mut picked = index::sample(&mut rng, set.len(), size.min(set.len())).into_vec();
        picked.sort_unstable();
        for i in picked {
            if seen.insert(set[i].id) {
                records.push(set[i].clone());
            }
        }
    }
    records
}
