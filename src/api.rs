//! High-level API for training and using batch models
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ranalytics::api::Trainer;
//! use ranalytics::data::{FieldType, RecordSet, TargetField};
//! use ranalytics::features::FeatureSpec;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let records = RecordSet::from_file("news.jsonl")?;
//! let model = Trainer::new()
//!     .with_c(1.0)
//!     .with_min_support(20)
//!     .train(
//!         &records,
//!         &[FeatureSpec::text("body")],
//!         &TargetField::new("tags", FieldType::StringVector),
//!     )?;
//!
//! model.save_to_file("news.model")?;
//! println!("{:?}", model.predict_labels(&records[0]));
//! # Ok(())
//! # }
//! ```

use crate::core::Result;
use crate::data::{Record, TargetField};
use crate::eval::{cross_validate, CrossValidationResult};
use crate::features::FeatureSpec;
use crate::model::{BatchConfig, BatchModel};

/// Batch model trainer with builder pattern
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: BatchConfig,
}

impl Trainer {
    /// Trainer with default solver settings and support threshold
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn with_config(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.solver.c = c;
        self
    }

    /// Set the cost ratio of positive to negative errors
    pub fn with_j(mut self, j: f64) -> Self {
        self.config.solver.j = j;
        self
    }

    /// Minimum number of examples a category needs to be trained
    pub fn with_min_support(mut self, min_support: usize) -> Self {
        self.config.min_support = min_support;
        self
    }

    /// Train only the listed categories
    pub fn with_allowed_categories<S: Into<String>>(mut self, categories: Vec<S>) -> Self {
        self.config.allowed_categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.solver.batch_size = batch_size;
        self
    }

    /// Set maximum number of solver iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.solver.max_iterations = max_iterations;
        self
    }

    /// Wall-clock budget per category, in seconds
    pub fn with_max_time(mut self, max_time: f64) -> Self {
        self.config.solver.max_time = max_time;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.solver.seed = seed;
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Train a batch model on `records`
    pub fn train(
        &self,
        records: &[Record],
        features: &[FeatureSpec],
        target: &TargetField,
    ) -> Result<BatchModel> {
        BatchModel::train(records, features, target, &self.config)
    }

    /// k-fold cross-validation with the current settings
    pub fn cross_validate(
        &self,
        records: &[Record],
        features: &[FeatureSpec],
        target: &TargetField,
        folds: usize,
        seed: u64,
    ) -> Result<CrossValidationResult> {
        cross_validate(records, features, target, folds, &self.config, seed)
    }
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::data::RecordSet;
    use std::path::Path;

    /// Train from a JSON Lines record file and a JSON training config
    pub fn train_files<P1: AsRef<Path>, P2: AsRef<Path>>(
        records_path: P1,
        config_path: P2,
    ) -> Result<BatchModel> {
        let records = RecordSet::from_file(records_path)?;
        let config = TrainingConfig::from_file(config_path)?;
        Trainer::with_config(config.to_batch_config()).train(&records, &config.features, &config.target)
    }

    /// Train on one record file, score the predicted labels on another
    pub fn evaluate_split<P1, P2, P3>(
        train_path: P1,
        test_path: P2,
        config_path: P3,
    ) -> Result<crate::eval::ClassificationScore>
    where
        P1: AsRef<Path>,
        P2: AsRef<Path>,
        P3: AsRef<Path>,
    {
        let model = train_files(train_path, config_path)?;
        let test = RecordSet::from_file(test_path)?;
        crate::eval::evaluate(&model, &test)
    }
}
