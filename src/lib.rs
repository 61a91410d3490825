//! Batch, active and online learning on top of linear models
//!
//! Records are JSON objects turned into sparse vectors by a
//! [`FeatureSpace`](features::FeatureSpace). A [`BatchModel`](model::BatchModel)
//! trains one linear model per target category, the
//! [`ActiveLearner`](active::ActiveLearner) builds a classifier interactively
//! from yes/no answers, and [`online`] holds incremental learners and
//! state estimators.

pub mod active;
pub mod algebra;
pub mod api;
pub mod config;
pub mod core;
pub mod data;
pub mod eval;
pub mod features;
pub mod model;
pub mod online;
pub mod persistence;
pub mod solver;
pub mod utils;

// Re-export main types for convenience
pub use crate::active::{ActiveLearner, ActiveLearnerSettings, LearnerInput};
pub use crate::algebra::SparseColMatrix;
pub use crate::api::Trainer;
pub use crate::config::TrainingConfig;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::core::{AnalyticsError, Result};
pub use crate::data::{FieldType, Record, RecordSet, TargetField};
pub use crate::eval::{ClassificationScore, ConfusionMatrix, RocScore};
pub use crate::features::{FeatureSpace, FeatureSpec};
pub use crate::model::{BatchConfig, BatchModel};
pub use crate::solver::{LinearModel, LinearSolver};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
