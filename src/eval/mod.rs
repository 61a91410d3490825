//! Evaluation utilities: classification scores, ROC analysis, confusion
//! matrices and cross-validation

pub mod confusion;
pub mod cross_validation;
pub mod roc;
pub mod score;

pub use self::confusion::*;
pub use self::cross_validation::*;
pub use self::roc::*;
pub use self::score::*;
