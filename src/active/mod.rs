//! Interactive active learning

pub mod learner;

pub use self::learner::*;
