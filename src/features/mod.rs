//! Feature extraction
//!
//! A [`FeatureSpace`] turns records into sparse feature vectors. It is
//! configured with a list of [`FeatureSpec`]s, fitted on a record set with
//! [`FeatureSpace::update`], and persisted alongside the models trained on it.

pub mod extractor;
pub mod space;

pub use self::extractor::*;
pub use self::space::*;
