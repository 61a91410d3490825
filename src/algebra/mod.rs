//! Linear algebra primitives
//!
//! Sparse column matrices for feature data, plus dense helpers on top of
//! `ndarray` used by the online learners and filters.

pub mod dense;
pub mod sparse;
pub mod svd;

pub use self::dense::*;
pub use self::sparse::*;
pub use self::svd::*;
