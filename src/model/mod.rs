//! Models trained from a labeled record set

pub mod batch;

pub use self::batch::*;
