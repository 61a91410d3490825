//! Record data model and loaders
//!
//! Records are JSON objects; record sets are loaded from JSON Lines files.

pub mod records;

pub use self::records::*;
