//! Model serialization and persistence
//!
//! Models are written as a stream of JSON lines so that composite models
//! (header, feature space, one classifier per category) can be appended to a
//! single file and read back in the same order.

use crate::core::{AnalyticsError, ModelKind, Result};
use crate::data::TargetField;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Current layout version of the batch model stream
pub const FORMAT_VERSION: u32 = 1;

/// One entry of the batch model header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub kind: ModelKind,
}

/// First line of a persisted batch model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelHeader {
    /// Stream layout version
    pub version: u32,
    /// Library version used to create the model
    pub library_version: String,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    /// Record field the model predicts
    pub target: TargetField,
    /// Trained categories, in the order their classifiers follow
    pub categories: Vec<CategoryEntry>,
}

impl ModelHeader {
    pub fn new(target: TargetField, categories: Vec<CategoryEntry>) -> Self {
        Self {
            version: FORMAT_VERSION,
            library_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            target,
            categories,
        }
    }

    /// Read and validate a header line
    pub fn read<R: BufRead>(reader: &mut R) -> Result<Self> {
        let header: Self = read_json_line(reader)?;
        if header.version != FORMAT_VERSION {
            return Err(AnalyticsError::SerializationError(format!(
                "unsupported model format version {} (expected {})",
                header.version, FORMAT_VERSION
            )));
        }
        Ok(header)
    }

    /// Print model summary
    pub fn print_summary(&self) {
        println!("=== Batch Model Summary ===");
        println!("Format Version: {}", self.version);
        println!("Library Version: {}", self.library_version);
        println!("Created: {}", self.created_at);
        println!("Target: {} ({:?})", self.target.name, self.target.field_type);
        println!("Categories: {}", self.categories.len());
        for entry in &self.categories {
            println!("  {} ({})", entry.name, entry.kind);
        }
    }
}

/// Serialize `value` as one JSON line
pub fn write_json_line<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *writer, value)
        .map_err(|e| AnalyticsError::SerializationError(e.to_string()))?;
    writer.write_all(b"\n").map_err(AnalyticsError::IoError)?;
    Ok(())
}

/// Deserialize the next JSON line
pub fn read_json_line<R: BufRead, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let mut line = String::new();
    let read = reader.read_line(&mut line).map_err(AnalyticsError::IoError)?;
    if read == 0 {
        return Err(AnalyticsError::SerializationError(
            "unexpected end of model stream".to_string(),
        ));
    }
    serde_json::from_str(line.trim_end()).map_err(|e| AnalyticsError::SerializationError(e.to_string()))
}

/// Open a buffered writer on a new file
pub fn create_file<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(AnalyticsError::IoError)?;
    Ok(BufWriter::new(file))
}

/// Open a buffered reader on an existing file
pub fn open_file<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(AnalyticsError::IoError)?;
    Ok(BufReader::new(file))
}
