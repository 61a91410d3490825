//! Records, record sets and target field descriptors
//!
//! A record set is stored one JSON object per line:
//!
//! ```text
//! {"$id": 1, "text": "cheap flights to rome", "tags": ["travel"]}
//! {"$id": 2, "text": "quarterly earnings beat estimates", "tags": ["finance"]}
//! ```

use crate::core::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Deref;
use std::path::Path;

const ID_KEY: &str = "$id";

/// A single record: an id plus named JSON fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "$id", default)]
    pub id: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new(id: u64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Build a record from a JSON object, using `ordinal` when it carries no id
    pub fn from_json(ordinal: u64, value: Value) -> Result<Self> {
        let Value::Object(mut fields) = value else {
            return Err(AnalyticsError::ParseError(
                "record must be a JSON object".to_string(),
            ));
        };
        let id = match fields.remove(ID_KEY) {
            None => ordinal,
            Some(v) => v.as_u64().ok_or_else(|| {
                AnalyticsError::ParseError(format!("invalid record id: {v}"))
            })?,
        };
        Ok(Self { id, fields })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// String values of a field: a single string, or every string in an array
    pub fn get_strings(&self, name: &str) -> Vec<&str> {
        match self.fields.get(name) {
            Some(Value::String(s)) => vec![s.as_str()],
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Ordered collection of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Load a record set from a JSON Lines file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(AnalyticsError::IoError)?;
        let reader = BufReader::new(file);
        Self::from_reader(reader)
    }

    /// Load a record set from a reader
    ///
    /// Records without an `$id` are numbered in file order starting above
    /// the largest explicit id, so every id in the set is distinct.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut records = Vec::new();
        let mut explicit_ids = HashSet::new();
        let mut missing = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(AnalyticsError::IoError)?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| {
                AnalyticsError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            let has_id = value.get(ID_KEY).is_some();
            let record = Record::from_json(0, value).map_err(|e| {
                AnalyticsError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            if !has_id {
                missing.push(records.len());
            } else if !explicit_ids.insert(record.id) {
                return Err(AnalyticsError::InvalidDataset(format!(
                    "duplicate record id {} on line {}",
                    record.id,
                    line_num + 1
                )));
            }
            records.push(record);
        }

        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let first_free = explicit_ids.iter().max().map_or(0, |&max| max + 1);
        for (next_id, position) in (first_free..).zip(missing) {
            records[position].id = next_id;
        }

        Ok(Self { records })
    }

    /// Records at the given positions, in the given order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
        }
    }

    pub fn into_inner(self) -> Vec<Record> {
        self.records
    }
}

impl Deref for RecordSet {
    type Target = [Record];

    fn deref(&self) -> &[Record] {
        &self.records
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

/// Storage type of a target field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// Single categorical value per record
    #[serde(rename = "string")]
    String,
    /// Set of categorical values per record
    #[serde(rename = "string_v")]
    StringVector,
    /// Real-valued target
    #[serde(rename = "float")]
    Float,
}

/// The record field a model predicts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl TargetField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
        }
    }

    /// Whether this target produces classification categories
    pub fn is_categorical(&self) -> bool {
        self.field_type != FieldType::Float
    }

    /// Categories a record belongs to under this target
    ///
    /// A `string` target reads a single value, a `string_v` target every
    /// string of the field. Float targets have no categories.
    pub fn categories_of<'r>(&self, record: &'r Record) -> Vec<&'r str> {
        match self.field_type {
            FieldType::String => record.get_str(&self.name).into_iter().collect(),
            FieldType::StringVector => record.get_strings(&self.name),
            FieldType::Float => Vec::new(),
        }
    }
}
