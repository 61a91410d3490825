//! Feature space: ordered feature blocks over a record schema

use crate::algebra::SparseColMatrix;
use crate::core::{Result, SparseVector};
use crate::data::Record;
use crate::features::{FeatureExtractor, FeatureSpec};
use crate::persistence::{read_json_line, write_json_line};
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Maps records to sparse feature vectors
///
/// Blocks are laid out one after another in spec order; each block's width
/// is fixed by the records seen in [`update`](Self::update).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpace {
    extractors: Vec<FeatureExtractor>,
}

impl FeatureSpace {
    /// Create an unfitted feature space
    pub fn new(specs: &[FeatureSpec]) -> Self {
        Self {
            extractors: specs.iter().map(FeatureExtractor::from).collect(),
        }
    }

    /// Append a feature block
    pub fn add(&mut self, spec: &FeatureSpec) {
        self.extractors.push(FeatureExtractor::from(spec));
    }

    /// Fit vocabularies and value ranges on `records`
    pub fn update(&mut self, records: &[Record]) {
        for record in records {
            for extractor in &mut self.extractors {
                extractor.update(record);
            }
        }
        debug!(
            "feature space updated with {} records, dim = {}",
            records.len(),
            self.dim()
        );
    }

    /// Total dimensionality
    pub fn dim(&self) -> usize {
        self.extractors.iter().map(FeatureExtractor::dim).sum()
    }

    pub fn extractors(&self) -> &[FeatureExtractor] {
        &self.extractors
    }

    /// Feature vector of a single record
    pub fn extract_vector(&self, record: &Record) -> SparseVector {
        let mut entries = Vec::new();
        let mut offset = 0;
        for extractor in &self.extractors {
            extractor.extract(record, offset, &mut entries);
            offset += extractor.dim();
        }
        let (indices, values) = entries.into_iter().unzip();
        SparseVector::new(indices, values)
    }

    /// Feature matrix with one column per record
    pub fn extract_matrix(&self, records: &[Record]) -> SparseColMatrix {
        let mut matrix = SparseColMatrix::new(self.dim());
        for record in records {
            matrix.push(self.extract_vector(record));
        }
        matrix
    }

    /// Write the fitted space as a single JSON line
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_json_line(writer, self)
    }

    /// Read a space written by [`save`](Self::save)
    pub fn load<R: BufRead>(reader: &mut R) -> Result<Self> {
        read_json_line(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn records() -> Vec<Record> {
        vec![
            Record::new(0)
                .with_field("text", "solar panels")
                .with_field("kind", "energy")
                .with_field("len", 2.0),
            Record::new(1)
                .with_field("text", "wind farms")
                .with_field("kind", "energy")
                .with_field("len", 4.0),
        ]
    }

    fn space() -> FeatureSpace {
        let mut space = FeatureSpace::new(&[
            FeatureSpec::text("text"),
            FeatureSpec::categorical("kind"),
        ]);
        space.add(&FeatureSpec::numeric("len", false));
        space.update(&records());
        space
    }

    #[test]
    fn test_blocks_are_offset() {
        let space = space();
        // 4 words + 1 category + 1 numeric
        assert_eq!(space.dim(), 6);

        let v = space.extract_vector(&records()[1]);
        assert_eq!(v.get(4), 1.0);
        assert_eq!(v.get(5), 4.0);
        assert!(v.indices.iter().all(|&i| i < 6));
    }

    #[test]
    fn test_extract_matrix() {
        let space = space();
        let m = space.extract_matrix(&records());
        assert_eq!(m.cols(), 2);
        assert_eq!(m.rows(), 6);
    }

    #[test]
    fn test_save_load() {
        let space = space();
        let mut buf = Vec::new();
        space.save(&mut buf).unwrap();

        let loaded = FeatureSpace::load(&mut Cursor::new(buf)).unwrap();
        assert_eq!(loaded, space);
        let rec = &records()[0];
        assert_eq!(loaded.extract_vector(rec), space.extract_vector(rec));
    }
}
