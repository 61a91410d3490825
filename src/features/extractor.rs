//! Per-field feature extractors

use crate::data::Record;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-facing description of one feature block
///
/// ```json
/// [
///   {"type": "text", "field": "text"},
///   {"type": "categorical", "field": "source"},
///   {"type": "numeric", "field": "length", "normalize": true}
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeatureSpec {
    /// A single real-valued dimension, optionally min-max scaled to [0, 1]
    Numeric {
        field: String,
        #[serde(default)]
        normalize: bool,
    },
    /// One-hot dimension per distinct string value
    Categorical { field: String },
    /// Bag of words over lower-cased alphanumeric tokens
    Text {
        field: String,
        #[serde(default = "default_tfidf")]
        tfidf: bool,
    },
}

fn default_tfidf() -> bool {
    true
}

impl FeatureSpec {
    pub fn numeric(field: &str, normalize: bool) -> Self {
        FeatureSpec::Numeric {
            field: field.to_string(),
            normalize,
        }
    }

    pub fn categorical(field: &str) -> Self {
        FeatureSpec::Categorical {
            field: field.to_string(),
        }
    }

    pub fn text(field: &str) -> Self {
        FeatureSpec::Text {
            field: field.to_string(),
            tfidf: true,
        }
    }
}

/// Fitted state of one feature block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeatureExtractor {
    Numeric {
        field: String,
        normalize: bool,
        range: Option<(f64, f64)>,
    },
    Categorical {
        field: String,
        values: BTreeMap<String, usize>,
    },
    Text {
        field: String,
        tfidf: bool,
        vocabulary: BTreeMap<String, usize>,
        doc_freq: Vec<u64>,
        docs: u64,
    },
}

impl From<&FeatureSpec> for FeatureExtractor {
    fn from(spec: &FeatureSpec) -> Self {
        match spec {
            FeatureSpec::Numeric { field, normalize } => FeatureExtractor::Numeric {
                field: field.clone(),
                normalize: *normalize,
                range: None,
            },
            FeatureSpec::Categorical { field } => FeatureExtractor::Categorical {
                field: field.clone(),
                values: BTreeMap::new(),
            },
            FeatureSpec::Text { field, tfidf } => FeatureExtractor::Text {
                field: field.clone(),
                tfidf: *tfidf,
                vocabulary: BTreeMap::new(),
                doc_freq: Vec::new(),
                docs: 0,
            },
        }
    }
}

impl FeatureExtractor {
    pub fn field(&self) -> &str {
        match self {
            FeatureExtractor::Numeric { field, .. }
            | FeatureExtractor::Categorical { field, .. }
            | FeatureExtractor::Text { field, .. } => field,
        }
    }

    /// Number of dimensions this block currently occupies
    pub fn dim(&self) -> usize {
        match self {
            FeatureExtractor::Numeric { .. } => 1,
            FeatureExtractor::Categorical { values, .. } => values.len(),
            FeatureExtractor::Text { vocabulary, .. } => vocabulary.len(),
        }
    }

    /// Fold one record into the fitted statistics
    pub fn update(&mut self, record: &Record) {
        match self {
            FeatureExtractor::Numeric { field, range, .. } => {
                if let Some(v) = record.get_f64(field) {
                    *range = Some(match *range {
                        Some((lo, hi)) => (lo.min(v), hi.max(v)),
                        None => (v, v),
                    });
                }
            }
            FeatureExtractor::Categorical { field, values } => {
                for value in record.get_strings(field) {
                    let next = values.len();
                    values.entry(value.to_string()).or_insert(next);
                }
            }
            FeatureExtractor::Text {
                field,
                vocabulary,
                doc_freq,
                docs,
                ..
            } => {
                let Some(text) = record.get_str(field) else {
                    return;
                };
                *docs += 1;
                let mut seen = tokenize(text);
                seen.sort_unstable();
                seen.dedup();
                for token in seen {
                    let next = vocabulary.len();
                    let idx = *vocabulary.entry(token).or_insert(next);
                    if idx == doc_freq.len() {
                        doc_freq.push(0);
                    }
                    doc_freq[idx] += 1;
                }
            }
        }
    }

    /// Append this block's `(index, value)` entries, shifted by `offset`
    pub fn extract(&self, record: &Record, offset: usize, out: &mut Vec<(usize, f64)>) {
        match self {
            FeatureExtractor::Numeric {
                field,
                normalize,
                range,
            } => {
                let Some(v) = record.get_f64(field) else {
                    return;
                };
                let value = match (normalize, range) {
                    (true, Some((lo, hi))) if hi > lo => ((v - lo) / (hi - lo)).clamp(0.0, 1.0),
                    // constant feature
                    (true, Some(_)) => 0.5,
                    _ => v,
                };
                if value != 0.0 {
                    out.push((offset, value));
                }
            }
            FeatureExtractor::Categorical { field, values } => {
                let mut hits: Vec<usize> = record
                    .get_strings(field)
                    .into_iter()
                    .filter_map(|v| values.get(v).copied())
                    .collect();
                hits.sort_unstable();
                hits.dedup();
                out.extend(hits.into_iter().map(|i| (offset + i, 1.0)));
            }
            FeatureExtractor::Text {
                field,
                tfidf,
                vocabulary,
                doc_freq,
                docs,
            } => {
                let Some(text) = record.get_str(field) else {
                    return;
                };
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for token in tokenize(text) {
                    if let Some(&idx) = vocabulary.get(&token) {
                        *counts.entry(idx).or_insert(0.0) += 1.0;
                    }
                }
                let mut block: Vec<(usize, f64)> = counts
                    .into_iter()
                    .map(|(idx, tf)| {
                        let weight = if *tfidf && doc_freq[idx] > 0 {
                            tf * (*docs as f64 / doc_freq[idx] as f64).ln()
                        } else {
                            tf
                        };
                        (idx, weight)
                    })
                    .filter(|&(_, w)| w != 0.0)
                    .collect();
                let norm = block.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for entry in &mut block {
                        entry.1 /= norm;
                    }
                }
                out.extend(block.into_iter().map(|(i, w)| (offset + i, w)));
            }
        }
    }
}

/// Lower-cased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
