//! Batch multi-label model: one linear model per target category

use crate::core::{AnalyticsError, ModelKind, Predictor, Result, SolverConfig};
use crate::data::{FieldType, Record, TargetField};
use crate::features::{FeatureSpace, FeatureSpec};
use crate::persistence::{create_file, open_file, write_json_line, CategoryEntry, ModelHeader};
use crate::solver::{LinearModel, LinearSolver};
use crate::utils::stats::matrix_stats;
use log::{debug, info};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Categories with fewer examples than this are not trained
pub const DEFAULT_MIN_SUPPORT: usize = 50;

/// Training target derived from a labeled record set
#[derive(Debug, Clone, PartialEq)]
pub struct TargetDescriptor {
    pub name: String,
    pub kind: ModelKind,
    /// Positive examples for a category, every record for a regression field
    pub example_count: usize,
    /// One value per record: ±1 for categories, the raw value for regression
    pub target_values: Vec<f64>,
}

/// Trained model for one category (or one regression field)
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryModel {
    pub name: String,
    pub kind: ModelKind,
    pub classifier: LinearModel,
}

/// Settings controlling which targets get trained and how
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub min_support: usize,
    /// Track only these categories; `None` tracks every value seen
    pub allowed_categories: Option<Vec<String>>,
    pub solver: SolverConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_support: DEFAULT_MIN_SUPPORT,
            allowed_categories: None,
            solver: SolverConfig::default(),
        }
    }
}

/// Build the training targets of `records` in first-seen order
pub fn build_targets(
    records: &[Record],
    target: &TargetField,
    allowed: Option<&[String]>,
) -> Result<Vec<TargetDescriptor>> {
    if target.field_type == FieldType::Float {
        let target_values = records
            .iter()
            .map(|r| {
                r.get_f64(&target.name).ok_or_else(|| {
                    AnalyticsError::InvalidDataset(format!(
                        "record {} has no numeric value for '{}'",
                        r.id, target.name
                    ))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        return Ok(vec![TargetDescriptor {
            name: target.name.clone(),
            kind: ModelKind::Regression,
            example_count: target_values.len(),
            target_values,
        }]);
    }

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut descriptors: Vec<TargetDescriptor> = Vec::new();

    for (row, record) in records.iter().enumerate() {
        for value in target.categories_of(record) {
            if let Some(allowed) = allowed {
                if !allowed.iter().any(|a| a.as_str() == value) {
                    continue;
                }
            }
            let slot = *index.entry(value.to_string()).or_insert_with(|| {
                descriptors.push(TargetDescriptor {
                    name: value.to_string(),
                    kind: ModelKind::Classification,
                    example_count: 0,
                    target_values: vec![-1.0; records.len()],
                });
                descriptors.len() - 1
            });
            let descriptor = &mut descriptors[slot];
            // a value listed twice in one record counts once
            if descriptor.target_values[row] < 0.0 {
                descriptor.target_values[row] = 1.0;
                descriptor.example_count += 1;
            }
        }
    }

    Ok(descriptors)
}

/// Multi-label predictor over a shared feature space
#[derive(Debug, Clone, PartialEq)]
pub struct BatchModel {
    target: TargetField,
    feature_space: FeatureSpace,
    models: Vec<CategoryModel>,
}

impl BatchModel {
    /// Fit a feature space on `records` and train every supported target
    pub fn train(
        records: &[Record],
        features: &[FeatureSpec],
        target: &TargetField,
        config: &BatchConfig,
    ) -> Result<Self> {
        if records.is_empty() {
            return Err(AnalyticsError::EmptyDataset);
        }

        let mut feature_space = FeatureSpace::new(features);
        feature_space.update(records);
        let matrix = feature_space.extract_matrix(records);
        let stats = matrix_stats(&matrix);
        debug!(
            "feature matrix: {} x {}, {:.1} non-zeros per record (max {})",
            stats.rows, stats.cols, stats.mean_nnz, stats.max_nnz
        );

        let targets = build_targets(records, target, config.allowed_categories.as_deref())?;
        let solver = LinearSolver::new(config.solver.clone());
        let discovered = targets.len();
        let mut models = Vec::new();

        for descriptor in targets {
            if descriptor.example_count < config.min_support {
                debug!(
                    "skipping '{}': {} examples below support threshold {}",
                    descriptor.name, descriptor.example_count, config.min_support
                );
                continue;
            }

            let classifier = match descriptor.kind {
                ModelKind::Classification => {
                    solver.train_classify(&matrix, &descriptor.target_values)?
                }
                ModelKind::Regression => {
                    solver.train_regression(&matrix, &descriptor.target_values)?
                }
            };
            info!(
                "trained {} model '{}' on {} examples ({} iterations)",
                descriptor.kind,
                descriptor.name,
                descriptor.example_count,
                classifier.iterations()
            );
            models.push(CategoryModel {
                name: descriptor.name,
                kind: descriptor.kind,
                classifier,
            });
        }

        info!(
            "batch model ready: {} of {} targets trained",
            models.len(),
            discovered
        );
        Ok(Self {
            target: target.clone(),
            feature_space,
            models,
        })
    }

    /// Record field this model predicts
    pub fn target(&self) -> &TargetField {
        &self.target
    }

    pub fn feature_space(&self) -> &FeatureSpace {
        &self.feature_space
    }

    pub fn models(&self) -> &[CategoryModel] {
        &self.models
    }

    /// Trained category names in training order
    pub fn categories(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Score of every trained category for `record`
    pub fn predict(&self, record: &Record) -> Vec<(String, f64)> {
        let x = self.feature_space.extract_vector(record);
        self.models
            .iter()
            .map(|m| (m.name.clone(), m.classifier.predict(&x)))
            .collect()
    }

    /// Categories with a positive score
    pub fn predict_labels(&self, record: &Record) -> Vec<String> {
        self.predict(record)
            .into_iter()
            .filter(|(_, score)| *score > 0.0)
            .map(|(name, _)| name)
            .collect()
    }

    /// Category with the lowest score; the first one wins a tie
    pub fn predict_top(&self, record: &Record) -> Option<String> {
        self.predict(record)
            .into_iter()
            .fold(None, |best: Option<(String, f64)>, (name, score)| match best {
                Some((_, low)) if low <= score => best,
                _ => Some((name, score)),
            })
            .map(|(name, _)| name)
    }

    /// Write header, feature space and every classifier in header order
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        let header = ModelHeader::new(
            self.target.clone(),
            self.models
                .iter()
                .map(|m| CategoryEntry {
                    name: m.name.clone(),
                    kind: m.kind,
                })
                .collect(),
        );
        write_json_line(writer, &header)?;
        self.feature_space.save(writer)?;
        for model in &self.models {
            model.classifier.save(writer)?;
        }
        Ok(())
    }

    /// Read a model written by [`save`](Self::save)
    pub fn load<R: BufRead>(reader: &mut R) -> Result<Self> {
        let header = ModelHeader::read(reader)?;
        let feature_space = FeatureSpace::load(reader)?;

        let mut models = Vec::with_capacity(header.categories.len());
        for entry in header.categories {
            let classifier = LinearModel::load(reader)?;
            if classifier.kind() != entry.kind {
                return Err(AnalyticsError::SerializationError(format!(
                    "category '{}' declared {} but stored a {} model",
                    entry.name,
                    entry.kind,
                    classifier.kind()
                )));
            }
            models.push(CategoryModel {
                name: entry.name,
                kind: entry.kind,
                classifier,
            });
        }

        Ok(Self {
            target: header.target,
            feature_space,
            models,
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = create_file(path)?;
        self.save(&mut writer)?;
        writer.flush().map_err(AnalyticsError::IoError)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = open_file(path)?;
        Self::load(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    fn corpus() -> Vec<Record> {
        (0..120)
            .map(|i| {
                let (text, topic) = if i % 2 == 0 {
                    ("goal scored by the home team", "sports")
                } else {
                    ("bank shares fell on the market", "finance")
                };
                let mut tags = vec![topic];
                if i % 10 == 0 {
                    tags.push("rare");
                }
                Record::new(i)
                    .with_field("text", text)
                    .with_field("topic", topic)
                    .with_field("tags", json!(tags))
            })
            .collect()
    }

    fn features() -> Vec<FeatureSpec> {
        vec![FeatureSpec::text("text")]
    }

    #[test]
    fn test_targets_in_first_seen_order() {
        let records = corpus();
        let targets =
            build_targets(&records, &TargetField::new("tags", FieldType::StringVector), None)
                .unwrap();

        let names: Vec<&str> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sports", "rare", "finance"]);
        assert_eq!(targets[0].example_count, 60);
        assert_eq!(targets[1].example_count, 12);
        for t in &targets {
            assert_eq!(t.target_values.len(), records.len());
            assert_eq!(
                t.target_values.iter().filter(|&&v| v > 0.0).count(),
                t.example_count
            );
        }
    }

    #[test]
    fn test_allowed_categories_filter() {
        let allowed = vec!["finance".to_string()];
        let targets = build_targets(
            &corpus(),
            &TargetField::new("tags", FieldType::StringVector),
            Some(&allowed),
        )
        .unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, "finance");
    }

    #[test]
    fn test_float_target_requires_values() {
        let records = vec![
            Record::new(0).with_field("price", 1.5),
            Record::new(1).with_field("price", "n/a"),
        ];
        let target = TargetField::new("price", FieldType::Float);
        assert!(matches!(
            build_targets(&records, &target, None),
            Err(AnalyticsError::InvalidDataset(_))
        ));

        let targets = build_targets(&records[..1], &target, None).unwrap();
        assert_eq!(targets[0].kind, ModelKind::Regression);
        assert_eq!(targets[0].target_values, vec![1.5]);
    }

    #[test]
    fn test_low_support_categories_are_dropped() {
        let model = BatchModel::train(
            &corpus(),
            &features(),
            &TargetField::new("tags", FieldType::StringVector),
            &BatchConfig::default(),
        )
        .unwrap();
        assert_eq!(model.categories(), vec!["sports", "finance"]);
    }

    #[test]
    fn test_predictions() {
        let model = BatchModel::train(
            &corpus(),
            &features(),
            &TargetField::new("topic", FieldType::String),
            &BatchConfig::default(),
        )
        .unwrap();

        let query = Record::new(999).with_field("text", "the team scored a late goal");
        assert_eq!(model.predict_labels(&query), vec!["sports".to_string()]);

        // lowest score, not highest
        assert_eq!(model.predict_top(&query), Some("finance".to_string()));

        let scores = model.predict(&query);
        assert_eq!(scores.len(), 2);
        assert!(scores[0].1 > scores[1].1);
    }

    #[test]
    fn test_save_load_round_trip() {
        let model = BatchModel::train(
            &corpus(),
            &features(),
            &TargetField::new("topic", FieldType::String),
            &BatchConfig::default(),
        )
        .unwrap();

        let mut buf = Vec::new();
        model.save(&mut buf).unwrap();
        let loaded = BatchModel::load(&mut Cursor::new(buf)).unwrap();

        assert_eq!(loaded, model);
        for record in corpus().iter().take(10) {
            assert_eq!(loaded.predict(record), model.predict(record));
        }
    }

    #[test]
    fn test_load_truncated_stream() {
        let model = BatchModel::train(
            &corpus(),
            &features(),
            &TargetField::new("topic", FieldType::String),
            &BatchConfig::default(),
        )
        .unwrap();
        let mut buf = Vec::new();
        model.save(&mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let truncated: Vec<&str> = text.lines().take(3).collect();
        let result = BatchModel::load(&mut Cursor::new(truncated.join("\n")));
        assert!(matches!(result, Err(AnalyticsError::SerializationError(_))));
    }
}
