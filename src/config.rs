//! Training configuration files
//!
//! ```json
//! {
//!   "features": [{"type": "text", "field": "body"}],
//!   "target": {"name": "tags", "type": "string_v"},
//!   "solver": {"c": 1.0, "j": 2.0},
//!   "min_support": 20
//! }
//! ```

use crate::core::{AnalyticsError, Result, SolverConfig};
use crate::data::TargetField;
use crate::features::FeatureSpec;
use crate::model::{BatchConfig, DEFAULT_MIN_SUPPORT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

fn default_min_support() -> usize {
    DEFAULT_MIN_SUPPORT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub features: Vec<FeatureSpec>,
    pub target: TargetField,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default = "default_min_support")]
    pub min_support: usize,
    #[serde(default)]
    pub allowed_categories: Option<Vec<String>>,
}

impl TrainingConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(AnalyticsError::IoError)?;
        Self::from_str(&text)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| AnalyticsError::ParseError(format!("invalid training config: {}", e)))?;
        if config.features.is_empty() {
            return Err(AnalyticsError::InvalidParameter(
                "training config lists no features".to_string(),
            ));
        }
        Ok(config)
    }

    pub fn to_batch_config(&self) -> BatchConfig {
        BatchConfig {
            min_support: self.min_support,
            allowed_categories: self.allowed_categories.clone(),
            solver: self.solver.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FieldType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = TrainingConfig::from_str(
            r#"{"features": [{"type": "text", "field": "body"}],
                "target": {"name": "tag", "type": "string"},
                "solver": {"c": 4.0}}"#,
        )
        .unwrap();

        assert_eq!(config.target, TargetField::new("tag", FieldType::String));
        assert_eq!(config.min_support, DEFAULT_MIN_SUPPORT);
        assert_eq!(config.solver.c, 4.0);
        assert_eq!(config.solver.j, 1.0);
        assert!(config.allowed_categories.is_none());
        assert_eq!(config.to_batch_config().solver.c, 4.0);
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"features": [{{"type": "categorical", "field": "source"}}],
                "target": {{"name": "tags", "type": "string_v"}},
                "min_support": 3, "allowed_categories": ["a"]}}"#
        )
        .unwrap();

        let config = TrainingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.features, vec![FeatureSpec::categorical("source")]);
        assert_eq!(config.min_support, 3);
        assert_eq!(config.allowed_categories, Some(vec!["a".to_string()]));
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            TrainingConfig::from_str("{not json"),
            Err(AnalyticsError::ParseError(_))
        ));
        assert!(matches!(
            TrainingConfig::from_str(r#"{"features": [], "target": {"name": "t", "type": "float"}}"#),
            Err(AnalyticsError::InvalidParameter(_))
        ));
    }
}
