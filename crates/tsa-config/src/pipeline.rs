//! Whole-pipeline configuration file.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::policy::{ClusteringParams, ScoringPolicy};
use crate::preset::PresetName;
use crate::scorer::ScorerConfig;
use crate::validate::ValidationError;

/// Input column used by the built-in default pipeline.
pub const DEFAULT_INPUT_ITEM: &str = "value";

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_gap_seconds() -> f64 {
    5.0
}

/// Ordered scorers plus the settings they share.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Sampling interval assumed when timestamps give no usable spacing.
    #[serde(default = "default_gap_seconds")]
    pub default_gap_seconds: f64,

    /// Scorers, run in order.
    #[serde(default)]
    pub scorers: Vec<ScorerConfig>,

    #[serde(default)]
    pub policy: ScoringPolicy,

    #[serde(default)]
    pub clustering: ClusteringParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PresetName::Full.pipeline(DEFAULT_INPUT_ITEM)
    }
}

impl PipelineConfig {
    /// An empty pipeline with default shared settings.
    pub fn empty() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_gap_seconds: default_gap_seconds(),
            scorers: Vec::new(),
            policy: ScoringPolicy::default(),
            clustering: ClusteringParams::default(),
        }
    }

    pub fn with_scorer(mut self, scorer: ScorerConfig) -> Self {
        self.scorers.push(scorer);
        self
    }

    /// Default sampling interval in nanoseconds.
    pub fn default_gap_nanos(&self) -> i64 {
        (self.default_gap_seconds * 1e9).round() as i64
    }

    /// Load from a file, choosing JSON or TOML by extension.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_content(&content, path)
    }

    /// Parse file content, choosing JSON or TOML by the path's extension.
    pub fn from_content(content: &str, path: &Path) -> Result<Self, ValidationError> {
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(content)
        } else {
            Self::from_toml_str(content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ValidationError> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String, ValidationError> {
        toml::to_string_pretty(self)
            .map_err(|e| ValidationError::ParseError(format!("TOML encoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::ScorerKind;

    #[test]
    fn parses_toml_with_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
            [[scorers]]
            kind = "kmeans"
            input_item = "temp"
            windowsize = 12
            output_item = "temp_kmeans"

            [policy]
            missed_match = "missing"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.schema_version, crate::CONFIG_SCHEMA_VERSION);
        assert_eq!(cfg.scorers.len(), 1);
        assert_eq!(cfg.scorers[0].kind, ScorerKind::KMeans);
        assert_eq!(cfg.default_gap_seconds, 5.0);
        assert_eq!(cfg.clustering.seed, 42);
    }

    #[test]
    fn toml_roundtrip_preserves_pipeline() {
        let cfg = PipelineConfig::default();
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = PipelineConfig::from_json_str("{ scorers: ").unwrap_err();
        assert!(matches!(err, ValidationError::ParseError(_)));
    }

    #[test]
    fn default_gap_in_nanos() {
        assert_eq!(PipelineConfig::empty().default_gap_nanos(), 5_000_000_000);
    }
}
