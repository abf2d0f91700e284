//! Configuration snapshots for run reports and reproducibility.
//!
//! A snapshot captures the exact configuration a run used, so scores can be
//! audited and reproduced later.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::pipeline::PipelineConfig;
use crate::resolve::{ConfigPaths, ConfigSource};

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    pub schema_version: String,

    /// Where the pipeline was loaded from.
    pub source: ConfigSource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    /// SHA-256 over the content hash and the effective configuration, so
    /// CLI overrides change it too.
    pub combined_hash: String,

    pub summary: ConfigSummary,
}

/// Key configuration values for quick reference.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    /// `kind:input->output@windowsize` per scorer, in run order.
    pub scorers: Vec<String>,
    pub non_finite: String,
    pub missed_match: String,
    pub clustering_seed: u64,
    pub default_gap_seconds: f64,
}

impl ConfigSummary {
    fn from_config(config: &PipelineConfig) -> Self {
        ConfigSummary {
            scorers: config
                .scorers
                .iter()
                .map(|s| {
                    format!(
                        "{}:{}->{}@{}",
                        s.kind, s.input_item, s.output_item, s.windowsize
                    )
                })
                .collect(),
            non_finite: config.policy.non_finite.to_string(),
            missed_match: config.policy.missed_match.to_string(),
            clustering_seed: config.clustering.seed,
            default_gap_seconds: config.default_gap_seconds,
        }
    }
}

impl ConfigSnapshot {
    /// Snapshot a loaded configuration. `content` is the raw file text, if any.
    pub fn new(config: &PipelineConfig, paths: &ConfigPaths, content: Option<&str>) -> Self {
        let content_hash = content.map(hash_content);
        let effective = serde_json::to_string(config).unwrap_or_default();
        let combined_hash = hash_content(&format!(
            "{}:{}",
            content_hash.as_deref().unwrap_or("none"),
            effective
        ));

        ConfigSnapshot {
            timestamp: Utc::now(),
            schema_version: config.schema_version.clone(),
            source: paths.source,
            path: paths.pipeline.as_ref().map(|p| p.display().to_string()),
            content_hash,
            combined_hash,
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Snapshot of a configuration built without any file.
    pub fn defaults_only(config: &PipelineConfig) -> Self {
        Self::new(config, &ConfigPaths::default(), None)
    }

    /// Whether two snapshots describe the same effective configuration.
    pub fn same_config(&self, other: &ConfigSnapshot) -> bool {
        self.combined_hash == other.combined_hash
    }
}

/// Hex SHA-256 of a string.
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
