//! Resolve, read and validate the pipeline configuration in one step.

use std::path::Path;

use crate::pipeline::PipelineConfig;
use crate::resolve::{resolve_config, ConfigPaths};
use crate::snapshot::ConfigSnapshot;
use crate::validate::{validate_pipeline, ValidationError};

/// A validated configuration and the snapshot describing where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: PipelineConfig,
    pub snapshot: ConfigSnapshot,
    paths: ConfigPaths,
    content: Option<String>,
}

/// Load the pipeline configuration using the standard resolution order.
///
/// An explicit `cli_path` that does not exist is an error rather than a
/// silent fall-through to defaults.
pub fn load_config(cli_path: Option<&Path>) -> Result<LoadedConfig, ValidationError> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(ValidationError::IoError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
    }

    let paths = resolve_config(cli_path);
    let (config, content) = match &paths.pipeline {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let config = PipelineConfig::from_content(&content, path)?;
            (config, Some(content))
        }
        None => (PipelineConfig::default(), None),
    };

    validate_pipeline(&config)?;
    let snapshot = ConfigSnapshot::new(&config, &paths, content.as_deref());
    Ok(LoadedConfig {
        config,
        snapshot,
        paths,
        content,
    })
}

impl LoadedConfig {
    /// Wrap an in-memory configuration, validating it first.
    pub fn from_config(config: PipelineConfig) -> Result<Self, ValidationError> {
        validate_pipeline(&config)?;
        let snapshot = ConfigSnapshot::defaults_only(&config);
        Ok(LoadedConfig {
            config,
            snapshot,
            paths: ConfigPaths::default(),
            content: None,
        })
    }

    /// Where the configuration was read from.
    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Replace the effective configuration (e.g. after CLI overrides).
    ///
    /// The result is validated again; the snapshot keeps the original
    /// source and content hash while its combined hash tracks the change.
    pub fn with_config(self, config: PipelineConfig) -> Result<Self, ValidationError> {
        validate_pipeline(&config)?;
        let snapshot = ConfigSnapshot::new(&config, &self.paths, self.content.as_deref());
        Ok(LoadedConfig {
            config,
            snapshot,
            paths: self.paths,
            content: self.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetName;
    use crate::scorer::{ScorerConfig, ScorerKind};

    #[test]
    fn overrides_change_the_combined_hash_only() {
        let base = LoadedConfig::from_config(PresetName::Full.pipeline("value")).unwrap();
        let before = base.snapshot.clone();
        let changed = PipelineConfig::empty().with_scorer(ScorerConfig::new(
            ScorerKind::KMeans,
            "value",
            6,
            "score",
        ));
        let after = base.with_config(changed).unwrap();
        assert!(!after.snapshot.same_config(&before));
        assert_eq!(after.snapshot.source, before.source);
        assert_eq!(after.snapshot.summary.scorers, vec!["kmeans:value->score@6"]);
    }

    #[test]
    fn overrides_are_validated() {
        let base = LoadedConfig::from_config(PipelineConfig::default()).unwrap();
        let bad = PipelineConfig::empty().with_scorer(ScorerConfig::new(
            ScorerKind::Spectral,
            "value",
            12,
            "value",
        ));
        assert!(base.with_config(bad).is_err());
    }
}
