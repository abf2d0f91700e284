//! Scoring pipeline configuration.
//!
//! This crate provides:
//! - Typed scorer, policy and clustering settings
//! - Ready-made presets over a single input column
//! - Config resolution (CLI → env → XDG → /etc → defaults)
//! - Semantic validation
//! - Config snapshots with content hashes for run reports

pub mod load;
pub mod pipeline;
pub mod policy;
pub mod preset;
pub mod resolve;
pub mod scorer;
pub mod snapshot;
pub mod validate;

pub use load::{load_config, LoadedConfig};
pub use pipeline::PipelineConfig;
pub use policy::{ClusteringParams, MissedMatchPolicy, NonFinitePolicy, ScoringPolicy};
pub use preset::{get_preset, PresetName};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use scorer::{ScorerConfig, ScorerKind};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_pipeline, ValidationError, ValidationResult};

/// Schema version for pipeline configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";

/// JSON schema of the pipeline configuration file.
pub fn config_schema() -> schemars::Schema {
    schemars::schema_for!(PipelineConfig)
}
