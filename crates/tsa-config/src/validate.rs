//! Configuration validation errors and semantic validation.

use std::collections::HashSet;
use thiserror::Error;

use crate::pipeline::PipelineConfig;
use crate::policy::ClusteringParams;
use crate::scorer::ScorerConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Schema validation failed: {0}")]
    SchemaError(String),

    #[error("Semantic validation failed: {0}")]
    SemanticError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 13,
            ValidationError::ParseError(_) => 14,
            ValidationError::SchemaError(_) => 15,
            ValidationError::SemanticError(_) => 16,
            ValidationError::MissingField(_) => 17,
            ValidationError::InvalidValue { .. } => 18,
            ValidationError::VersionMismatch { .. } => 19,
        }
    }
}

impl From<ValidationError> for tsa_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) => tsa_common::Error::Config(msg),
            ValidationError::SchemaError(_) | ValidationError::VersionMismatch { .. } => {
                tsa_common::Error::SchemaValidation(err.to_string())
            }
            ValidationError::InvalidValue { .. } => {
                tsa_common::Error::InvalidScorer(err.to_string())
            }
            other => tsa_common::Error::Config(other.to_string()),
        }
    }
}

/// Validate a pipeline configuration semantically.
pub fn validate_pipeline(config: &PipelineConfig) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    if config.scorers.is_empty() {
        return Err(ValidationError::MissingField("scorers".to_string()));
    }

    let mut outputs = HashSet::new();
    for (i, scorer) in config.scorers.iter().enumerate() {
        validate_scorer(i, scorer)?;
        if !outputs.insert(scorer.output_item.as_str()) {
            return Err(ValidationError::SemanticError(format!(
                "output column '{}' is written by more than one scorer",
                scorer.output_item
            )));
        }
    }

    if !(config.default_gap_seconds.is_finite() && config.default_gap_seconds > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: "default_gap_seconds".to_string(),
            message: format!("Must be positive, got {}", config.default_gap_seconds),
        });
    }

    validate_clustering(&config.clustering)?;

    Ok(())
}

fn validate_scorer(index: usize, scorer: &ScorerConfig) -> ValidationResult<()> {
    let field = |name: &str| format!("scorers[{}].{}", index, name);

    if scorer.input_item.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field("input_item"),
            message: "Must not be empty".to_string(),
        });
    }
    if scorer.output_item.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: field("output_item"),
            message: "Must not be empty".to_string(),
        });
    }
    if scorer.input_item == scorer.output_item {
        return Err(ValidationError::SemanticError(format!(
            "scorer {} would overwrite its own input column '{}'",
            index, scorer.input_item
        )));
    }
    // windowsize below 1 is accepted; scorers coerce it to 1

    Ok(())
}

fn validate_clustering(params: &ClusteringParams) -> ValidationResult<()> {
    let invalid = |field: &str, message: String| ValidationError::InvalidValue {
        field: format!("clustering.{}", field),
        message,
    };

    if !(params.alpha > 0.0 && params.alpha < 1.0) {
        return Err(invalid("alpha", format!("Must be in (0, 1), got {}", params.alpha)));
    }
    if !(params.beta > 1.0 && params.beta.is_finite()) {
        return Err(invalid("beta", format!("Must be greater than 1, got {}", params.beta)));
    }
    if !(params.contamination > 0.0 && params.contamination <= 0.5) {
        return Err(invalid(
            "contamination",
            format!("Must be in (0, 0.5], got {}", params.contamination),
        ));
    }
    if params.n_clusters_wide == 0 {
        return Err(invalid("n_clusters_wide", "Must be at least 1".to_string()));
    }
    if params.n_clusters_narrow == 0 {
        return Err(invalid("n_clusters_narrow", "Must be at least 1".to_string()));
    }
    if params.n_init == 0 {
        return Err(invalid("n_init", "Must be at least 1".to_string()));
    }
    if params.max_iter == 0 {
        return Err(invalid("max_iter", "Must be at least 1".to_string()));
    }
    if !(params.tol >= 0.0 && params.tol.is_finite()) {
        return Err(invalid("tol", format!("Must be non-negative, got {}", params.tol)));
    }

    Ok(())
}
