//! Error types for time-series anomaly scoring.
//!
//! Every error carries a stable numeric code for machine parsing, a
//! category for grouping, and a recoverability hint:
//! - 10-19: configuration
//! - 20-29: input table
//! - 30-39: scoring
//! - 60-69: I/O and serialization
//!
//! Agents receive the same information as JSON via [`StructuredError`]:
//! ```json
//! { "code": 20, "category": "table", "message": "column 'temp' not found", "recoverable": true }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::table::TableError;

/// Result type alias for scoring operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Pipeline configuration errors.
    Config,
    /// Malformed or inconsistent input tables.
    Table,
    /// Feature extraction and scoring errors.
    Scoring,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Table => write!(f, "table"),
            ErrorCategory::Scoring => write!(f, "scoring"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid scorer configuration: {0}")]
    InvalidScorer(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    // Table errors (20-29)
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("invalid input row {row}: {message}")]
    InvalidInput { row: usize, message: String },

    // Scoring errors (30-39)
    #[error("scoring failed for entity {entity}: {message}")]
    Scoring { entity: String, message: String },

    #[error("numerical failure: {0}")]
    Numerical(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl Error {
    /// Returns the stable error code.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidScorer(_) => 11,
            Error::SchemaValidation(_) => 12,
            Error::Table(_) => 20,
            Error::InvalidInput { .. } => 21,
            Error::Scoring { .. } => 30,
            Error::Numerical(_) => 31,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
            Error::Csv(_) => 62,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidScorer(_) | Error::SchemaValidation(_) => {
                ErrorCategory::Config
            }
            Error::Table(_) | Error::InvalidInput { .. } => ErrorCategory::Table,
            Error::Scoring { .. } | Error::Numerical(_) => ErrorCategory::Scoring,
            Error::Io(_) | Error::Json(_) | Error::Csv(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether fixing the input or configuration can resolve this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidScorer(_) | Error::SchemaValidation(_) => true,
            Error::Table(_) | Error::InvalidInput { .. } => true,
            Error::Scoring { .. } => true,
            // an internal numerical failure is a bug, not bad input
            Error::Numerical(_) => false,
            Error::Io(_) => true,
            Error::Json(_) | Error::Csv(_) => true,
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidScorer(_) => "Invalid Scorer",
            Error::SchemaValidation(_) => "Schema Validation Failed",
            Error::Table(_) => "Table Error",
            Error::InvalidInput { .. } => "Invalid Input Row",
            Error::Scoring { .. } => "Scoring Error",
            Error::Numerical(_) => "Numerical Failure",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Error",
            Error::Csv(_) => "CSV Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();
        match err {
            Error::InvalidInput { row, .. } => {
                context.insert("row".to_string(), serde_json::json!(row));
            }
            Error::Scoring { entity, .. } => {
                context.insert("entity".to_string(), serde_json::json!(entity));
            }
            Error::Table(TableError::MissingColumn { column }) => {
                context.insert("column".to_string(), serde_json::json!(column));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_category_ranges() {
        let cases = [
            (Error::Config("x".into()), ErrorCategory::Config, 10..20),
            (
                Error::Table(TableError::MissingColumn {
                    column: "temp".into(),
                }),
                ErrorCategory::Table,
                20..30,
            ),
            (
                Error::Scoring {
                    entity: "a".into(),
                    message: "boom".into(),
                },
                ErrorCategory::Scoring,
                30..40,
            ),
            (Error::Csv("bad quote".into()), ErrorCategory::Io, 60..70),
        ];
        for (err, category, range) in cases {
            assert_eq!(err.category(), category);
            assert!(range.contains(&err.code()), "{} -> {}", err, err.code());
        }
    }

    #[test]
    fn table_errors_convert_transparently() {
        let err: Error = TableError::MissingColumn {
            column: "speed".into(),
        }
        .into();
        assert_eq!(err.to_string(), "column 'speed' not found");
        assert!(err.is_recoverable());
    }

    #[test]
    fn structured_error_carries_context() {
        let err = Error::InvalidInput {
            row: 7,
            message: "bad timestamp".into(),
        };
        let s = StructuredError::from(&err);
        assert_eq!(s.code, 21);
        assert_eq!(s.context.get("row"), Some(&serde_json::json!(7)));
        let json = s.to_json();
        assert!(json.contains("\"category\":\"table\""));
    }
}
