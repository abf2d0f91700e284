//! Shared types for time-series anomaly scoring.
//!
//! This crate provides the pieces every other crate agrees on:
//! - Entity and run identifiers
//! - The multi-entity, time-indexed table and its entity partition
//! - The unified error type with stable codes
//! - Output format selection for the CLI

pub mod error;
pub mod id;
pub mod output;
pub mod table;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use id::{EntityId, RunId};
pub use output::OutputFormat;
pub use table::{EntityPartition, TableError, TimeSeriesTable};
