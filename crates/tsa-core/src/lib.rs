//! Windowed anomaly scoring for multi-entity time series.
//!
//! The scoring pipeline, per entity:
//! - Sampling: minimum and mean spacing of the entity's timestamps
//! - Imputation: time interpolation, or a gap-presence grid
//! - Feature extraction: spectral energy z-scores or CBLOF window scores
//! - Stretching: per-window scores interpolated back to one per sample
//! - Realignment: nearest-timestamp join onto the entity's original rows
//!
//! [`scorer::AnomalyScorer`] drives one scoring function over every entity
//! of a table; [`pipeline::Pipeline`] chains several. The binary entry point
//! is in `main.rs`.

pub mod exit_codes;
pub mod extract;
pub mod impute;
pub mod io;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod realign;
pub mod sampling;
pub mod scorer;
pub mod stretch;

pub use pipeline::{Pipeline, PipelineOutcome};
pub use scorer::{AnomalyScorer, ScoreError, ScoreOutcome, ScoreReport};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
