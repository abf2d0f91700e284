//! Scoring policies and clustering hyper-parameters.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to NaN or infinite scores before they are written.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum NonFinitePolicy {
    /// Write them unchanged.
    #[default]
    Propagate,
    /// Replace them with the neutral score 0.
    Neutral,
}

/// Score given to a row with no imputed timestamp within tolerance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum MissedMatchPolicy {
    /// The neutral score 0.
    #[default]
    Neutral,
    /// The row's raw input value.
    EchoInput,
    /// A missing cell.
    Missing,
}

impl fmt::Display for NonFinitePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonFinitePolicy::Propagate => write!(f, "propagate"),
            NonFinitePolicy::Neutral => write!(f, "neutral"),
        }
    }
}

impl fmt::Display for MissedMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissedMatchPolicy::Neutral => write!(f, "neutral"),
            MissedMatchPolicy::EchoInput => write!(f, "echo_input"),
            MissedMatchPolicy::Missing => write!(f, "missing"),
        }
    }
}

/// Degenerate-case handling shared by every scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScoringPolicy {
    pub non_finite: NonFinitePolicy,
    pub missed_match: MissedMatchPolicy,
}

/// Hyper-parameters of the CBLOF window clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClusteringParams {
    /// Clusters requested when the window is wider than one sample.
    pub n_clusters_wide: usize,
    /// Clusters requested for single-sample windows.
    pub n_clusters_narrow: usize,
    /// Share of windows the large clusters must cover.
    pub alpha: f64,
    /// Size ratio separating large from small clusters.
    pub beta: f64,
    /// Weight scores by cluster size.
    pub use_weights: bool,
    /// Expected outlier share.
    pub contamination: f64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
}

impl Default for ClusteringParams {
    fn default() -> Self {
        Self {
            n_clusters_wide: 40,
            n_clusters_narrow: 20,
            alpha: 0.9,
            beta: 5.0,
            use_weights: false,
            contamination: 0.1,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
            seed: 42,
        }
    }
}

impl ClusteringParams {
    /// Requested cluster count for a window length.
    pub fn cluster_count(&self, windowsize: usize) -> usize {
        if windowsize > 1 {
            self.n_clusters_wide
        } else {
            self.n_clusters_narrow
        }
    }
}
