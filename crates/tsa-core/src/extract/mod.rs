//! Feature extractors.
//!
//! An extractor turns an imputed per-entity signal into one score per
//! window, together with the window centres (in sample positions) that the
//! stretcher uses to map scores back onto every sample.

pub mod cluster;
pub mod spectral;

pub use cluster::OutlierClustering;
pub use spectral::{EnergyScale, SpectralEnergy};

use serde::Serialize;
use thiserror::Error;
use tsa_config::{ClusteringParams, ScorerConfig, ScorerKind};
use tsa_math::{ClusterError, SpectralError};

/// How an extractor wants its input signal prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Imputation {
    /// Original timestamps, missing values interpolated in time.
    Interpolate,
    /// Regular grid at the mean sampling period with a 0/1 gap indicator.
    PresenceGrid,
}

/// Per-window scores and their centres.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSeries {
    pub scores: Vec<f64>,
    /// Window centres in sample positions, strictly increasing.
    pub centers: Vec<f64>,
}

impl FeatureSeries {
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Errors raised by feature extraction.
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("spectral analysis failed: {0}")]
    Spectral(#[from] SpectralError),

    #[error("clustering failed: {0}")]
    Cluster(#[from] ClusterError),

    #[error("signal of {len} samples is too short for windows of {windowsize}")]
    SignalTooShort { len: usize, windowsize: usize },
}

/// Turns a dense signal into per-window scores.
pub trait FeatureExtractor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Input preparation this extractor expects.
    fn imputation(&self) -> Imputation;

    /// Score `signal` window by window.
    fn extract(&self, signal: &[f64]) -> Result<FeatureSeries, ExtractError>;
}

/// Build the extractor for a scorer configuration.
pub fn extractor_for(config: &ScorerConfig, clustering: &ClusteringParams) -> Box<dyn FeatureExtractor> {
    let windowsize = config.effective_windowsize();
    match config.kind {
        ScorerKind::NoData => Box::new(SpectralEnergy::gap_presence(
            windowsize,
            config.window_overlap(),
        )),
        ScorerKind::Spectral => Box::new(SpectralEnergy::signal(windowsize, config.window_overlap())),
        ScorerKind::KMeans => Box::new(OutlierClustering::new(
            windowsize,
            config.step(),
            clustering,
        )),
    }
}
