//! Per-scorer settings.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three anomaly scoring strategies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, ValueEnum,
)]
pub enum ScorerKind {
    /// Spectral energy of the gap-presence grid
    #[serde(rename = "nodata")]
    #[value(name = "nodata", alias = "no-data")]
    NoData,
    /// Log spectral energy of the time-interpolated signal
    #[serde(rename = "spectral")]
    #[value(name = "spectral")]
    Spectral,
    /// CBLOF outlier score of sliding windows
    #[serde(rename = "kmeans")]
    #[value(name = "kmeans", alias = "cblof")]
    KMeans,
}

impl ScorerKind {
    pub const ALL: &'static [ScorerKind] =
        &[ScorerKind::NoData, ScorerKind::Spectral, ScorerKind::KMeans];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScorerKind::NoData => "nodata",
            ScorerKind::Spectral => "spectral",
            ScorerKind::KMeans => "kmeans",
        }
    }

    /// Label recorded in the execution trace.
    pub fn trace_label(&self) -> &'static str {
        match self {
            ScorerKind::NoData => "NoDataAnomalyScore",
            ScorerKind::Spectral => "SpectralAnomalyScore",
            ScorerKind::KMeans => "KMeansAnomalyScore",
        }
    }

    /// Conventional output column for an input column.
    pub fn default_output(&self, input_item: &str) -> String {
        format!("{}_{}", input_item, self.as_str())
    }
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nodata" | "no-data" | "no_data" => Ok(ScorerKind::NoData),
            "spectral" => Ok(ScorerKind::Spectral),
            "kmeans" | "k-means" | "cblof" => Ok(ScorerKind::KMeans),
            other => Err(format!(
                "unknown scorer '{}', expected one of: nodata, spectral, kmeans",
                other
            )),
        }
    }
}

/// One configured scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScorerConfig {
    pub kind: ScorerKind,
    /// Column holding the raw signal.
    pub input_item: String,
    /// Window length; values below 1 are treated as 1.
    pub windowsize: i64,
    /// Column receiving the score.
    pub output_item: String,
}

impl ScorerConfig {
    pub fn new(
        kind: ScorerKind,
        input_item: impl Into<String>,
        windowsize: i64,
        output_item: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            input_item: input_item.into(),
            windowsize,
            output_item: output_item.into(),
        }
    }

    pub fn effective_windowsize(&self) -> usize {
        usize::try_from(self.windowsize.max(1)).unwrap_or(usize::MAX)
    }

    /// Samples shared by consecutive spectrogram segments.
    pub fn window_overlap(&self) -> usize {
        let ws = self.effective_windowsize();
        if ws > 1 {
            ws - (ws / 12).max(1)
        } else {
            0
        }
    }

    /// Sliding-window stride for the clustering extractor.
    pub fn step(&self) -> usize {
        1
    }
}
