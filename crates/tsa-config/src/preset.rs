//! Ready-made pipelines over a single input column.
//!
//! - Gaps: gap-presence spectral energy only
//! - Spectral: log spectral energy of the interpolated signal only
//! - Kmeans: CBLOF window clustering only
//! - Full: all three, in that order

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::PipelineConfig;
use crate::scorer::{ScorerConfig, ScorerKind};

/// Window length used by every preset.
pub const PRESET_WINDOWSIZE: i64 = 12;

/// Available presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Gaps,
    Spectral,
    Kmeans,
    Full,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Gaps,
        PresetName::Spectral,
        PresetName::Kmeans,
        PresetName::Full,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Gaps => "gaps",
            PresetName::Spectral => "spectral",
            PresetName::Kmeans => "kmeans",
            PresetName::Full => "full",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "gaps" | "nodata" | "no-data" => Some(PresetName::Gaps),
            "spectral" | "fft" => Some(PresetName::Spectral),
            "kmeans" | "cblof" | "cluster" => Some(PresetName::Kmeans),
            "full" | "all" => Some(PresetName::Full),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Gaps => "Flags windows where readings go missing",
            PresetName::Spectral => "Flags bursts of high-frequency energy in the signal",
            PresetName::Kmeans => "Flags windows whose shape matches no common pattern",
            PresetName::Full => "Runs the gap, spectral and clustering scorers in sequence",
        }
    }

    /// Scorer kinds, in execution order.
    pub fn kinds(&self) -> &'static [ScorerKind] {
        match self {
            PresetName::Gaps => &[ScorerKind::NoData],
            PresetName::Spectral => &[ScorerKind::Spectral],
            PresetName::Kmeans => &[ScorerKind::KMeans],
            PresetName::Full => ScorerKind::ALL,
        }
    }

    /// Build the preset pipeline reading `input_item`.
    pub fn pipeline(&self, input_item: &str) -> PipelineConfig {
        self.kinds()
            .iter()
            .fold(PipelineConfig::empty(), |cfg, kind| {
                cfg.with_scorer(ScorerConfig::new(
                    *kind,
                    input_item,
                    PRESET_WINDOWSIZE,
                    kind.default_output(input_item),
                ))
            })
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset lookup.
#[derive(Debug, Clone)]
pub enum PresetError {
    UnknownPreset(String),
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::UnknownPreset(name) => write!(
                f,
                "Unknown preset '{}'. Available: {}",
                name,
                PresetName::ALL
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

impl std::error::Error for PresetError {}

/// Look up a preset by name and build it over `input_item`.
pub fn get_preset(name: &str, input_item: &str) -> Result<PipelineConfig, PresetError> {
    let preset: PresetName = name.parse()?;
    Ok(preset.pipeline(input_item))
}

/// Name and description of every preset.
pub fn list_presets() -> Vec<(&'static str, &'static str)> {
    PresetName::ALL
        .iter()
        .map(|p| (p.as_str(), p.description()))
        .collect()
}
