//! Spectral energy of sliding segments.
//!
//! Energy is the frequency-weighted sum of a segment's power spectrum.
//! Bins at or below `2 / windowsize` cycles per sample are clamped to the
//! weight `1 / windowsize`. Per-segment energies are z-scored across the
//! entity.

use serde::Serialize;
use tracing::debug;
use tsa_math::{spectrogram, zscore};

use super::{ExtractError, FeatureExtractor, FeatureSeries, Imputation};

/// Scale applied to the raw energy before standardisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyScale {
    Linear,
    Log10,
}

/// Spectral-energy feature extractor.
#[derive(Debug, Clone, Serialize)]
pub struct SpectralEnergy {
    pub scale: EnergyScale,
    pub windowsize: usize,
    pub overlap: usize,
    input: Imputation,
}

impl SpectralEnergy {
    /// Linear energy of the gap-presence indicator.
    pub fn gap_presence(windowsize: usize, overlap: usize) -> Self {
        Self {
            scale: EnergyScale::Linear,
            windowsize,
            overlap,
            input: Imputation::PresenceGrid,
        }
    }

    /// Log-scaled energy of the interpolated signal itself.
    pub fn signal(windowsize: usize, overlap: usize) -> Self {
        Self {
            scale: EnergyScale::Log10,
            windowsize,
            overlap,
            input: Imputation::Interpolate,
        }
    }

    /// Per-bin weights: the bin frequency, or `1 / windowsize` at low frequencies.
    fn weights(&self, freqs: &[f64]) -> Vec<f64> {
        let ws = self.windowsize as f64;
        let cutoff = 2.0 / ws;
        freqs
            .iter()
            .map(|&f| if f > cutoff { f } else { 1.0 / ws })
            .collect()
    }
}

impl FeatureExtractor for SpectralEnergy {
    fn name(&self) -> &'static str {
        match self.scale {
            EnergyScale::Linear => "spectral_energy_linear",
            EnergyScale::Log10 => "spectral_energy_log10",
        }
    }

    fn imputation(&self) -> Imputation {
        self.input
    }

    fn extract(&self, signal: &[f64]) -> Result<FeatureSeries, ExtractError> {
        if signal.len() < self.windowsize {
            return Err(ExtractError::SignalTooShort {
                len: signal.len(),
                windowsize: self.windowsize,
            });
        }
        let spec = spectrogram(signal, 1.0, self.windowsize, self.overlap)?;
        let mut energy = spec.weighted_energy(&self.weights(&spec.freqs));
        if self.scale == EnergyScale::Log10 {
            // zero energy gives -inf, which poisons the z-scores as NaN
            for e in energy.iter_mut() {
                *e = e.log10();
            }
        }

        let scores = zscore(&energy);
        debug!(
            segments = scores.len(),
            max_zscore = scores.iter().cloned().fold(f64::NAN, f64::max),
            "spectral energy"
        );
        Ok(FeatureSeries {
            scores,
            centers: spec.times,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn weights_clamp_low_frequencies() {
        let e = SpectralEnergy::signal(12, 11);
        let freqs: Vec<f64> = (0..7).map(|k| k as f64 / 12.0).collect();
        let w = e.weights(&freqs);
        // 0, 1/12 and 2/12 sit at or below the cutoff
        for v in &w[..3] {
            assert!(approx_eq(*v, 1.0 / 12.0, 1e-15));
        }
        assert!(approx_eq(w[3], 3.0 / 12.0, 1e-15));
        assert!(approx_eq(w[6], 0.5, 1e-15));
    }

    #[test]
    fn one_score_per_segment() {
        let x: Vec<f64> = (0..30).map(|i| ((i * 7) % 5) as f64 + 1.0).collect();
        let series = SpectralEnergy::signal(12, 11).extract(&x).unwrap();
        assert_eq!(series.len(), 19);
        assert_eq!(series.centers[0], 6.0);
        assert_eq!(series.centers[18], 24.0);
        let mean: f64 = series.scores.iter().sum::<f64>() / series.len() as f64;
        assert!(mean.abs() < 1e-9);
    }

    #[test]
    fn burst_stands_out_in_linear_energy() {
        let mut x = vec![0.0; 60];
        for v in &mut x[40..44] {
            *v = 1.0;
        }
        let series = SpectralEnergy::gap_presence(12, 11).extract(&x).unwrap();
        let quiet = series.scores[0];
        let peak = series.scores.iter().cloned().fold(f64::MIN, f64::max);
        assert!(peak > quiet);
        // segments fully before the burst see no energy at all
        assert!(series.scores[..20].iter().all(|&s| approx_eq(s, quiet, 1e-12)));
    }

    #[test]
    fn constant_signal_gives_nan_scores() {
        let series = SpectralEnergy::signal(12, 11).extract(&[2.0; 20]).unwrap();
        assert!(series.scores.iter().all(|s| s.is_nan()));
    }

    #[test]
    fn short_signal_is_rejected() {
        let err = SpectralEnergy::signal(12, 11).extract(&[1.0; 5]).unwrap_err();
        assert_eq!(
            err,
            ExtractError::SignalTooShort {
                len: 5,
                windowsize: 12
            }
        );
    }
}
