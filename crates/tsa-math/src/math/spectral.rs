//! Short-time power spectra.
//!
//! Computes a one-sided spectrogram with a periodic Hann window, no
//! detrending and "spectrum" scaling (power per bin, normalised by the
//! squared window sum). Bins other than DC (and Nyquist, for even segment
//! lengths) are doubled to fold in the negative frequencies.

use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;
use thiserror::Error;

use super::window::hann;

/// Errors raised while computing a spectrogram.
#[derive(Debug, Error, PartialEq)]
pub enum SpectralError {
    #[error("segment length must be positive")]
    EmptySegment,
    #[error("overlap {noverlap} must be smaller than segment length {nperseg}")]
    OverlapTooLarge { nperseg: usize, noverlap: usize },
    #[error("signal of {len} samples is shorter than one segment of {nperseg}")]
    SignalTooShort { len: usize, nperseg: usize },
    #[error("sample rate must be positive and finite, got {fs}")]
    InvalidSampleRate { fs: f64 },
}

/// Spectrogram of a real signal.
#[derive(Debug, Clone, Serialize)]
pub struct Spectrogram {
    /// Frequency of each bin, `k * fs / nperseg` for `k = 0..=nperseg/2`.
    pub freqs: Vec<f64>,
    /// Centre of each segment in signal time units.
    pub times: Vec<f64>,
    /// Power per segment: `power[segment][bin]`.
    pub power: Vec<Vec<f64>>,
}

impl Spectrogram {
    /// Number of segments.
    pub fn segments(&self) -> usize {
        self.times.len()
    }

    /// Per-segment dot product of the power column with `weights`.
    ///
    /// `weights` must have one entry per frequency bin.
    pub fn weighted_energy(&self, weights: &[f64]) -> Vec<f64> {
        self.power
            .iter()
            .map(|col| col.iter().zip(weights).map(|(p, w)| p * w).sum())
            .collect()
    }
}

/// Compute the spectrogram of `signal`.
///
/// Segments start every `nperseg - noverlap` samples; a trailing partial
/// segment is dropped.
pub fn spectrogram(
    signal: &[f64],
    fs: f64,
    nperseg: usize,
    noverlap: usize,
) -> Result<Spectrogram, SpectralError> {
    if nperseg == 0 {
        return Err(SpectralError::EmptySegment);
    }
    if noverlap >= nperseg {
        return Err(SpectralError::OverlapTooLarge { nperseg, noverlap });
    }
    if signal.len() < nperseg {
        return Err(SpectralError::SignalTooShort {
            len: signal.len(),
            nperseg,
        });
    }
    if !(fs.is_finite() && fs > 0.0) {
        return Err(SpectralError::InvalidSampleRate { fs });
    }

    let step = nperseg - noverlap;
    let count = (signal.len() - noverlap) / step;
    let window = hann(nperseg);
    let win_sum: f64 = window.iter().sum();
    let scale = 1.0 / (win_sum * win_sum);
    let n_bins = nperseg / 2 + 1;

    let freqs: Vec<f64> = (0..n_bins).map(|k| k as f64 * fs / nperseg as f64).collect();
    let times: Vec<f64> = (0..count)
        .map(|i| (nperseg as f64 / 2.0 + (i * step) as f64) / fs)
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut buffer = vec![Complex::new(0.0, 0.0); nperseg];
    let doubled_end = if nperseg % 2 == 0 { n_bins - 1 } else { n_bins };

    let mut power = Vec::with_capacity(count);
    for seg in 0..count {
        let start = seg * step;
        for (slot, (x, w)) in buffer
            .iter_mut()
            .zip(signal[start..start + nperseg].iter().zip(&window))
        {
            *slot = Complex::new(x * w, 0.0);
        }
        fft.process(&mut buffer);

        let mut column: Vec<f64> = buffer[..n_bins]
            .iter()
            .map(|c| c.norm_sqr() * scale)
            .collect();
        for value in column.iter_mut().take(doubled_end).skip(1) {
            *value *= 2.0;
        }
        power.push(column);
    }

    Ok(Spectrogram {
        freqs,
        times,
        power,
    })
}
