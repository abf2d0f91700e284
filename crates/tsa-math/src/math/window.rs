//! Window functions and sliding-window views.

use std::f64::consts::PI;

/// Periodic Hann window of length `n` (the FFT-friendly variant).
///
/// Lengths 0 and 1 degenerate to all-ones.
pub fn hann(n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![1.0; n];
    }
    let denom = n as f64;
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
        .collect()
}

/// Overlapping windows of `width` samples taken every `step` samples.
///
/// Produces `(len - width) / step + 1` rows, or none when the signal is
/// shorter than one window. `width` and `step` of zero produce no rows.
pub fn sliding_windows(signal: &[f64], width: usize, step: usize) -> Vec<Vec<f64>> {
    if width == 0 || step == 0 || signal.len() < width {
        return Vec::new();
    }
    let count = (signal.len() - width) / step + 1;
    (0..count)
        .map(|i| signal[i * step..i * step + width].to_vec())
        .collect()
}
