//! Population statistics and z-scores.
//!
//! Non-finite inputs are never filtered: NaN and ±inf flow through every
//! function so callers can decide what a degenerate score means.

/// Arithmetic mean.
///
/// Finite inputs use a running update, which returns the exact input value
/// when every sample is identical. Returns NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    if values.iter().any(|v| !v.is_finite()) {
        return values.iter().sum::<f64>() / values.len() as f64;
    }
    let mut m = 0.0;
    for (i, v) in values.iter().enumerate() {
        m += (v - m) / (i as f64 + 1.0);
    }
    m
}

/// Population standard deviation (divisor N, not N-1).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Standard score of every value against the population of `values`.
///
/// Zero dispersion yields NaN (0/0) or ±inf rather than an error.
pub fn zscore(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let s = population_std(values);
    values.iter().map(|v| (v - m) / s).collect()
}

/// Successive differences `values[i + 1] - values[i]`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}
