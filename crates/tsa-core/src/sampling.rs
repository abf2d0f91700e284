//! Sampling statistics of one entity's timestamps.

use serde::Serialize;

/// Nanoseconds per second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Spacing of an entity's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SamplingStats {
    /// Smallest gap between consecutive timestamps (ns). Used as the
    /// realignment tolerance.
    pub min_delta: i64,
    /// Average gap between consecutive timestamps (ns). Used as the
    /// presence-grid period.
    pub mean_delta: i64,
}

impl SamplingStats {
    /// Derive spacing from ascending timestamps.
    ///
    /// A zero or undefined minimum (fewer than two samples, or duplicates
    /// only) falls back to `default_gap`; a zero or undefined mean falls
    /// back to the resolved minimum. Both results are therefore positive
    /// whenever `default_gap` is.
    pub fn from_timestamps(times: &[i64], default_gap: i64) -> Self {
        let deltas: Vec<i128> = times
            .windows(2)
            .map(|w| i128::from(w[1]) - i128::from(w[0]))
            .collect();

        let min_delta = match deltas.iter().min() {
            Some(&d) if d > 0 => clamp_i64(d),
            _ => default_gap,
        };

        let mean_delta = if deltas.is_empty() {
            min_delta
        } else {
            let mean = deltas.iter().sum::<i128>() / deltas.len() as i128;
            if mean > 0 {
                clamp_i64(mean)
            } else {
                min_delta
            }
        };

        SamplingStats {
            min_delta,
            mean_delta,
        }
    }

    pub fn min_delta_seconds(&self) -> f64 {
        self.min_delta as f64 / NANOS_PER_SEC as f64
    }

    pub fn mean_delta_seconds(&self) -> f64 {
        self.mean_delta as f64 / NANOS_PER_SEC as f64
    }
}

fn clamp_i64(v: i128) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}
