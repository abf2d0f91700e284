//! Gap imputation.
//!
//! Two strategies turn an entity's irregular, possibly incomplete samples
//! into a dense signal:
//! - [`interpolate_time`]: fill missing values by linear interpolation in
//!   time, keeping the original timestamps
//! - [`presence_grid`]: resample onto a regular grid and record, per grid
//!   bucket, whether a usable value was observed

use serde::Serialize;

/// Nanoseconds per UTC day; grid buckets are anchored at midnight.
const NANOS_PER_DAY: i64 = 86_400 * 1_000_000_000;

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}

/// Fill missing values (`None` or NaN) by linear interpolation in time.
///
/// The result has one value per input sample. A missing value between two
/// observed ones is interpolated by timestamp; missing values before the
/// first or after the last observation become 0.0, as does an entity with
/// no observation at all. Infinite values are kept as observed.
///
/// `times` must be ascending and as long as `values`.
pub fn interpolate_time(times: &[i64], values: &[Option<f64>]) -> Vec<f64> {
    debug_assert_eq!(times.len(), values.len());
    let n = values.len().min(times.len());
    let mut out = vec![0.0; n];

    let mut prev: Option<usize> = None;
    let mut i = 0;
    while i < n {
        if let Some(v) = usable(values[i]) {
            out[i] = v;
            prev = Some(i);
            i += 1;
            continue;
        }

        // run of missing values [i, j)
        let mut j = i;
        while j < n && usable(values[j]).is_none() {
            j += 1;
        }
        if let (Some(lo), true) = (prev, j < n) {
            let (t0, v0) = (times[lo], out[lo]);
            let (t1, v1) = (times[j], usable(values[j]).unwrap_or(0.0));
            for k in i..j {
                out[k] = if t1 == t0 {
                    v0
                } else {
                    let frac = (times[k] - t0) as f64 / (t1 - t0) as f64;
                    v0 + (v1 - v0) * frac
                };
            }
        }
        i = j;
    }
    out
}

/// A regular grid with a 0/1 gap indicator per bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceGrid {
    /// Bucket labels (left edges), ns since the epoch.
    pub times: Vec<i64>,
    /// 1.0 where the bucket's first observation is missing or the bucket is
    /// empty, 0.0 otherwise.
    pub indicator: Vec<f64>,
}

impl PresenceGrid {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of buckets flagged as gaps.
    pub fn gap_count(&self) -> usize {
        self.indicator.iter().filter(|&&v| v > 0.0).count()
    }
}

/// Resample onto a grid of `period` nanoseconds and flag gaps.
///
/// Buckets are `[origin + k * period, origin + (k + 1) * period)` with the
/// origin at UTC midnight of the first timestamp's day. The grid spans from
/// the bucket holding the first sample to the bucket holding the last. Each
/// bucket takes the first sample falling into it.
///
/// `times` must be ascending and as long as `values`; `period` must be
/// positive (a non-positive period yields an empty grid).
pub fn presence_grid(times: &[i64], values: &[Option<f64>], period: i64) -> PresenceGrid {
    let (Some(&first), Some(&last)) = (times.first(), times.last()) else {
        return PresenceGrid {
            times: Vec::new(),
            indicator: Vec::new(),
        };
    };
    if period <= 0 {
        return PresenceGrid {
            times: Vec::new(),
            indicator: Vec::new(),
        };
    }

    let origin = i128::from(first.div_euclid(NANOS_PER_DAY) * NANOS_PER_DAY);
    let period_wide = i128::from(period);
    let bucket_of = |t: i64| (i128::from(t) - origin).div_euclid(period_wide);
    let first_bucket = bucket_of(first);
    let count = (bucket_of(last) - first_bucket + 1) as usize;

    let grid_times: Vec<i64> = (0..count)
        .map(|k| {
            let label = origin + (first_bucket + k as i128) * period_wide;
            i64::try_from(label).unwrap_or(i64::MAX)
        })
        .collect();

    let mut indicator = vec![1.0; count];
    let mut filled = vec![false; count];
    for (&t, &value) in times.iter().zip(values) {
        let slot = (bucket_of(t) - first_bucket) as usize;
        if !filled[slot] {
            filled[slot] = true;
            indicator[slot] = if usable(value).is_some() { 0.0 } else { 1.0 };
        }
    }

    PresenceGrid {
        times: grid_times,
        indicator,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: i64 = 1_000_000_000;

    fn secs(v: &[i64]) -> Vec<i64> {
        v.iter().map(|s| s * SEC).collect()
    }

    #[test]
    fn interpolates_interior_gap_by_time() {
        // uneven spacing: value at t=1 should be 1/4 of the way to t=4
        let t = secs(&[0, 1, 4]);
        let v = [Some(0.0), None, Some(8.0)];
        assert_eq!(interpolate_time(&t, &v), vec![0.0, 2.0, 8.0]);
    }

    #[test]
    fn leading_and_trailing_gaps_become_zero() {
        let t = secs(&[0, 1, 2, 3, 4]);
        let v = [None, Some(3.0), Some(5.0), None, Some(f64::NAN)];
        assert_eq!(interpolate_time(&t, &v), vec![0.0, 3.0, 5.0, 0.0, 0.0]);
    }

    #[test]
    fn all_missing_is_all_zero() {
        let t = secs(&[0, 1, 2]);
        assert_eq!(interpolate_time(&t, &[None, None, None]), vec![0.0; 3]);
    }

    #[test]
    fn duplicate_anchor_timestamps_do_not_divide_by_zero() {
        let t = [5, 5, 5];
        let v = [Some(1.0), None, Some(3.0)];
        assert_eq!(interpolate_time(&t, &v), vec![1.0, 1.0, 3.0]);
    }

    #[test]
    fn infinities_are_kept() {
        let t = secs(&[0, 1]);
        let out = interpolate_time(&t, &[Some(f64::INFINITY), Some(1.0)]);
        assert!(out[0].is_infinite());
    }

    #[test]
    fn grid_flags_empty_bucket() {
        // 0..29 s and 31..60 s at 1 s: period equal to the spacing leaves
        // bucket 30 empty
        let t = secs(&(0..30).chain(31..61).collect::<Vec<_>>());
        let v = vec![Some(1.0); t.len()];
        let grid = presence_grid(&t, &v, SEC);
        assert_eq!(grid.len(), 61);
        assert_eq!(grid.indicator[30], 1.0);
        assert_eq!(grid.gap_count(), 1);
        assert_eq!(grid.times[30], 30 * SEC);
    }

    #[test]
    fn grid_flags_missing_first_value() {
        let t = secs(&[0, 1, 2]);
        let v = [Some(1.0), None, Some(2.0)];
        let grid = presence_grid(&t, &v, SEC);
        assert_eq!(grid.indicator, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn grid_takes_first_sample_per_bucket() {
        // both samples land in bucket 0; the first is missing
        let t = [0, SEC / 2, 2 * SEC];
        let v = [None, Some(1.0), Some(1.0)];
        let grid = presence_grid(&t, &v, 2 * SEC);
        assert_eq!(grid.indicator, vec![1.0, 0.0]);
    }

    #[test]
    fn grid_is_anchored_at_midnight() {
        // first sample 07:00:03, period 10 s: first label is 07:00:00
        let start = 7 * 3600 * SEC + 3 * SEC;
        let t = [start, start + 10 * SEC];
        let grid = presence_grid(&t, &[Some(0.0), Some(0.0)], 10 * SEC);
        assert_eq!(grid.times[0], 7 * 3600 * SEC);
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn grid_handles_pre_epoch_times() {
        let t = [-3 * SEC, -SEC];
        let grid = presence_grid(&t, &[Some(0.0), Some(0.0)], SEC);
        assert_eq!(grid.times, vec![-3 * SEC, -2 * SEC, -SEC]);
        assert_eq!(grid.indicator, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn grid_of_nothing_is_empty() {
        assert!(presence_grid(&[], &[], SEC).is_empty());
        assert!(presence_grid(&[0], &[Some(1.0)], 0).is_empty());
    }
}
