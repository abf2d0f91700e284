//! Nearest-timestamp realignment of imputed-series scores onto original rows.

/// Map each original timestamp to the score of the nearest imputed timestamp.
///
/// Both timestamp slices must be ascending, and `scores` must be as long as
/// `imputed`. A match is accepted when the distance is at most `tolerance`
/// nanoseconds; equidistant neighbours resolve to the earlier one, and
/// among equal imputed timestamps the last wins. Unmatched rows get `None`.
pub fn realign(original: &[i64], imputed: &[i64], scores: &[f64], tolerance: i64) -> Vec<Option<f64>> {
    debug_assert_eq!(imputed.len(), scores.len());
    let tolerance = i128::from(tolerance);
    original
        .iter()
        .map(|&t| {
            nearest(imputed, t)
                .filter(|&(_, dist)| dist <= tolerance)
                .and_then(|(idx, _)| scores.get(idx).copied())
        })
        .collect()
}

/// Index of the imputed timestamp closest to `t`, with its distance.
fn nearest(imputed: &[i64], t: i64) -> Option<(usize, i128)> {
    let distance = |idx: usize| (i128::from(t) - i128::from(imputed[idx])).abs();

    let after = imputed.partition_point(|&x| x <= t);
    let backward = after.checked_sub(1).map(|idx| (idx, distance(idx)));
    let first_ge = imputed.partition_point(|&x| x < t);
    let forward = (first_ge < imputed.len()).then(|| (first_ge, distance(first_ge)));

    match (backward, forward) {
        (Some(b), Some(f)) => Some(if b.1 <= f.1 { b } else { f }),
        (b, f) => b.or(f),
    }
}
