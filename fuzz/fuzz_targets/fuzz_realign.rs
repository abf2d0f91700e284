//! Fuzz target for stretching and realignment.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tsa_core::extract::FeatureSeries;
use tsa_core::realign::realign;
use tsa_core::stretch::stretch;

#[derive(Debug, Arbitrary)]
struct Input {
    original: Vec<i64>,
    imputed: Vec<i64>,
    scores: Vec<f64>,
    tolerance: i64,
    signal_len: u8,
}

fuzz_target!(|input: Input| {
    let mut original = input.original;
    let mut imputed = input.imputed;
    let mut scores = input.scores;
    original.sort_unstable();
    imputed.sort_unstable();
    let n = imputed.len().min(scores.len());
    imputed.truncate(n);
    scores.truncate(n);

    let aligned = realign(&original, &imputed, &scores, input.tolerance);
    assert_eq!(aligned.len(), original.len());

    let features = FeatureSeries {
        scores,
        centers: (0..n).map(|i| i as f64 * 1.5).collect(),
    };
    if let Ok(stretched) = stretch(&features, input.signal_len as usize) {
        assert_eq!(stretched.len(), input.signal_len as usize);
    }
});
