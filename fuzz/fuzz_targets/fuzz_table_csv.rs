//! Fuzz target for CSV table reading and scoring.
//!
//! Arbitrary bytes must either fail to parse or produce a table that every
//! scorer can process without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tsa_config::{ClusteringParams, ScorerConfig, ScorerKind, ScoringPolicy};
use tsa_core::io::{read_table, TableLayout};
use tsa_core::AnomalyScorer;

fuzz_target!(|data: &[u8]| {
    let Ok(table) = read_table(data, &TableLayout::default()) else {
        return;
    };
    if table.len() > 512 {
        return;
    }
    let clustering = ClusteringParams {
        n_init: 1,
        max_iter: 20,
        ..ClusteringParams::default()
    };
    for kind in ScorerKind::ALL {
        let scorer = AnomalyScorer::new(
            ScorerConfig::new(*kind, "value", 4, "score"),
            &ScoringPolicy::default(),
            &clustering,
        );
        if let Ok(outcome) = scorer.execute(&table) {
            assert_eq!(outcome.table.len(), table.len());
        }
    }
});
