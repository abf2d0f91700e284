//! End-to-end scoring scenarios.
//!
//! Each test builds a small table, runs one scorer over it and checks the
//! shape of the scores rather than exact values.

use chrono::{DateTime, Utc};
use tsa_common::TimeSeriesTable;
use tsa_config::{ClusteringParams, ScorerConfig, ScorerKind, ScoringPolicy};
use tsa_core::extract::{FeatureExtractor, OutlierClustering};
use tsa_core::scorer::EntityStatus;
use tsa_core::AnomalyScorer;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).expect("timestamp in range")
}

fn table(rows: &[(&str, i64, Option<f64>)]) -> TimeSeriesTable {
    let mut t = TimeSeriesTable::new();
    for &(entity, secs, value) in rows {
        t.push_row(entity, at(secs), [("value", value)]);
    }
    t
}

fn series<'a>(entity: &'a str, values: &[f64]) -> Vec<(&'a str, i64, Option<f64>)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (entity, i as i64, Some(v)))
        .collect()
}

fn scorer(kind: ScorerKind, windowsize: i64) -> AnomalyScorer {
    AnomalyScorer::new(
        ScorerConfig::new(kind, "value", windowsize, "score"),
        &ScoringPolicy::default(),
        &ClusteringParams::default(),
    )
}

fn scores(t: &TimeSeriesTable) -> Vec<f64> {
    t.column("score")
        .expect("score column")
        .iter()
        .map(|v| v.expect("score present"))
        .collect()
}

/// Bit patterns, so NaN scores compare equal to themselves.
fn bits(values: &[f64]) -> Vec<u64> {
    values.iter().map(|v| v.to_bits()).collect()
}

fn max(values: &[f64]) -> f64 {
    values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
}

// ============================================================================
// Spikes
// ============================================================================

mod spike {
    use super::*;

    #[test]
    fn clustering_flags_rows_around_the_spike() {
        let mut values = vec![5.0; 30];
        values[25] = 50.0;
        let outcome = scorer(ScorerKind::KMeans, 12)
            .execute(&table(&series("pump", &values)))
            .unwrap();
        let s = scores(&outcome.table);
        assert_eq!(s.len(), 30);
        assert_eq!(max(&s[..12]), 0.0);
        assert!(max(&s[20..]) > max(&s[..12]));
    }

    #[test]
    fn clustering_windows_isolate_a_late_spike() {
        let mut values = vec![5.0; 30];
        values[27] = 50.0;
        let series = OutlierClustering::new(12, 1, &ClusteringParams::default())
            .extract(&values)
            .unwrap();
        assert_eq!(series.scores.len(), 19);
        assert_eq!(series.centers.len(), 19);
        assert!(max(&series.scores[16..=18]) > max(&series.scores[..=15]));
    }

    #[test]
    fn spectral_energy_rises_around_the_spike() {
        let mut values = vec![5.0; 60];
        values[45] = 50.0;
        let outcome = scorer(ScorerKind::Spectral, 12)
            .execute(&table(&series("pump", &values)))
            .unwrap();
        let s = scores(&outcome.table);
        assert!(s.iter().all(|v| v.is_finite()));
        assert!(max(&s[40..50]) > max(&s[..20]));
        // rows far before the spike share one standardised energy
        assert!(s[..20].windows(2).all(|w| (w[0] - w[1]).abs() < 1e-9));
    }
}

// ============================================================================
// Gaps
// ============================================================================

mod gap {
    use super::*;

    #[test]
    fn rows_next_to_a_missing_sample_score_high() {
        let rows: Vec<(&str, i64, Option<f64>)> = (0..30)
            .chain(31..61)
            .map(|s| ("meter", s, Some(1.0)))
            .collect();
        let outcome = scorer(ScorerKind::NoData, 12).execute(&table(&rows)).unwrap();
        let entity = &outcome.report.entities[0];
        assert_eq!(entity.status, EntityStatus::Scored);
        assert_eq!(entity.missed_matches, 0);

        let s = scores(&outcome.table);
        // row 30 holds t = 31 s, right after the hole
        assert!(s[30] > s[5]);
        assert!(s[29] > s[5]);
    }

    #[test]
    fn missing_readings_count_as_gaps() {
        let rows: Vec<(&str, i64, Option<f64>)> = (0..60)
            .map(|s| ("meter", s, if s == 40 { None } else { Some(2.0) }))
            .collect();
        let outcome = scorer(ScorerKind::NoData, 12).execute(&table(&rows)).unwrap();
        let s = scores(&outcome.table);
        assert!(s[40] > s[5]);
    }
}

// ============================================================================
// Insufficient data
// ============================================================================

mod short_entity {
    use super::*;

    #[test]
    fn entities_no_longer_than_a_window_stay_neutral() {
        let mut rows = series("short", &[1.0, 9.0, 1.0, 9.0, 1.0]);
        rows.extend(series("exact", &[3.0; 12]));
        for kind in ScorerKind::ALL {
            let outcome = scorer(*kind, 12).execute(&table(&rows)).unwrap();
            assert_eq!(scores(&outcome.table), vec![0.0; 17], "{kind}");
            assert!(outcome
                .report
                .entities
                .iter()
                .all(|e| e.status == EntityStatus::InsufficientData));
        }
    }
}

// ============================================================================
// Isolation and ordering
// ============================================================================

mod isolation {
    use super::*;

    #[test]
    fn other_entities_do_not_change_scores() {
        let noisy: Vec<f64> = (0..40).map(|i| ((i * 17) % 11) as f64).collect();
        let calm: Vec<f64> = (0..40).map(|i| 10.0 + (i % 3) as f64).collect();

        let mut both = series("a", &noisy);
        both.extend(series("b", &calm));
        let alone = series("b", &calm);

        for kind in ScorerKind::ALL {
            let s = scorer(*kind, 8);
            let joint = bits(&scores(&s.execute(&table(&both)).unwrap().table));
            let single = bits(&scores(&s.execute(&table(&alone)).unwrap().table));
            assert_eq!(joint[40..], single[..], "{kind}");
        }
    }

    #[test]
    fn prefilled_output_column_is_overwritten() {
        let calm: Vec<f64> = (0..30).map(|i| 10.0 + (i % 4) as f64).collect();
        let mut t = TimeSeriesTable::new();
        for i in 0..3 {
            t.push_row("a", at(i), [("value", Some(1.0)), ("score", Some(99.0))]);
        }
        for (i, &v) in calm.iter().enumerate() {
            t.push_row("b", at(i as i64), [("value", Some(v)), ("score", Some(-7.0))]);
        }
        let alone = table(&series("b", &calm));

        for kind in ScorerKind::ALL {
            let s = scorer(*kind, 8);
            let joint = scores(&s.execute(&t).unwrap().table);
            let single = scores(&s.execute(&alone).unwrap().table);
            assert_eq!(joint[..3], [0.0; 3], "{kind}");
            assert_eq!(bits(&joint[3..]), bits(&single), "{kind}");
        }
    }

    #[test]
    fn row_order_does_not_matter() {
        let values: Vec<f64> = (0..30).map(|i| ((i * 7) % 5) as f64).collect();
        let sorted = series("a", &values);
        let mut reversed = sorted.clone();
        reversed.reverse();

        let s = scorer(ScorerKind::KMeans, 6);
        let forward = scores(&s.execute(&table(&sorted)).unwrap().table);
        let mut backward = scores(&s.execute(&table(&reversed)).unwrap().table);
        backward.reverse();
        assert_eq!(forward, backward);
    }
}

// ============================================================================
// Degenerate signals
// ============================================================================

mod constant_signal {
    use super::*;

    #[test]
    fn spectral_scores_are_undefined() {
        let outcome = scorer(ScorerKind::Spectral, 6)
            .execute(&table(&series("flat", &[7.0; 20])))
            .unwrap();
        assert!(scores(&outcome.table).iter().all(|v| v.is_nan()));
        assert_eq!(outcome.report.non_finite(), 20);
    }

    #[test]
    fn clustering_scores_are_zero() {
        let outcome = scorer(ScorerKind::KMeans, 6)
            .execute(&table(&series("flat", &[7.0; 20])))
            .unwrap();
        assert_eq!(scores(&outcome.table), vec![0.0; 20]);
    }
}
