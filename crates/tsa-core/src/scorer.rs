//! Entity driver: runs one scoring function over every entity of a table.
//!
//! For each entity, in ascending entity order:
//! 1. collect its rows in timestamp order
//! 2. derive sampling statistics
//! 3. impute (interpolate in time, or build a gap-presence grid)
//! 4. skip the entity if the imputed signal is not longer than one window
//! 5. extract per-window features and stretch them to one score per sample
//! 6. realign the scores onto the entity's original rows
//!
//! Rows of skipped entities keep the neutral score 0.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use tsa_common::{EntityId, TableError, TimeSeriesTable};
use tsa_config::{
    ClusteringParams, MissedMatchPolicy, NonFinitePolicy, ScorerConfig, ScorerKind, ScoringPolicy,
};
use tsa_math::InterpError;

use crate::extract::{extractor_for, ExtractError, FeatureExtractor, Imputation};
use crate::impute::{interpolate_time, presence_grid};
use crate::logging::{event_names, Stage};
use crate::realign::realign;
use crate::sampling::{SamplingStats, NANOS_PER_SEC};
use crate::stretch::stretch;

/// Sampling interval assumed when an entity's timestamps give no spacing.
pub const DEFAULT_GAP_NANOS: i64 = 5 * NANOS_PER_SEC;

/// Errors raised while scoring a table.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("entity {entity}: {source}")]
    Extract {
        entity: EntityId,
        #[source]
        source: ExtractError,
    },

    #[error("entity {entity}: cannot stretch window scores: {source}")]
    Stretch {
        entity: EntityId,
        #[source]
        source: InterpError,
    },
}

impl From<ScoreError> for tsa_common::Error {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::Table(e) => tsa_common::Error::Table(e),
            ScoreError::Extract { entity, source } => tsa_common::Error::Scoring {
                entity: entity.to_string(),
                message: source.to_string(),
            },
            ScoreError::Stretch { entity, source } => tsa_common::Error::Numerical(format!(
                "entity {}: {}",
                entity, source
            )),
        }
    }
}

/// What happened to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Scored,
    /// Imputed signal not longer than one window; rows keep the neutral score.
    InsufficientData,
}

/// Per-entity result summary.
#[derive(Debug, Clone, Serialize)]
pub struct EntityOutcome {
    pub entity: EntityId,
    pub status: EntityStatus,
    /// Rows of this entity in the input table.
    pub rows: usize,
    /// Length of the imputed signal.
    pub signal_len: usize,
    pub sampling: SamplingStats,
    /// Rows with no imputed timestamp within tolerance.
    pub missed_matches: usize,
    /// Rows whose score was NaN or infinite.
    pub non_finite: usize,
    /// Largest absolute finite score written for this entity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_score: Option<f64>,
}

/// Summary of one scorer run over a table.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub scorer: &'static str,
    pub kind: ScorerKind,
    pub input_item: String,
    pub output_item: String,
    pub windowsize: usize,
    pub entities: Vec<EntityOutcome>,
}

impl ScoreReport {
    pub fn scored_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.status == EntityStatus::Scored)
            .count()
    }

    pub fn insufficient_count(&self) -> usize {
        self.entities.len() - self.scored_count()
    }

    pub fn missed_matches(&self) -> usize {
        self.entities.iter().map(|e| e.missed_matches).sum()
    }

    pub fn non_finite(&self) -> usize {
        self.entities.iter().map(|e| e.non_finite).sum()
    }

    /// Largest absolute finite score across entities.
    pub fn peak_score(&self) -> Option<f64> {
        self.entities
            .iter()
            .filter_map(|e| e.peak_score)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let peak = self
            .peak_score()
            .map(|p| format!("{:.3}", p))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} -> {}: {} entities ({} scored, {} insufficient), {} missed matches, {} non-finite, peak {}",
            self.scorer,
            self.input_item,
            self.output_item,
            self.entities.len(),
            self.scored_count(),
            self.insufficient_count(),
            self.missed_matches(),
            self.non_finite(),
            peak
        )
    }
}

/// A scored table plus its report.
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub table: TimeSeriesTable,
    pub report: ScoreReport,
}

/// Scores applied to one entity's rows.
struct EntityScores {
    values: Vec<Option<f64>>,
    outcome: EntityOutcome,
}

/// One configured scoring function.
pub struct AnomalyScorer {
    config: ScorerConfig,
    policy: ScoringPolicy,
    default_gap: i64,
    extractor: Box<dyn FeatureExtractor>,
}

impl std::fmt::Debug for AnomalyScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnomalyScorer")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .field("default_gap", &self.default_gap)
            .field("extractor", &self.extractor.name())
            .finish()
    }
}

impl AnomalyScorer {
    /// Build a scorer. A window size below 1 is treated as 1.
    pub fn new(config: ScorerConfig, policy: &ScoringPolicy, clustering: &ClusteringParams) -> Self {
        if config.windowsize < 1 {
            warn!(
                output = %config.output_item,
                windowsize = config.windowsize,
                "windowsize below 1, using 1"
            );
        }
        let extractor = extractor_for(&config, clustering);
        Self {
            config,
            policy: *policy,
            default_gap: DEFAULT_GAP_NANOS,
            extractor,
        }
    }

    /// Override the fallback sampling interval (nanoseconds, must be positive).
    pub fn with_default_gap(mut self, nanos: i64) -> Self {
        if nanos > 0 {
            self.default_gap = nanos;
        }
        self
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Label recorded in the pipeline trace.
    pub fn trace_label(&self) -> &'static str {
        self.config.kind.trace_label()
    }

    /// Score every entity of `table` into the configured output column.
    ///
    /// Returns a new table; the input is not modified. Fails when the input
    /// column is absent or a timestamp is out of range.
    pub fn execute(&self, table: &TimeSeriesTable) -> Result<ScoreOutcome, ScoreError> {
        let input = table.column(&self.config.input_item)?;
        let partition = table.partition();
        let windowsize = self.config.effective_windowsize();

        info!(
            event = event_names::SCORER_STARTED,
            stage = %Stage::Score,
            scorer = self.trace_label(),
            input = %self.config.input_item,
            output = %self.config.output_item,
            windowsize,
            entities = partition.len(),
            "scoring"
        );

        let mut output: Vec<Option<f64>> = vec![Some(0.0); table.len()];
        let mut entities = Vec::with_capacity(partition.len());

        for (entity, rows) in partition.iter() {
            let times = rows
                .iter()
                .map(|&row| table.timestamp_nanos(row))
                .collect::<Result<Vec<i64>, TableError>>()?;
            let values: Vec<Option<f64>> = rows.iter().map(|&row| input[row]).collect();

            let scored = self.score_entity(entity, &times, &values)?;
            for (&row, value) in rows.iter().zip(scored.values) {
                output[row] = value;
            }
            entities.push(scored.outcome);
        }

        let table = table.with_column(self.config.output_item.clone(), output)?;
        let report = ScoreReport {
            scorer: self.trace_label(),
            kind: self.config.kind,
            input_item: self.config.input_item.clone(),
            output_item: self.config.output_item.clone(),
            windowsize,
            entities,
        };

        info!(
            event = event_names::SCORER_FINISHED,
            stage = %Stage::Score,
            scorer = report.scorer,
            scored = report.scored_count(),
            insufficient = report.insufficient_count(),
            "scored"
        );
        Ok(ScoreOutcome { table, report })
    }

    fn score_entity(
        &self,
        entity: &EntityId,
        times: &[i64],
        values: &[Option<f64>],
    ) -> Result<EntityScores, ScoreError> {
        let sampling = SamplingStats::from_timestamps(times, self.default_gap);
        info!(
            event = event_names::ENTITY_SAMPLING,
            entity = %entity,
            min_delta_s = sampling.min_delta_seconds(),
            mean_delta_s = sampling.mean_delta_seconds(),
            "timedelta"
        );

        let (imputed_times, signal) = match self.extractor.imputation() {
            Imputation::Interpolate => (times.to_vec(), interpolate_time(times, values)),
            Imputation::PresenceGrid => {
                let grid = presence_grid(times, values, sampling.mean_delta);
                debug!(entity = %entity, buckets = grid.len(), gaps = grid.gap_count(), "presence grid");
                (grid.times, grid.indicator)
            }
        };

        let windowsize = self.config.effective_windowsize();
        debug!(
            entity = %entity,
            column = %self.config.input_item,
            windowsize,
            overlap = self.config.window_overlap(),
            signal_len = signal.len(),
            "imputed"
        );
        let mut outcome = EntityOutcome {
            entity: entity.clone(),
            status: EntityStatus::InsufficientData,
            rows: times.len(),
            signal_len: signal.len(),
            sampling,
            missed_matches: 0,
            non_finite: 0,
            peak_score: None,
        };

        if signal.len() <= windowsize {
            debug!(
                event = event_names::ENTITY_SKIPPED,
                entity = %entity,
                signal_len = signal.len(),
                windowsize,
                "not enough data to score"
            );
            return Ok(EntityScores {
                values: vec![Some(0.0); times.len()],
                outcome,
            });
        }

        let features = self
            .extractor
            .extract(&signal)
            .map_err(|source| ScoreError::Extract {
                entity: entity.clone(),
                source,
            })?;
        let stretched = stretch(&features, signal.len()).map_err(|source| ScoreError::Stretch {
            entity: entity.clone(),
            source,
        })?;
        let aligned = realign(times, &imputed_times, &stretched, sampling.min_delta);

        let mut scores = Vec::with_capacity(aligned.len());
        for (matched, raw) in aligned.into_iter().zip(values) {
            let value = match matched {
                Some(v) => Some(v),
                None => {
                    outcome.missed_matches += 1;
                    match self.policy.missed_match {
                        MissedMatchPolicy::Neutral => Some(0.0),
                        MissedMatchPolicy::EchoInput => *raw,
                        MissedMatchPolicy::Missing => None,
                    }
                }
            };
            let value = match value {
                Some(v) if !v.is_finite() => {
                    outcome.non_finite += 1;
                    match self.policy.non_finite {
                        NonFinitePolicy::Propagate => Some(v),
                        NonFinitePolicy::Neutral => Some(0.0),
                    }
                }
                other => other,
            };
            if let Some(v) = value.filter(|v| v.is_finite()) {
                let magnitude = v.abs();
                outcome.peak_score = Some(outcome.peak_score.map_or(magnitude, |p| p.max(magnitude)));
            }
            scores.push(value);
        }

        if outcome.missed_matches > 0 {
            warn!(
                event = event_names::ENTITY_MISSED_MATCHES,
                entity = %entity,
                count = outcome.missed_matches,
                policy = %self.policy.missed_match,
                "rows without a realigned score"
            );
        }
        if outcome.non_finite > 0 {
            warn!(
                event = event_names::ENTITY_NON_FINITE,
                entity = %entity,
                count = outcome.non_finite,
                policy = %self.policy.non_finite,
                "non-finite scores"
            );
        }

        outcome.status = EntityStatus::Scored;
        debug!(
            event = event_names::ENTITY_SCORED,
            entity = %entity,
            extractor = self.extractor.name(),
            windows = features.len(),
            "entity scored"
        );
        Ok(EntityScores {
            values: scores,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{regular_series, TableBuilder};
    use crate::{assert_approx_eq, assert_err};

    fn scorer(kind: ScorerKind, windowsize: i64) -> AnomalyScorer {
        AnomalyScorer::new(
            ScorerConfig::new(kind, "value", windowsize, "score"),
            &ScoringPolicy::default(),
            &ClusteringParams::default(),
        )
    }

    #[test]
    fn missing_input_column_is_an_error() {
        let table = TableBuilder::new().series("a", 0, 1, &[1.0, 2.0]).build();
        let err = scorer(ScorerKind::Spectral, 1)
            .execute(&TableBuilder::new().column("other").series("a", 0, 1, &[1.0]).build());
        assert_err!(err);
        let err = AnomalyScorer::new(
            ScorerConfig::new(ScorerKind::KMeans, "temp", 2, "out"),
            &ScoringPolicy::default(),
            &ClusteringParams::default(),
        )
        .execute(&table)
        .unwrap_err();
        assert_eq!(err.to_string(), "column 'temp' not found");
    }

    #[test]
    fn short_entity_keeps_neutral_scores() {
        let table = regular_series("a", &[1.0, 5.0, 2.0]);
        let outcome = scorer(ScorerKind::Spectral, 12).execute(&table).unwrap();
        assert_eq!(outcome.table.column("score").unwrap(), &[Some(0.0); 3]);
        assert_eq!(outcome.report.entities[0].status, EntityStatus::InsufficientData);
        assert_eq!(outcome.report.insufficient_count(), 1);
    }

    #[test]
    fn signal_exactly_one_window_long_is_skipped() {
        let table = regular_series("a", &[1.0, 2.0, 3.0, 4.0]);
        let outcome = scorer(ScorerKind::KMeans, 4).execute(&table).unwrap();
        assert_eq!(outcome.report.scored_count(), 0);
    }

    #[test]
    fn input_table_is_untouched() {
        let values: Vec<f64> = (0..30).map(|i| (i % 3) as f64).collect();
        let table = regular_series("a", &values);
        let outcome = scorer(ScorerKind::KMeans, 4).execute(&table).unwrap();
        assert!(!table.has_column("score"));
        assert_eq!(outcome.table.column("value").unwrap(), table.column("value").unwrap());
        assert_eq!(outcome.table.len(), table.len());
    }

    #[test]
    fn output_has_one_value_per_row_and_is_finite_for_varied_input() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 13) % 7) as f64).collect();
        let table = regular_series("a", &values);
        for kind in ScorerKind::ALL {
            let outcome = scorer(*kind, 6).execute(&table).unwrap();
            let scores = outcome.table.column("score").unwrap();
            assert_eq!(scores.len(), 40);
            if *kind != ScorerKind::NoData {
                assert!(scores.iter().all(|s| s.is_some_and(f64::is_finite)), "{kind}");
            }
        }
    }

    #[test]
    fn constant_input_propagates_or_neutralises_nan() {
        let table = regular_series("a", &[4.0; 30]);
        let outcome = scorer(ScorerKind::Spectral, 6).execute(&table).unwrap();
        let scores = outcome.table.column("score").unwrap();
        assert!(scores.iter().all(|s| s.is_some_and(f64::is_nan)));
        assert_eq!(outcome.report.non_finite(), 30);
        assert_eq!(outcome.report.peak_score(), None);

        let neutral = AnomalyScorer::new(
            ScorerConfig::new(ScorerKind::Spectral, "value", 6, "score"),
            &ScoringPolicy {
                non_finite: NonFinitePolicy::Neutral,
                ..ScoringPolicy::default()
            },
            &ClusteringParams::default(),
        );
        let outcome = neutral.execute(&table).unwrap();
        assert_eq!(outcome.table.column("score").unwrap(), &[Some(0.0); 30]);
        assert_eq!(outcome.report.non_finite(), 30);
    }

    #[test]
    fn presence_grid_scores_realign_onto_original_rows() {
        // samples at 0..29 s and 31..60 s: the mean spacing is 60/59 s, so
        // the grid has 60 buckets and every row finds a label within 1 s
        let secs: Vec<i64> = (0..30).chain(31..61).collect();
        let table = TableBuilder::new()
            .rows("a", &secs, &vec![Some(1.0); secs.len()])
            .build();
        let outcome = scorer(ScorerKind::NoData, 12).execute(&table).unwrap();
        let entity = &outcome.report.entities[0];
        assert_eq!(entity.status, EntityStatus::Scored);
        assert_eq!(entity.missed_matches, 0);
        assert_eq!(entity.signal_len, 60);
    }

    #[test]
    fn missed_matches_follow_policy() {
        // 25 rows one second apart then one row 1000 s later: the grid at
        // the mean spacing (about 41 s) leaves early rows farther than the
        // 1 s tolerance from any bucket label
        let mut secs: Vec<i64> = (0..25).collect();
        secs.push(1024);
        let values: Vec<Option<f64>> = (0..26).map(|i| Some(i as f64 + 100.0)).collect();
        let table = TableBuilder::new().rows("a", &secs, &values).build();

        let run = |missed_match| {
            AnomalyScorer::new(
                ScorerConfig::new(ScorerKind::NoData, "value", 2, "score"),
                &ScoringPolicy {
                    missed_match,
                    ..ScoringPolicy::default()
                },
                &ClusteringParams::default(),
            )
            .execute(&table)
            .unwrap()
        };

        let echo = run(MissedMatchPolicy::EchoInput);
        let missed = echo.report.missed_matches();
        assert!(missed > 0);
        let echoed = echo
            .table
            .column("score")
            .unwrap()
            .iter()
            .filter(|s| s.is_some_and(|v| v >= 100.0))
            .count();
        assert_eq!(echoed, missed);

        let blank = run(MissedMatchPolicy::Missing);
        let blanks = blank.table.column("score").unwrap().iter().filter(|s| s.is_none()).count();
        assert_eq!(blanks, missed);
    }

    #[test]
    fn entities_are_scored_independently() {
        let spiky: Vec<f64> = (0..30).map(|i| if i == 25 { 50.0 } else { 5.0 }).collect();
        let calm: Vec<f64> = (0..30).map(|i| (i % 5) as f64).collect();
        let both = TableBuilder::new()
            .series("a", 0, 1, &spiky)
            .series("b", 0, 1, &calm)
            .build();
        let alone = TableBuilder::new().series("b", 0, 1, &calm).build();

        let s = scorer(ScorerKind::KMeans, 12);
        let joint = s.execute(&both).unwrap();
        let single = s.execute(&alone).unwrap();

        let joint_b: Vec<Option<f64>> = joint.table.column("score").unwrap()[30..].to_vec();
        assert_eq!(joint_b, single.table.column("score").unwrap());
        assert_eq!(joint.report.entities.len(), 2);
        assert_eq!(joint.report.entities[0].entity.as_str(), "a");
    }

    #[test]
    fn default_gap_is_configurable() {
        let s = scorer(ScorerKind::Spectral, 1).with_default_gap(7 * NANOS_PER_SEC);
        let table = TableBuilder::new().series("a", 0, 0, &[1.0, 2.0, 3.0]).build();
        let outcome = s.execute(&table).unwrap();
        assert_eq!(outcome.report.entities[0].sampling.min_delta, 7 * NANOS_PER_SEC);
        assert_approx_eq!(outcome.report.entities[0].sampling.min_delta_seconds(), 7.0);
    }

    #[test]
    fn summary_mentions_label_and_counts() {
        let table = regular_series("a", &[1.0, 2.0]);
        let outcome = scorer(ScorerKind::KMeans, 12).execute(&table).unwrap();
        let line = outcome.report.summary();
        assert!(line.starts_with("KMeansAnomalyScore value -> score"));
        assert!(line.contains("1 insufficient"));
        assert!(line.ends_with("peak -"));
    }
}
