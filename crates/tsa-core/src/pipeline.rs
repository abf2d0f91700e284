//! Ordered chains of scorers.
//!
//! Each scorer reads the table produced by the previous one, so a later
//! scorer may consume an earlier scorer's output column.

use serde::Serialize;
use tsa_common::TimeSeriesTable;
use tsa_config::PipelineConfig;

use crate::scorer::{AnomalyScorer, ScoreError, ScoreReport};

/// Result of running a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub table: TimeSeriesTable,
    pub reports: Vec<ScoreReport>,
    /// Trace labels of the scorers that ran, in order.
    pub trace: Vec<String>,
}

impl PipelineOutcome {
    /// Largest absolute finite score over all scorers.
    pub fn peak_score(&self) -> Option<f64> {
        self.reports
            .iter()
            .filter_map(ScoreReport::peak_score)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
    }
}

/// Serializable digest of a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry<'a> {
    pub label: &'a str,
    pub input_item: &'a str,
    pub output_item: &'a str,
}

#[derive(Debug, Default)]
pub struct Pipeline {
    scorers: Vec<AnomalyScorer>,
}

impl Pipeline {
    pub fn new(scorers: Vec<AnomalyScorer>) -> Self {
        Self { scorers }
    }

    /// Build every scorer of `config` with its shared policy, clustering
    /// parameters and default sampling gap.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let scorers = config
            .scorers
            .iter()
            .map(|sc| {
                AnomalyScorer::new(sc.clone(), &config.policy, &config.clustering)
                    .with_default_gap(config.default_gap_nanos())
            })
            .collect();
        Self { scorers }
    }

    pub fn push(&mut self, scorer: AnomalyScorer) {
        self.scorers.push(scorer);
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }

    pub fn scorers(&self) -> &[AnomalyScorer] {
        &self.scorers
    }

    /// Trace labels in execution order.
    pub fn trace(&self) -> Vec<&'static str> {
        self.scorers.iter().map(AnomalyScorer::trace_label).collect()
    }

    /// Trace with the columns each scorer reads and writes.
    pub fn trace_entries(&self) -> Vec<TraceEntry<'_>> {
        self.scorers
            .iter()
            .map(|s| TraceEntry {
                label: s.trace_label(),
                input_item: &s.config().input_item,
                output_item: &s.config().output_item,
            })
            .collect()
    }

    /// Run every scorer in order. Stops at the first failing scorer.
    pub fn run(&self, table: &TimeSeriesTable) -> Result<PipelineOutcome, ScoreError> {
        let mut current = table.clone();
        let mut reports = Vec::with_capacity(self.scorers.len());
        let mut trace = Vec::with_capacity(self.scorers.len());

        for scorer in &self.scorers {
            let outcome = scorer.execute(&current)?;
            trace.push(scorer.trace_label().to_string());
            reports.push(outcome.report);
            current = outcome.table;
        }

        Ok(PipelineOutcome {
            table: current,
            reports,
            trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::regular_series;
    use tsa_config::{PresetName, ScorerConfig, ScorerKind};

    #[test]
    fn full_preset_adds_three_columns_in_order() {
        let values: Vec<f64> = (0..40).map(|i| ((i * 5) % 9) as f64).collect();
        let table = regular_series("pump-1", &values);
        let config = PresetName::Full.pipeline("value");
        let pipeline = Pipeline::from_config(&config);

        assert_eq!(
            pipeline.trace(),
            vec!["NoDataAnomalyScore", "SpectralAnomalyScore", "KMeansAnomalyScore"]
        );

        let outcome = pipeline.run(&table).unwrap();
        assert_eq!(outcome.trace, pipeline.trace());
        assert_eq!(outcome.reports.len(), 3);
        for sc in &config.scorers {
            assert_eq!(outcome.table.column(&sc.output_item).unwrap().len(), 40);
        }
        assert!(outcome.peak_score().is_some());
    }

    #[test]
    fn later_scorer_may_read_earlier_output() {
        let values: Vec<f64> = (0..30).map(|i| ((i * 3) % 7) as f64).collect();
        let table = regular_series("a", &values);
        let config = PipelineConfig::empty()
            .with_scorer(ScorerConfig::new(ScorerKind::KMeans, "value", 4, "first"))
            .with_scorer(ScorerConfig::new(ScorerKind::Spectral, "first", 4, "second"));
        let outcome = Pipeline::from_config(&config).run(&table).unwrap();
        assert!(outcome.table.has_column("second"));
        assert_eq!(outcome.reports[1].input_item, "first");
    }

    #[test]
    fn failure_stops_the_chain() {
        let table = regular_series("a", &[1.0; 20]);
        let config = PipelineConfig::empty()
            .with_scorer(ScorerConfig::new(ScorerKind::KMeans, "missing", 4, "x"))
            .with_scorer(ScorerConfig::new(ScorerKind::Spectral, "value", 4, "y"));
        assert!(matches!(
            Pipeline::from_config(&config).run(&table),
            Err(ScoreError::Table(_))
        ));
    }

    #[test]
    fn empty_pipeline_returns_the_input() {
        let table = regular_series("a", &[1.0, 2.0]);
        let outcome = Pipeline::default().run(&table).unwrap();
        assert_eq!(outcome.table, table);
        assert!(outcome.trace.is_empty());
        assert_eq!(outcome.peak_score(), None);
    }

    #[test]
    fn trace_entries_name_columns() {
        let pipeline = Pipeline::from_config(&PresetName::Gaps.pipeline("temp"));
        let entries = pipeline.trace_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label, "NoDataAnomalyScore");
        assert_eq!(entries[0].input_item, "temp");
    }
}
