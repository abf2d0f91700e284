//! Run reports and their rendering.
//!
//! Reports go to stdout in the format chosen with `--format`; the scored
//! table itself is written as CSV.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tsa_common::OutputFormat;
use tsa_config::ConfigSnapshot;

use crate::pipeline::PipelineOutcome;
use crate::scorer::ScoreReport;

/// Schema version of the run report.
pub const REPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Everything known about one scoring run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: &'static str,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    /// Input file, or `-` for stdin.
    pub input: String,
    pub rows: usize,
    pub entities: usize,
    pub config: ConfigSnapshot,
    pub trace: Vec<String>,
    pub scorers: Vec<ScoreReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_score: Option<f64>,
    /// Exit status name, e.g. `OK_CLEAN`.
    pub status: &'static str,
}

impl RunReport {
    pub fn new(
        run_id: impl Into<String>,
        input: impl Into<String>,
        config: ConfigSnapshot,
        outcome: &PipelineOutcome,
        status: &'static str,
    ) -> Self {
        let entities = outcome
            .reports
            .first()
            .map(|r| r.entities.len())
            .unwrap_or_else(|| outcome.table.partition().len());
        RunReport {
            schema_version: REPORT_SCHEMA_VERSION,
            run_id: run_id.into(),
            generated_at: Utc::now(),
            input: input.into(),
            rows: outcome.table.len(),
            entities,
            config,
            trace: outcome.trace.clone(),
            scorers: outcome.reports.clone(),
            peak_score: outcome.peak_score(),
            status,
        }
    }
}

/// Render `report` for stdout. CSV output carries the table instead, so it
/// has no report rendering.
pub fn render_report(report: &RunReport, format: OutputFormat) -> Result<Option<String>, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report).map(Some),
        OutputFormat::Jsonl => render_jsonl(report).map(Some),
        OutputFormat::Summary => Ok(Some(render_summary(report))),
        OutputFormat::Csv => Ok(None),
    }
}

/// One line per scored entity, then a closing run line.
fn render_jsonl(report: &RunReport) -> Result<String, serde_json::Error> {
    let mut lines = Vec::new();
    for scorer in &report.scorers {
        for entity in &scorer.entities {
            let line = json!({
                "run_id": report.run_id,
                "scorer": scorer.scorer,
                "output_item": scorer.output_item,
                "entity": entity,
            });
            lines.push(serde_json::to_string(&line)?);
        }
    }
    let closing = json!({
        "run_id": report.run_id,
        "event": "run.finished",
        "rows": report.rows,
        "entities": report.entities,
        "trace": report.trace,
        "peak_score": report.peak_score,
        "status": report.status,
    });
    lines.push(serde_json::to_string(&closing)?);
    Ok(lines.join("\n"))
}

fn render_summary(report: &RunReport) -> String {
    let mut out = format!(
        "run {}: {} rows, {} entities, {} scorer(s) [{}]\n",
        report.run_id,
        report.rows,
        report.entities,
        report.scorers.len(),
        report.status
    );
    for scorer in &report.scorers {
        out.push_str("  ");
        out.push_str(&scorer.summary());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::test_utils::regular_series;
    use tsa_config::PresetName;

    fn report() -> RunReport {
        let config = PresetName::Kmeans.pipeline("value");
        let table = regular_series("a", &(0..20).map(|i| (i % 4) as f64).collect::<Vec<_>>());
        let outcome = Pipeline::from_config(&config).run(&table).unwrap();
        RunReport::new(
            "run-abc",
            "-",
            ConfigSnapshot::defaults_only(&config),
            &outcome,
            "OK_CLEAN",
        )
    }

    #[test]
    fn json_report_has_trace_and_scorers() {
        let text = render_report(&report(), OutputFormat::Json).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["trace"][0], "KMeansAnomalyScore");
        assert_eq!(value["scorers"][0]["entities"][0]["status"], "scored");
        assert_eq!(value["rows"], 20);
        assert_eq!(value["status"], "OK_CLEAN");
    }

    #[test]
    fn jsonl_has_one_line_per_entity_plus_closing() {
        let text = render_report(&report(), OutputFormat::Jsonl).unwrap().unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["event"], "run.finished");
    }

    #[test]
    fn summary_and_csv() {
        let r = report();
        let text = render_report(&r, OutputFormat::Summary).unwrap().unwrap();
        assert!(text.starts_with("run run-abc: 20 rows, 1 entities"));
        assert!(text.contains("KMeansAnomalyScore value -> value_kmeans"));
        assert!(render_report(&r, OutputFormat::Csv).unwrap().is_none());
    }
}
