//! Stage and event names shared by the scorer, pipeline and CLI.

use serde::{Deserialize, Serialize};

/// Processing stages of a scoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading the input table.
    Load,
    /// Per-entity scoring.
    Score,
    /// Writing the scored table and report.
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Load => "load",
            Stage::Score => "score",
            Stage::Write => "write",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names, emitted as the `event` field.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const TABLE_LOADED: &str = "table.loaded";

    pub const SCORER_STARTED: &str = "scorer.started";
    pub const SCORER_FINISHED: &str = "scorer.finished";
    pub const ENTITY_SAMPLING: &str = "entity.sampling";
    pub const ENTITY_SKIPPED: &str = "entity.skipped";
    pub const ENTITY_SCORED: &str = "entity.scored";
    pub const ENTITY_MISSED_MATCHES: &str = "entity.missed_matches";
    pub const ENTITY_NON_FINITE: &str = "entity.non_finite";

    pub const OUTPUT_WRITTEN: &str = "output.written";
}
