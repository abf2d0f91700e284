//! Test utilities for tsa-core.
//!
//! Provides assertion macros, fixture paths and small table builders.

use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};
use tsa_common::TimeSeriesTable;

// ============================================================================
// Macros
// ============================================================================

/// Assert that a Result is Ok and return the value.
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// Assert that a Result is Err.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(val) => panic!("Expected Err, got Ok: {:?}", val),
            Err(_) => {}
        }
    };
}

/// Assert that two floating point numbers are approximately equal.
#[macro_export]
macro_rules! assert_approx_eq {
    ($a:expr, $b:expr) => {
        $crate::assert_approx_eq!($a, $b, 1e-6_f64)
    };
    ($a:expr, $b:expr, $epsilon:expr) => {{
        let a: f64 = $a;
        let b: f64 = $b;
        let eps: f64 = $epsilon;
        let diff = (a - b).abs();
        if diff > eps {
            panic!(
                "assertion failed: `(left ~= right)` (left: `{}`, right: `{}`, diff: `{}`, epsilon: `{}`)",
                a, b, diff, eps
            );
        }
    }};
}

// ============================================================================
// Fixtures
// ============================================================================

/// Fixture directory relative to crate root.
pub const FIXTURES_DIR: &str = "tests/fixtures";

pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join(FIXTURES_DIR).join(name)
}

// ============================================================================
// Tables
// ============================================================================

/// Timestamp `secs` seconds after the Unix epoch.
pub fn at_secs(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Builds tables row by row for tests.
#[derive(Debug, Clone)]
pub struct TableBuilder {
    column: String,
    table: TimeSeriesTable,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Empty builder writing into the `value` column.
    pub fn new() -> Self {
        Self {
            column: tsa_config::pipeline::DEFAULT_INPUT_ITEM.to_string(),
            table: TimeSeriesTable::new(),
        }
    }

    /// Column that subsequent rows fill.
    pub fn column(mut self, name: &str) -> Self {
        self.column = name.to_string();
        self
    }

    /// Regularly spaced, fully observed samples.
    pub fn series(self, entity: &str, start_secs: i64, step_secs: i64, values: &[f64]) -> Self {
        let secs: Vec<i64> = (0..values.len() as i64)
            .map(|i| start_secs + i * step_secs)
            .collect();
        let values: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        self.rows(entity, &secs, &values)
    }

    /// Samples at explicit second offsets.
    pub fn rows(mut self, entity: &str, secs: &[i64], values: &[Option<f64>]) -> Self {
        for (&s, &v) in secs.iter().zip(values) {
            self.table
                .push_row(entity, at_secs(s), [(self.column.clone(), v)]);
        }
        self
    }

    pub fn build(self) -> TimeSeriesTable {
        self.table
    }
}

/// One entity sampled every second from the epoch.
pub fn regular_series(entity: &str, values: &[f64]) -> TimeSeriesTable {
    TableBuilder::new().series(entity, 0, 1, values).build()
}
