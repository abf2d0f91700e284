//! CSV tables.
//!
//! One row per observation: an entity column, a timestamp column, and any
//! number of numeric columns. Empty cells and `NaN` are missing readings.
//!
//! Timestamps are accepted as RFC 3339 (`2024-01-01T00:00:00Z`), as naive
//! `YYYY-MM-DD HH:MM:SS[.fff]` (read as UTC), or as epoch seconds. They are
//! written back as RFC 3339 in UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tsa_common::{TableError, TimeSeriesTable};

/// Errors raised while reading or writing CSV tables.
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("required column '{column}' not found in header")]
    MissingColumn { column: String },

    #[error("row {row}: cannot parse timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}, column '{column}': cannot parse number '{value}'")]
    BadNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

impl From<CsvError> for tsa_common::Error {
    fn from(err: CsvError) -> Self {
        match err {
            CsvError::Io { source, .. } => tsa_common::Error::Io(source),
            CsvError::Table(e) => tsa_common::Error::Table(e),
            CsvError::MissingColumn { column } => {
                tsa_common::Error::Table(TableError::MissingColumn { column })
            }
            CsvError::BadTimestamp { row, .. } | CsvError::BadNumber { row, .. } => {
                tsa_common::Error::InvalidInput {
                    row,
                    message: err.to_string(),
                }
            }
            CsvError::Csv(e) => tsa_common::Error::Csv(e.to_string()),
        }
    }
}

/// Names of the key columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableLayout {
    pub entity_column: String,
    pub time_column: String,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            entity_column: "id".to_string(),
            time_column: "timestamp".to_string(),
        }
    }
}

impl TableLayout {
    pub fn new(entity_column: impl Into<String>, time_column: impl Into<String>) -> Self {
        Self {
            entity_column: entity_column.into(),
            time_column: time_column.into(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    let secs = raw.parse::<f64>().ok().filter(|s| s.is_finite())?;
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp(whole as i64, nanos)
}

fn parse_cell(raw: &str) -> Result<Option<f64>, ()> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| ())
}

fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

/// Read a table from CSV. Rows are numbered from 1 (the first data row) in
/// error messages.
pub fn read_table<R: Read>(reader: R, layout: &TableLayout) -> Result<TimeSeriesTable, CsvError> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CsvError::MissingColumn {
                column: name.to_string(),
            })
    };
    let entity_idx = position(&layout.entity_column)?;
    let time_idx = position(&layout.time_column)?;
    let value_columns: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != entity_idx && *i != time_idx)
        .collect();

    let mut table = TimeSeriesTable::new();
    for (_, name) in &value_columns {
        table.add_column(name.as_str(), Vec::new())?;
    }

    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let entity = record.get(entity_idx).unwrap_or_default();
        let raw_ts = record.get(time_idx).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| CsvError::BadTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;

        let mut cells = Vec::with_capacity(value_columns.len());
        for (col, name) in &value_columns {
            let raw = record.get(*col).unwrap_or_default();
            let value = parse_cell(raw).map_err(|_| CsvError::BadNumber {
                row,
                column: name.to_string(),
                value: raw.to_string(),
            })?;
            cells.push((name.as_str(), value));
        }
        table.push_row(entity, timestamp, cells);
    }

    Ok(table)
}

/// Read a table from a CSV file.
pub fn read_table_path(path: &Path, layout: &TableLayout) -> Result<TimeSeriesTable, CsvError> {
    let file = File::open(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_table(file, layout)
}

/// Write a table as CSV: key columns first, then value columns by name.
pub fn write_table<W: Write>(writer: W, table: &TimeSeriesTable, layout: &TableLayout) -> Result<(), CsvError> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    let names: Vec<&str> = table.column_names().collect();

    let mut header = vec![layout.entity_column.as_str(), layout.time_column.as_str()];
    header.extend(names.iter().copied());
    wtr.write_record(&header)?;

    let columns = names
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>, TableError>>()?;

    for row in 0..table.len() {
        let mut record = Vec::with_capacity(2 + columns.len());
        record.push(table.entities()[row].to_string());
        record.push(table.timestamps()[row].to_rfc3339_opts(SecondsFormat::AutoSi, true));
        record.extend(columns.iter().map(|c| format_cell(c[row])));
        wtr.write_record(&record)?;
    }
    wtr.flush().map_err(|source| CsvError::Io {
        path: "<output>".to_string(),
        source,
    })?;
    Ok(())
}

/// Write a table to a CSV file, replacing it.
pub fn write_table_path(path: &Path, table: &TimeSeriesTable, layout: &TableLayout) -> Result<(), CsvError> {
    let file = File::create(path).map_err(|source| CsvError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_table(file, table, layout)
}
