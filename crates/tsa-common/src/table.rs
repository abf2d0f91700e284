//! Multi-entity, time-indexed tables.
//!
//! A [`TimeSeriesTable`] holds rows keyed by `(entity, timestamp)` with any
//! number of named numeric columns. Cells are `Option<f64>`: `None` is a
//! missing reading. Rows are not required to be sorted or unique; the
//! [`EntityPartition`] groups them per entity in timestamp order.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::id::EntityId;

/// Errors raised by table access and construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TableError {
    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    #[error("column '{column}' has {actual} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("timestamp at row {row} is outside the nanosecond range")]
    TimestampOutOfRange { row: usize },
}

/// Rows of a multi-entity time series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeriesTable {
    entities: Vec<EntityId>,
    timestamps: Vec<DateTime<Utc>>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Column names in lexical order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Append one row. Columns absent from `cells` are missing for this row;
    /// a column seen for the first time is back-filled with missing values.
    pub fn push_row<I, K>(&mut self, entity: impl Into<EntityId>, timestamp: DateTime<Utc>, cells: I)
    where
        I: IntoIterator<Item = (K, Option<f64>)>,
        K: Into<String>,
    {
        let row = self.len();
        self.entities.push(entity.into());
        self.timestamps.push(timestamp);

        for (name, value) in cells {
            let column = self
                .columns
                .entry(name.into())
                .or_insert_with(|| vec![None; row]);
            if column.len() == row {
                column.push(value);
            } else {
                column[row] = value;
            }
        }
        for column in self.columns.values_mut() {
            if column.len() == row {
                column.push(None);
            }
        }
    }

    /// Insert or replace a column.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.len(),
                actual: values.len(),
            });
        }
        self.columns.insert(name, values);
        Ok(())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Result<&[Option<f64>], TableError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| TableError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// A copy of this table with `name` set to `values`.
    pub fn with_column(
        &self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<TimeSeriesTable, TableError> {
        let mut out = self.clone();
        out.add_column(name, values)?;
        Ok(out)
    }

    /// Timestamp of `row` as nanoseconds since the Unix epoch.
    pub fn timestamp_nanos(&self, row: usize) -> Result<i64, TableError> {
        self.timestamps[row]
            .timestamp_nanos_opt()
            .ok_or(TableError::TimestampOutOfRange { row })
    }

    /// Group row indices by entity, each group sorted by timestamp.
    ///
    /// Rows sharing a timestamp keep their table order.
    pub fn partition(&self) -> EntityPartition {
        let mut groups: BTreeMap<EntityId, Vec<usize>> = BTreeMap::new();
        for (row, entity) in self.entities.iter().enumerate() {
            groups.entry(entity.clone()).or_default().push(row);
        }
        for rows in groups.values_mut() {
            rows.sort_by_key(|&row| self.timestamps[row]);
        }
        EntityPartition { groups }
    }
}

/// Row indices of every entity, in ascending entity order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityPartition {
    groups: BTreeMap<EntityId, Vec<usize>>,
}

impl EntityPartition {
    /// Number of distinct entities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Rows of one entity, if present.
    pub fn rows(&self, entity: &EntityId) -> Option<&[usize]> {
        self.groups.get(entity).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &[usize])> {
        self.groups.iter().map(|(e, rows)| (e, rows.as_slice()))
    }
}
