use crate::protocol::types::{name_row, ColumnMeta, NamedRow, Row};
use serde::Serialize;
use std::sync::Arc;

/// Fully buffered outcome of one statement.
///
/// Rows are shared behind an `Arc` and never mutated after buffering, so
/// clones are cheap and safe to hand to other threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    Rows(Arc<[Row]>),
    AffectedRows(u64),
}

impl Materialized {
    pub fn rows(&self) -> &[Row] {
        match self {
            Materialized::Rows(rows) => &rows[..],
            Materialized::AffectedRows(_) => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows().get(index)
    }

    pub fn named_rows(&self, columns: &[ColumnMeta]) -> Vec<NamedRow> {
        self.rows().iter().map(|row| name_row(columns, row)).collect()
    }
}

/// Caller-facing buffered shape: named rows for result-bearing statements,
/// the affected count for everything else. Serializes as a JSON array of
/// objects or a bare number.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Stored {
    Rows(Vec<NamedRow>),
    AffectedRows(u64),
}

impl Stored {
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
