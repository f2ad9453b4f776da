use crate::protocol::types::{ColumnMeta, Row, Value};

/// Column metadata plus rows for one statement, or an affected-row count
/// for statements that produce no result set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowBuffer {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Row>,
    pub affected_rows: u64,
}

impl RowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer for an UPDATE/INSERT/REPLACE/DELETE outcome.
    pub fn affected(affected_rows: u64) -> Self {
        Self {
            affected_rows,
            ..Self::default()
        }
    }

    pub fn add_column(&mut self, name: impl Into<String>) {
        self.columns.push(ColumnMeta::new(name));
    }

    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn with_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.add_column(name);
        }
        self
    }

    pub fn with_row<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_row(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
