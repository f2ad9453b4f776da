//! Contract between the cursors and whatever executes statements.
//!
//! Connection management, statement text and transport live behind these
//! traits. A driver binding implements [`RowsetHandle`] for one statement's
//! result and [`BatchHandle`] for a multi-statement batch; [`memory`] is a
//! complete in-process implementation.

pub mod capabilities;
pub mod memory;

pub use capabilities::HandleCapabilities;
pub use memory::{MemoryBatch, MemoryRowset};

use crate::error::{Result, SphinxQlError};
use crate::protocol::{name_row, ColumnMeta, NamedRow, Row};

/// Raw result handle for one executed statement.
///
/// Implementations free per-rowset resources on `Drop`; `release` is the
/// explicit, early variant. Releasing a rowset must not discard the
/// remaining statements of the batch it came from.
pub trait RowsetHandle {
    fn capabilities(&self) -> HandleCapabilities;

    /// Number of result columns; zero for statements without a result set.
    fn column_count(&self) -> usize;

    fn column(&self, index: usize) -> Result<ColumnMeta>;

    fn row_count(&self) -> usize;

    /// Mutation count, meaningful only when `column_count()` is zero.
    fn affected_rows(&self) -> u64;

    /// Pulls the next row, `None` once the rowset is exhausted.
    fn fetch_row(&mut self) -> Result<Option<Row>>;

    /// Pulls every remaining row.
    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.fetch_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    fn fetch_all_named(&mut self) -> Result<Vec<NamedRow>> {
        let columns = (0..self.column_count())
            .map(|i| self.column(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(self
            .fetch_all()?
            .iter()
            .map(|row| name_row(&columns, row))
            .collect())
    }

    /// Repositions so the next `fetch_row` returns row `row`. Only valid when
    /// `capabilities().rewindable` is set.
    fn seek(&mut self, _row: usize) -> Result<()> {
        Err(SphinxQlError::UnsupportedFeature(
            "rowset handle cannot seek".to_string(),
        ))
    }

    fn release(&mut self) -> Result<()>;
}

/// Raw handle for a batch of statements executed in one round trip.
pub trait BatchHandle {
    type Rowset: RowsetHandle;

    fn capabilities(&self) -> HandleCapabilities;

    /// Opens the result of the statement the batch is currently positioned
    /// on. Rows consumed through an earlier rowset of the same statement are
    /// not replayed unless the handle is rewindable.
    fn current_rowset(&mut self) -> Result<Self::Rowset>;

    /// Advances to the next statement. `Ok(false)` means the batch is
    /// exhausted.
    fn next_rowset(&mut self) -> Result<bool>;

    /// Repositions on the first statement. Only valid when
    /// `capabilities().rewindable` is set.
    fn rewind(&mut self) -> Result<()> {
        Err(SphinxQlError::UnsupportedFeature(
            "batch handle cannot rewind".to_string(),
        ))
    }
}

impl<H: RowsetHandle + ?Sized> RowsetHandle for Box<H> {
    fn capabilities(&self) -> HandleCapabilities {
        (**self).capabilities()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column(&self, index: usize) -> Result<ColumnMeta> {
        (**self).column(index)
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn affected_rows(&self) -> u64 {
        (**self).affected_rows()
    }

    fn fetch_row(&mut self) -> Result<Option<Row>> {
        (**self).fetch_row()
    }

    fn fetch_all(&mut self) -> Result<Vec<Row>> {
        (**self).fetch_all()
    }

    fn fetch_all_named(&mut self) -> Result<Vec<NamedRow>> {
        (**self).fetch_all_named()
    }

    fn seek(&mut self, row: usize) -> Result<()> {
        (**self).seek(row)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}
