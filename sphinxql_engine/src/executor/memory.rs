use crate::error::{Result, SphinxQlError};
use crate::executor::{BatchHandle, HandleCapabilities, RowsetHandle};
use crate::protocol::{ColumnMeta, Row, RowBuffer};
use std::sync::Arc;

const ER_QUERY_INTERRUPTED: i32 = 1317;
const ER_NEXT_ROWSET: i32 = 1064;
const ER_SERVER_GONE: i32 = 2006;

/// In-memory rowset: behaves like a driver cursor over rows that were
/// already produced, with optional fault injection.
#[derive(Debug, Clone)]
pub struct MemoryRowset {
    columns: Arc<[ColumnMeta]>,
    rows: Arc<[Row]>,
    affected_rows: u64,
    next: usize,
    capabilities: HandleCapabilities,
    fail_fetch_at: Option<usize>,
    fetch_calls: usize,
    fail_call_once: Option<usize>,
    released: bool,
}

impl MemoryRowset {
    pub fn new(buffer: RowBuffer) -> Self {
        Self {
            columns: Arc::from(buffer.columns),
            rows: Arc::from(buffer.rows),
            affected_rows: buffer.affected_rows,
            next: 0,
            capabilities: HandleCapabilities::default(),
            fail_fetch_at: None,
            fetch_calls: 0,
            fail_call_once: None,
            released: false,
        }
    }

    pub fn with_capabilities(mut self, capabilities: HandleCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Makes the fetch of row `index` fail with an executor error. The
    /// failure repeats on every retry; the read position does not move.
    pub fn fail_fetch_at(mut self, index: usize) -> Self {
        self.fail_fetch_at = Some(index);
        self
    }

    /// Makes the `call`-th `fetch_row` (zero-based, counted across seeks)
    /// fail once with an executor error. Later calls succeed.
    pub fn fail_fetch_call_once(mut self, call: usize) -> Self {
        self.fail_call_once = Some(call);
        self
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Index of the row the next `fetch_row` returns.
    pub fn next_index(&self) -> usize {
        self.next
    }

    fn ensure_open(&self) -> Result<()> {
        if self.released {
            return Err(SphinxQlError::ResourceReleased);
        }
        Ok(())
    }
}

impl RowsetHandle for MemoryRowset {
    fn capabilities(&self) -> HandleCapabilities {
        self.capabilities
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column(&self, index: usize) -> Result<ColumnMeta> {
        self.columns.get(index).cloned().ok_or_else(|| {
            SphinxQlError::executor(0, format!("column {} out of range", index))
        })
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    fn fetch_row(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        let call = self.fetch_calls;
        self.fetch_calls += 1;
        if self.fail_call_once == Some(call) {
            self.fail_call_once = None;
            return Err(SphinxQlError::executor(
                ER_QUERY_INTERRUPTED,
                format!("query execution was interrupted on fetch {}", call),
            ));
        }
        if self.fail_fetch_at == Some(self.next) {
            return Err(SphinxQlError::executor(
                ER_QUERY_INTERRUPTED,
                format!("query execution was interrupted at row {}", self.next),
            ));
        }
        let row = self.rows.get(self.next).cloned();
        if row.is_some() {
            self.next += 1;
        }
        Ok(row)
    }

    fn seek(&mut self, row: usize) -> Result<()> {
        self.ensure_open()?;
        if !self.capabilities.rewindable {
            return Err(SphinxQlError::UnsupportedFeature(
                "forward-only rowset cannot seek".to_string(),
            ));
        }
        if row > self.rows.len() {
            return Err(SphinxQlError::executor(
                0,
                format!("seek to row {} past end of {} rows", row, self.rows.len()),
            ));
        }
        self.next = row;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        self.released = true;
        Ok(())
    }
}

/// In-memory multi-statement batch. Each statement is a [`MemoryRowset`]
/// template; opening the current statement hands out a fresh copy.
#[derive(Debug, Clone)]
pub struct MemoryBatch {
    statements: Vec<MemoryRowset>,
    current: usize,
    capabilities: HandleCapabilities,
    fail_advance_to: Option<usize>,
    fail_rewind: bool,
}

impl MemoryBatch {
    pub fn new(statements: Vec<MemoryRowset>) -> Self {
        Self {
            statements,
            current: 0,
            capabilities: HandleCapabilities::default(),
            fail_advance_to: None,
            fail_rewind: false,
        }
    }

    pub fn from_buffers<I>(buffers: I) -> Self
    where
        I: IntoIterator<Item = RowBuffer>,
    {
        Self::new(buffers.into_iter().map(MemoryRowset::new).collect())
    }

    pub fn with_capabilities(mut self, capabilities: HandleCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Makes advancing onto statement `index` fail with an executor error.
    pub fn fail_advance_to(mut self, index: usize) -> Self {
        self.fail_advance_to = Some(index);
        self
    }

    /// Makes `rewind` fail with an executor error, as a dropped connection
    /// would.
    pub fn fail_rewind(mut self) -> Self {
        self.fail_rewind = true;
        self
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }
}

impl BatchHandle for MemoryBatch {
    type Rowset = MemoryRowset;

    fn capabilities(&self) -> HandleCapabilities {
        self.capabilities
    }

    fn current_rowset(&mut self) -> Result<MemoryRowset> {
        self.statements.get(self.current).cloned().ok_or_else(|| {
            SphinxQlError::executor(
                0,
                format!("no statement result at position {}", self.current),
            )
        })
    }

    fn next_rowset(&mut self) -> Result<bool> {
        let target = self.current + 1;
        if self.current >= self.statements.len() {
            return Ok(false);
        }
        if self.fail_advance_to == Some(target) {
            return Err(SphinxQlError::executor(
                ER_NEXT_ROWSET,
                format!("error in statement {} of batch", target),
            ));
        }
        self.current = target;
        Ok(target < self.statements.len())
    }

    fn rewind(&mut self) -> Result<()> {
        if !self.capabilities.rewindable {
            return Err(SphinxQlError::UnsupportedFeature(
                "forward-only batch cannot rewind".to_string(),
            ));
        }
        if self.fail_rewind {
            return Err(SphinxQlError::Executor {
                sqlstate: *b"08S01",
                native_code: ER_SERVER_GONE,
                message: "server has gone away".to_string(),
            });
        }
        self.current = 0;
        Ok(())
    }
}
