use crate::engine::access::{CursorIter, ForwardCursor, RandomAccess};
use crate::engine::options::CursorOptions;
use crate::error::{Result, SphinxQlError};
use crate::executor::RowsetHandle;
use crate::observability::{global_metrics, EventLogger};
use crate::protocol::{name_row, ColumnMeta, Materialized, NamedRow, Row, Stored};
use log::Level;
use std::fmt;
use std::sync::Arc;

const COMPONENT: &str = "RowCursor";

enum CursorState<H> {
    /// Rows come from the live handle. `fetched` caches the row at `position`
    /// because the handle cannot hand it out twice. `next_fetch` is the row
    /// the handle returns on its next `fetch_row`; it diverges from
    /// `position + 1` only after a failed pull.
    Unbuffered {
        handle: H,
        position: Option<usize>,
        fetched: Option<Row>,
        next_fetch: usize,
    },
    /// Every row lives in `stored`; the handle has been dropped.
    Buffered {
        stored: Materialized,
        position: Option<usize>,
    },
    /// `free_result` ran before anything was buffered.
    Released { position: Option<usize> },
}

impl<H> CursorState<H> {
    fn name(&self) -> &'static str {
        match self {
            CursorState::Unbuffered { .. } => "streaming",
            CursorState::Buffered { .. } => "buffered",
            CursorState::Released { .. } => "released",
        }
    }

    fn position(&self) -> Option<usize> {
        match self {
            CursorState::Unbuffered { position, .. }
            | CursorState::Buffered { position, .. }
            | CursorState::Released { position } => *position,
        }
    }
}

/// Cursor over the result of one executed statement.
///
/// Starts either buffered or streaming depending on [`CursorOptions`]. A
/// streaming cursor can be buffered later with [`RowCursor::store`]; once
/// buffered, every read is served from memory and the handle is gone.
pub struct RowCursor<H> {
    columns: Arc<[ColumnMeta]>,
    row_count: usize,
    affected_rows: u64,
    state: CursorState<H>,
    logger: EventLogger,
}

impl<H: RowsetHandle> RowCursor<H> {
    pub fn new(handle: H) -> Result<Self> {
        Self::with_options(handle, CursorOptions::default())
    }

    pub fn with_options(handle: H, options: CursorOptions) -> Result<Self> {
        let column_count = handle.column_count();
        let columns = (0..column_count)
            .map(|i| handle.column(i))
            .collect::<Result<Vec<_>>>()?;

        // Affected rows stay 0 for result-bearing statements so SELECT reports
        // a coherent count.
        let (row_count, affected_rows) = if column_count > 0 {
            (handle.row_count(), 0)
        } else {
            (0, handle.affected_rows())
        };

        let eager = options.fetch_mode.buffers_eagerly(handle.capabilities());
        global_metrics().record_rowset_opened();

        let mut cursor = Self {
            columns: Arc::from(columns),
            row_count,
            affected_rows,
            state: CursorState::Unbuffered {
                handle,
                position: None,
                fetched: None,
                next_fetch: 0,
            },
            logger: EventLogger::new(options.log_events),
        };
        if eager {
            cursor.store()?;
        }
        Ok(cursor)
    }
}

impl<H> RowCursor<H> {
    /// Builds an already-buffered cursor.
    pub fn from_materialized(columns: Vec<ColumnMeta>, stored: Materialized) -> Self {
        let (row_count, affected_rows) = match &stored {
            Materialized::Rows(rows) => (rows.len(), 0),
            Materialized::AffectedRows(n) => (0, *n),
        };
        Self {
            columns: Arc::from(columns),
            row_count,
            affected_rows,
            state: CursorState::Buffered {
                stored,
                position: None,
            },
            logger: EventLogger::default(),
        }
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    /// Rows reported by the handle when the cursor was built.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Mutation count; 0 for statements that return rows.
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn position(&self) -> Option<usize> {
        self.state.position()
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self.state, CursorState::Buffered { .. })
    }

    pub fn is_released(&self) -> bool {
        matches!(self.state, CursorState::Released { .. })
    }

    /// The raw handle, while rows are still being streamed from it.
    pub fn handle(&self) -> Option<&H> {
        match &self.state {
            CursorState::Unbuffered { handle, .. } => Some(handle),
            _ => None,
        }
    }

    pub fn has_row(&self, index: usize) -> bool {
        index < self.row_count
    }

    /// True while the row count has not been reached. Checked before the
    /// increment, so at the last row it still reports true and the following
    /// `to_next_row` lands on `row_count` with nothing fetched.
    pub fn has_next_row(&self) -> bool {
        match self.position() {
            None => self.row_count > 0,
            Some(p) => p < self.row_count,
        }
    }

    pub fn fetch_row_as_list(&self) -> Result<Row> {
        match &self.state {
            CursorState::Buffered { stored, position } => {
                let index = position.ok_or(SphinxQlError::NoCurrentRow)?;
                stored.row(index).cloned().ok_or(SphinxQlError::RowNotFound {
                    index,
                    row_count: self.row_count,
                })
            }
            CursorState::Unbuffered {
                position, fetched, ..
            } => {
                let index = position.ok_or(SphinxQlError::NoCurrentRow)?;
                fetched.clone().ok_or(SphinxQlError::RowNotFound {
                    index,
                    row_count: self.row_count,
                })
            }
            CursorState::Released { .. } => Err(SphinxQlError::ResourceReleased),
        }
    }

    pub fn fetch_row_as_map(&self) -> Result<NamedRow> {
        let row = self.fetch_row_as_list()?;
        Ok(name_row(&self.columns, &row))
    }

    /// Cheap copy of a buffered cursor, sharing its rows and starting
    /// unpositioned. Fails for cursors that are not buffered.
    pub fn snapshot(&self) -> Result<Self> {
        match &self.state {
            CursorState::Buffered { stored, .. } => Ok(Self {
                columns: self.columns.clone(),
                row_count: self.row_count,
                affected_rows: self.affected_rows,
                state: CursorState::Buffered {
                    stored: stored.clone(),
                    position: None,
                },
                logger: self.logger,
            }),
            other => Err(SphinxQlError::ModeConflict(format!(
                "cannot snapshot a {} rowset",
                other.name()
            ))),
        }
    }

    fn buffer(&self) -> Result<&Materialized> {
        match &self.state {
            CursorState::Buffered { stored, .. } => Ok(stored),
            CursorState::Released { .. } => Err(SphinxQlError::ResourceReleased),
            CursorState::Unbuffered { .. } => Err(SphinxQlError::ModeConflict(
                "rowset is not buffered".to_string(),
            )),
        }
    }
}

impl<H: RowsetHandle> RowCursor<H> {
    /// Buffers every row and drops the handle. Idempotent.
    ///
    /// A streaming cursor positioned on row 0 keeps that row. Once more rows
    /// have been pulled, including by a failed earlier `store`, they are gone
    /// from the handle: it must be rewindable, otherwise this fails with
    /// `ModeConflict` rather than silently dropping rows.
    pub fn store(&mut self) -> Result<()> {
        let logger = self.logger;
        let has_columns = !self.columns.is_empty();
        let (stored, position) = match &mut self.state {
            CursorState::Buffered { .. } => return Ok(()),
            CursorState::Released { .. } => return Err(SphinxQlError::ResourceReleased),
            CursorState::Unbuffered {
                handle,
                position,
                fetched,
                next_fetch,
            } => {
                let stored = if has_columns {
                    let mut rows: Vec<Row> = match (*next_fetch, *position, fetched.as_ref()) {
                        (0, _, _) => Vec::new(),
                        (1, Some(0), Some(row)) => vec![row.clone()],
                        (pulled, _, _) => {
                            if !handle.capabilities().rewindable {
                                let message = format!(
                                    "{} rows already pulled from a forward-only handle, store() can't fetch all the data",
                                    pulled
                                );
                                return Err(mode_conflict(logger, message));
                            }
                            realign(logger, handle, next_fetch, 0)?;
                            Vec::new()
                        }
                    };
                    while let Some(row) = pull(logger, handle, next_fetch)? {
                        rows.push(row);
                    }
                    Materialized::Rows(Arc::from(rows))
                } else {
                    Materialized::AffectedRows(self.affected_rows)
                };
                (stored, *position)
            }
        };

        global_metrics().record_store(stored.len() as u64);
        logger.log_transition(
            COMPONENT,
            self.state.name(),
            "buffered",
            &[
                ("rows", stored.len().to_string()),
                ("columns", self.columns.len().to_string()),
            ],
        );
        self.state = CursorState::Buffered { stored, position };
        Ok(())
    }

    /// Buffers and returns the raw buffer.
    pub fn materialized(&mut self) -> Result<&Materialized> {
        self.store()?;
        self.buffer()
    }

    /// Named rows for result-bearing statements, the affected count
    /// otherwise.
    pub fn stored(&mut self) -> Result<Stored> {
        if self.columns.is_empty() {
            return Ok(Stored::AffectedRows(self.affected_rows));
        }
        Ok(Stored::Rows(self.fetch_all_as_maps()?))
    }

    /// Moves the cursor to `index`.
    ///
    /// Buffered cursors move freely. Streaming cursors pull forward to the
    /// row, and move backwards only through a rewindable handle. A failed
    /// pull leaves the cursor on the last row it did fetch.
    pub fn to_row(&mut self, index: usize) -> Result<()> {
        if !self.has_row(index) {
            return Err(SphinxQlError::RowNotFound {
                index,
                row_count: self.row_count,
            });
        }

        let logger = self.logger;
        match &mut self.state {
            CursorState::Buffered { position, .. } => {
                *position = Some(index);
                Ok(())
            }
            CursorState::Released { .. } => Err(SphinxQlError::ResourceReleased),
            CursorState::Unbuffered {
                handle,
                position,
                fetched,
                next_fetch,
            } => {
                let start = match *position {
                    Some(p) if p == index => return Ok(()),
                    Some(p) if p < index => p + 1,
                    Some(_) => index,
                    None => 0,
                };
                realign(logger, handle, next_fetch, start)?;
                for i in start..=index {
                    let row = pull(logger, handle, next_fetch)?;
                    *position = Some(i);
                    *fetched = row;
                    global_metrics().record_rows_streamed(1);
                    logger.log_fetch(COMPONENT, i);
                }
                Ok(())
            }
        }
    }

    pub fn to_next_row(&mut self) -> Result<()> {
        if !self.has_next_row() {
            return Err(SphinxQlError::NoNextRow {
                position: self.position(),
                row_count: self.row_count,
            });
        }

        let next = self.position().map_or(0, |p| p + 1);
        let logger = self.logger;
        match &mut self.state {
            CursorState::Buffered { position, .. } => {
                *position = Some(next);
                Ok(())
            }
            CursorState::Released { .. } => Err(SphinxQlError::ResourceReleased),
            CursorState::Unbuffered {
                handle,
                position,
                fetched,
                next_fetch,
            } => {
                realign(logger, handle, next_fetch, next)?;
                let row = pull(logger, handle, next_fetch)?;
                *position = Some(next);
                *fetched = row;
                global_metrics().record_rows_streamed(1);
                logger.log_fetch(COMPONENT, next);
                Ok(())
            }
        }
    }

    /// Every row, positional. Buffers first, so later indexed access keeps
    /// working.
    pub fn fetch_all_as_lists(&mut self) -> Result<Vec<Row>> {
        self.store()?;
        Ok(self.buffer()?.rows().to_vec())
    }

    /// Every row keyed by column name. Buffers first.
    pub fn fetch_all_as_maps(&mut self) -> Result<Vec<NamedRow>> {
        self.store()?;
        Ok(self.buffer()?.named_rows(&self.columns))
    }

    /// Releases the handle's server-side resources. Buffered rows stay
    /// readable; an unbuffered cursor rejects further row access with
    /// `ResourceReleased`. Calling it again is a no-op.
    pub fn free_result(&mut self) -> Result<()> {
        let logger = self.logger;
        let position = match &mut self.state {
            CursorState::Unbuffered {
                handle, position, ..
            } => {
                observe(logger, handle.release())?;
                *position
            }
            CursorState::Buffered { .. } | CursorState::Released { .. } => return Ok(()),
        };

        self.state = CursorState::Released { position };
        global_metrics().record_release();
        logger.log_event(Level::Debug, COMPONENT, "handle released", &[]);
        Ok(())
    }

    /// Iterates named rows from the first one.
    pub fn rows(&mut self) -> CursorIter<'_, Self> {
        CursorIter::new(self)
    }
}

fn mode_conflict(logger: EventLogger, message: String) -> SphinxQlError {
    global_metrics().record_mode_conflict();
    logger.log_event(
        Level::Warn,
        COMPONENT,
        "mode conflict",
        &[("reason", message.clone())],
    );
    SphinxQlError::ModeConflict(message)
}

/// Pulls one row, advancing `next_fetch` only when the handle answered.
fn pull<H: RowsetHandle>(
    logger: EventLogger,
    handle: &mut H,
    next_fetch: &mut usize,
) -> Result<Option<Row>> {
    let row = observe(logger, handle.fetch_row())?;
    *next_fetch += 1;
    Ok(row)
}

/// Makes `target` the next row the handle returns, seeking when it is
/// elsewhere.
fn realign<H: RowsetHandle>(
    logger: EventLogger,
    handle: &mut H,
    next_fetch: &mut usize,
    target: usize,
) -> Result<()> {
    if *next_fetch == target {
        return Ok(());
    }
    if !handle.capabilities().rewindable {
        let message = format!(
            "forward-only handle is at row {}, cannot reposition to row {}",
            next_fetch, target
        );
        return Err(mode_conflict(logger, message));
    }
    observe(logger, handle.seek(target))?;
    *next_fetch = target;
    Ok(())
}

fn observe<T>(logger: EventLogger, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if e.is_executor_error() {
            global_metrics().record_executor_error();
            logger.log_error(COMPONENT, &e.to_string());
        }
    }
    result
}

impl<H: RowsetHandle> RandomAccess for RowCursor<H> {
    type Item = NamedRow;

    fn contains_index(&mut self, index: usize) -> Result<bool> {
        Ok(self.has_row(index))
    }

    fn get(&mut self, index: usize) -> Result<NamedRow> {
        self.to_row(index)?;
        self.fetch_row_as_map()
    }

    fn len(&mut self) -> Result<usize> {
        self.store()?;
        Ok(self.row_count)
    }
}

impl<H: RowsetHandle> ForwardCursor for RowCursor<H> {
    type Item = NamedRow;

    fn rewind(&mut self) -> Result<()> {
        if self.row_count == 0 {
            return Ok(());
        }
        self.to_row(0)
    }

    fn is_valid(&mut self) -> Result<bool> {
        Ok(self.has_row(self.key()))
    }

    fn current(&mut self) -> Result<NamedRow> {
        self.fetch_row_as_map()
    }

    fn key(&self) -> usize {
        self.position().unwrap_or(0)
    }

    fn advance(&mut self) -> Result<()> {
        if self.has_next_row() {
            self.to_next_row()
        } else {
            Ok(())
        }
    }
}

impl<H> fmt::Debug for RowCursor<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCursor")
            .field("columns", &self.columns)
            .field("row_count", &self.row_count)
            .field("affected_rows", &self.affected_rows)
            .field("mode", &self.state.name())
            .field("position", &self.position())
            .finish()
    }
}
