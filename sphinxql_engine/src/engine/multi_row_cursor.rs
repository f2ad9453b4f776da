use crate::engine::access::{CursorIter, ForwardCursor, RandomAccess};
use crate::engine::options::CursorOptions;
use crate::engine::row_cursor::RowCursor;
use crate::error::{Result, SphinxQlError};
use crate::executor::BatchHandle;
use crate::observability::{global_metrics, EventLogger};
use log::Level;
use std::fmt;

const COMPONENT: &str = "MultiRowCursor";

type Rowset<B> = RowCursor<<B as BatchHandle>::Rowset>;

enum BatchState<B: BatchHandle> {
    /// Statements are opened one by one from the live batch handle.
    Unbuffered {
        handle: B,
        cursor: Option<usize>,
    },
    /// One buffered cursor per statement.
    Buffered {
        rowsets: Vec<Rowset<B>>,
        cursor: Option<usize>,
    },
}

/// Cursor over the results of a multi-statement batch, one [`RowCursor`]
/// per statement.
///
/// Walking the batch with [`MultiRowCursor::get_next`] streams statement by
/// statement. Indexed access, counting and rewinding need every statement
/// in memory and buffer the whole batch first: the raw handle cannot go
/// back.
pub struct MultiRowCursor<B: BatchHandle> {
    state: BatchState<B>,
    options: CursorOptions,
    logger: EventLogger,
}

impl<B: BatchHandle> MultiRowCursor<B> {
    pub fn new(handle: B) -> Result<Self> {
        Self::with_options(handle, CursorOptions::default())
    }

    /// Wraps a batch handle. In buffered mode (or `Auto` over a
    /// client-buffered handle) every statement is buffered right away.
    pub fn with_options(handle: B, options: CursorOptions) -> Result<Self> {
        let eager = options.fetch_mode.buffers_eagerly(handle.capabilities());
        let mut multi = Self {
            state: BatchState::Unbuffered {
                handle,
                cursor: None,
            },
            options,
            logger: EventLogger::new(options.log_events),
        };
        if eager {
            multi.store()?;
        }
        Ok(multi)
    }

    /// Rebuilds a batch from cursors that were already produced, buffering
    /// any that still stream.
    pub fn from_rowsets(mut rowsets: Vec<Rowset<B>>, options: CursorOptions) -> Result<Self> {
        for rowset in rowsets.iter_mut() {
            rowset.store()?;
        }
        Ok(Self {
            state: BatchState::Buffered {
                rowsets,
                cursor: None,
            },
            options,
            logger: EventLogger::new(options.log_events),
        })
    }

    pub fn is_buffered(&self) -> bool {
        matches!(self.state, BatchState::Buffered { .. })
    }

    /// The raw batch handle, until the batch is buffered.
    pub fn handle(&self) -> Option<&B> {
        match &self.state {
            BatchState::Unbuffered { handle, .. } => Some(handle),
            BatchState::Buffered { .. } => None,
        }
    }

    fn cursor(&self) -> Option<usize> {
        match &self.state {
            BatchState::Unbuffered { cursor, .. } | BatchState::Buffered { cursor, .. } => *cursor,
        }
    }

    /// Buffers every statement of the batch. Idempotent.
    ///
    /// Once `get_next` has opened a statement, the rows read through that
    /// cursor are gone from the handle, so re-reading needs a rewindable
    /// handle. Otherwise this fails with `ModeConflict`.
    pub fn store(&mut self) -> Result<()> {
        let logger = self.logger;
        match &mut self.state {
            BatchState::Buffered { .. } => return Ok(()),
            BatchState::Unbuffered { handle, cursor } => {
                if let Some(c) = *cursor {
                    if !handle.capabilities().rewindable {
                        global_metrics().record_mode_conflict();
                        logger.log_event(
                            Level::Warn,
                            COMPONENT,
                            "mode conflict",
                            &[("cursor", c.to_string())],
                        );
                        return Err(SphinxQlError::ModeConflict(format!(
                            "statement {} already opened from a forward-only batch, store() can't fetch all the data",
                            c
                        )));
                    }
                    observe(logger, handle.rewind())?;
                }
                *cursor = None;
            }
        }

        let mut rowsets = Vec::new();
        while let Some(mut rowset) = self.get_next()? {
            rowset.store()?;
            rowsets.push(rowset);
        }

        logger.log_transition(
            COMPONENT,
            "streaming",
            "buffered",
            &[("statements", rowsets.len().to_string())],
        );
        self.state = BatchState::Buffered {
            rowsets,
            cursor: None,
        };
        Ok(())
    }

    /// Buffers and returns one cursor per statement.
    pub fn stored(&mut self) -> Result<&[Rowset<B>]> {
        let (rowsets, _) = self.buffered()?;
        Ok(rowsets)
    }

    /// Next statement's cursor, `None` once the batch is exhausted.
    ///
    /// Buffered batches hand out snapshots of their cursors. Unbuffered
    /// batches open the current statement on the first call and advance the
    /// handle on every later one.
    pub fn get_next(&mut self) -> Result<Option<Rowset<B>>> {
        let options = self.options;
        let logger = self.logger;
        match &mut self.state {
            BatchState::Buffered { rowsets, cursor } => {
                let next = cursor.map_or(0, |c| c + 1).min(rowsets.len());
                *cursor = Some(next);
                match rowsets.get(next) {
                    Some(rowset) => rowset.snapshot().map(Some),
                    None => Ok(None),
                }
            }
            BatchState::Unbuffered { handle, cursor } => {
                // The first statement's result is available without advancing.
                if let Some(c) = *cursor {
                    let advanced = observe(logger, handle.next_rowset())?;
                    *cursor = Some(c + 1);
                    if !advanced {
                        return Ok(None);
                    }
                } else {
                    *cursor = Some(0);
                }
                let rowset = observe(logger, handle.current_rowset())?;
                RowCursor::with_options(rowset, options).map(Some)
            }
        }
    }

    /// Iterates the statements from the current position, streaming when the
    /// batch is not buffered.
    pub fn rowsets(&mut self) -> Rowsets<'_, B> {
        Rowsets {
            multi: self,
            done: false,
        }
    }

    /// Iterates the statements from the first one, buffering the batch.
    pub fn iter(&mut self) -> CursorIter<'_, Self> {
        CursorIter::new(self)
    }

    fn buffered(&mut self) -> Result<(&mut Vec<Rowset<B>>, &mut Option<usize>)> {
        self.store()?;
        match &mut self.state {
            BatchState::Buffered { rowsets, cursor } => Ok((rowsets, cursor)),
            BatchState::Unbuffered { .. } => Err(SphinxQlError::ModeConflict(
                "batch is not buffered".to_string(),
            )),
        }
    }
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

/// Streaming iterator over a batch's statements, backed by `get_next`.
pub struct Rowsets<'a, B: BatchHandle> {
    multi: &'a mut MultiRowCursor<B>,
    done: bool,
}

impl<B: BatchHandle> Iterator for Rowsets<'_, B> {
    type Item = Result<Rowset<B>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.multi.get_next() {
            Ok(Some(rowset)) => Some(Ok(rowset)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<B: BatchHandle> RandomAccess for MultiRowCursor<B> {
    type Item = Rowset<B>;

    fn contains_index(&mut self, index: usize) -> Result<bool> {
        let (rowsets, _) = self.buffered()?;
        Ok(index < rowsets.len())
    }

    fn get(&mut self, index: usize) -> Result<Rowset<B>> {
        let (rowsets, _) = self.buffered()?;
        let count = rowsets.len();
        rowsets
            .get(index)
            .ok_or(SphinxQlError::RowNotFound {
                index,
                row_count: count,
            })?
            .snapshot()
    }

    fn len(&mut self) -> Result<usize> {
        let (rowsets, _) = self.buffered()?;
        Ok(rowsets.len())
    }
}

impl<B: BatchHandle> ForwardCursor for MultiRowCursor<B> {
    type Item = Rowset<B>;

    /// Always buffers first: the raw handle cannot be rewound.
    fn rewind(&mut self) -> Result<()> {
        let (_, cursor) = self.buffered()?;
        *cursor = None;
        Ok(())
    }

    fn is_valid(&mut self) -> Result<bool> {
        let key = self.key();
        let (rowsets, _) = self.buffered()?;
        Ok(key < rowsets.len())
    }

    fn current(&mut self) -> Result<Rowset<B>> {
        let key = self.key();
        self.get(key)
    }

    fn key(&self) -> usize {
        self.cursor().unwrap_or(0)
    }

    fn advance(&mut self) -> Result<()> {
        let key = self.key();
        let (rowsets, cursor) = self.buffered()?;
        *cursor = Some((key + 1).min(rowsets.len()));
        Ok(())
    }
}

impl<B: BatchHandle> fmt::Debug for MultiRowCursor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("MultiRowCursor");
        match &self.state {
            BatchState::Unbuffered { cursor, .. } => {
                s.field("mode", &"streaming").field("cursor", cursor)
            }
            BatchState::Buffered { rowsets, cursor } => s
                .field("mode", &"buffered")
                .field("cursor", cursor)
                .field("rowsets", rowsets),
        };
        s.finish()
    }
}
