pub mod engine;
mod error;
pub mod executor;
pub mod observability;
pub mod protocol;

pub use engine::{
    CursorIter, CursorOptions, FetchMode, ForwardCursor, MultiRowCursor, RandomAccess, RowCursor,
};
pub use error::{ErrorCategory, Result, SphinxQlError};
pub use executor::{BatchHandle, HandleCapabilities, MemoryBatch, MemoryRowset, RowsetHandle};
pub use protocol::{ColumnMeta, Materialized, NamedRow, Row, RowBuffer, Stored, Value};
