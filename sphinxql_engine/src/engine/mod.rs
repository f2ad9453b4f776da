pub mod access;
pub mod multi_row_cursor;
pub mod options;
pub mod row_cursor;

pub use access::{CursorIter, ForwardCursor, RandomAccess};
pub use multi_row_cursor::{MultiRowCursor, Rowsets};
pub use options::{CursorOptions, FetchMode, FETCH_MODE_ENV, LOG_EVENTS_ENV};
pub use row_cursor::RowCursor;
