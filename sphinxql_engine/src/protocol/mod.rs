pub mod multi_result;
pub mod row_buffer;
pub mod types;

pub use multi_result::{Materialized, Stored};
pub use row_buffer::RowBuffer;
pub use types::{name_row, ColumnMeta, NamedRow, Row, Value};
