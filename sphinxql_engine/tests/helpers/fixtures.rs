/// Canned executor handles shared by the integration tests.
use sphinxql_engine::executor::{HandleCapabilities, MemoryBatch, MemoryRowset};
use sphinxql_engine::protocol::{RowBuffer, Value};

/// `SELECT id, name` returning `[[1,"a"],[2,"b"]]`.
pub fn two_row_select() -> RowBuffer {
    RowBuffer::new()
        .with_columns(["id", "name"])
        .with_row([Value::Int(1), Value::from("a")])
        .with_row([Value::Int(2), Value::from("b")])
}

/// `SELECT id, title, weight` with `count` generated rows.
pub fn select_rows(count: i64) -> RowBuffer {
    (0..count).fold(
        RowBuffer::new().with_columns(["id", "title", "weight"]),
        |buffer, i| {
            buffer.with_row([
                Value::Int(i),
                Value::from(format!("doc {}", i)),
                Value::Float(i as f64 / 2.0),
            ])
        },
    )
}

/// Batch of `SELECT` (2 rows), `UPDATE` (1 affected), `SELECT` (3 rows).
pub fn mixed_batch() -> MemoryBatch {
    MemoryBatch::from_buffers([
        RowBuffer::new()
            .with_columns(["id"])
            .with_row([Value::Int(1)])
            .with_row([Value::Int(2)]),
        RowBuffer::affected(1),
        RowBuffer::new()
            .with_columns(["id", "title"])
            .with_row([Value::Int(10), Value::from("alpha")])
            .with_row([Value::Int(11), Value::from("beta")])
            .with_row([Value::Int(12), Value::from("gamma")]),
    ])
}

/// Server-side cursor: no client buffer, no seeking.
pub fn forward_only(buffer: RowBuffer) -> MemoryRowset {
    MemoryRowset::new(buffer).with_capabilities(HandleCapabilities::forward_only())
}

/// Server-side cursor that can seek.
pub fn rewindable(buffer: RowBuffer) -> MemoryRowset {
    MemoryRowset::new(buffer)
        .with_capabilities(HandleCapabilities::forward_only().with_rewind(true))
}
