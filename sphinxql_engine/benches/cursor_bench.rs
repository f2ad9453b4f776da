use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sphinxql_engine::engine::{CursorOptions, MultiRowCursor, RandomAccess, RowCursor};
use sphinxql_engine::executor::{HandleCapabilities, MemoryBatch, MemoryRowset};
use sphinxql_engine::protocol::{RowBuffer, Value};

fn documents(count: i64) -> RowBuffer {
    (0..count).fold(
        RowBuffer::new().with_columns(["id", "title", "weight"]),
        |buffer, i| {
            buffer.with_row([
                Value::Int(i),
                Value::from(format!("document {}", i)),
                Value::Float(i as f64 * 0.25),
            ])
        },
    )
}

fn quiet(options: CursorOptions) -> CursorOptions {
    options.with_log_events(false)
}

fn benchmark_buffered_iteration(c: &mut Criterion) {
    let handle = MemoryRowset::new(documents(1000));
    c.bench_function("buffered_iterate_1000_rows", |b| {
        b.iter(|| {
            let mut cursor =
                RowCursor::with_options(handle.clone(), quiet(CursorOptions::buffered())).unwrap();
            black_box(cursor.rows().filter_map(|r| r.ok()).count())
        });
    });
}

fn benchmark_streamed_iteration(c: &mut Criterion) {
    let handle = MemoryRowset::new(documents(1000))
        .with_capabilities(HandleCapabilities::forward_only());
    c.bench_function("streamed_iterate_1000_rows", |b| {
        b.iter(|| {
            let mut cursor =
                RowCursor::with_options(handle.clone(), quiet(CursorOptions::streaming()))
                    .unwrap();
            let mut seen = 0;
            while cursor.has_next_row() {
                cursor.to_next_row().unwrap();
                if let Ok(row) = cursor.fetch_row_as_list() {
                    black_box(&row);
                    seen += 1;
                }
            }
            black_box(seen)
        });
    });
}

fn benchmark_fetch_all_as_maps(c: &mut Criterion) {
    let handle = MemoryRowset::new(documents(1000));
    c.bench_function("fetch_all_as_maps_1000_rows", |b| {
        b.iter(|| {
            let mut cursor =
                RowCursor::with_options(handle.clone(), quiet(CursorOptions::streaming()))
                    .unwrap();
            black_box(cursor.fetch_all_as_maps().unwrap().len())
        });
    });
}

fn benchmark_batch_buffering(c: &mut Criterion) {
    let batch = MemoryBatch::from_buffers([
        documents(200),
        RowBuffer::affected(50),
        documents(200),
        documents(200),
    ]);
    c.bench_function("batch_store_4_statements", |b| {
        b.iter(|| {
            let mut multi =
                MultiRowCursor::with_options(batch.clone(), quiet(CursorOptions::buffered()))
                    .unwrap();
            black_box(multi.len().unwrap())
        });
    });
}

criterion_group!(
    benches,
    benchmark_buffered_iteration,
    benchmark_streamed_iteration,
    benchmark_fetch_all_as_maps,
    benchmark_batch_buffering
);
criterion_main!(benches);
