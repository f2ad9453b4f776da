/// MultiRowCursor over mixed statement batches.
use sphinxql_engine::engine::{CursorOptions, ForwardCursor, MultiRowCursor, RandomAccess};
use sphinxql_engine::executor::{HandleCapabilities, MemoryBatch};
use sphinxql_engine::protocol::{RowBuffer, Stored, Value};
use sphinxql_engine::SphinxQlError;

mod helpers;
use helpers::{init_test_logger, mixed_batch};

fn streaming(batch: MemoryBatch) -> MultiRowCursor<MemoryBatch> {
    MultiRowCursor::with_options(batch, CursorOptions::streaming()).unwrap()
}

#[test]
fn test_mixed_batch_indexed_access() {
    init_test_logger();
    let mut multi = MultiRowCursor::new(mixed_batch()).unwrap();
    assert_eq!(multi.len().unwrap(), 3);
    assert_eq!(multi.get(1).unwrap().affected_rows(), 1);

    let maps = multi.get(2).unwrap().fetch_all_as_maps().unwrap();
    assert_eq!(maps.len(), 3);
    assert_eq!(maps[0]["id"], Value::Int(10));
    assert_eq!(maps[2]["title"], Value::from("gamma"));

    assert!(multi.contains_index(2).unwrap());
    assert!(!multi.contains_index(3).unwrap());
    assert_eq!(
        multi.get(3).unwrap_err(),
        SphinxQlError::RowNotFound {
            index: 3,
            row_count: 3
        }
    );
}

#[test]
fn test_streaming_batch_indexed_access_buffers_first() {
    let mut multi = streaming(mixed_batch());
    assert!(!multi.is_buffered());
    assert_eq!(multi.len().unwrap(), 3);
    assert!(multi.is_buffered());
    assert_eq!(multi.get(0).unwrap().row_count(), 2);
}

#[test]
fn test_store_after_second_get_next_conflicts() {
    init_test_logger();
    let mut multi = streaming(mixed_batch());
    multi.get_next().unwrap();
    multi.get_next().unwrap();

    assert!(matches!(
        multi.store(),
        Err(SphinxQlError::ModeConflict(_))
    ));
    assert!(matches!(
        multi.len(),
        Err(SphinxQlError::ModeConflict(_))
    ));

    // Streaming still works after the refused store.
    let last = multi.get_next().unwrap().unwrap();
    assert_eq!(last.row_count(), 3);
    assert!(multi.get_next().unwrap().is_none());
}

#[test]
fn test_store_is_idempotent() {
    let mut multi = streaming(mixed_batch());
    multi.store().unwrap();
    let first: Vec<_> = multi
        .stored()
        .unwrap()
        .iter()
        .map(|r| (r.row_count(), r.affected_rows()))
        .collect();
    multi.store().unwrap();
    let second: Vec<_> = multi
        .stored()
        .unwrap()
        .iter()
        .map(|r| (r.row_count(), r.affected_rows()))
        .collect();
    assert_eq!(first, vec![(2, 0), (0, 1), (3, 0)]);
    assert_eq!(first, second);
}

#[test]
fn test_iteration_visits_each_statement_once() {
    let mut multi = streaming(mixed_batch());

    let mut counts = Vec::new();
    multi.rewind().unwrap();
    while multi.is_valid().unwrap() {
        assert_eq!(multi.key(), counts.len());
        let mut rowset = multi.current().unwrap();
        counts.push(rowset.len().unwrap());
        multi.advance().unwrap();
    }
    assert_eq!(counts, vec![2, 0, 3]);

    let again: Vec<usize> = multi
        .iter()
        .map(|r| r.unwrap().row_count())
        .collect();
    assert_eq!(again, vec![2, 0, 3]);
}

#[test]
fn test_rowsets_stream_without_buffering() {
    let mut multi = streaming(mixed_batch());
    let mut shapes = Vec::new();
    for rowset in multi.rowsets() {
        let mut rowset = rowset.unwrap();
        shapes.push(rowset.stored().unwrap());
    }
    assert!(!multi.is_buffered());
    assert_eq!(shapes.len(), 3);
    assert_eq!(shapes[1], Stored::AffectedRows(1));
    match &shapes[2] {
        Stored::Rows(rows) => assert_eq!(rows.len(), 3),
        other => panic!("expected rows, got {:?}", other),
    }
}

#[test]
fn test_mutation_through_index_is_rejected() {
    let mut multi = MultiRowCursor::new(mixed_batch()).unwrap();
    let replacement = multi.get(0).unwrap();

    assert!(matches!(
        multi.set(1, replacement),
        Err(SphinxQlError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        multi.remove(0),
        Err(SphinxQlError::UnsupportedOperation(_))
    ));
    assert_eq!(multi.len().unwrap(), 3);
    assert_eq!(multi.get(1).unwrap().affected_rows(), 1);
}

#[test]
fn test_advance_failure_propagates() {
    init_test_logger();
    let mut multi = streaming(mixed_batch().fail_advance_to(2));
    assert!(multi.get_next().unwrap().is_some());
    assert!(multi.get_next().unwrap().is_some());

    let err = multi.get_next().unwrap_err();
    assert!(err.is_executor_error());
    assert_eq!(err.native_code(), 1064);
    assert_eq!(multi.handle().map(|h| h.current_index()), Some(1));

    let eager = MultiRowCursor::with_options(
        mixed_batch().fail_advance_to(1),
        CursorOptions::buffered(),
    );
    assert!(eager.unwrap_err().is_executor_error());
}

#[test]
fn test_rewindable_batch_can_buffer_late() {
    let batch =
        mixed_batch().with_capabilities(HandleCapabilities::forward_only().with_rewind(true));
    let mut multi = streaming(batch);
    while multi.get_next().unwrap().is_some() {}
    multi.store().unwrap();
    assert_eq!(multi.len().unwrap(), 3);
    assert_eq!(multi.get(2).unwrap().row_count(), 3);
}

#[test]
fn test_empty_batch() {
    // Opening statement 0 of an empty batch is an executor failure.
    let err = MultiRowCursor::new(MemoryBatch::new(Vec::new())).unwrap_err();
    assert!(err.is_executor_error());

    let mut single = MultiRowCursor::new(MemoryBatch::from_buffers([RowBuffer::affected(0)]))
        .unwrap();
    assert_eq!(single.len().unwrap(), 1);
    assert_eq!(single.iter().count(), 1);
}
