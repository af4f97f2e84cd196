//! Shared fixtures for fetcher integration tests

#![allow(dead_code)]

use firebird_fetch::{Fetcher, MemoryCursor, RecordingListener, RowValue, ServerScrollFetcher};

/// Fetch size for tests where it does not influence the outcome
pub const FETCH_SIZE_NOT_IMPORTANT: usize = 10;

/// Row with a single big-endian `INTEGER` id column
pub fn id_row(id: i32) -> RowValue {
    RowValue::of([Some(id.to_be_bytes())])
}

/// Rows with ids `1..=count`
pub fn id_rows(count: i32) -> Vec<RowValue> {
    (1..=count).map(id_row).collect()
}

/// Id stored in a row created by [`id_row`]
pub fn extract_id(row: &RowValue) -> i32 {
    let data = row.field_data(0).expect("id column is not NULL");
    i32::from_be_bytes(data[..4].try_into().expect("4 byte id"))
}

/// Cursor over `count` id rows, optionally without a reported row count
pub fn id_cursor(count: i32, reports_row_count: bool) -> MemoryCursor {
    MemoryCursor::new(id_rows(count))
        .with_column_count(1)
        .with_row_count_reporting(reports_row_count)
}

pub type TestFetcher = ServerScrollFetcher<MemoryCursor, RecordingListener>;

/// Server scroll fetcher over `count` id rows
pub fn scroll_fetcher(
    count: i32,
    fetch_size: usize,
    max_rows: usize,
    reports_row_count: bool,
) -> (TestFetcher, RecordingListener) {
    let listener = RecordingListener::new();
    let fetcher = ServerScrollFetcher::new(
        id_cursor(count, reports_row_count),
        fetch_size,
        Some(max_rows),
        listener.clone(),
    )
    .expect("scrollable cursor");
    (fetcher, listener)
}

pub fn assert_before_first(fetcher: &impl Fetcher) {
    assert!(fetcher.is_before_first().unwrap(), "expected before-first");
    assert!(!fetcher.is_after_last().unwrap(), "expected not after-last");
    assert_eq!(fetcher.row_num().unwrap(), 0, "expected no row number");
    assert!(fetcher.current_row().is_none());
}

pub fn assert_after_last(fetcher: &impl Fetcher) {
    assert!(!fetcher.is_before_first().unwrap(), "expected not before-first");
    assert!(fetcher.is_after_last().unwrap(), "expected after-last");
    assert_eq!(fetcher.row_num().unwrap(), 0, "expected no row number");
    assert!(fetcher.current_row().is_none());
}

pub fn assert_at_row(fetcher: &impl Fetcher, row: usize) {
    assert!(!fetcher.is_before_first().unwrap(), "expected not before-first");
    assert!(!fetcher.is_after_last().unwrap(), "expected not after-last");
    assert_eq!(fetcher.row_num().unwrap(), row, "unexpected row number");
}

/// Notification `index` reported the row with id `expected`
pub fn assert_row_value(listener: &RecordingListener, index: usize, expected: i32) {
    let row = listener
        .row(index)
        .unwrap_or_else(|| panic!("no notification {index}, got {}", listener.len()))
        .unwrap_or_else(|| panic!("notification {index} was a boundary"));
    assert_eq!(extract_id(&row), expected, "unexpected row in notification {index}");
}

/// Notification `index` reported a move to a boundary
pub fn assert_row_to_none(listener: &RecordingListener, index: usize) {
    let row = listener
        .row(index)
        .unwrap_or_else(|| panic!("no notification {index}, got {}", listener.len()));
    assert!(row.is_none(), "expected notification {index} to be a boundary, got {row:?}");
}
