//! Tests for navigation over a server-side scrollable cursor
//!
//! Every scenario runs with and without a max rows cap (the cursor then has
//! more rows than the cap) and with and without a server-reported row count.

mod common;

use common::*;
use firebird_fetch::{CompletionReason, Error, Fetcher};
use rstest::rstest;

/// Cap for a scenario expecting `rows` visible rows, and the cursor size
fn capped(rows: i32, extra: i32, with_max_rows: bool) -> (i32, usize) {
    if with_max_rows {
        (rows + extra, rows as usize)
    } else {
        (rows, 0)
    }
}

mod first_last_tests {
    use super::*;

    #[rstest]
    fn test_first_no_rows(#[values(false, true)] with_max_rows: bool, #[values(false, true)] reports: bool) {
        let (mut fetcher, listener) =
            scroll_fetcher(0, FETCH_SIZE_NOT_IMPORTANT, if with_max_rows { 5 } else { 0 }, reports);
        assert_before_first(&fetcher);

        assert!(!fetcher.first().unwrap(), "expected no first row");
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 0);
    }

    #[rstest]
    fn test_first_from_row(
        #[values(0, 1, 2, 5, 10)] initial_row: i32,
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(initial_row.max(5), 5, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, reports);
        assert_before_first(&fetcher);

        if initial_row != 0 {
            assert!(fetcher.absolute(initial_row.into()).unwrap(), "expected move to row");
            assert_at_row(&fetcher, initial_row as usize);
            listener.clear_rows();
        }

        assert!(fetcher.first().unwrap(), "expected first row");
        assert_at_row(&fetcher, 1);
        assert!(fetcher.is_first().unwrap());
        assert!(!fetcher.is_last().unwrap());
        assert_row_value(&listener, 0, 1);
    }

    #[rstest]
    fn test_last_no_rows(#[values(false, true)] with_max_rows: bool, #[values(false, true)] reports: bool) {
        let (mut fetcher, listener) =
            scroll_fetcher(0, FETCH_SIZE_NOT_IMPORTANT, if with_max_rows { 5 } else { 0 }, reports);
        assert_before_first(&fetcher);

        assert!(!fetcher.last().unwrap(), "expected no last row");
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 0);
    }

    #[rstest]
    fn test_last_from_row(
        #[values(0, 1, 2, 5, 10)] initial_row: i32,
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let number_of_rows = initial_row.max(5);
        let (count, max_rows) = capped(number_of_rows, 5, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, reports);
        assert_before_first(&fetcher);

        if initial_row != 0 {
            assert!(fetcher.absolute(initial_row.into()).unwrap(), "expected move to row");
            assert_at_row(&fetcher, initial_row as usize);
            listener.clear_rows();
        }

        assert!(fetcher.last().unwrap(), "expected last row");
        assert_at_row(&fetcher, number_of_rows as usize);
        assert!(!fetcher.is_first().unwrap());
        assert!(fetcher.is_last().unwrap());
        assert_row_value(&listener, 0, number_of_rows);
    }

    #[rstest]
    fn test_first_last_first_single_row(
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(1, 4, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, reports);
        assert_before_first(&fetcher);

        assert!(fetcher.first().unwrap());
        assert_at_row(&fetcher, 1);
        assert!(fetcher.is_first().unwrap());
        assert!(fetcher.is_last().unwrap());
        assert_row_value(&listener, 0, 1);

        assert!(fetcher.last().unwrap());
        assert_at_row(&fetcher, 1);
        assert!(fetcher.is_first().unwrap());
        assert!(fetcher.is_last().unwrap());
        assert_row_value(&listener, 1, 1);

        assert!(fetcher.first().unwrap());
        assert_at_row(&fetcher, 1);
        assert!(fetcher.is_first().unwrap());
        assert!(fetcher.is_last().unwrap());
        assert_row_value(&listener, 2, 1);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0)]
    #[case(7, 0)]
    #[case(7, 3)]
    #[case(3, 7)]
    fn test_last_lands_on_effective_count(#[case] count: i32, #[case] max_rows: usize) {
        let (mut fetcher, _) = scroll_fetcher(count, 2, max_rows, false);
        let expected = if max_rows > 0 { (count as usize).min(max_rows) } else { count as usize };

        assert_eq!(fetcher.last().unwrap(), expected > 0);
        assert_eq!(fetcher.row_num().unwrap(), expected);
        assert_eq!(fetcher.size().unwrap(), expected);
    }

    #[rstest]
    fn test_absolute_minus_one_equals_last(#[values(1, 4, 9)] count: i32) {
        let (mut by_last, last_listener) = scroll_fetcher(count, 3, 0, false);
        let (mut by_absolute, absolute_listener) = scroll_fetcher(count, 3, 0, false);

        assert!(by_last.last().unwrap());
        assert!(by_absolute.absolute(-1).unwrap());
        assert_eq!(by_last.row_num().unwrap(), by_absolute.row_num().unwrap());
        assert_eq!(last_listener.rows(), absolute_listener.rows());
    }

    #[rstest]
    fn test_first_then_previous(#[values(0, 1, 5)] count: i32) {
        let (mut fetcher, _) = scroll_fetcher(count, 3, 0, true);
        fetcher.first().unwrap();
        assert!(!fetcher.previous().unwrap());
        assert_before_first(&fetcher);
    }
}

mod next_previous_tests {
    use super::*;

    #[rstest]
    fn test_next_no_rows(#[values(false, true)] with_max_rows: bool, #[values(false, true)] reports: bool) {
        let (mut fetcher, listener) =
            scroll_fetcher(0, FETCH_SIZE_NOT_IMPORTANT, if with_max_rows { 5 } else { 0 }, reports);
        assert_before_first(&fetcher);

        assert!(!fetcher.next().unwrap(), "expected no next row");
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 0);
    }

    #[rstest]
    fn test_next_to_end(
        #[values(1, 3, 5, 10)] fetch_size: usize,
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(5, 5, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, fetch_size, max_rows, reports);
        assert_before_first(&fetcher);

        for row in 1..=5 {
            assert!(fetcher.next().unwrap(), "expected next row {row}");
            assert_at_row(&fetcher, row as usize);
            assert_eq!(fetcher.is_first().unwrap(), row == 1, "is_first at row {row}");
            assert_eq!(fetcher.is_last().unwrap(), row == 5, "is_last at row {row}");
            assert_row_value(&listener, row as usize - 1, row);
        }

        assert!(!fetcher.next().unwrap(), "expected no more rows");
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 5);
    }

    #[rstest]
    fn test_next_only_with_max_rows_finds_row(#[values(false, true)] reports: bool) {
        let (mut fetcher, listener) = scroll_fetcher(5, 5, 2, reports);

        assert!(fetcher.next().unwrap(), "expected row 1");
        assert_at_row(&fetcher, 1);
        assert!(fetcher.is_first().unwrap());
        assert!(!fetcher.is_last().unwrap());
        assert_row_value(&listener, 0, 1);

        assert!(fetcher.next().unwrap(), "expected row 2");
        assert_at_row(&fetcher, 2);
        assert!(!fetcher.is_first().unwrap());
        assert!(fetcher.is_last().unwrap());
        assert_row_value(&listener, 1, 2);

        assert!(!fetcher.next().unwrap(), "expected no more rows");
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 2);
    }

    #[rstest]
    fn test_previous_from_end_no_rows(
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (mut fetcher, listener) =
            scroll_fetcher(0, FETCH_SIZE_NOT_IMPORTANT, if with_max_rows { 5 } else { 0 }, reports);
        assert_before_first(&fetcher);

        fetcher.after_last().unwrap();
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 0);

        assert!(!fetcher.previous().unwrap(), "expected no previous row");
        assert_before_first(&fetcher);
        assert_row_to_none(&listener, 1);
    }

    #[rstest]
    fn test_previous_from_end_to_start(
        #[values(1, 3, 5, 10)] fetch_size: usize,
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(5, 5, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, fetch_size, max_rows, reports);
        assert_before_first(&fetcher);

        fetcher.after_last().unwrap();
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 0);
        listener.clear_rows();

        for row in (1..=5).rev() {
            assert!(fetcher.previous().unwrap(), "expected previous row {row}");
            assert_at_row(&fetcher, row as usize);
            assert_eq!(fetcher.is_first().unwrap(), row == 1, "is_first at row {row}");
            assert_eq!(fetcher.is_last().unwrap(), row == 5, "is_last at row {row}");
            assert_row_value(&listener, 5 - row as usize, row);
        }

        assert!(!fetcher.previous().unwrap(), "expected no more rows");
        assert_before_first(&fetcher);
        assert_row_to_none(&listener, 5);
    }

    #[rstest]
    fn test_next_previous_combinations(
        #[values(1, 3, 5, 7, 10, 20)] fetch_size: usize,
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(20, 10, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, fetch_size, max_rows, reports);
        assert_before_first(&fetcher);

        let mut received = 0;
        let mut row = 0;
        let mut step = |fetcher: &mut TestFetcher, row: i32, forward: bool| {
            let moved = if forward { fetcher.next() } else { fetcher.previous() };
            assert!(moved.unwrap(), "expected row {row}");
            assert_at_row(&*fetcher, row as usize);
            assert_row_value(&listener, received, row);
            received += 1;
        };

        while row < 7 {
            row += 1;
            step(&mut fetcher, row, true);
        }
        while row > 3 {
            row -= 1;
            step(&mut fetcher, row, false);
        }
        while row < 20 {
            row += 1;
            step(&mut fetcher, row, true);
        }
        while row > 1 {
            row -= 1;
            step(&mut fetcher, row, false);
        }
        while row < 20 {
            row += 1;
            step(&mut fetcher, row, true);
        }
    }
}

mod absolute_relative_tests {
    use super::*;

    #[rstest]
    fn test_absolute_various_positions(
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(10, 10, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, reports);
        assert_before_first(&fetcher);

        assert!(fetcher.absolute(5).unwrap());
        assert_at_row(&fetcher, 5);
        assert_row_value(&listener, 0, 5);

        assert!(fetcher.absolute(2).unwrap());
        assert_at_row(&fetcher, 2);
        assert_row_value(&listener, 1, 2);

        assert!(fetcher.absolute(-7).unwrap(), "expected row -7 (== 4)");
        assert_at_row(&fetcher, 4);
        assert_row_value(&listener, 2, 4);

        assert!(!fetcher.absolute(0).unwrap());
        assert_before_first(&fetcher);
        assert_row_to_none(&listener, 3);

        assert!(!fetcher.absolute(11).unwrap());
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 4);

        assert!(!fetcher.absolute(-11).unwrap());
        assert_before_first(&fetcher);
        assert_row_to_none(&listener, 5);
    }

    #[rstest]
    fn test_relative_various_positions(
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(10, 10, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, reports);
        assert_before_first(&fetcher);

        assert!(!fetcher.relative(0).unwrap());
        assert_before_first(&fetcher);
        assert_row_to_none(&listener, 0);

        assert!(fetcher.relative(5).unwrap());
        assert_at_row(&fetcher, 5);
        assert_row_value(&listener, 1, 5);

        assert!(fetcher.relative(-1).unwrap());
        assert_at_row(&fetcher, 4);
        assert_row_value(&listener, 2, 4);

        assert!(fetcher.relative(3).unwrap());
        assert_at_row(&fetcher, 7);
        assert_row_value(&listener, 3, 7);

        assert!(fetcher.relative(-6).unwrap());
        assert_at_row(&fetcher, 1);
        assert_row_value(&listener, 4, 1);

        assert!(!fetcher.relative(-1).unwrap());
        assert_before_first(&fetcher);
        assert_row_to_none(&listener, 5);

        assert!(fetcher.relative(10).unwrap());
        assert_at_row(&fetcher, 10);
        assert_row_value(&listener, 6, 10);

        assert!(!fetcher.relative(1).unwrap());
        assert_after_last(&fetcher);
        assert_row_to_none(&listener, 7);

        assert!(fetcher.relative(-2).unwrap());
        assert_at_row(&fetcher, 9);
        assert_row_value(&listener, 8, 9);
    }

    #[rstest]
    fn test_round_trip_from_first_row(#[values(false, true)] reports: bool) {
        let (mut fetcher, listener) = scroll_fetcher(10, 3, 0, reports);
        let steps: [(i64, Option<i32>); 9] = [
            (5, Some(6)),
            (-1, Some(5)),
            (3, Some(8)),
            (-6, Some(2)),
            (-1, Some(1)),
            (-1, None),
            (10, Some(10)),
            (1, None),
            (-2, Some(9)),
        ];

        assert!(fetcher.first().unwrap());
        assert_row_value(&listener, 0, 1);

        for (index, (offset, expected)) in steps.into_iter().enumerate() {
            assert_eq!(fetcher.relative(offset).unwrap(), expected.is_some(), "relative({offset})");
            match expected {
                Some(id) => {
                    assert_at_row(&fetcher, id as usize);
                    assert_row_value(&listener, index + 1, id);
                }
                None => assert_row_to_none(&listener, index + 1),
            }
        }
    }

    #[rstest]
    fn test_relative_zero_keeps_row_without_fetch(#[values(false, true)] reports: bool) {
        let (mut fetcher, listener) = scroll_fetcher(5, 2, 0, reports);
        fetcher.absolute(3).unwrap();
        let fetches = fetcher.cursor().fetch_count();

        assert!(fetcher.relative(0).unwrap());
        assert_at_row(&fetcher, 3);
        assert_eq!(listener.row(0), listener.row(1));
        assert_eq!(fetcher.cursor().fetch_count(), fetches);
    }

    #[rstest]
    fn test_repeated_absolute_is_idempotent(#[values(1, 4, -2)] row: i64) {
        let (mut fetcher, listener) = scroll_fetcher(6, 2, 0, true);
        assert!(fetcher.absolute(row).unwrap());
        let fetches = fetcher.cursor().fetch_count();
        let position = fetcher.position();

        assert!(fetcher.absolute(row).unwrap());
        assert_eq!(fetcher.position(), position);
        assert_eq!(listener.row(0), listener.row(1));
        assert_eq!(fetcher.cursor().fetch_count(), fetches);
    }
}

mod boundary_tests {
    use super::*;

    #[rstest]
    fn test_before_first(#[values(0, 5)] row_count: i32, #[values(false, true)] with_max_rows: bool) {
        let count = row_count + if with_max_rows && row_count != 0 { 5 } else { 0 };
        let max_rows = if with_max_rows { row_count.max(1) as usize } else { 0 };
        let (mut fetcher, _) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, true);
        assert_before_first(&fetcher);

        fetcher.next().unwrap();
        assert!(!fetcher.is_before_first().unwrap());

        fetcher.before_first().unwrap();
        assert_before_first(&fetcher);
    }

    #[rstest]
    fn test_after_last(#[values(0, 5)] row_count: i32, #[values(false, true)] with_max_rows: bool) {
        let count = row_count + if with_max_rows && row_count != 0 { 5 } else { 0 };
        let max_rows = if with_max_rows { row_count.max(1) as usize } else { 0 };
        let (mut fetcher, _) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, true);
        assert_before_first(&fetcher);

        fetcher.after_last().unwrap();
        assert_after_last(&fetcher);
        let fetches = fetcher.cursor().fetch_count();
        assert_eq!(fetches, 0, "after_last does not fetch");

        fetcher.previous().unwrap();
        assert!(!fetcher.is_after_last().unwrap());
    }

    #[rstest]
    fn test_is_empty_no_rows(#[values(false, true)] with_max_rows: bool, #[values(false, true)] reports: bool) {
        let (mut fetcher, listener) =
            scroll_fetcher(0, FETCH_SIZE_NOT_IMPORTANT, if with_max_rows { 5 } else { 0 }, reports);
        assert_before_first(&fetcher);
        assert!(fetcher.is_empty().unwrap());
        assert!(listener.is_empty());
    }

    #[rstest]
    fn test_is_empty_with_rows(
        #[values(1, 10)] row_count: i32,
        #[values(false, true)] with_max_rows: bool,
        #[values(false, true)] reports: bool,
    ) {
        let (count, max_rows) = capped(row_count, 5, with_max_rows);
        let (mut fetcher, listener) = scroll_fetcher(count, FETCH_SIZE_NOT_IMPORTANT, max_rows, reports);
        assert!(!fetcher.is_empty().unwrap());
        assert_before_first(&fetcher);
        assert!(listener.is_empty());

        assert!(fetcher.next().unwrap());
        assert_row_value(&listener, 0, 1);
    }
}

mod failure_tests {
    use super::*;

    fn server_error() -> Error {
        Error::server(335544364, "request synchronization error")
    }

    fn connection_reset() -> Error {
        Error::Protocol("connection reset".to_string())
    }

    #[rstest]
    fn test_fetch_failure_keeps_state(
        #[values(false, true)] reports: bool,
        #[values(server_error(), connection_reset())] failure: Error,
    ) {
        let (mut fetcher, listener) = scroll_fetcher(10, 3, 0, reports);
        fetcher.absolute(4).unwrap();
        listener.clear_rows();

        fetcher.cursor_mut().fail_next_fetch(failure);
        let err = fetcher.absolute(8).unwrap_err();
        assert!(err.is_recoverable());
        assert!(!err.is_closed());
        assert_at_row(&fetcher, 4);
        assert!(listener.is_empty());

        assert!(fetcher.absolute(8).unwrap());
        assert_row_value(&listener, 0, 8);
    }

    #[test]
    fn test_next_after_failure_resynchronizes() {
        let (mut fetcher, listener) = scroll_fetcher(10, 3, 0, true);
        fetcher.next().unwrap();
        fetcher.next().unwrap();
        fetcher.next().unwrap();

        fetcher.cursor_mut().fail_next_fetch(server_error());
        assert!(matches!(fetcher.next(), Err(Error::ServerError { code: 335544364, .. })));
        assert_at_row(&fetcher, 3);

        for row in 4..=10 {
            assert!(fetcher.next().unwrap());
            assert_row_value(&listener, row as usize - 1, row);
        }
        assert!(!fetcher.next().unwrap());
    }

    #[test]
    fn test_closed_fetcher_fails_distinctly() {
        let (mut fetcher, listener) = scroll_fetcher(3, 2, 0, true);
        fetcher.next().unwrap();
        fetcher.close(CompletionReason::TransactionEnd).unwrap();

        assert!(listener.is_closed());
        assert!(fetcher.cursor().is_closed());
        for result in [
            fetcher.first(),
            fetcher.last(),
            fetcher.next(),
            fetcher.previous(),
            fetcher.absolute(1),
            fetcher.relative(1),
            fetcher.is_last(),
            fetcher.is_empty(),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(err, Error::ResultSetClosed));
            assert!(err.is_closed());
            assert!(!err.is_recoverable());
        }
        assert!(matches!(fetcher.before_first(), Err(Error::ResultSetClosed)));
        assert!(matches!(fetcher.size(), Err(Error::ResultSetClosed)));
    }
}
