//! Fetcher over a server-side scrollable cursor
//!
//! [`ServerScrollFetcher`] keeps only the rows of its most recent fetch in
//! memory. Moving within that window costs nothing; moving outside it costs
//! one or two round trips:
//!
//! - `next` and `previous` fetch a full window (`Next` or `Prior` of fetch
//!   size rows) adjacent to the target row, after repositioning the server
//!   cursor if it is not where the fetch must start;
//! - `first`, `last`, `absolute` and `relative` fetch the single target row.
//!
//! The cursor size is learned lazily: from the server when it can report it,
//! otherwise by fetching to the end. A max rows cap makes the cursor look as
//! if it ends at the cap.

use crate::config::FetchConfig;
use crate::constants::{CompletionReason, DEFAULT_FETCH_ROWS};
use crate::cursor::{FetchRequest, ScrollResult, ServerCursor};
use crate::error::{Error, Result};
use crate::listener::FetcherListener;
use crate::row::RowValue;

use super::window::FetchWindow;
use super::{Fetcher, Position};

/// Scrollable fetcher backed by a server cursor.
///
/// # Example
///
/// ```rust
/// use firebird_fetch::{Fetcher, MemoryCursor, RowValue, ServerScrollFetcher};
///
/// # fn example() -> firebird_fetch::Result<()> {
/// let rows = (1..=10).map(|i: i32| RowValue::of([Some(i.to_be_bytes())])).collect();
/// let mut fetcher = ServerScrollFetcher::new(MemoryCursor::new(rows), 3, None, ())?;
///
/// assert!(fetcher.absolute(-2)?);
/// assert_eq!(fetcher.row_num()?, 9);
/// assert!(fetcher.relative(-8)?);
/// assert!(fetcher.is_first()?);
/// assert!(!fetcher.relative(-1)?);
/// assert!(fetcher.is_before_first()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ServerScrollFetcher<C, L = ()> {
    cursor: C,
    listener: L,
    fetch_size: usize,
    max_rows: Option<usize>,
    closed: bool,
    /// Number of rows visible through this fetcher (capped by max rows)
    cursor_size: Option<usize>,
    /// Number of rows of the server cursor
    server_cursor_size: Option<usize>,
    /// Server cursor position, `None` after a failed or unpredictable fetch
    server_position: Option<usize>,
    position: Position,
    current_row: Option<RowValue>,
    window: FetchWindow,
}

impl<C: ServerCursor, L: FetcherListener> ServerScrollFetcher<C, L> {
    /// Create a fetcher over a freshly executed scrollable cursor
    ///
    /// A `fetch_size` of 0 uses [`DEFAULT_FETCH_ROWS`]. A `max_rows` of
    /// `None` or `Some(0)` means no cap.
    pub fn new(cursor: C, fetch_size: usize, max_rows: Option<usize>, listener: L) -> Result<Self> {
        if !cursor.is_scrollable() {
            return Err(Error::FeatureNotSupported(
                "cursor is not a server-side scrollable cursor".to_string(),
            ));
        }
        Ok(Self {
            cursor,
            listener,
            fetch_size,
            max_rows: max_rows.filter(|&max_rows| max_rows > 0),
            closed: false,
            cursor_size: None,
            server_cursor_size: None,
            server_position: Some(0),
            position: Position::BeforeFirst,
            current_row: None,
            window: FetchWindow::default(),
        })
    }

    /// Create a fetcher using the fetch size and max rows of `config`
    pub fn with_config(cursor: C, config: &FetchConfig, listener: L) -> Result<Self> {
        Self::new(cursor, config.fetch_size, config.max_rows, listener)
    }

    /// Get the underlying cursor
    pub fn cursor(&self) -> &C {
        &self.cursor
    }

    /// Get the underlying cursor mutably
    pub fn cursor_mut(&mut self) -> &mut C {
        &mut self.cursor
    }

    /// Get the listener
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Max rows cap, if any
    pub fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        Ok(())
    }

    fn actual_fetch_size(&self) -> usize {
        if self.fetch_size > 0 {
            self.fetch_size
        } else {
            DEFAULT_FETCH_ROWS
        }
    }

    fn exceeds_max_rows(&self, position: usize) -> bool {
        self.max_rows.is_some_and(|max_rows| position > max_rows)
    }

    /// Whether `position` is known to be after the last row
    fn known_beyond_end(&self, position: usize) -> bool {
        self.exceeds_max_rows(position) || self.cursor_size.is_some_and(|size| position > size)
    }

    // =========================================================================
    // Notification
    // =========================================================================

    fn notify(&mut self, position: Position, row: Option<RowValue>) -> bool {
        self.position = position;
        self.listener.row_changed(row.as_ref());
        let found = row.is_some();
        self.current_row = row;
        found
    }

    fn move_to_row(&mut self, position: usize, row: RowValue) -> bool {
        self.notify(Position::Row(position), Some(row))
    }

    fn move_before_first(&mut self) -> bool {
        self.notify(Position::BeforeFirst, None)
    }

    fn move_after_last(&mut self) -> bool {
        self.notify(Position::AfterLast, None)
    }

    // =========================================================================
    // Server round trips
    // =========================================================================

    fn fetch_from_server(&mut self, request: FetchRequest) -> Result<ScrollResult> {
        self.server_position = None;
        let result = self.cursor.fetch(request)?;
        tracing::trace!(
            orientation = ?request.orientation,
            num_rows = request.num_rows,
            offset = request.offset,
            received = result.len(),
            before_first = result.before_first,
            after_last = result.after_last,
            "Scroll fetch"
        );
        Ok(result)
    }

    /// Position the server cursor at `expected`
    ///
    /// `expected` must be 0 or one past a row known to exist, so landing
    /// after-last reveals the row count.
    fn synchronize_server_position(&mut self, expected: usize) -> Result<()> {
        if self.server_position == Some(expected) {
            return Ok(());
        }
        tracing::trace!(
            expected = expected,
            actual = ?self.server_position,
            "Repositioning server cursor"
        );
        let result = self.fetch_from_server(FetchRequest::absolute(to_offset(expected)))?;
        if result.after_last && expected > 0 {
            self.record_server_size(expected - 1);
        }
        self.server_position = Some(expected);
        Ok(())
    }

    fn record_server_size(&mut self, count: usize) -> usize {
        let size = self.max_rows.map_or(count, |max_rows| max_rows.min(count));
        self.server_cursor_size = Some(count);
        self.cursor_size = Some(size);
        tracing::debug!(server_rows = count, rows = size, "Cursor size established");
        size
    }

    /// Accept the result of a single row fetch positioned at `target`
    fn accept_single_row(&mut self, target: usize, result: ScrollResult) -> bool {
        let before_first = result.before_first;
        match result.rows.into_iter().next() {
            Some(row) => {
                self.server_position = Some(target);
                self.window.replace(target, vec![row.clone()]);
                self.move_to_row(target, row)
            }
            None if before_first => {
                self.server_position = Some(0);
                self.move_before_first()
            }
            None => {
                self.server_position = self.server_cursor_size.map(|count| count + 1);
                self.move_after_last()
            }
        }
    }

    /// Move to `target`, fetching a window forward from the row before it
    fn load_forward(&mut self, target: usize) -> Result<bool> {
        if self.known_beyond_end(target) {
            return Ok(self.move_after_last());
        }
        if let Some(row) = self.window.get(target).cloned() {
            return Ok(self.move_to_row(target, row));
        }

        let start = target - 1;
        let mut num_rows = self.actual_fetch_size();
        if let Some(max_rows) = self.max_rows {
            num_rows = num_rows.min(max_rows - start);
        }
        self.synchronize_server_position(start)?;
        let result = self.fetch_from_server(FetchRequest::next(num_rows))?;

        let received = result.rows.len();
        if result.after_last {
            let count = self.record_server_size(start + received);
            self.server_position = Some(start + received + 1);
            if target > count {
                return Ok(self.move_after_last());
            }
        } else {
            self.server_position = Some(start + received);
        }
        let Some(row) = result.rows.first().cloned() else {
            return Ok(self.move_after_last());
        };
        self.window.replace(target, result.rows);
        Ok(self.move_to_row(target, row))
    }

    /// Move to `target`, fetching a window backward from the row after it
    ///
    /// `target` must be a row known to exist.
    fn load_backward(&mut self, target: usize) -> Result<bool> {
        if let Some(row) = self.window.get(target).cloned() {
            return Ok(self.move_to_row(target, row));
        }

        let num_rows = self.actual_fetch_size().min(target);
        self.synchronize_server_position(target + 1)?;
        let result = self.fetch_from_server(FetchRequest::prior(num_rows))?;

        let received = result.rows.len();
        if received == 0 {
            self.server_position = Some(0);
            return Ok(self.move_before_first());
        }
        let offset = target + 1 - received;
        self.server_position = Some(if result.before_first { 0 } else { offset });
        // Prior fetches deliver rows from high to low
        let mut rows = result.rows;
        rows.reverse();
        let row = rows[received - 1].clone();
        self.window.replace(offset, rows);
        Ok(self.move_to_row(target, row))
    }

    fn load_absolute(&mut self, target: usize) -> Result<bool> {
        if self.known_beyond_end(target) {
            return Ok(self.move_after_last());
        }
        if let Some(row) = self.window.get(target).cloned() {
            return Ok(self.move_to_row(target, row));
        }
        let result = self.fetch_from_server(FetchRequest::absolute(to_offset(target)))?;
        Ok(self.accept_single_row(target, result))
    }

    /// Number of rows, fetching to the end when the server cannot report it
    fn require_cursor_size(&mut self) -> Result<usize> {
        if let Some(size) = self.cursor_size {
            return Ok(size);
        }
        match self.cursor.row_count()? {
            Some(count) => Ok(self.record_server_size(count)),
            None => self.discover_cursor_size(),
        }
    }

    fn discover_cursor_size(&mut self) -> Result<usize> {
        let mut known = self.window.last_position().unwrap_or(0);
        if let Position::Row(row) = self.position {
            known = known.max(row);
        }
        tracing::debug!(from = known, "Row count not reported, fetching to end of cursor");

        loop {
            if let Some(max_rows) = self.max_rows {
                if known >= max_rows {
                    self.cursor_size = Some(max_rows);
                    return Ok(max_rows);
                }
            }
            let mut num_rows = self.actual_fetch_size();
            if let Some(max_rows) = self.max_rows {
                num_rows = num_rows.min(max_rows - known);
            }
            self.synchronize_server_position(known)?;
            if let Some(size) = self.cursor_size {
                return Ok(size);
            }

            let result = self.fetch_from_server(FetchRequest::next(num_rows))?;
            let received = result.rows.len();
            let exhausted = result.after_last || received < num_rows;
            if received > 0 {
                self.window.replace(known + 1, result.rows);
            }
            known += received;
            if exhausted {
                self.server_position = Some(known + 1);
                return Ok(self.record_server_size(known));
            }
            self.server_position = Some(known);
        }
    }

    /// Fetch the row after `row` without moving, to find out if it exists
    fn look_ahead(&mut self, row: usize) -> Result<bool> {
        self.synchronize_server_position(row)?;
        if self.cursor_size.is_some_and(|size| row >= size) {
            return Ok(false);
        }
        let result = self.fetch_from_server(FetchRequest::next(1))?;
        match result.rows.into_iter().next() {
            Some(next_row) => {
                self.server_position = Some(row + 1);
                let capacity = self.actual_fetch_size();
                self.window.push(row + 1, next_row, capacity);
                Ok(true)
            }
            None => {
                self.record_server_size(row);
                self.server_position = Some(row + 1);
                Ok(false)
            }
        }
    }
}

impl<C: ServerCursor, L: FetcherListener> Fetcher for ServerScrollFetcher<C, L> {
    fn first(&mut self) -> Result<bool> {
        self.check_open()?;
        if self.cursor_size == Some(0) {
            return Ok(self.move_after_last());
        }
        if let Some(row) = self.window.get(1).cloned() {
            return Ok(self.move_to_row(1, row));
        }

        let result = self.fetch_from_server(FetchRequest::first())?;
        if result.is_empty() {
            self.record_server_size(0);
            self.server_position = Some(if result.before_first { 0 } else { 1 });
            return Ok(self.move_after_last());
        }
        Ok(self.accept_single_row(1, result))
    }

    fn last(&mut self) -> Result<bool> {
        self.check_open()?;
        let size = self.require_cursor_size()?;
        if size == 0 {
            return Ok(self.move_after_last());
        }
        if let Some(row) = self.window.get(size).cloned() {
            return Ok(self.move_to_row(size, row));
        }

        // A cap below the server row count moves the last row off the end
        let request = if self.cursor_size == self.server_cursor_size {
            FetchRequest::last()
        } else {
            FetchRequest::absolute(to_offset(size))
        };
        let result = self.fetch_from_server(request)?;
        if result.is_empty() {
            return Err(Error::Protocol(format!(
                "no row returned for last row {size} of the cursor"
            )));
        }
        Ok(self.accept_single_row(size, result))
    }

    fn next(&mut self) -> Result<bool> {
        self.check_open()?;
        let target = match self.position {
            Position::BeforeFirst => 1,
            Position::Row(row) => row + 1,
            Position::AfterLast => return Ok(self.move_after_last()),
        };
        self.load_forward(target)
    }

    fn previous(&mut self) -> Result<bool> {
        self.check_open()?;
        let target = match self.position {
            Position::BeforeFirst | Position::Row(1) => return Ok(self.move_before_first()),
            Position::Row(row) => row - 1,
            Position::AfterLast => match self.require_cursor_size()? {
                0 => return Ok(self.move_before_first()),
                size => size,
            },
        };
        self.load_backward(target)
    }

    fn absolute(&mut self, row: i64) -> Result<bool> {
        self.check_open()?;
        let target = match row {
            0 => return Ok(self.move_before_first()),
            row if row > 0 => usize::try_from(row).unwrap_or(usize::MAX),
            row => {
                let size = self.require_cursor_size()?;
                let from_end = usize::try_from(row.unsigned_abs()).unwrap_or(usize::MAX);
                if from_end > size {
                    return Ok(self.move_before_first());
                }
                size + 1 - from_end
            }
        };
        self.load_absolute(target)
    }

    fn relative(&mut self, rows: i64) -> Result<bool> {
        self.check_open()?;
        if rows == 0 {
            let row = self.current_row.clone();
            return Ok(self.notify(self.position, row));
        }
        let base = match self.position {
            Position::BeforeFirst => 0,
            Position::Row(row) => row,
            Position::AfterLast => self.require_cursor_size()? + 1,
        };
        let target = to_offset(base).saturating_add(rows);
        if target <= 0 {
            return Ok(self.move_before_first());
        }
        let target = usize::try_from(target).unwrap_or(usize::MAX);
        if self.known_beyond_end(target) {
            return Ok(self.move_after_last());
        }
        if let Some(row) = self.window.get(target).cloned() {
            return Ok(self.move_to_row(target, row));
        }

        let request = if self.server_position == Some(base) {
            FetchRequest::relative(rows)
        } else {
            FetchRequest::absolute(to_offset(target))
        };
        let result = self.fetch_from_server(request)?;
        Ok(self.accept_single_row(target, result))
    }

    fn before_first(&mut self) -> Result<()> {
        self.check_open()?;
        self.move_before_first();
        Ok(())
    }

    fn after_last(&mut self) -> Result<()> {
        self.check_open()?;
        self.move_after_last();
        Ok(())
    }

    fn is_first(&mut self) -> Result<bool> {
        self.check_open()?;
        Ok(self.position == Position::Row(1))
    }

    fn is_last(&mut self) -> Result<bool> {
        self.check_open()?;
        let Position::Row(row) = self.position else {
            return Ok(false);
        };
        if let Some(size) = self.cursor_size {
            return Ok(row == size);
        }
        if self.max_rows == Some(row) {
            return Ok(true);
        }
        if self.window.get(row + 1).is_some() {
            return Ok(false);
        }
        Ok(!self.look_ahead(row)?)
    }

    fn is_before_first(&self) -> Result<bool> {
        self.check_open()?;
        Ok(self.position == Position::BeforeFirst)
    }

    fn is_after_last(&self) -> Result<bool> {
        self.check_open()?;
        Ok(self.position == Position::AfterLast)
    }

    fn is_empty(&mut self) -> Result<bool> {
        self.check_open()?;
        if let Some(size) = self.cursor_size {
            return Ok(size == 0);
        }
        if self.position.is_row() || !self.window.is_empty() {
            return Ok(false);
        }
        if let Some(count) = self.cursor.row_count()? {
            return Ok(self.record_server_size(count) == 0);
        }
        Ok(!self.look_ahead(0)?)
    }

    fn row_num(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.position.row_num())
    }

    fn size(&mut self) -> Result<usize> {
        self.check_open()?;
        self.require_cursor_size()
    }

    fn position(&self) -> Position {
        self.position
    }

    fn current_row(&self) -> Option<&RowValue> {
        self.current_row.as_ref()
    }

    fn fetch_size(&self) -> usize {
        self.fetch_size
    }

    fn set_fetch_size(&mut self, fetch_size: usize) {
        self.fetch_size = fetch_size;
    }

    fn close(&mut self, reason: CompletionReason) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.window.clear();
        self.current_row = None;
        self.server_position = None;

        let result = self.cursor.close_cursor(reason);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Failed to close server cursor");
        }
        tracing::debug!(
            ?reason,
            transaction_end = reason.is_transaction_end(),
            "Server scroll fetcher closed"
        );
        self.listener.fetcher_closed();
        result
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

fn to_offset(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}
