//! Streaming fetcher for forward-only result sets
//!
//! [`ForwardOnlyFetcher`] reads the cursor front to back with `Next` fetches
//! of fetch size rows, issued only when the rows of the previous batch are
//! used up. Only the current batch is kept in memory. The server cursor stays
//! open until the fetcher is closed.
//!
//! Every scrolling operation fails with [`Error::ForwardOnly`]. The size of
//! the result set is only known once the last row was fetched.

use std::collections::VecDeque;

use crate::config::FetchConfig;
use crate::constants::{CompletionReason, DEFAULT_FETCH_ROWS};
use crate::cursor::{FetchRequest, ServerCursor};
use crate::error::{Error, Result};
use crate::listener::FetcherListener;
use crate::row::RowValue;

use super::{Fetcher, Position};

/// Forward-only fetcher backed by a server cursor.
///
/// # Example
///
/// ```rust
/// use firebird_fetch::{Fetcher, ForwardOnlyFetcher, MemoryCursor, RowValue};
///
/// # fn example() -> firebird_fetch::Result<()> {
/// let rows = (1..=100).map(|i: i32| RowValue::of([Some(i.to_be_bytes())])).collect();
/// let mut fetcher = ForwardOnlyFetcher::new(MemoryCursor::new(rows), 10, None, ());
///
/// assert!(fetcher.next()?);
/// assert_eq!(fetcher.cursor().fetch_count(), 1);
/// assert!(fetcher.previous().is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ForwardOnlyFetcher<C, L = ()> {
    cursor: C,
    listener: L,
    fetch_size: usize,
    max_rows: Option<usize>,
    closed: bool,
    /// Fetched rows not yet visited
    batch: VecDeque<RowValue>,
    /// Rows received from the server so far
    fetched: usize,
    /// No rows remain on the server (or beyond the cap)
    exhausted: bool,
    position: Position,
    current_row: Option<RowValue>,
}

impl<C: ServerCursor, L: FetcherListener> ForwardOnlyFetcher<C, L> {
    /// Create a fetcher over a freshly executed cursor
    ///
    /// A `fetch_size` of 0 uses [`DEFAULT_FETCH_ROWS`]. A `max_rows` of
    /// `None` or `Some(0)` means no cap.
    pub fn new(cursor: C, fetch_size: usize, max_rows: Option<usize>, listener: L) -> Self {
        Self {
            cursor,
            listener,
            fetch_size,
            max_rows: max_rows.filter(|&max_rows| max_rows > 0),
            closed: false,
            batch: VecDeque::new(),
            fetched: 0,
            exhausted: false,
            position: Position::BeforeFirst,
            current_row: None,
        }
    }

    /// Create a fetcher using the fetch size and max rows of `config`
    pub fn with_config(cursor: C, config: &FetchConfig, listener: L) -> Self {
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

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        Ok(())
    }

    fn reject_scroll(&self, operation: &str) -> Result<()> {
        self.check_open()?;
        Err(Error::ForwardOnly(operation.to_string()))
    }

    fn notify(&mut self, position: Position, row: Option<RowValue>) -> bool {
        self.position = position;
        self.listener.row_changed(row.as_ref());
        let found = row.is_some();
        self.current_row = row;
        found
    }

    /// Fetch the next batch if the current one is used up
    ///
    /// On failure nothing changes, so the call can be repeated.
    fn ensure_batch(&mut self) -> Result<()> {
        if !self.batch.is_empty() || self.exhausted {
            return Ok(());
        }
        let mut num_rows = if self.fetch_size > 0 {
            self.fetch_size
        } else {
            DEFAULT_FETCH_ROWS
        };
        if let Some(max_rows) = self.max_rows {
            let remaining = max_rows.saturating_sub(self.fetched);
            if remaining == 0 {
                self.exhausted = true;
                return Ok(());
            }
            num_rows = num_rows.min(remaining);
        }

        let result = self.cursor.fetch(FetchRequest::next(num_rows))?;
        let received = result.rows.len();
        tracing::trace!(
            num_rows = num_rows,
            received = received,
            after_last = result.after_last,
            "Forward fetch"
        );
        self.fetched += received;
        self.exhausted = result.after_last
            || received < num_rows
            || self.max_rows.is_some_and(|max_rows| self.fetched >= max_rows);
        if self.exhausted {
            tracing::debug!(rows = self.fetched, "All rows fetched");
        }
        self.batch.extend(result.rows);
        Ok(())
    }
}

impl<C: ServerCursor, L: FetcherListener> Fetcher for ForwardOnlyFetcher<C, L> {
    fn first(&mut self) -> Result<bool> {
        self.reject_scroll("first").map(|()| false)
    }

    fn last(&mut self) -> Result<bool> {
        self.reject_scroll("last").map(|()| false)
    }

    fn next(&mut self) -> Result<bool> {
        self.check_open()?;
        let target = match self.position {
            Position::BeforeFirst => 1,
            Position::Row(row) => row + 1,
            Position::AfterLast => return Ok(self.notify(Position::AfterLast, None)),
        };
        self.ensure_batch()?;
        match self.batch.pop_front() {
            Some(row) => Ok(self.notify(Position::Row(target), Some(row))),
            None => Ok(self.notify(Position::AfterLast, None)),
        }
    }

    fn previous(&mut self) -> Result<bool> {
        self.reject_scroll("previous").map(|()| false)
    }

    fn absolute(&mut self, _row: i64) -> Result<bool> {
        self.reject_scroll("absolute").map(|()| false)
    }

    fn relative(&mut self, _rows: i64) -> Result<bool> {
        self.reject_scroll("relative").map(|()| false)
    }

    fn before_first(&mut self) -> Result<()> {
        self.reject_scroll("before_first")
    }

    fn after_last(&mut self) -> Result<()> {
        self.reject_scroll("after_last")
    }

    fn is_first(&mut self) -> Result<bool> {
        self.check_open()?;
        Ok(self.position == Position::Row(1))
    }

    fn is_last(&mut self) -> Result<bool> {
        self.check_open()?;
        if !self.position.is_row() {
            return Ok(false);
        }
        self.ensure_batch()?;
        Ok(self.batch.is_empty())
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
        if self.fetched > 0 {
            return Ok(false);
        }
        self.ensure_batch()?;
        Ok(self.fetched == 0)
    }

    fn row_num(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.position.row_num())
    }

    /// Number of rows, known only after the last row was fetched
    fn size(&mut self) -> Result<usize> {
        self.check_open()?;
        if !self.exhausted {
            return Err(Error::ForwardOnly("size".to_string()));
        }
        Ok(self.fetched)
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
        self.batch.clear();
        self.current_row = None;

        let result = self.cursor.close_cursor(reason);
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Failed to close server cursor");
        }
        tracing::debug!(?reason, rows = self.fetched, "Forward-only fetcher closed");
        self.listener.fetcher_closed();
        result
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn is_forward_only(&self) -> bool {
        true
    }
}
