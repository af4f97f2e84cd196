//! Fetcher over fully materialized rows
//!
//! Used when a result set must be scrollable but server-side scrolling is
//! not available or not configured. All rows are fetched with `Next`
//! requests when the fetcher is created and the server cursor is closed
//! right after. Loaded forward-only, it reads a result set in full up front
//! while still rejecting scrolling.

use crate::config::FetchConfig;
use crate::constants::{CompletionReason, DEFAULT_FETCH_ROWS};
use crate::cursor::{FetchRequest, ServerCursor};
use crate::error::{Error, Result};
use crate::listener::FetcherListener;
use crate::row::RowValue;

use super::{Fetcher, Position};

/// In-memory fetcher
#[derive(Debug)]
pub struct CachedFetcher<L = ()> {
    rows: Vec<RowValue>,
    listener: L,
    fetch_size: usize,
    forward_only: bool,
    closed: bool,
    position: Position,
    current_row: Option<RowValue>,
}

impl<L: FetcherListener> CachedFetcher<L> {
    /// Fetch all rows of `cursor` and close it
    ///
    /// At most `max_rows` rows are fetched when a cap is given. The cursor
    /// is closed even when fetching fails.
    pub fn load<C: ServerCursor>(
        mut cursor: C,
        fetch_size: usize,
        max_rows: Option<usize>,
        forward_only: bool,
        listener: L,
    ) -> Result<Self> {
        let fetched = fetch_all(&mut cursor, fetch_size, max_rows.filter(|&max| max > 0));
        let closed = cursor.close_cursor(CompletionReason::Other);
        let rows = fetched?;
        closed?;
        tracing::debug!(rows = rows.len(), forward_only = forward_only, "Result set cached");

        Ok(Self {
            rows,
            listener,
            fetch_size,
            forward_only,
            closed: false,
            position: Position::BeforeFirst,
            current_row: None,
        })
    }

    /// Load using the settings of `config`
    pub fn with_config<C: ServerCursor>(cursor: C, config: &FetchConfig, listener: L) -> Result<Self> {
        Self::load(
            cursor,
            config.fetch_size,
            config.max_rows,
            !config.is_scrollable(),
            listener,
        )
    }

    /// Create a scrollable fetcher over rows already in memory
    pub fn from_rows(rows: Vec<RowValue>, listener: L) -> Self {
        Self {
            rows,
            listener,
            fetch_size: 0,
            forward_only: false,
            closed: false,
            position: Position::BeforeFirst,
            current_row: None,
        }
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::ResultSetClosed);
        }
        Ok(())
    }

    fn check_scrollable(&self, operation: &str) -> Result<()> {
        self.check_open()?;
        if self.forward_only {
            return Err(Error::ForwardOnly(operation.to_string()));
        }
        Ok(())
    }

    /// Move to `position`, which must be a valid row or a virtual position
    fn move_to(&mut self, position: Position) -> bool {
        let row = match position {
            Position::Row(row) => self.rows.get(row - 1).cloned(),
            Position::BeforeFirst | Position::AfterLast => None,
        };
        self.position = position;
        self.listener.row_changed(row.as_ref());
        let found = row.is_some();
        self.current_row = row;
        found
    }

    /// Move to `target`, clamping to before-first or after-last
    fn move_to_offset(&mut self, target: i64) -> bool {
        if target <= 0 {
            return self.move_to(Position::BeforeFirst);
        }
        match usize::try_from(target) {
            Ok(row) if row <= self.rows.len() => self.move_to(Position::Row(row)),
            _ => self.move_to(Position::AfterLast),
        }
    }

    fn base_offset(&self) -> i64 {
        let base = match self.position {
            Position::BeforeFirst => 0,
            Position::Row(row) => row,
            Position::AfterLast => self.rows.len() + 1,
        };
        i64::try_from(base).unwrap_or(i64::MAX)
    }
}

fn fetch_all<C: ServerCursor>(
    cursor: &mut C,
    fetch_size: usize,
    max_rows: Option<usize>,
) -> Result<Vec<RowValue>> {
    let fetch_size = if fetch_size > 0 { fetch_size } else { DEFAULT_FETCH_ROWS };
    let mut rows = Vec::new();
    loop {
        let mut num_rows = fetch_size;
        if let Some(max_rows) = max_rows {
            if rows.len() >= max_rows {
                break;
            }
            num_rows = num_rows.min(max_rows - rows.len());
        }
        let result = cursor.fetch(FetchRequest::next(num_rows))?;
        let received = result.rows.len();
        let exhausted = result.after_last || received < num_rows;
        rows.extend(result.rows);
        if exhausted {
            break;
        }
    }
    Ok(rows)
}

impl<L: FetcherListener> Fetcher for CachedFetcher<L> {
    fn first(&mut self) -> Result<bool> {
        self.check_scrollable("first")?;
        Ok(self.move_to_offset(1))
    }

    fn last(&mut self) -> Result<bool> {
        self.check_scrollable("last")?;
        if self.rows.is_empty() {
            return Ok(self.move_to(Position::AfterLast));
        }
        Ok(self.move_to(Position::Row(self.rows.len())))
    }

    fn next(&mut self) -> Result<bool> {
        self.check_open()?;
        if self.position == Position::AfterLast {
            return Ok(self.move_to(Position::AfterLast));
        }
        let target = self.base_offset() + 1;
        Ok(self.move_to_offset(target))
    }

    fn previous(&mut self) -> Result<bool> {
        self.check_scrollable("previous")?;
        let target = self.base_offset() - 1;
        Ok(self.move_to_offset(target))
    }

    fn absolute(&mut self, row: i64) -> Result<bool> {
        self.check_scrollable("absolute")?;
        if row >= 0 {
            return Ok(self.move_to_offset(row));
        }
        let size = i64::try_from(self.rows.len()).unwrap_or(i64::MAX);
        Ok(self.move_to_offset(size.saturating_add(1).saturating_add(row)))
    }

    fn relative(&mut self, rows: i64) -> Result<bool> {
        self.check_scrollable("relative")?;
        if rows == 0 {
            return Ok(self.move_to(self.position));
        }
        let target = self.base_offset().saturating_add(rows);
        Ok(self.move_to_offset(target))
    }

    fn before_first(&mut self) -> Result<()> {
        self.check_scrollable("before_first")?;
        self.move_to(Position::BeforeFirst);
        Ok(())
    }

    fn after_last(&mut self) -> Result<()> {
        self.check_scrollable("after_last")?;
        self.move_to(Position::AfterLast);
        Ok(())
    }

    fn is_first(&mut self) -> Result<bool> {
        self.check_open()?;
        Ok(self.position == Position::Row(1))
    }

    fn is_last(&mut self) -> Result<bool> {
        self.check_open()?;
        Ok(!self.rows.is_empty() && self.position == Position::Row(self.rows.len()))
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
        Ok(self.rows.is_empty())
    }

    fn row_num(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.position.row_num())
    }

    fn size(&mut self) -> Result<usize> {
        self.check_open()?;
        Ok(self.rows.len())
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
        self.rows.clear();
        self.current_row = None;
        tracing::debug!(?reason, "Cached fetcher closed");
        self.listener.fetcher_closed();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn is_forward_only(&self) -> bool {
        self.forward_only
    }
}
