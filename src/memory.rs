//! In-memory server cursor
//!
//! [`MemoryCursor`] implements [`ServerCursor`] over a fixed list of rows,
//! following the scroll-fetch semantics of a Firebird server cursor: the
//! server position ranges over `0..=n + 1`, where `0` is before the first row
//! and `n + 1` is after the last row.
//!
//! It records every request it receives, which makes it possible to verify
//! how many round trips an operation costs, and it can be told to fail the
//! next fetch to exercise error propagation.

use crate::constants::{CompletionReason, FetchOrientation};
use crate::cursor::{FetchRequest, ScrollResult, ServerCursor};
use crate::error::{Error, Result};
use crate::row::RowValue;

/// A server cursor backed by an in-memory row list
#[derive(Debug)]
pub struct MemoryCursor {
    rows: Vec<RowValue>,
    column_count: usize,
    /// Server position: 0 is before-first, rows.len() + 1 is after-last
    position: usize,
    report_row_count: bool,
    scrollable: bool,
    closed: bool,
    close_reason: Option<CompletionReason>,
    requests: Vec<FetchRequest>,
    pending_failure: Option<Error>,
}

impl MemoryCursor {
    /// Create a scrollable cursor that reports its row count
    ///
    /// The column count is taken from the first row, see
    /// [`with_column_count`](Self::with_column_count) for empty cursors.
    pub fn new(rows: Vec<RowValue>) -> Self {
        Self {
            column_count: rows.first().map_or(0, RowValue::len),
            rows,
            position: 0,
            report_row_count: true,
            scrollable: true,
            closed: false,
            close_reason: None,
            requests: Vec::new(),
            pending_failure: None,
        }
    }

    /// Override the column count
    pub fn with_column_count(mut self, column_count: usize) -> Self {
        self.column_count = column_count;
        self
    }

    /// Set whether [`row_count`](ServerCursor::row_count) reports the count
    ///
    /// When disabled, the fetcher has to discover the count by fetching.
    pub fn with_row_count_reporting(mut self, report: bool) -> Self {
        self.report_row_count = report;
        self
    }

    /// Make this a forward-only cursor that only accepts `Next` fetches
    pub fn forward_only(mut self) -> Self {
        self.scrollable = false;
        self
    }

    /// Fail the next fetch with `error`
    ///
    /// Use [`Error::server`] for a failure reported by the server and
    /// [`Error::Protocol`] for a broken exchange.
    pub fn fail_next_fetch(&mut self, error: Error) {
        self.pending_failure = Some(error);
    }

    /// Number of fetch round trips received (including failed ones)
    pub fn fetch_count(&self) -> usize {
        self.requests.len()
    }

    /// All fetch requests received, in order
    pub fn requests(&self) -> &[FetchRequest] {
        &self.requests
    }

    /// Forget the recorded requests
    pub fn clear_requests(&mut self) {
        self.requests.clear();
    }

    /// Current server position
    pub fn server_position(&self) -> usize {
        self.position
    }

    /// Check if the cursor was closed
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reason given when the cursor was closed
    pub fn close_reason(&self) -> Option<CompletionReason> {
        self.close_reason
    }

    fn after_last_position(&self) -> usize {
        self.rows.len() + 1
    }

    /// Move to `target` (may be out of range) and return the single row there
    fn move_to(&mut self, target: i64) -> ScrollResult {
        let count = self.rows.len() as i64;
        if target <= 0 {
            self.position = 0;
            ScrollResult::default().with_before_first()
        } else if target > count {
            self.position = self.after_last_position();
            ScrollResult::default().with_after_last()
        } else {
            self.position = target as usize;
            ScrollResult::new(vec![self.rows[self.position - 1].clone()])
        }
    }

    fn fetch_next(&mut self, num_rows: usize) -> ScrollResult {
        let start = self.position.min(self.rows.len());
        let take = num_rows.min(self.rows.len() - start);
        let rows = self.rows[start..start + take].to_vec();
        if take < num_rows {
            self.position = self.after_last_position();
            ScrollResult::new(rows).with_after_last()
        } else {
            self.position = start + take;
            ScrollResult::new(rows)
        }
    }

    fn fetch_prior(&mut self, num_rows: usize) -> ScrollResult {
        let top = self.position.min(self.after_last_position());
        let available = top.saturating_sub(1);
        let take = num_rows.min(available);
        // Rows are sent from high to low row number
        let rows = (top - take..top)
            .rev()
            .map(|position| self.rows[position - 1].clone())
            .collect();
        if take < num_rows {
            self.position = 0;
            ScrollResult::new(rows).with_before_first()
        } else {
            self.position = top - take;
            ScrollResult::new(rows)
        }
    }
}

impl ServerCursor for MemoryCursor {
    fn fetch(&mut self, request: FetchRequest) -> Result<ScrollResult> {
        if self.closed {
            return Err(Error::CursorClosed);
        }
        self.requests.push(request);
        if let Some(error) = self.pending_failure.take() {
            return Err(error);
        }
        if !self.scrollable && request.orientation != FetchOrientation::Next {
            return Err(Error::FeatureNotSupported(format!(
                "fetch {:?} on a forward-only cursor",
                request.orientation
            )));
        }
        if request.orientation.is_multi_row() && request.num_rows == 0 {
            return Err(Error::Protocol("fetch size must be positive".to_string()));
        }

        let count = self.rows.len() as i64;
        let result = match request.orientation {
            FetchOrientation::Next => self.fetch_next(request.num_rows),
            FetchOrientation::Prior => self.fetch_prior(request.num_rows),
            FetchOrientation::First => self.move_to(1),
            FetchOrientation::Last => {
                if count == 0 {
                    self.move_to(0)
                } else {
                    self.move_to(count)
                }
            }
            FetchOrientation::Absolute => {
                let target = if request.offset >= 0 {
                    request.offset
                } else {
                    count + 1 + request.offset
                };
                self.move_to(target)
            }
            FetchOrientation::Relative => {
                let target = self.position as i64 + request.offset;
                self.move_to(target)
            }
        };
        Ok(result)
    }

    fn row_count(&mut self) -> Result<Option<usize>> {
        if self.closed {
            return Err(Error::CursorClosed);
        }
        Ok(self.report_row_count.then_some(self.rows.len()))
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn is_scrollable(&self) -> bool {
        self.scrollable
    }

    fn close_cursor(&mut self, reason: CompletionReason) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.close_reason = Some(reason);
            self.position = 0;
        }
        Ok(())
    }
}
