//! Server cursor capability consumed by the fetch engine
//!
//! The fetch engine does not speak the wire protocol itself. It drives an
//! executed statement through the [`ServerCursor`] trait, which exposes the
//! scroll-fetch operation of the protocol layer: fetch a number of rows in a
//! direction, or reposition to a first/last/absolute/relative row.
//!
//! # Example
//!
//! ```rust
//! use firebird_fetch::{FetchRequest, MemoryCursor, RowValue, ServerCursor};
//!
//! # fn example() -> firebird_fetch::Result<()> {
//! let rows = (1..=3).map(|i: i32| RowValue::of([Some(i.to_be_bytes())])).collect();
//! let mut cursor = MemoryCursor::new(rows);
//!
//! let result = cursor.fetch(FetchRequest::next(2))?;
//! assert_eq!(result.len(), 2);
//! assert!(!result.after_last);
//!
//! let result = cursor.fetch_absolute(3)?;
//! assert_eq!(result.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::constants::{CompletionReason, FetchOrientation};
use crate::error::Result;
use crate::row::RowValue;

/// A single scroll-fetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    /// Fetch orientation
    pub orientation: FetchOrientation,
    /// Number of rows to fetch (`Next` and `Prior` only)
    pub num_rows: usize,
    /// Fetch position (`Absolute`) or offset (`Relative`)
    pub offset: i64,
}

impl FetchRequest {
    /// Fetch up to `num_rows` rows after the current server position
    pub fn next(num_rows: usize) -> Self {
        Self {
            orientation: FetchOrientation::Next,
            num_rows,
            offset: 0,
        }
    }

    /// Fetch up to `num_rows` rows before the current server position
    pub fn prior(num_rows: usize) -> Self {
        Self {
            orientation: FetchOrientation::Prior,
            num_rows,
            offset: 0,
        }
    }

    /// Fetch the first row
    pub fn first() -> Self {
        Self {
            orientation: FetchOrientation::First,
            num_rows: 1,
            offset: 0,
        }
    }

    /// Fetch the last row
    pub fn last() -> Self {
        Self {
            orientation: FetchOrientation::Last,
            num_rows: 1,
            offset: 0,
        }
    }

    /// Fetch the row at an absolute position; negative counts from the end
    pub fn absolute(position: i64) -> Self {
        Self {
            orientation: FetchOrientation::Absolute,
            num_rows: 1,
            offset: position,
        }
    }

    /// Fetch the row at an offset from the current server position
    pub fn relative(offset: i64) -> Self {
        Self {
            orientation: FetchOrientation::Relative,
            num_rows: 1,
            offset,
        }
    }
}

/// Result of one scroll-fetch round trip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollResult {
    /// The rows received, in the order the server sent them
    ///
    /// For a `Prior` fetch this is from high to low row number.
    pub rows: Vec<RowValue>,
    /// The server cursor ended up before the first row
    pub before_first: bool,
    /// The server cursor ended up after the last row
    pub after_last: bool,
}

impl ScrollResult {
    /// Create a new scroll result
    pub fn new(rows: Vec<RowValue>) -> Self {
        Self {
            rows,
            before_first: false,
            after_last: false,
        }
    }

    /// Mark the result as having crossed the start of the cursor
    pub fn with_before_first(mut self) -> Self {
        self.before_first = true;
        self
    }

    /// Mark the result as having crossed the end of the cursor
    pub fn with_after_last(mut self) -> Self {
        self.after_last = true;
        self
    }

    /// Get the first row if any
    pub fn first(&self) -> Option<&RowValue> {
        self.rows.first()
    }

    /// Check if no rows were returned
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of rows returned
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Executed statement cursor as exposed by the protocol layer.
///
/// Each call to [`fetch`](ServerCursor::fetch) is one blocking round trip.
/// Implementations report failures as errors and never retry.
pub trait ServerCursor {
    /// Perform one scroll fetch
    fn fetch(&mut self, request: FetchRequest) -> Result<ScrollResult>;

    /// Total number of rows of the cursor, if the server can report it
    ///
    /// `None` means the count can only be discovered by fetching to the end.
    fn row_count(&mut self) -> Result<Option<usize>>;

    /// Number of columns of each row
    fn column_count(&self) -> usize;

    /// Whether the cursor was opened as a server-side scrollable cursor
    fn is_scrollable(&self) -> bool;

    /// Close the cursor on the server
    fn close_cursor(&mut self, reason: CompletionReason) -> Result<()>;

    /// Fetch up to `num_rows` rows forward
    fn fetch_forward(&mut self, num_rows: usize) -> Result<ScrollResult> {
        self.fetch(FetchRequest::next(num_rows))
    }

    /// Reposition to an absolute row and fetch it
    fn fetch_absolute(&mut self, position: i64) -> Result<ScrollResult> {
        self.fetch(FetchRequest::absolute(position))
    }

    /// Reposition relative to the current row and fetch it
    fn fetch_relative(&mut self, offset: i64) -> Result<ScrollResult> {
        self.fetch(FetchRequest::relative(offset))
    }
}

impl<C: ServerCursor + ?Sized> ServerCursor for &mut C {
    fn fetch(&mut self, request: FetchRequest) -> Result<ScrollResult> {
        (**self).fetch(request)
    }

    fn row_count(&mut self) -> Result<Option<usize>> {
        (**self).row_count()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn is_scrollable(&self) -> bool {
        (**self).is_scrollable()
    }

    fn close_cursor(&mut self, reason: CompletionReason) -> Result<()> {
        (**self).close_cursor(reason)
    }
}

impl<C: ServerCursor + ?Sized> ServerCursor for Box<C> {
    fn fetch(&mut self, request: FetchRequest) -> Result<ScrollResult> {
        (**self).fetch(request)
    }

    fn row_count(&mut self) -> Result<Option<usize>> {
        (**self).row_count()
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn is_scrollable(&self) -> bool {
        (**self).is_scrollable()
    }

    fn close_cursor(&mut self, reason: CompletionReason) -> Result<()> {
        (**self).close_cursor(reason)
    }
}
