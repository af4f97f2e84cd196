//! Result set fetchers
//!
//! A fetcher owns the rows of one executed query and implements the
//! positioning operations of a result set on top of them:
//!
//! - [`ServerScrollFetcher`] drives a server-side scrollable cursor, fetching
//!   rows on demand and caching the most recent fetch window.
//! - [`CachedFetcher`] materializes all rows up front and scrolls in memory.
//! - [`ForwardOnlyFetcher`] streams the rows front to back, one fetch batch
//!   at a time.
//! - [`UpdatableFetcher`] wraps any of them and overlays rows inserted,
//!   updated or deleted by the client.
//!
//! All fetchers report the current row through a
//! [`FetcherListener`](crate::listener::FetcherListener) whenever it changes.
//! Use [`open_fetcher`] to pick the right combination for a [`FetchConfig`].

mod cached;
mod forward_only;
mod server_scroll;
mod updatable;
mod window;

pub use cached::CachedFetcher;
pub use forward_only::ForwardOnlyFetcher;
pub use server_scroll::ServerScrollFetcher;
pub use updatable::UpdatableFetcher;

use crate::config::{FetchConfig, ScrollableCursorMode};
use crate::constants::CompletionReason;
use crate::cursor::ServerCursor;
use crate::error::{Error, Result};
use crate::listener::FetcherListener;
use crate::row::RowValue;

/// Position of a fetcher within its result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// Before the first row (also the initial position)
    #[default]
    BeforeFirst,
    /// On a row, 1-based
    Row(usize),
    /// After the last row
    AfterLast,
}

impl Position {
    /// Row number, or 0 when not on a row
    pub fn row_num(self) -> usize {
        match self {
            Position::Row(row) => row,
            Position::BeforeFirst | Position::AfterLast => 0,
        }
    }

    /// Check if this is a row position
    pub fn is_row(self) -> bool {
        matches!(self, Position::Row(_))
    }
}

/// Positioning and mutation operations of a result set.
///
/// Positioning methods return `true` when they landed on a row and `false`
/// when they landed before the first or after the last row. Out of range
/// positions are not errors. Every method fails with
/// [`Error::ResultSetClosed`] after [`close`](Fetcher::close).
pub trait Fetcher {
    /// Move to the first row
    fn first(&mut self) -> Result<bool>;

    /// Move to the last row
    fn last(&mut self) -> Result<bool>;

    /// Move to the next row
    fn next(&mut self) -> Result<bool>;

    /// Move to the previous row
    fn previous(&mut self) -> Result<bool>;

    /// Move to an absolute row; negative rows count from the end, `-1` being
    /// the last row, and `0` is before-first
    fn absolute(&mut self, row: i64) -> Result<bool>;

    /// Move a number of rows relative to the current position
    fn relative(&mut self, rows: i64) -> Result<bool>;

    /// Move before the first row
    fn before_first(&mut self) -> Result<()>;

    /// Move after the last row
    fn after_last(&mut self) -> Result<()>;

    /// Check if positioned on the first row
    fn is_first(&mut self) -> Result<bool>;

    /// Check if positioned on the last row
    fn is_last(&mut self) -> Result<bool>;

    /// Check if positioned before the first row
    fn is_before_first(&self) -> Result<bool>;

    /// Check if positioned after the last row
    fn is_after_last(&self) -> Result<bool>;

    /// Check if the result set has no rows
    fn is_empty(&mut self) -> Result<bool>;

    /// Current row number, 0 when not on a row
    fn row_num(&self) -> Result<usize>;

    /// Number of rows in the result set
    fn size(&mut self) -> Result<usize>;

    /// Current position
    fn position(&self) -> Position;

    /// Content of the current row, as last reported to the listener
    fn current_row(&self) -> Option<&RowValue>;

    /// Configured fetch size, 0 meaning the driver default
    fn fetch_size(&self) -> usize;

    /// Change the fetch size used for subsequent round trips
    fn set_fetch_size(&mut self, fetch_size: usize);

    /// Close the fetcher and release its cursor
    fn close(&mut self, reason: CompletionReason) -> Result<()>;

    /// Check if the fetcher was closed
    fn is_closed(&self) -> bool;

    /// Whether only `next` may move the fetcher
    fn is_forward_only(&self) -> bool {
        false
    }

    /// Insert a row after the current row and move onto it
    fn insert_row(&mut self, _row: RowValue) -> Result<()> {
        Err(Error::ReadOnly)
    }

    /// Replace the content of the current row
    fn update_row(&mut self, _row: RowValue) -> Result<()> {
        Err(Error::ReadOnly)
    }

    /// Mark the current row as deleted
    fn delete_row(&mut self) -> Result<()> {
        Err(Error::ReadOnly)
    }

    /// Add a row after the last row without moving
    fn append_row(&mut self, _row: RowValue) -> Result<()> {
        Err(Error::ReadOnly)
    }

    /// Whether the current row was inserted by the client
    fn row_inserted(&self) -> bool {
        false
    }

    /// Whether the current row was updated by the client
    fn row_updated(&self) -> bool {
        false
    }

    /// Whether the current row was deleted by the client
    fn row_deleted(&self) -> bool {
        false
    }
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn first(&mut self) -> Result<bool> {
        (**self).first()
    }

    fn last(&mut self) -> Result<bool> {
        (**self).last()
    }

    fn next(&mut self) -> Result<bool> {
        (**self).next()
    }

    fn previous(&mut self) -> Result<bool> {
        (**self).previous()
    }

    fn absolute(&mut self, row: i64) -> Result<bool> {
        (**self).absolute(row)
    }

    fn relative(&mut self, rows: i64) -> Result<bool> {
        (**self).relative(rows)
    }

    fn before_first(&mut self) -> Result<()> {
        (**self).before_first()
    }

    fn after_last(&mut self) -> Result<()> {
        (**self).after_last()
    }

    fn is_first(&mut self) -> Result<bool> {
        (**self).is_first()
    }

    fn is_last(&mut self) -> Result<bool> {
        (**self).is_last()
    }

    fn is_before_first(&self) -> Result<bool> {
        (**self).is_before_first()
    }

    fn is_after_last(&self) -> Result<bool> {
        (**self).is_after_last()
    }

    fn is_empty(&mut self) -> Result<bool> {
        (**self).is_empty()
    }

    fn row_num(&self) -> Result<usize> {
        (**self).row_num()
    }

    fn size(&mut self) -> Result<usize> {
        (**self).size()
    }

    fn position(&self) -> Position {
        (**self).position()
    }

    fn current_row(&self) -> Option<&RowValue> {
        (**self).current_row()
    }

    fn fetch_size(&self) -> usize {
        (**self).fetch_size()
    }

    fn set_fetch_size(&mut self, fetch_size: usize) {
        (**self).set_fetch_size(fetch_size)
    }

    fn close(&mut self, reason: CompletionReason) -> Result<()> {
        (**self).close(reason)
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }

    fn is_forward_only(&self) -> bool {
        (**self).is_forward_only()
    }

    fn insert_row(&mut self, row: RowValue) -> Result<()> {
        (**self).insert_row(row)
    }

    fn update_row(&mut self, row: RowValue) -> Result<()> {
        (**self).update_row(row)
    }

    fn delete_row(&mut self) -> Result<()> {
        (**self).delete_row()
    }

    fn append_row(&mut self, row: RowValue) -> Result<()> {
        (**self).append_row(row)
    }

    fn row_inserted(&self) -> bool {
        (**self).row_inserted()
    }

    fn row_updated(&self) -> bool {
        (**self).row_updated()
    }

    fn row_deleted(&self) -> bool {
        (**self).row_deleted()
    }
}

/// How a result set scrolls
#[derive(Debug, Clone, Copy)]
enum Scroll {
    None,
    Server,
    Emulated,
}

/// Create the fetcher stack for an executed cursor
///
/// - scrollable result sets use a [`ServerScrollFetcher`] when server-side
///   scrolling is configured and the cursor supports it, and a
///   [`CachedFetcher`] otherwise;
/// - forward-only result sets use a [`ForwardOnlyFetcher`];
/// - updatable result sets are wrapped in an [`UpdatableFetcher`].
///
/// # Example
///
/// ```rust
/// use firebird_fetch::{open_fetcher, FetchConfig, MemoryCursor, RowValue, ResultSetType};
///
/// # fn example() -> firebird_fetch::Result<()> {
/// let rows = (1..=5).map(|i: i32| RowValue::of([Some(i.to_be_bytes())])).collect();
/// let config = FetchConfig::new()
///     .with_result_set_type(ResultSetType::ScrollInsensitive)
///     .with_fetch_size(2);
///
/// let mut fetcher = open_fetcher(MemoryCursor::new(rows), &config, ())?;
/// assert!(fetcher.last()?);
/// assert_eq!(fetcher.row_num()?, 5);
/// # Ok(())
/// # }
/// ```
pub fn open_fetcher<'a, C, L>(
    cursor: C,
    config: &FetchConfig,
    listener: L,
) -> Result<Box<dyn Fetcher + 'a>>
where
    C: ServerCursor + 'a,
    L: FetcherListener + 'a,
{
    let scroll = if !config.is_scrollable() {
        Scroll::None
    } else if config.scrollable_cursor == ScrollableCursorMode::Server && cursor.is_scrollable() {
        Scroll::Server
    } else {
        tracing::debug!(
            mode = %config.scrollable_cursor,
            cursor_scrollable = cursor.is_scrollable(),
            "Using emulated scrolling"
        );
        Scroll::Emulated
    };
    let deleted_row_marker = RowValue::deleted_marker(cursor.column_count());

    let fetcher: Box<dyn Fetcher + 'a> = match (scroll, config.is_updatable()) {
        (Scroll::None, false) => Box::new(ForwardOnlyFetcher::with_config(cursor, config, listener)),
        (Scroll::None, true) => Box::new(UpdatableFetcher::new(
            ForwardOnlyFetcher::with_config(cursor, config, ()),
            listener,
            deleted_row_marker,
        )),
        (Scroll::Server, false) => Box::new(ServerScrollFetcher::with_config(cursor, config, listener)?),
        (Scroll::Server, true) => Box::new(UpdatableFetcher::new(
            ServerScrollFetcher::with_config(cursor, config, ())?,
            listener,
            deleted_row_marker,
        )),
        (Scroll::Emulated, false) => Box::new(CachedFetcher::with_config(cursor, config, listener)?),
        (Scroll::Emulated, true) => Box::new(UpdatableFetcher::new(
            CachedFetcher::with_config(cursor, config, ())?,
            listener,
            deleted_row_marker,
        )),
    };
    Ok(fetcher)
}
