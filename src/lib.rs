#![warn(missing_docs)]

//! # firebird-fetch
//!
//! Result set fetch engine for Firebird database drivers.
//!
//! This crate implements how the rows of an executed query are navigated: it
//! drives a server-side scrollable cursor through a small fetch capability,
//! caches the most recent window of rows, learns the cursor size lazily,
//! honors a max rows cap and reports every change of the current row to a
//! listener. An update overlay lets clients insert, update and delete rows
//! of a result set without touching the server.
//!
//! ## Features
//!
//! - **Server-side scrolling** - `next`, `previous`, `first`, `last`,
//!   `absolute` and `relative` mapped onto Firebird scroll fetches
//! - **Fetch windows** - movement within the last fetched rows needs no
//!   round trip
//! - **Max rows** - a cap makes the result set end early, everywhere
//! - **Updatable result sets** - inserted, updated and deleted rows tracked
//!   per position, with a deleted-row marker
//! - **Emulated scrolling** - in-memory fallback when the server cannot
//!   scroll
//! - **Forward-only streaming** - one fetch batch in memory at a time
//!
//! ## Quick Start
//!
//! ```rust
//! use firebird_fetch::{Fetcher, MemoryCursor, RecordingListener, RowValue, ServerScrollFetcher};
//!
//! # fn example() -> firebird_fetch::Result<()> {
//! let rows = (1..=10).map(|i: i32| RowValue::of([Some(i.to_be_bytes())])).collect();
//! let listener = RecordingListener::new();
//! let mut fetcher = ServerScrollFetcher::new(MemoryCursor::new(rows), 3, None, listener.clone())?;
//!
//! while fetcher.next()? {
//!     let row = fetcher.current_row().expect("positioned on a row");
//!     println!("{:?}", row.field_data(0));
//! }
//!
//! assert!(fetcher.is_after_last()?);
//! assert_eq!(listener.len(), 11);
//! # Ok(())
//! # }
//! ```
//!
//! ## Choosing a Fetcher
//!
//! [`open_fetcher`] selects the fetcher for a [`FetchConfig`]:
//!
//! ```rust
//! use firebird_fetch::{open_fetcher, Concurrency, FetchConfig, MemoryCursor, ResultSetType, RowValue};
//!
//! # fn example() -> firebird_fetch::Result<()> {
//! let rows = (1..=3).map(|i: i32| RowValue::of([Some(i.to_be_bytes())])).collect();
//! let config = FetchConfig::new()
//!     .with_result_set_type(ResultSetType::ScrollInsensitive)
//!     .with_concurrency(Concurrency::Updatable);
//!
//! let mut fetcher = open_fetcher(MemoryCursor::new(rows), &config, ())?;
//! fetcher.last()?;
//! fetcher.delete_row()?;
//! assert!(fetcher.row_deleted());
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! Round trips, row count discovery and close are reported through
//! [`tracing`](https://docs.rs/tracing) events. The crate installs no
//! subscriber.

pub mod config;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod fetcher;
pub mod listener;
pub mod memory;
pub mod row;

// Re-export commonly used types
pub use config::{Concurrency, FetchConfig, ResultSetType, ScrollableCursorMode};
pub use constants::{CompletionReason, FetchOrientation, DEFAULT_FETCH_ROWS};
pub use cursor::{FetchRequest, ScrollResult, ServerCursor};
pub use error::{Error, Result};
pub use fetcher::{
    open_fetcher, CachedFetcher, Fetcher, ForwardOnlyFetcher, Position, ServerScrollFetcher,
    UpdatableFetcher,
};
pub use listener::{FetcherListener, RecordingListener};
pub use memory::MemoryCursor;
pub use row::RowValue;
