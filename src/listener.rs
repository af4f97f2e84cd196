//! Row change notifications
//!
//! Fetchers do not expose their current row through shared state. Instead,
//! every change of position or of the current row's content is pushed to a
//! [`FetcherListener`] injected at construction. The notification happens
//! synchronously, before the positioning call returns.

use std::cell::RefCell;
use std::rc::Rc;

use crate::row::RowValue;

/// Receiver of fetcher state changes
pub trait FetcherListener {
    /// The current row changed
    ///
    /// `row` is `None` when the fetcher moved to before-first or after-last.
    fn row_changed(&mut self, row: Option<&RowValue>);

    /// The fetcher was closed
    fn fetcher_closed(&mut self) {}
}

/// Listener that ignores all notifications
impl FetcherListener for () {
    fn row_changed(&mut self, _row: Option<&RowValue>) {}
}

impl<L: FetcherListener + ?Sized> FetcherListener for &mut L {
    fn row_changed(&mut self, row: Option<&RowValue>) {
        (**self).row_changed(row);
    }

    fn fetcher_closed(&mut self) {
        (**self).fetcher_closed();
    }
}

impl<L: FetcherListener + ?Sized> FetcherListener for Box<L> {
    fn row_changed(&mut self, row: Option<&RowValue>) {
        (**self).row_changed(row);
    }

    fn fetcher_closed(&mut self) {
        (**self).fetcher_closed();
    }
}

#[derive(Debug, Default)]
struct Recording {
    rows: Vec<Option<RowValue>>,
    closed: bool,
}

/// Listener that records every notification
///
/// Clones share the same recording, so a clone can be handed to a fetcher
/// while another one is kept to inspect what was reported.
///
/// # Example
///
/// ```rust
/// use firebird_fetch::{FetcherListener, RecordingListener, RowValue};
///
/// let recorder = RecordingListener::new();
/// let mut listener = recorder.clone();
/// listener.row_changed(Some(&RowValue::of([Some(b"x")])));
/// listener.row_changed(None);
///
/// assert_eq!(recorder.len(), 2);
/// assert!(recorder.row(1).unwrap().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    recording: Rc<RefCell<Recording>>,
}

impl RecordingListener {
    /// Create an empty recording
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows reported so far
    pub fn rows(&self) -> Vec<Option<RowValue>> {
        self.recording.borrow().rows.clone()
    }

    /// Row reported by notification `index`
    ///
    /// The outer `Option` is `None` when fewer notifications were received.
    pub fn row(&self, index: usize) -> Option<Option<RowValue>> {
        self.recording.borrow().rows.get(index).cloned()
    }

    /// Most recent notification
    pub fn last(&self) -> Option<Option<RowValue>> {
        self.recording.borrow().rows.last().cloned()
    }

    /// Number of notifications received
    pub fn len(&self) -> usize {
        self.recording.borrow().rows.len()
    }

    /// Check if no notifications were received
    pub fn is_empty(&self) -> bool {
        self.recording.borrow().rows.is_empty()
    }

    /// Forget the recorded rows
    pub fn clear_rows(&self) {
        self.recording.borrow_mut().rows.clear();
    }

    /// Whether a close notification was received
    pub fn is_closed(&self) -> bool {
        self.recording.borrow().closed
    }
}

impl FetcherListener for RecordingListener {
    fn row_changed(&mut self, row: Option<&RowValue>) {
        self.recording.borrow_mut().rows.push(row.cloned());
    }

    fn fetcher_closed(&mut self) {
        self.recording.borrow_mut().closed = true;
    }
}
