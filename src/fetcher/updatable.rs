//! Client-side row modifications over another fetcher
//!
//! [`UpdatableFetcher`] presents the rows of a wrapped fetcher as one logical
//! sequence in which the client can insert, update and delete rows. Changes
//! never reach the wrapped fetcher or the server; they live in an overlay:
//!
//! - the head of the sequence, up to the last modified row, is materialized
//!   as a list of entries, each either referring to a wrapped row or holding
//!   a local row value;
//! - everything after the head maps one-to-one onto the remaining wrapped
//!   rows, which are only fetched when visited;
//! - rows appended at the end follow the last wrapped row.
//!
//! Deleted rows keep their position and report the deleted-row marker.
//!
//! Over a forward-only fetcher the overlay is forward-only too: only `next`
//! moves it, and the size is known once the wrapped rows are exhausted.

use crate::constants::CompletionReason;
use crate::error::{Error, Result};
use crate::listener::FetcherListener;
use crate::row::RowValue;

use super::{Fetcher, Position};

#[derive(Debug, Clone)]
enum RowSource {
    /// Row of the wrapped fetcher, by its row number
    Wrapped(usize),
    Local(RowValue),
    Deleted,
}

#[derive(Debug, Clone)]
struct Entry {
    source: RowSource,
    inserted: bool,
    updated: bool,
}

impl Entry {
    fn wrapped(row: usize) -> Self {
        Self {
            source: RowSource::Wrapped(row),
            inserted: false,
            updated: false,
        }
    }

    fn inserted(row: RowValue) -> Self {
        Self {
            source: RowSource::Local(row),
            inserted: true,
            updated: false,
        }
    }

    fn is_deleted(&self) -> bool {
        matches!(self.source, RowSource::Deleted)
    }
}

/// Location of a logical row in the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Index into the materialized head
    Head(usize),
    /// Row number of an untouched wrapped row
    Wrapped(usize),
    /// Index into the appended rows
    Appended(usize),
}

/// Updatable view over another fetcher.
///
/// # Example
///
/// ```rust
/// use firebird_fetch::{Fetcher, MemoryCursor, RowValue, ServerScrollFetcher, UpdatableFetcher};
///
/// # fn example() -> firebird_fetch::Result<()> {
/// let rows = (1..=3).map(|i: i32| RowValue::of([Some(i.to_be_bytes())])).collect();
/// let inner = ServerScrollFetcher::new(MemoryCursor::new(rows), 0, None, ())?;
/// let mut fetcher = UpdatableFetcher::new(inner, (), RowValue::deleted_marker(1));
///
/// fetcher.absolute(2)?;
/// fetcher.insert_row(RowValue::of([Some(99i32.to_be_bytes())]))?;
/// assert_eq!(fetcher.row_num()?, 3);
/// assert!(fetcher.row_inserted());
/// assert_eq!(fetcher.size()?, 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UpdatableFetcher<F, L = ()> {
    inner: F,
    listener: L,
    deleted_row_marker: RowValue,
    head: Vec<Entry>,
    /// First wrapped row not covered by `head`
    next_wrapped_row: usize,
    appended: Vec<Entry>,
    position: Position,
    slot: Option<Slot>,
    current_row: Option<RowValue>,
    closed: bool,
}

impl<F: Fetcher, L: FetcherListener> UpdatableFetcher<F, L> {
    /// Wrap `inner`; deleted rows are reported as `deleted_row_marker`
    pub fn new(inner: F, listener: L, deleted_row_marker: RowValue) -> Self {
        Self {
            inner,
            listener,
            deleted_row_marker,
            head: Vec::new(),
            next_wrapped_row: 1,
            appended: Vec::new(),
            position: Position::BeforeFirst,
            slot: None,
            current_row: None,
            closed: false,
        }
    }

    /// Get the wrapped fetcher
    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Get the listener
    pub fn listener(&self) -> &L {
        &self.listener
    }

    fn check_open(&self) -> Result<()> {
        if self.closed || self.inner.is_closed() {
            return Err(Error::ResultSetClosed);
        }
        Ok(())
    }

    fn check_scrollable(&self, operation: &str) -> Result<()> {
        self.check_open()?;
        if self.inner.is_forward_only() {
            return Err(Error::ForwardOnly(operation.to_string()));
        }
        Ok(())
    }

    fn notify(&mut self, position: Position, slot: Option<Slot>, row: Option<RowValue>) -> bool {
        self.position = position;
        self.slot = slot;
        self.listener.row_changed(row.as_ref());
        let found = row.is_some();
        self.current_row = row;
        found
    }

    fn move_before_first(&mut self) -> bool {
        self.notify(Position::BeforeFirst, None, None)
    }

    fn move_after_last(&mut self) -> bool {
        self.notify(Position::AfterLast, None, None)
    }

    fn logical_size(&mut self) -> Result<usize> {
        let wrapped_size = self.inner.size()?;
        let untouched = (wrapped_size + 1).saturating_sub(self.next_wrapped_row);
        Ok(self.head.len() + untouched + self.appended.len())
    }

    /// Locate logical row `target` (1-based); `None` if beyond the end
    ///
    /// A `Wrapped` slot may still be beyond the end when no rows were
    /// appended, or while a forward-only fetcher has rows left to read,
    /// which only shows when the wrapped fetcher is moved there.
    fn resolve(&mut self, target: usize) -> Result<Option<Slot>> {
        if target <= self.head.len() {
            return Ok(Some(Slot::Head(target - 1)));
        }
        let wrapped_row = self.next_wrapped_row + (target - self.head.len() - 1);
        let streaming = self.inner.is_forward_only() && self.inner.position() != Position::AfterLast;
        if self.appended.is_empty() || streaming {
            return Ok(Some(Slot::Wrapped(wrapped_row)));
        }
        let wrapped_size = self.inner.size()?;
        if wrapped_row <= wrapped_size {
            return Ok(Some(Slot::Wrapped(wrapped_row)));
        }
        let index = wrapped_row - wrapped_size - 1;
        Ok((index < self.appended.len()).then_some(Slot::Appended(index)))
    }

    /// Move the wrapped fetcher to `row` and read it
    fn wrapped_row(&mut self, row: usize) -> Result<Option<RowValue>> {
        let found = match self.inner.position() {
            Position::Row(current) if current == row => self.inner.current_row().is_some(),
            Position::Row(current) if current + 1 == row => self.inner.next()?,
            Position::Row(current) if current == row + 1 => self.inner.previous()?,
            Position::BeforeFirst if row == 1 => self.inner.next()?,
            _ => self.inner.absolute(i64::try_from(row).unwrap_or(i64::MAX))?,
        };
        Ok(if found {
            self.inner.current_row().cloned()
        } else {
            None
        })
    }

    fn entry_row(&mut self, entry: &Entry) -> Result<Option<RowValue>> {
        match &entry.source {
            RowSource::Wrapped(row) => self.wrapped_row(*row),
            RowSource::Local(row) => Ok(Some(row.clone())),
            RowSource::Deleted => Ok(Some(self.deleted_row_marker.clone())),
        }
    }

    fn move_to(&mut self, target: usize) -> Result<bool> {
        let Some(slot) = self.resolve(target)? else {
            return Ok(self.move_after_last());
        };
        let row = match slot {
            Slot::Head(index) => {
                let entry = self.head[index].clone();
                self.entry_row(&entry)?
            }
            Slot::Wrapped(row) => self.wrapped_row(row)?,
            Slot::Appended(index) => {
                let entry = self.appended[index].clone();
                self.entry_row(&entry)?
            }
        };
        match row {
            Some(row) => Ok(self.notify(Position::Row(target), Some(slot), Some(row))),
            // Forward-only wrapped rows ran out, the appended rows follow
            None if !self.appended.is_empty()
                && self.inner.is_forward_only()
                && self.inner.position() == Position::AfterLast =>
            {
                self.move_to(target)
            }
            None => Ok(self.move_after_last()),
        }
    }

    /// Whether the wrapped fetcher has rows after row `last`
    fn has_wrapped_rows_after(&mut self, last: usize) -> Result<bool> {
        match self.inner.position() {
            Position::Row(row) if row == last => Ok(!self.inner.is_last()?),
            Position::BeforeFirst if last == 0 => Ok(!self.inner.is_empty()?),
            _ => Ok(self.inner.size()? > last),
        }
    }

    /// Extend the head to cover wrapped row `row`, returning its head index
    fn materialize(&mut self, row: usize) -> usize {
        while self.next_wrapped_row <= row {
            self.head.push(Entry::wrapped(self.next_wrapped_row));
            self.next_wrapped_row += 1;
        }
        self.head.len() - 1
    }

    fn current_slot(&self, operation: &str) -> Result<Slot> {
        match (self.position, self.slot) {
            (Position::Row(_), Some(slot)) => Ok(slot),
            _ => Err(Error::InvalidCursorState(format!(
                "{operation} requires a current row"
            ))),
        }
    }

    /// Entry of the current row, materializing it if needed
    fn current_entry_mut(&mut self, slot: Slot) -> (&mut Entry, Slot) {
        match slot {
            Slot::Head(index) => (&mut self.head[index], slot),
            Slot::Appended(index) => (&mut self.appended[index], slot),
            Slot::Wrapped(row) => {
                let index = self.materialize(row);
                (&mut self.head[index], Slot::Head(index))
            }
        }
    }

    fn current_entry(&self) -> Option<&Entry> {
        match self.slot? {
            Slot::Head(index) => self.head.get(index),
            Slot::Appended(index) => self.appended.get(index),
            Slot::Wrapped(_) => None,
        }
    }

    fn base_position(&mut self) -> Result<usize> {
        Ok(match self.position {
            Position::BeforeFirst => 0,
            Position::Row(row) => row,
            Position::AfterLast => self.logical_size()? + 1,
        })
    }
}

impl<F: Fetcher, L: FetcherListener> Fetcher for UpdatableFetcher<F, L> {
    fn first(&mut self) -> Result<bool> {
        self.check_scrollable("first")?;
        self.move_to(1)
    }

    fn last(&mut self) -> Result<bool> {
        self.check_scrollable("last")?;
        match self.logical_size()? {
            0 => Ok(self.move_after_last()),
            size => self.move_to(size),
        }
    }

    fn next(&mut self) -> Result<bool> {
        self.check_open()?;
        match self.position {
            Position::BeforeFirst => self.move_to(1),
            Position::Row(row) => self.move_to(row + 1),
            Position::AfterLast => Ok(self.move_after_last()),
        }
    }

    fn previous(&mut self) -> Result<bool> {
        self.check_scrollable("previous")?;
        match self.base_position()? {
            0 | 1 => Ok(self.move_before_first()),
            base => self.move_to(base - 1),
        }
    }

    fn absolute(&mut self, row: i64) -> Result<bool> {
        self.check_scrollable("absolute")?;
        let target = match row {
            0 => return Ok(self.move_before_first()),
            row if row > 0 => usize::try_from(row).unwrap_or(usize::MAX),
            row => {
                let size = self.logical_size()?;
                let from_end = usize::try_from(row.unsigned_abs()).unwrap_or(usize::MAX);
                if from_end > size {
                    return Ok(self.move_before_first());
                }
                size + 1 - from_end
            }
        };
        self.move_to(target)
    }

    fn relative(&mut self, rows: i64) -> Result<bool> {
        self.check_scrollable("relative")?;
        if rows == 0 {
            let row = self.current_row.clone();
            return Ok(self.notify(self.position, self.slot, row));
        }
        let base = i64::try_from(self.base_position()?).unwrap_or(i64::MAX);
        let target = base.saturating_add(rows);
        if target <= 0 {
            return Ok(self.move_before_first());
        }
        self.move_to(usize::try_from(target).unwrap_or(usize::MAX))
    }

    fn before_first(&mut self) -> Result<()> {
        self.check_scrollable("before_first")?;
        self.inner.before_first()?;
        self.move_before_first();
        Ok(())
    }

    fn after_last(&mut self) -> Result<()> {
        self.check_scrollable("after_last")?;
        self.inner.after_last()?;
        self.move_after_last();
        Ok(())
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
        match self.slot {
            Some(Slot::Appended(index)) => Ok(index + 1 == self.appended.len()),
            Some(Slot::Head(index)) => {
                if index + 1 < self.head.len() || !self.appended.is_empty() {
                    return Ok(false);
                }
                let last_wrapped = self.next_wrapped_row - 1;
                Ok(!self.has_wrapped_rows_after(last_wrapped)?)
            }
            Some(Slot::Wrapped(row)) => {
                if !self.appended.is_empty() {
                    return Ok(false);
                }
                Ok(!self.has_wrapped_rows_after(row)?)
            }
            None => Ok(false),
        }
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
        if !self.head.is_empty() || !self.appended.is_empty() {
            return Ok(false);
        }
        self.inner.is_empty()
    }

    fn row_num(&self) -> Result<usize> {
        self.check_open()?;
        Ok(self.position.row_num())
    }

    fn size(&mut self) -> Result<usize> {
        self.check_open()?;
        self.logical_size()
    }

    fn position(&self) -> Position {
        self.position
    }

    fn current_row(&self) -> Option<&RowValue> {
        self.current_row.as_ref()
    }

    fn fetch_size(&self) -> usize {
        self.inner.fetch_size()
    }

    fn set_fetch_size(&mut self, fetch_size: usize) {
        self.inner.set_fetch_size(fetch_size);
    }

    fn close(&mut self, reason: CompletionReason) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.head.clear();
        self.appended.clear();
        self.slot = None;
        self.current_row = None;

        let result = self.inner.close(reason);
        tracing::debug!(?reason, "Updatable fetcher closed");
        self.listener.fetcher_closed();
        result
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn is_forward_only(&self) -> bool {
        self.inner.is_forward_only()
    }

    fn insert_row(&mut self, row: RowValue) -> Result<()> {
        self.check_open()?;
        let slot = self.current_slot("insert")?;
        let current = self.position.row_num();
        let inserted = match slot {
            Slot::Head(index) => {
                self.head.insert(index + 1, Entry::inserted(row.clone()));
                Slot::Head(index + 1)
            }
            Slot::Wrapped(wrapped) => {
                let index = self.materialize(wrapped);
                self.head.insert(index + 1, Entry::inserted(row.clone()));
                Slot::Head(index + 1)
            }
            Slot::Appended(index) => {
                self.appended.insert(index + 1, Entry::inserted(row.clone()));
                Slot::Appended(index + 1)
            }
        };
        tracing::trace!(row = current + 1, "Row inserted");
        self.notify(Position::Row(current + 1), Some(inserted), Some(row));
        Ok(())
    }

    fn update_row(&mut self, row: RowValue) -> Result<()> {
        self.check_open()?;
        let slot = self.current_slot("update")?;
        let (entry, slot) = self.current_entry_mut(slot);
        entry.source = RowSource::Local(row.clone());
        entry.updated = true;
        tracing::trace!(row = self.position.row_num(), "Row updated");
        self.notify(self.position, Some(slot), Some(row));
        Ok(())
    }

    fn delete_row(&mut self) -> Result<()> {
        self.check_open()?;
        let slot = self.current_slot("delete")?;
        let (entry, slot) = self.current_entry_mut(slot);
        if entry.is_deleted() {
            return Ok(());
        }
        entry.source = RowSource::Deleted;
        tracing::trace!(row = self.position.row_num(), "Row deleted");
        let marker = self.deleted_row_marker.clone();
        self.notify(self.position, Some(slot), Some(marker));
        Ok(())
    }

    fn append_row(&mut self, row: RowValue) -> Result<()> {
        self.check_open()?;
        self.appended.push(Entry::inserted(row));
        Ok(())
    }

    fn row_inserted(&self) -> bool {
        self.current_entry().is_some_and(|entry| entry.inserted)
    }

    fn row_updated(&self) -> bool {
        self.current_entry().is_some_and(|entry| entry.updated)
    }

    fn row_deleted(&self) -> bool {
        self.current_entry().is_some_and(Entry::is_deleted)
    }
}
