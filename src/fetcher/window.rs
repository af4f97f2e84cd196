//! Contiguous run of rows cached from the last server fetch

use crate::row::RowValue;

/// Rows `offset..offset + rows.len()` of the cursor, 1-based
#[derive(Debug, Default)]
pub(crate) struct FetchWindow {
    rows: Vec<RowValue>,
    offset: usize,
}

impl FetchWindow {
    /// Row at `position`, if cached
    pub(crate) fn get(&self, position: usize) -> Option<&RowValue> {
        if self.rows.is_empty() || position < self.offset {
            return None;
        }
        self.rows.get(position - self.offset)
    }

    /// Replace the window with rows in ascending order starting at `offset`
    pub(crate) fn replace(&mut self, offset: usize, rows: Vec<RowValue>) {
        self.offset = offset;
        self.rows = rows;
    }

    /// Add a row at `position`, extending the window when it is adjacent
    ///
    /// The window never grows beyond `capacity` rows; the oldest rows are
    /// dropped first.
    pub(crate) fn push(&mut self, position: usize, row: RowValue, capacity: usize) {
        if self.rows.is_empty() || self.last_position() != Some(position - 1) {
            self.replace(position, vec![row]);
            return;
        }
        self.rows.push(row);
        let excess = self.rows.len().saturating_sub(capacity.max(1));
        if excess > 0 {
            self.rows.drain(..excess);
            self.offset += excess;
        }
    }

    /// Position of the last cached row
    pub(crate) fn last_position(&self) -> Option<usize> {
        (!self.rows.is_empty()).then(|| self.offset + self.rows.len() - 1)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
        self.offset = 0;
    }
}
