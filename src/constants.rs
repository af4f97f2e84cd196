//! Constants shared by the fetch engine

// =============================================================================
// Fetch Defaults
// =============================================================================

/// Number of rows fetched per round trip when no fetch size was set
pub const DEFAULT_FETCH_ROWS: usize = 400;

// =============================================================================
// Fetch Orientation (for scrollable cursors)
// =============================================================================

/// Fetch orientation for scrollable cursor operations
///
/// The discriminants are the Firebird `fetch_scroll` operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FetchOrientation {
    /// Fetch the next rows (default)
    #[default]
    Next = 0,
    /// Fetch the previous rows
    Prior = 1,
    /// Fetch the first row
    First = 2,
    /// Fetch the last row
    Last = 3,
    /// Fetch an absolute position
    Absolute = 4,
    /// Fetch relative to the current position
    Relative = 5,
}

impl FetchOrientation {
    /// Whether this orientation can return more than one row
    pub fn is_multi_row(self) -> bool {
        matches!(self, FetchOrientation::Next | FetchOrientation::Prior)
    }
}

// =============================================================================
// Completion Reasons
// =============================================================================

/// Reason a fetcher (and its server cursor) is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionReason {
    /// Result set closed by its owner
    #[default]
    Other,
    /// The owning statement completed (for example re-executed or closed)
    StatementCompleted,
    /// The transaction the cursor belongs to ended
    TransactionEnd,
}

impl CompletionReason {
    /// Whether the transaction of the cursor has ended
    pub fn is_transaction_end(self) -> bool {
        self == CompletionReason::TransactionEnd
    }
}
