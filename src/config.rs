//! Fetch configuration and driver property parsing
//!
//! A [`FetchConfig`] describes how the rows of an executed query are fetched:
//! the result set type and concurrency requested by the client, the fetch
//! size, the max rows cap and whether scrollable result sets use server-side
//! scrollable cursors or emulate scrolling in memory.
//!
//! Properties can also be read from a driver property string:
//! `fetchSize=100;maxRows=500;scrollableCursor=EMULATED`.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Type of result set requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSetType {
    /// Rows can only be read once, front to back
    #[default]
    ForwardOnly,
    /// Rows can be visited in any order; changes by others are not visible
    ScrollInsensitive,
}

/// Concurrency mode requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    /// Rows cannot be modified through the result set
    #[default]
    ReadOnly,
    /// Rows can be inserted, updated and deleted through the result set
    Updatable,
}

/// How scrollable result sets are implemented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollableCursorMode {
    /// Use a server-side scrollable cursor when the server supports it
    #[default]
    Server,
    /// Fetch all rows and scroll in memory
    Emulated,
}

impl FromStr for ScrollableCursorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SERVER" => Ok(ScrollableCursorMode::Server),
            "EMULATED" => Ok(ScrollableCursorMode::Emulated),
            _ => Err(Error::InvalidConfig(format!(
                "invalid scrollableCursor value '{s}', expected SERVER or EMULATED"
            ))),
        }
    }
}

impl fmt::Display for ScrollableCursorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrollableCursorMode::Server => write!(f, "SERVER"),
            ScrollableCursorMode::Emulated => write!(f, "EMULATED"),
        }
    }
}

/// Fetch configuration for one result set.
///
/// # Example
///
/// ```rust
/// use firebird_fetch::{Concurrency, FetchConfig, ResultSetType, ScrollableCursorMode};
///
/// let config = FetchConfig::new()
///     .with_result_set_type(ResultSetType::ScrollInsensitive)
///     .with_concurrency(Concurrency::Updatable)
///     .with_fetch_size(50)
///     .with_max_rows(1000);
/// assert!(config.is_scrollable());
/// assert_eq!(config.max_rows, Some(1000));
///
/// let config: FetchConfig = "fetchSize=10;scrollableCursor=emulated".parse().unwrap();
/// assert_eq!(config.fetch_size, 10);
/// assert_eq!(config.scrollable_cursor, ScrollableCursorMode::Emulated);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchConfig {
    /// Rows per round trip, 0 for the driver default
    pub fetch_size: usize,
    /// Maximum number of rows visible in the result set
    pub max_rows: Option<usize>,
    /// Result set type
    pub result_set_type: ResultSetType,
    /// Concurrency mode
    pub concurrency: Concurrency,
    /// Scrollable cursor implementation
    pub scrollable_cursor: ScrollableCursorMode,
}

impl FetchConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fetch size
    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    /// Set the max rows cap; 0 removes the cap
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = (max_rows > 0).then_some(max_rows);
        self
    }

    /// Set the result set type
    pub fn with_result_set_type(mut self, result_set_type: ResultSetType) -> Self {
        self.result_set_type = result_set_type;
        self
    }

    /// Set the concurrency mode
    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the scrollable cursor implementation
    pub fn with_scrollable_cursor(mut self, mode: ScrollableCursorMode) -> Self {
        self.scrollable_cursor = mode;
        self
    }

    /// Whether the result set is scrollable
    pub fn is_scrollable(&self) -> bool {
        self.result_set_type == ResultSetType::ScrollInsensitive
    }

    /// Whether the result set is updatable
    pub fn is_updatable(&self) -> bool {
        self.concurrency == Concurrency::Updatable
    }

    /// Apply a driver property
    ///
    /// Known keys are `fetchSize`, `maxRows` and `scrollableCursor`; keys are
    /// matched case-insensitively. Unknown keys are ignored.
    pub fn apply_property(&mut self, key: &str, value: &str) -> Result<()> {
        match key.trim().to_ascii_lowercase().as_str() {
            "fetchsize" => self.fetch_size = parse_count(key, value)?,
            "maxrows" => {
                let max_rows = parse_count(key, value)?;
                self.max_rows = (max_rows > 0).then_some(max_rows);
            }
            "scrollablecursor" => self.scrollable_cursor = value.parse()?,
            _ => tracing::trace!(key = key, "Ignoring unknown fetch property"),
        }
        Ok(())
    }
}

fn parse_count(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("invalid value '{value}' for {key}")))
}

/// Parse `key=value` properties separated by `;` or `&`
impl FromStr for FetchConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut config = FetchConfig::default();
        for property in s.split([';', '&']).map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = property.split_once('=').ok_or_else(|| {
                Error::InvalidConfig(format!("property '{property}' is missing a value"))
            })?;
            config.apply_property(key, value)?;
        }
        Ok(config)
    }
}
