//! Error types for the fetch engine
//!
//! This module defines the errors that can surface while positioning a
//! result set, from failures reported by the server cursor to misuse of a
//! fetcher after it was closed.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the fetch engine
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// General protocol error reported by the server cursor
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Firebird error with GDS error code
    #[error("GDS error {code}: {message}")]
    ServerError { code: u32, message: String },

    // =========================================================================
    // Connection Errors
    // =========================================================================
    /// Connection closed unexpectedly
    #[error("connection closed unexpectedly")]
    ConnectionClosed,

    /// The server cursor is closed
    #[error("cursor is closed")]
    CursorClosed,

    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // =========================================================================
    // Result Set Errors
    // =========================================================================
    /// The fetcher was closed (result set closed or transaction ended)
    #[error("result set is already closed")]
    ResultSetClosed,

    /// Operation requires a current row
    #[error("invalid cursor state: {0}")]
    InvalidCursorState(String),

    /// Row mutation on a fetcher without an update overlay
    #[error("result set is read-only")]
    ReadOnly,

    /// Scrolling operation on a forward-only result set
    #[error("operation {0} not allowed on a forward-only result set")]
    ForwardOnly(String),

    // =========================================================================
    // Feature and Configuration Errors
    // =========================================================================
    /// Feature not supported
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),

    /// Invalid configuration property
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a new server error
    pub fn server(code: u32, message: impl Into<String>) -> Self {
        Error::ServerError {
            code,
            message: message.into(),
        }
    }

    /// Check if this is a connection-related error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::ConnectionClosed | Error::Io(_))
    }

    /// Check if this error was raised by the server or transport, leaving the
    /// fetcher usable for another attempt
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Protocol(_) | Error::ServerError { .. } | Error::ConnectionClosed | Error::Io(_)
        )
    }

    /// Check if this error signals use of a closed fetcher or cursor
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::ResultSetClosed | Error::CursorClosed)
    }
}
