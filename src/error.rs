//! Error types for tick-ledger.
//!
//! Clean error handling using `thiserror` for ergonomic error definitions.
//! Ordering violations are deliberately absent here: they are recoverable
//! and surface as [`crate::types::OutOfOrderEvent`] values instead.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Main error type for ledger operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Symbol was never ingested
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Record routed to a ledger that owns a different symbol
    #[error("Record for {actual} routed to ledger for {expected}")]
    SymbolMismatch { expected: String, actual: String },

    /// Symbol already present when merging tables
    #[error("Symbol already tracked: {0}")]
    DuplicateSymbol(String),

    /// Record failed validation (empty symbol, negative price, ...)
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Input line has fewer fields than required
    #[error("Missing field #{index} ({name})")]
    MissingField { index: usize, name: &'static str },

    /// Field could not be converted to its expected type
    #[error("Invalid {name}: {value:?}")]
    InvalidField { name: &'static str, value: String },

    /// Update type outside {1, 2, 3}
    #[error("Invalid update type: {0:?}")]
    InvalidUpdateType(String),

    /// Date not in YYYYMMDD form or not a calendar date
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),

    /// I/O failure (file open, read, write)
    #[error("IO error: {0}")]
    Io(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl LedgerError {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        LedgerError::Generic(msg.into())
    }

    /// Whether this error came from decoding an input line.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            LedgerError::MissingField { .. }
                | LedgerError::InvalidField { .. }
                | LedgerError::InvalidUpdateType(_)
                | LedgerError::InvalidDate(_)
        )
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Generic(format!("JSON error: {err}"))
    }
}

impl From<String> for LedgerError {
    fn from(err: String) -> Self {
        LedgerError::Generic(err)
    }
}

impl From<&str> for LedgerError {
    fn from(err: &str) -> Self {
        LedgerError::Generic(err.to_string())
    }
}
