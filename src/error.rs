use std::time::Duration;

use thiserror::Error;

/// Every failure surfaced by the command builder, the result mapper and the
/// execution lifecycle.
///
/// Driver failures travel through unchanged (the `#[from]` variants are
/// transparent), so callers can match on the backend error directly.
#[derive(Debug, Error)]
pub enum SprocError {
    #[cfg(feature = "mssql")]
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    /// The caller used the API out of order, e.g. bound a parameter before the
    /// command was configured as a stored-procedure call.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Type conversion error: {0}")]
    ConversionError(String),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Other database error: {0}")]
    Other(String),
}

impl SprocError {
    /// True for precondition violations the caller can fix without touching the database.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidOperation(_))
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
