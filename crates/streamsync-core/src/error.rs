//! Error types module
//!
//! All failures that can escape a remote call or a repository operation are
//! unified under `SyncError`. Reconciliation outcomes such as a stale record or
//! a 404 on refresh are not errors; they travel as `ResponseEnvelope` data.
//!
//! The `Database` and `Transport` variants wrap `sqlx::Error` and
//! `reqwest::Error` when the `sqlx` and `http` features are enabled, and fall
//! back to plain strings otherwise.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[cfg(feature = "http")]
use reqwest::Error as ReqwestError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like invalid input
    Debug,
    /// Warning level - for recoverable issues like a missing configuration
    Warn,
    /// Error level - for unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Credentials are missing or invalid. Fatal to any remote call, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider answered, but not with what the protocol requires.
    #[error("Transfer error: {0}")]
    Transfer(String),

    #[cfg(feature = "http")]
    #[error("Transport error: {0}")]
    Transport(#[source] ReqwestError),

    #[cfg(not(feature = "http"))]
    #[error("Transport error: {0}")]
    Transport(String),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(feature = "sqlx")]
impl From<SqlxError> for SyncError {
    fn from(err: SqlxError) -> Self {
        SyncError::Database(err)
    }
}

#[cfg(feature = "http")]
impl From<ReqwestError> for SyncError {
    fn from(err: ReqwestError) -> Self {
        SyncError::Transport(err)
    }
}

impl SyncError {
    /// Machine-readable error code (e.g., "TRANSFER_ERROR")
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "CONFIGURATION_ERROR",
            SyncError::Transfer(_) => "TRANSFER_ERROR",
            SyncError::Transport(_) => "TRANSPORT_ERROR",
            SyncError::Database(_) => "DATABASE_ERROR",
            SyncError::Io(_) => "IO_ERROR",
            SyncError::InvalidInput(_) => "INVALID_INPUT",
            SyncError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same operation later may succeed
    pub fn is_recoverable(&self) -> bool {
        match self {
            SyncError::Configuration(_) | SyncError::InvalidInput(_) => false,
            SyncError::Transfer(_)
            | SyncError::Transport(_)
            | SyncError::Database(_)
            | SyncError::Io(_)
            | SyncError::Internal(_) => true,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            SyncError::InvalidInput(_) => LogLevel::Debug,
            SyncError::Configuration(_) => LogLevel::Warn,
            _ => LogLevel::Error,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, SyncError::Configuration(_))
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, SyncError::Transfer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_fatal() {
        let err = SyncError::Configuration("No credentials".to_string());
        assert!(!err.is_recoverable());
        assert!(err.is_configuration());
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn transfer_errors_are_recoverable() {
        let err = SyncError::Transfer("missing uid".to_string());
        assert!(err.is_recoverable());
        assert!(err.is_transfer());
        assert_eq!(err.to_string(), "Transfer error: missing uid");
    }

    #[test]
    fn io_error_converts() {
        let err: SyncError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert_eq!(err.log_level(), LogLevel::Error);
    }
}
