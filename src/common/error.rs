//! Error types for escar

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // === I/O Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Directory Errors ===
    #[error("Directory error: {0}")]
    Directory(String),

    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Corrupted record: {0}")]
    Corrupted(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Membership Errors ===
    #[error("Membership error: {0}")]
    Membership(String),

    // === Config Errors ===
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Control flow ===
    #[error("Operation timeout: {0}")]
    Timeout(String),

    #[error("Operation cancelled")]
    Cancelled,

    // === Generic ===
    #[error("Internal error: {0}")]
    Internal(String),
}

/// How the retry executor treats a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Transient backend failure, retried within the attempt budget.
    Retryable,
    /// Never retried, surfaced to the caller unchanged.
    Fatal,
    /// Aborts the call immediately without consuming budget.
    Cancelled,
}

impl Error {
    /// Classify this error for retry handling
    pub fn class(&self) -> FailureClass {
        match self {
            Error::Cancelled => FailureClass::Cancelled,
            Error::InvalidConfig(_) | Error::Config(_) => FailureClass::Fatal,
            _ => FailureClass::Retryable,
        }
    }

    /// Convert to HTTP status code
    pub fn to_http_status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::InvalidConfig(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::Directory(_) | Error::RocksDb(_) | Error::Membership(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Error::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Corrupted(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes() {
        assert_eq!(Error::Cancelled.class(), FailureClass::Cancelled);
        assert_eq!(
            Error::InvalidConfig("no clusters".into()).class(),
            FailureClass::Fatal
        );
        assert_eq!(
            Error::Directory("connection reset".into()).class(),
            FailureClass::Retryable
        );
        assert_eq!(
            Error::Membership("throttled".into()).class(),
            FailureClass::Retryable
        );
    }
}
