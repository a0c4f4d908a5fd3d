//! Unified application error type.
//! Registry, sync adapter, gateways and the HTTP layer all return AppError
//! so a failure is classified once and rendered the same way everywhere.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    // ---------------------------
    // Registry / input errors
    // ---------------------------
    #[error("{0}")]
    Validation(String),

    #[error("A job with this name already exists")]
    DuplicateName,

    #[error("Maximum number of jobs reached ({max})")]
    LimitExceeded { max: usize },

    #[error("Job not found")]
    NotFound(i64),

    // ---------------------------
    // Remote spreadsheet errors
    // ---------------------------
    #[error("Sync error: {0}")]
    Sync(String),

    #[error("Remote call timed out: {0}")]
    Timeout(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Shorthand for input errors raised by the registry and the adapter.
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// True for errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::DuplicateName
                | AppError::LimitExceeded { .. }
                | AppError::NotFound(_)
        )
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AppError::Timeout(e.to_string())
        } else {
            AppError::Sync(e.to_string())
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_http_contract() {
        assert_eq!(
            AppError::DuplicateName.to_string(),
            "A job with this name already exists"
        );
        assert_eq!(
            AppError::LimitExceeded { max: 10 }.to_string(),
            "Maximum number of jobs reached (10)"
        );
        assert_eq!(AppError::validation("bad").to_string(), "bad");
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(AppError::NotFound(3).is_client_error());
        assert!(AppError::DuplicateName.is_client_error());
        assert!(!AppError::Sync("boom".into()).is_client_error());
        assert!(!AppError::Timeout("append".into()).is_client_error());
    }
}
