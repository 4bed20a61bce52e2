use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

/// Errors surfaced by the table-access layer.
///
/// Record-shape failures and store failures are kept apart so callers can
/// decide between retrying and failing fast. A missing record is never an
/// error; lookups return `Ok(None)` instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("failed to marshal record: {0}")]
    Marshal(String),
    #[error("failed to unmarshal record: {0}")]
    Unmarshal(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("a record already exists under this key")]
    AlreadyExists,
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl DatabaseError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
        }
    }

    /// Only store-side failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Map any SDK operation error to a backend error, keeping the full error chain.
pub fn map_sdk_error<E, R>(operation: &'static str) -> impl FnOnce(SdkError<E, R>) -> DatabaseError
where
    E: std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    move |err| DatabaseError::backend(operation, DisplayErrorContext(&err).to_string())
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_errors_are_retryable() {
        let err = DatabaseError::backend("GetItem", "connection reset");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "GetItem failed: connection reset");
    }

    #[test]
    fn shape_errors_are_not_retryable() {
        assert!(!DatabaseError::Marshal("bad".into()).is_retryable());
        assert!(!DatabaseError::Unmarshal("bad".into()).is_retryable());
        assert!(!DatabaseError::InvalidRequest("bad".into()).is_retryable());
        assert!(!DatabaseError::AlreadyExists.is_retryable());
    }
}
