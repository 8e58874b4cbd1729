//! Error types for sandbox-share.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::path::PathBuf;

/// Main error type for sandbox-share operations.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A different body is already stored under this handle.
    #[error("handle collision: {handle}")]
    HandleCollision {
        /// The contested handle.
        handle: String,
    },

    /// Database path error.
    #[error("invalid database path: {path}")]
    InvalidPath {
        /// The invalid path.
        path: PathBuf,
    },
}

/// Errors answered to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request is not a usable share.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The envelope is larger than the configured limit.
    #[error("payload too large (limit: {limit} bytes)")]
    PayloadTooLarge {
        /// Maximum allowed size.
        limit: usize,
    },

    /// No share under this handle.
    #[error("share not found: {handle}")]
    NotFound {
        /// The requested handle.
        handle: String,
    },

    /// Storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::HandleCollision { .. }) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            // Storage details stay in the log.
            return (status, "internal error").into_response();
        }
        tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        (status, self.to_string()).into_response()
    }
}

/// Result type alias for share service operations.
pub type Result<T> = std::result::Result<T, ShareError>;

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_statuses() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge { limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::NotFound {
                handle: "ab12".into()
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Storage(StorageError::HandleCollision {
                handle: "ab12".into()
            })
            .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Storage(StorageError::Migration("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
