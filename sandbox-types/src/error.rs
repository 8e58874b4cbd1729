//! Error types for the sandbox persistence layer.

use thiserror::Error;

/// Errors that can occur while decoding, loading, or persisting sandbox state.
///
/// Read-path variants (`MalformedToken`, `MalformedEnvelope`) are recoverable:
/// callers fall back to defaults or the in-memory value. Write-path variants
/// (`ShareService`, `BackendUnavailable`) are surfaced to the user once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SandboxError {
    /// A URL token is not valid base64 or does not decompress.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// A stored or fetched JSON payload does not have a usable shape.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The share service answered with a non-success status.
    #[error("share service error: status {status}")]
    ShareService {
        /// HTTP status returned by the service.
        status: u16,
    },

    /// The local persistence backend could not be read or written.
    #[error("storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A share handle is empty or not a hex token.
    #[error("invalid share handle: {0:?}")]
    InvalidHandle(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SandboxError::ShareService { status: 503 };
        assert_eq!(err.to_string(), "share service error: status 503");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SandboxError>();
    }
}
