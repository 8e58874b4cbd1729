//! Transport abstraction for the share service.
//!
//! This module provides a pluggable transport layer that abstracts the
//! underlying HTTP mechanism (reqwest, mock for testing).
//!
//! # Design
//!
//! The share protocol has exactly two request shapes:
//! - `post_form()` sends one form-encoded field
//! - `get()` fetches a path
//!
//! Both return the raw status and body; interpreting them is the job of
//! [`crate::share::ShareClient`].
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_response("/share", 200, "ab12");
//! let response = transport.post_form("/share", "data", "{}").await?;
//! assert_eq!(response.body, "ab12");
//! ```

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::{MockGate, MockTransport, PostedForm};

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors. None of them carry an HTTP status; a response with a
/// non-success status is still a successful transport round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete in time.
    #[error("request timeout")]
    Timeout,

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl TransportResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport trait for talking to the share service.
#[async_trait]
pub trait ShareTransport: Send + Sync {
    /// POST a form with a single `field=value` pair to `path`.
    async fn post_form(
        &self,
        path: &str,
        field: &str,
        value: &str,
    ) -> Result<TransportResponse, TransportError>;

    /// GET `path`.
    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: ShareTransport + ?Sized> ShareTransport for Box<T> {
    async fn post_form(
        &self,
        path: &str,
        field: &str,
        value: &str,
    ) -> Result<TransportResponse, TransportError> {
        (**self).post_form(path, field, value).await
    }

    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        (**self).get(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(!TransportResponse::new(404, "").is_success());
        assert!(!TransportResponse::new(503, "").is_success());
    }

    #[tokio::test]
    async fn boxed_transport_delegates() {
        let mock = MockTransport::new();
        mock.queue_response("/x", 201, "ok");
        let boxed: Box<dyn ShareTransport> = Box::new(mock.clone());

        let response = boxed.get("/x").await.unwrap();
        assert_eq!(response, TransportResponse::new(201, "ok"));
        assert_eq!(mock.requested_paths(), vec!["/x".to_string()]);
    }
}
