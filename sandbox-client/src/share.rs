//! ShareClient - publish and fetch project snapshots.
//!
//! # Protocol
//!
//! ```text
//! POST /share          data=<envelope JSON>   → 2xx, body = handle
//! GET  /share/<handle>                        → 2xx, body = envelope JSON
//! ```
//!
//! Any non-2xx status is [`SandboxError::ShareService`]. Fetched bodies are
//! salvaged, never trusted: malformed file entries are dropped and options
//! stay untyped until the project reconciles them.

use sandbox_types::{salvage_envelope, Envelope, SalvagedEnvelope, SandboxError, ShareHandle};
use thiserror::Error;

use crate::transport::{ShareTransport, TransportError};

/// Path the envelope is posted to.
pub const SHARE_PATH: &str = "/share";

/// Form field carrying the envelope.
pub const DATA_FIELD: &str = "data";

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service could not be reached.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service answered, but not usefully.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

impl ClientError {
    /// HTTP status if the service answered with a failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Sandbox(SandboxError::ShareService { status }) => Some(*status),
            _ => None,
        }
    }
}

/// Client for the remote share service.
#[derive(Debug, Clone)]
pub struct ShareClient<T: ShareTransport> {
    transport: T,
}

impl<T: ShareTransport> ShareClient<T> {
    /// Create a client over a transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Publish an envelope and return the issued handle.
    pub async fn publish(&self, envelope: &Envelope) -> Result<ShareHandle, ClientError> {
        let body = envelope.to_json()?;
        let response = self
            .transport
            .post_form(SHARE_PATH, DATA_FIELD, &body)
            .await?;

        if !response.is_success() {
            tracing::warn!(status = response.status, "publish rejected");
            return Err(SandboxError::ShareService {
                status: response.status,
            }
            .into());
        }

        let handle = ShareHandle::parse(response.body.trim())?;
        tracing::info!(handle = %handle, files = envelope.files.len(), "published");
        Ok(handle)
    }

    /// Fetch and salvage the envelope published under `handle`.
    pub async fn fetch(&self, handle: &ShareHandle) -> Result<SalvagedEnvelope, ClientError> {
        let path = format!("{}/{}", SHARE_PATH, handle);
        let response = self.transport.get(&path).await?;

        if !response.is_success() {
            tracing::warn!(handle = %handle, status = response.status, "fetch failed");
            return Err(SandboxError::ShareService {
                status: response.status,
            }
            .into());
        }

        let salvaged = salvage_envelope(&response.body)?;
        if salvaged.dropped > 0 {
            tracing::debug!(handle = %handle, dropped = salvaged.dropped, "dropped malformed files");
        }
        Ok(salvaged)
    }

    /// Get a reference to the transport (for testing).
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
