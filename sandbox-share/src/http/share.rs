//! Publish and fetch endpoints.

use crate::error::ApiError;
use crate::server::ShareServer;
use crate::storage::content_handle;
use axum::extract::rejection::FormRejection;
use axum::extract::Path;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Form};
use sandbox_types::ShareHandle;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Form posted to `POST /share`.
#[derive(Debug, Deserialize)]
pub struct ShareForm {
    /// Envelope JSON.
    pub data: String,
}

/// Store an envelope and answer its handle as plain text.
pub async fn publish_handler(
    Extension(server): Extension<Arc<ShareServer>>,
    form: Result<Form<ShareForm>, FormRejection>,
) -> Result<String, ApiError> {
    let result = publish(&server, form).await;
    if matches!(
        result,
        Err(ApiError::BadRequest(_)) | Err(ApiError::PayloadTooLarge { .. })
    ) {
        server.metrics().rejected_total.fetch_add(1, Ordering::Relaxed);
    }
    result
}

async fn publish(
    server: &ShareServer,
    form: Result<Form<ShareForm>, FormRejection>,
) -> Result<String, ApiError> {
    let Form(form) = form.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge {
                limit: server.config().limits.max_payload_bytes,
            }
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    })?;

    let limit = server.config().limits.max_payload_bytes;
    if form.data.len() > limit {
        tracing::debug!(bytes = form.data.len(), limit, "envelope over limit");
        return Err(ApiError::PayloadTooLarge { limit });
    }
    validate_envelope(&form.data)?;

    let handle = content_handle(&form.data);
    let created = server.storage().put_share(&handle, &form.data).await?;

    let metrics = server.metrics();
    metrics.publishes_total.fetch_add(1, Ordering::Relaxed);
    metrics
        .bytes_received
        .fetch_add(form.data.len() as u64, Ordering::Relaxed);
    if created {
        metrics.shares_created_total.fetch_add(1, Ordering::Relaxed);
    }
    tracing::info!(%handle, bytes = form.data.len(), created, "share published");

    Ok(handle)
}

/// A share must be a JSON object with a `files` array. Entries inside it are
/// not checked; readers salvage what they can.
fn validate_envelope(data: &str) -> Result<(), ApiError> {
    let value: Value = serde_json::from_str(data)
        .map_err(|e| ApiError::BadRequest(format!("data is not JSON: {}", e)))?;

    match value.get("files") {
        Some(Value::Array(_)) => Ok(()),
        _ if !value.is_object() => Err(ApiError::BadRequest("data is not a JSON object".into())),
        _ => Err(ApiError::BadRequest("data has no files array".into())),
    }
}

/// Answer the envelope stored under a handle.
pub async fn fetch_handler(
    Extension(server): Extension<Arc<ShareServer>>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handle = ShareHandle::parse(&handle)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match server.storage().get_share(handle.as_str()).await? {
        Some(share) => {
            server.metrics().fetches_total.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(handle = %handle, "share fetched");
            Ok(([(CONTENT_TYPE, "application/json")], share.body))
        }
        None => {
            server.metrics().not_found_total.fetch_add(1, Ordering::Relaxed);
            Err(ApiError::NotFound {
                handle: handle.as_str().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_needs_files_array() {
        assert!(validate_envelope(r#"{"files":[]}"#).is_ok());
        assert!(validate_envelope(r#"{"files":[{"junk":1}],"linker":7}"#).is_ok());

        assert!(validate_envelope(r#"{"files":"main.wgsl"}"#).is_err());
        assert!(validate_envelope(r#"{"linker":"primary"}"#).is_err());
        assert!(validate_envelope(r#"[{"files":[]}]"#).is_err());
        assert!(validate_envelope("files=").is_err());
    }
}
