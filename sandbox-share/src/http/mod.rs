//! HTTP endpoints for sandbox-share.
//!
//! ```text
//! POST /share          form data=<envelope JSON>  → 200 text/plain handle
//! GET  /share/:handle                             → 200 application/json envelope
//! GET  /health                                    → JSON status
//! GET  /metrics                                   → Prometheus text
//! ```

pub mod health;
mod metrics;
pub mod share;

use crate::server::ShareServer;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Extension, Router};
use std::sync::Arc;

pub use health::HealthStatus;

/// Slack for form encoding on top of the envelope limit: percent-encoding
/// can triple the size of JSON punctuation.
const FORM_ENCODING_FACTOR: usize = 3;

/// Build the HTTP router with all endpoints.
pub fn build_router(server: Arc<ShareServer>) -> Router {
    let body_limit = server
        .config()
        .limits
        .max_payload_bytes
        .saturating_mul(FORM_ENCODING_FACTOR)
        .saturating_add(1024);

    Router::new()
        .route("/share", post(share::publish_handler))
        .route("/share/:handle", get(share::fetch_handler))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(server))
}
