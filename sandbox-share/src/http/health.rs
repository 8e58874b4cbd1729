//! Health check endpoint.

use crate::server::ShareServer;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Number of stored shares, if storage answered.
    pub shares: Option<u64>,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Health check handler.
///
/// Reports `degraded` rather than failing when storage cannot be queried.
pub async fn health_handler(Extension(server): Extension<Arc<ShareServer>>) -> Json<HealthStatus> {
    let shares = match server.storage().count_shares().await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach storage");
            None
        }
    };

    Json(HealthStatus {
        status: if shares.is_some() { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        shares,
        uptime_seconds: server.uptime_seconds(),
    })
}
