//! Prometheus metrics endpoint.

use crate::server::ShareServer;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns counters (monotonic since startup) and the stored share count.
pub async fn metrics_handler(Extension(server): Extension<Arc<ShareServer>>) -> impl IntoResponse {
    let m = server.metrics();

    let publishes = m.publishes_total.load(Ordering::Relaxed);
    let created = m.shares_created_total.load(Ordering::Relaxed);
    let fetches = m.fetches_total.load(Ordering::Relaxed);
    let not_found = m.not_found_total.load(Ordering::Relaxed);
    let rejected = m.rejected_total.load(Ordering::Relaxed);
    let bytes_rx = m.bytes_received.load(Ordering::Relaxed);

    // Best effort; a storage failure reports zero.
    let stored = server.storage().count_shares().await.unwrap_or(0);

    let body = format!(
        r#"# HELP sandbox_share_info Server information
# TYPE sandbox_share_info gauge
sandbox_share_info{{version="{version}"}} 1

# HELP sandbox_share_uptime_seconds Seconds since startup
# TYPE sandbox_share_uptime_seconds gauge
sandbox_share_uptime_seconds {uptime}

# HELP sandbox_share_publishes_total Publish requests accepted
# TYPE sandbox_share_publishes_total counter
sandbox_share_publishes_total {publishes}

# HELP sandbox_share_created_total Publishes that stored a new share
# TYPE sandbox_share_created_total counter
sandbox_share_created_total {created}

# HELP sandbox_share_fetches_total Fetches answered with a share
# TYPE sandbox_share_fetches_total counter
sandbox_share_fetches_total {fetches}

# HELP sandbox_share_not_found_total Fetches for unknown handles
# TYPE sandbox_share_not_found_total counter
sandbox_share_not_found_total {not_found}

# HELP sandbox_share_rejected_total Publishes rejected as malformed or too large
# TYPE sandbox_share_rejected_total counter
sandbox_share_rejected_total {rejected}

# HELP sandbox_share_bytes_received_total Envelope bytes received
# TYPE sandbox_share_bytes_received_total counter
sandbox_share_bytes_received_total {bytes_rx}

# HELP sandbox_share_stored Shares currently in the database
# TYPE sandbox_share_stored gauge
sandbox_share_stored {stored}
"#,
        version = env!("CARGO_PKG_VERSION"),
        uptime = server.uptime_seconds(),
    );

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
