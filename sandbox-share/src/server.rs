//! ShareServer: configuration, storage and counters shared by all handlers.

use crate::config::Config;
use crate::error::ShareError;
use crate::http::build_router;
use crate::storage::{ShareStorage, SqliteStorage};
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

/// Operational metrics for monitoring share activity.
///
/// All counters are monotonically increasing (reset only on restart).
#[derive(Debug, Default)]
pub struct ShareMetrics {
    /// Publish requests that stored or matched a share.
    pub publishes_total: AtomicU64,
    /// Publishes that created a new row.
    pub shares_created_total: AtomicU64,
    /// Fetches answered with a share.
    pub fetches_total: AtomicU64,
    /// Fetches for handles that do not exist.
    pub not_found_total: AtomicU64,
    /// Publishes rejected as malformed or too large.
    pub rejected_total: AtomicU64,
    /// Envelope bytes received.
    pub bytes_received: AtomicU64,
}

/// The share service.
pub struct ShareServer {
    config: Config,
    storage: Arc<dyn ShareStorage>,
    metrics: ShareMetrics,
    started_at: Instant,
}

impl std::fmt::Debug for ShareServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareServer")
            .field("config", &self.config)
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl ShareServer {
    /// Create a server over any storage backend.
    pub fn new(config: Config, storage: Arc<dyn ShareStorage>) -> Self {
        Self {
            config,
            storage,
            metrics: ShareMetrics::default(),
            started_at: Instant::now(),
        }
    }

    /// Open the SQLite database named in `config` and create a server over it.
    pub async fn open(config: Config) -> Result<Self, ShareError> {
        let storage = SqliteStorage::new(&config.storage.database).await?;
        tracing::info!(database = %config.storage.database.display(), "storage ready");
        Ok(Self::new(config, Arc::new(storage)))
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get access to the storage layer.
    pub fn storage(&self) -> &dyn ShareStorage {
        self.storage.as_ref()
    }

    /// Get access to the operational metrics.
    pub fn metrics(&self) -> &ShareMetrics {
        &self.metrics
    }

    /// Seconds since the server was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ShareError> {
        let listener = TcpListener::bind(&self.config.server.bind_address).await?;
        Ok(listener)
    }

    /// Serve HTTP on `listener` until the task is dropped or the listener fails.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<(), ShareError> {
        let addr: SocketAddr = listener.local_addr()?;
        tracing::info!(%addr, "share service listening");
        axum::serve(listener, build_router(self)).await?;
        Ok(())
    }
}
