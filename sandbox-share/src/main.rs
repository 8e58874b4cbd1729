//! sandbox-share binary entry point.
//!
//! Usage:
//! ```bash
//! sandbox-share --config share.toml
//! ```

use anyhow::{Context, Result};
use sandbox_share::{Config, ShareServer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "share.toml";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sandbox_share=info,warn")),
        )
        .init();

    let config = load_config(&get_config_path())?;
    let server = Arc::new(
        ShareServer::open(config)
            .await
            .context("Failed to open share storage")?,
    );
    let listener = server.bind().await.with_context(|| {
        format!(
            "Failed to bind {}",
            server.config().server.bind_address
        )
    })?;

    tokio::select! {
        result = server.clone().serve(listener) => result.context("Share service stopped")?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }
    Ok(())
}

/// Read the config file, or fall back to defaults when the default path is absent.
fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG) {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    Config::from_file(path).context("Failed to load configuration")
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG))
}
