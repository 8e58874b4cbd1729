//! CLI command implementations.

pub mod configure;
pub mod decode;
pub mod files;
pub mod linker;
pub mod share;
pub mod status;

use anyhow::{Context as _, Result};
use sandbox_client::{
    FileBackend, HttpTransport, MemoryNavigator, MockTransport, Navigator, PageLocation, Session,
    SessionConfig, ShareTransport, DEFAULT_OUTPUT,
};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{CliConfig, CliState};

/// Subdirectory of the data directory holding one file per store key.
pub const STORE_DIR: &str = "store";

/// A session as the CLI drives it.
pub type CliSession = Session<Box<dyn ShareTransport>, MemoryNavigator>;

/// Everything a command needs to open a session.
#[derive(Debug, Clone)]
pub struct Context {
    /// Data directory.
    pub data_dir: PathBuf,
    /// Loaded configuration.
    pub config: CliConfig,
    /// Use the in-process mock share service.
    pub mock: bool,
}

impl Context {
    /// Create a context.
    pub fn new(data_dir: PathBuf, config: CliConfig, mock: bool) -> Self {
        Self {
            data_dir,
            config,
            mock,
        }
    }

    fn transport(&self) -> Result<Box<dyn ShareTransport>> {
        if self.mock {
            return Ok(Box::new(MockTransport::new()));
        }
        let transport = HttpTransport::new(&self.config.share_url, self.config.timeout())
            .with_context(|| format!("Invalid share_url {:?}", self.config.share_url))?;
        Ok(Box::new(transport))
    }

    /// Open a session where the previous command left off.
    ///
    /// The mock share service starts empty on every run, so with `--mock`
    /// the saved location is not reopened.
    pub async fn open(&self) -> Result<CliSession> {
        let state = CliState::load(&self.data_dir).await?;
        let location = if self.mock {
            PageLocation::root()
        } else {
            PageLocation::parse(&state.path)
                .with_context(|| format!("Invalid saved location {:?}", state.path))?
        };

        let session = self.open_at(&location).await?;
        if let Some(name) = &state.selected {
            let selected = session.mutate(|p| p.select_name(name)).await;
            if selected.is_err() {
                tracing::debug!(name = %name, "previously selected file is gone");
            }
        }
        Ok(session)
    }

    /// Open a session seeded from `location`.
    pub async fn open_at(&self, location: &PageLocation) -> Result<CliSession> {
        let backend = FileBackend::new(self.data_dir.join(STORE_DIR))
            .context("Failed to open project store")?;
        let session = Session::open(
            SessionConfig::default(),
            self.transport()?,
            Arc::new(backend),
            MemoryNavigator::new(location.path()),
            location,
        )
        .await;
        Ok(session)
    }

    /// Print anything the session put in the output area and save where it
    /// ended up.
    pub async fn close(&self, session: &CliSession) -> Result<()> {
        let output = session.output().await;
        if output != DEFAULT_OUTPUT {
            eprintln!("{}", output);
        }

        let mut state = CliState::load(&self.data_dir).await.unwrap_or_default();
        if !self.mock {
            state.path = session.navigator().current();
        }
        state.selected = Some(session.snapshot().await.current_file().name.clone());
        state.save(&self.data_dir).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// A mock-backed context in a fresh data directory.
    pub fn context() -> (TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(dir.path().to_path_buf(), CliConfig::default(), true);
        (dir, ctx)
    }
}
