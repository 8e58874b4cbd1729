//! Configuration and saved state for sandbox-cli.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "sandbox.toml";

/// Saved state file name inside the data directory.
pub const STATE_FILE: &str = "state.json";

/// Settings read from `sandbox.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Base URL of the share service.
    #[serde(default = "default_share_url")]
    pub share_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Base URL permalinks are built on.
    #[serde(default = "default_page_url")]
    pub page_url: String,
}

fn default_share_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_page_url() -> String {
    "http://localhost:3000/".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            share_url: default_share_url(),
            timeout_secs: default_timeout_secs(),
            page_url: default_page_url(),
        }
    }
}

impl CliConfig {
    /// Load from an explicit file, or from `sandbox.toml` in the data directory.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub async fn load(data_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => data_dir.join(CONFIG_FILE),
        };

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Write to `sandbox.toml` in the data directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(CONFIG_FILE);
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save config")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// State carried from one invocation to the next.
///
/// Reopening a `/s/<handle>` location reloads that share, the same as
/// reloading the page would. The selected file is remembered by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliState {
    /// Path of the current navigation entry.
    #[serde(default = "default_path")]
    pub path: String,

    /// Name of the selected file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

impl Default for CliState {
    fn default() -> Self {
        Self {
            path: default_path(),
            selected: None,
        }
    }
}

impl CliState {
    /// Load from the data directory, or the root location if nothing was saved.
    pub async fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(STATE_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => serde_json::from_str(&contents).context("Invalid saved state"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).context("Failed to read saved state"),
        }
    }

    /// Save to the data directory.
    pub async fn save(&self, data_dir: &Path) -> Result<()> {
        let path = data_dir.join(STATE_FILE);
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(&path, contents)
            .await
            .context("Failed to save state")?;
        set_file_permissions_0600(&path).await?;
        Ok(())
    }
}

/// Set file permissions to 0600 (owner read/write only) on Unix.
/// No-op on non-Unix platforms.
async fn set_file_permissions_0600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .context("Failed to set file permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}

/// Set directory permissions to 0700 (owner only) on Unix.
/// No-op on non-Unix platforms.
pub async fn set_dir_permissions_0700(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
            .await
            .context("Failed to set directory permissions")?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
