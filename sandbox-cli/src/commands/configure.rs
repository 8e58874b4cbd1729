//! Show or update `sandbox.toml`.

use anyhow::{Context as _, Result};
use std::path::Path;
use url::Url;

use crate::config::{CliConfig, CONFIG_FILE};

/// Changes requested on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    /// New share service URL.
    pub share_url: Option<String>,
    /// New timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// New permalink base URL.
    pub page_url: Option<String>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.share_url.is_none() && self.timeout_secs.is_none() && self.page_url.is_none()
    }
}

/// Apply `update` to the config in `data_dir` and print the result.
pub async fn run(data_dir: &Path, current: CliConfig, update: ConfigUpdate) -> Result<()> {
    let config = if update.is_empty() {
        current
    } else {
        let config = apply(current, update)?;
        config.save(data_dir).await?;
        println!("Saved {}", data_dir.join(CONFIG_FILE).display());
        config
    };

    println!("share_url    = {}", config.share_url);
    println!("timeout_secs = {}", config.timeout_secs);
    println!("page_url     = {}", config.page_url);
    Ok(())
}

fn apply(mut config: CliConfig, update: ConfigUpdate) -> Result<CliConfig> {
    if let Some(url) = update.share_url {
        Url::parse(&url).with_context(|| format!("Invalid share URL {:?}", url))?;
        config.share_url = url;
    }
    if let Some(secs) = update.timeout_secs {
        anyhow::ensure!(secs > 0, "Timeout must be at least one second");
        config.timeout_secs = secs;
    }
    if let Some(url) = update.page_url {
        Url::parse(&url).with_context(|| format!("Invalid page URL {:?}", url))?;
        config.page_url = url;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn update_is_saved() {
        let dir = tempdir().unwrap();
        let update = ConfigUpdate {
            share_url: Some("https://share.example".into()),
            timeout_secs: Some(30),
            ..ConfigUpdate::default()
        };
        run(dir.path(), CliConfig::default(), update).await.unwrap();

        let loaded = CliConfig::load(dir.path(), None).await.unwrap();
        assert_eq!(loaded.share_url, "https://share.example");
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.page_url, CliConfig::default().page_url);
    }

    #[tokio::test]
    async fn empty_update_writes_nothing() {
        let dir = tempdir().unwrap();
        run(dir.path(), CliConfig::default(), ConfigUpdate::default())
            .await
            .unwrap();
        assert!(!dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let bad_url = ConfigUpdate {
            share_url: Some("nowhere".into()),
            ..ConfigUpdate::default()
        };
        assert!(apply(CliConfig::default(), bad_url).is_err());

        let zero = ConfigUpdate {
            timeout_secs: Some(0),
            ..ConfigUpdate::default()
        };
        assert!(apply(CliConfig::default(), zero).is_err());
    }
}
