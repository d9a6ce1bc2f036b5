//! Application config (`config.toml` in the data directory)
//!
//! Every field has a default, so a missing file or a partial one is fine.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::paths;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Folder holding one subfolder per collection
    pub download_path: Option<String>,
    /// Admin override table; `overrides.json` in the data dir when unset
    pub overrides_path: Option<String>,
    /// Tree Scanner cache lifetime
    pub cache_ttl_secs: u64,
    /// Relative to the data dir
    pub settings_file: String,
    /// Relative to the data dir
    pub ledger_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            download_path: None,
            overrides_path: None,
            cache_ttl_secs: 300,
            settings_file: "settings.json".to_string(),
            ledger_file: "sync_state.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load config from `path`, or from the default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => paths::config_file()?,
        };
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Download root: the CLI flag wins over the config file
    pub fn download_root(&self, flag: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        match &self.download_path {
            Some(path) => Ok(paths::expand(path)),
            None => bail!(
                "No download path configured. Pass --download-path or set download_path in {}",
                paths::config_file()?.display()
            ),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn settings_path(&self) -> Result<PathBuf> {
        Ok(paths::data_dir()?.join(&self.settings_file))
    }

    pub fn ledger_path(&self) -> Result<PathBuf> {
        Ok(paths::data_dir()?.join(&self.ledger_file))
    }

    pub fn overrides_path(&self) -> Result<PathBuf> {
        match &self.overrides_path {
            Some(path) => Ok(paths::expand(path)),
            None => Ok(paths::data_dir()?.join("overrides.json")),
        }
    }
}
