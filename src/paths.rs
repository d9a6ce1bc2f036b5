//! Centralized path resolution for dmsync
//!
//! # Environment Variables
//!
//! - `DMSYNC_DATA_DIR` - Override the data directory (settings, ledger, config)
//!
//! # Path Resolution Priority
//!
//! For data_dir():
//! 1. `DMSYNC_DATA_DIR` environment variable
//! 2. `XDG_DATA_HOME/dm-sync` (if set)
//! 3. Platform default: `dirs::data_local_dir()/dm-sync`

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for data directory override
pub const ENV_DATA_DIR: &str = "DMSYNC_DATA_DIR";

const APP_DIR: &str = "dm-sync";

/// Get the dmsync data directory path
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_DATA_DIR) {
        let path = expand(&dir);
        log::debug!("Using data dir from {}: {}", ENV_DATA_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        let path = PathBuf::from(xdg_data).join(APP_DIR);
        log::debug!("Using XDG_DATA_HOME: {}", path.display());
        return Ok(path);
    }

    let base = dirs::data_local_dir().context("Could not determine data directory")?;
    let path = base.join(APP_DIR);
    log::debug!("Using default data dir: {}", path.display());
    Ok(path)
}

/// Default location of `config.toml`
pub fn config_file() -> Result<PathBuf> {
    Ok(data_dir()?.join("config.toml"))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================
