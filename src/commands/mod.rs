pub mod ledger;
pub mod purge;
pub mod scan;
pub mod settings;
pub mod status;

use anyhow::{Context as _, Result};
use chartsync::{
    Collection, FilterSettings, Ledger, Manifest, Overrides, SyncContext, TreeScanner,
};
use std::path::Path;

use crate::Context;

/// Load the remote manifest; unlike local state, a bad manifest is an error
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::load(path).with_context(|| format!("Could not load manifest {}", path.display()))
}

/// Build the reconciliation context from config and persisted state
pub fn open_sync_context(ctx: &Context) -> Result<SyncContext> {
    let config = &ctx.config;
    let download_root = config.download_root(ctx.download_path.as_deref())?;
    if !download_root.is_dir() {
        log::warn!(
            "Download folder {} does not exist yet",
            download_root.display()
        );
    }

    Ok(SyncContext::new(
        download_root,
        TreeScanner::new(config.cache_ttl()),
        Ledger::load(config.ledger_path()?),
        FilterSettings::load(config.settings_path()?),
        Overrides::load(&config.overrides_path()?),
    ))
}

/// Find a collection by id, then by name (case-insensitive)
pub fn find_collection<'a>(manifest: &'a Manifest, key: &str) -> Result<&'a Collection> {
    manifest
        .collection(key)
        .or_else(|| {
            manifest
                .collections
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(key))
        })
        .with_context(|| format!("No collection named '{key}' in the manifest"))
}
