//! Per-process reconciliation context
//!
//! Owns the caches and the loaded persistent state. Construct once and pass
//! by reference; nothing in this crate keeps global state.

use std::path::{Path, PathBuf};

use crate::files::FileCache;
use crate::ledger::Ledger;
use crate::names::sanitize_filename;
use crate::overrides::Overrides;
use crate::scanner::TreeScanner;
use crate::settings::FilterSettings;

/// Everything reconciliation reads from, rooted at the download folder
#[derive(Debug)]
pub struct SyncContext {
    download_root: PathBuf,
    pub scanner: TreeScanner,
    pub files: FileCache,
    pub ledger: Ledger,
    pub settings: FilterSettings,
    pub overrides: Overrides,
}

impl SyncContext {
    pub fn new(
        download_root: impl Into<PathBuf>,
        scanner: TreeScanner,
        ledger: Ledger,
        settings: FilterSettings,
        overrides: Overrides,
    ) -> Self {
        Self {
            download_root: download_root.into(),
            scanner,
            files: FileCache::new(),
            ledger,
            settings,
            overrides,
        }
    }

    /// Root holding one folder per collection
    pub fn download_root(&self) -> &Path {
        &self.download_root
    }

    /// Local folder of a collection
    pub fn collection_path(&self, collection_name: &str) -> PathBuf {
        self.download_root.join(sanitize_filename(collection_name))
    }

    /// Local folder of a sub-collection
    pub fn sub_collection_path(&self, collection_name: &str, sub_collection: &str) -> PathBuf {
        self.collection_path(collection_name)
            .join(sanitize_filename(sub_collection))
    }

    /// Forget cached scans affected by a filesystem change at `path`
    ///
    /// Call right after downloading, extracting or deleting under `path`.
    pub fn invalidate(&mut self, path: &Path) {
        self.scanner.clear(Some(path));
        self.files.invalidate(path);
    }

    /// Forget every cached scan
    pub fn invalidate_all(&mut self) {
        self.scanner.clear(None);
        self.files.invalidate_all();
    }
}
