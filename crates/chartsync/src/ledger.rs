//! Download ledger
//!
//! Durable record of what has actually been downloaded and extracted, keyed by
//! path relative to the download root (`Drive/Setlist/pack.7z`). An archive
//! entry keeps the full list of files it expanded into, independent of what
//! is on disk now.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// On-disk format version; anything else is discarded on load
pub const LEDGER_VERSION: u32 = 1;

/// A ledger record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEntry {
    /// A file downloaded as-is
    File {
        hash: String,
        size: u64,
        synced_at: DateTime<Utc>,
    },
    /// A downloaded and extracted archive
    Archive {
        hash: String,
        archive_size: u64,
        extracted_at: DateTime<Utc>,
        /// Extracted files, relative to the archive's parent folder
        #[serde(default)]
        files: BTreeMap<String, u64>,
    },
}

impl LedgerEntry {
    pub fn hash(&self) -> &str {
        match self {
            Self::File { hash, .. } | Self::Archive { hash, .. } => hash,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    #[serde(default)]
    last_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<String, LedgerEntry>,
}

/// Summary counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    /// Plain files plus every file extracted from an archive
    pub total_files: usize,
    pub total_archives: usize,
    pub last_sync: Option<DateTime<Utc>>,
}

/// The persisted download ledger
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    last_sync: Option<DateTime<Utc>>,
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    /// An empty ledger that will be saved to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_sync: None,
            entries: BTreeMap::new(),
        }
    }

    /// Load the ledger, starting empty if the file is missing or unreadable
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut ledger = Self::new(path);

        if !ledger.path.exists() {
            log::debug!("Ledger {} does not exist, starting empty", ledger.path.display());
            return ledger;
        }

        let parsed = fs::read_to_string(&ledger.path)
            .map_err(Error::from)
            .and_then(|content| serde_json::from_str::<LedgerFile>(&content).map_err(Error::from));

        match parsed {
            Ok(file) if file.version == LEDGER_VERSION => {
                ledger.last_sync = file.last_sync;
                ledger.entries = file.entries;
                log::debug!(
                    "Loaded ledger {} ({} entries)",
                    ledger.path.display(),
                    ledger.entries.len()
                );
            }
            Ok(file) => {
                log::warn!(
                    "Ledger {} has version {}, expected {}; starting empty",
                    ledger.path.display(),
                    file.version,
                    LEDGER_VERSION
                );
            }
            Err(e) => {
                log::warn!("Ledger {} is unreadable ({}); starting empty", ledger.path.display(), e);
            }
        }

        ledger
    }

    /// Save atomically: write a temp file next to the ledger, then rename
    pub fn save(&mut self) -> Result<()> {
        self.last_sync = Some(Utc::now());

        let dir = self
            .path
            .parent()
            .ok_or_else(|| Error::InvalidPath(self.path.display().to_string()))?;
        fs::create_dir_all(dir)?;

        let file = LedgerFile {
            version: LEDGER_VERSION,
            last_sync: self.last_sync,
            entries: self.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;

        log::debug!("Saved ledger to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Record a directly downloaded file
    pub fn add_file(&mut self, path: &str, size: u64, hash: &str) {
        self.entries.insert(
            path.to_string(),
            LedgerEntry::File {
                hash: hash.to_string(),
                size,
                synced_at: Utc::now(),
            },
        );
    }

    /// Record an extracted archive and everything it expanded into
    ///
    /// `extracted` paths are relative to the archive's parent folder,
    /// which is where archives extract to.
    pub fn add_archive(
        &mut self,
        path: &str,
        hash: &str,
        archive_size: u64,
        extracted: BTreeMap<String, u64>,
    ) {
        self.entries.insert(
            path.to_string(),
            LedgerEntry::Archive {
                hash: hash.to_string(),
                archive_size,
                extracted_at: Utc::now(),
                files: extracted,
            },
        );
    }

    /// Forget a plain file; returns whether it was tracked
    pub fn remove_file(&mut self, path: &str) -> bool {
        if matches!(self.entries.get(path), Some(LedgerEntry::File { .. })) {
            self.entries.remove(path);
            true
        } else {
            false
        }
    }

    /// Forget an archive and its extracted files; returns whether it was tracked
    pub fn remove_archive(&mut self, path: &str) -> bool {
        if matches!(self.entries.get(path), Some(LedgerEntry::Archive { .. })) {
            self.entries.remove(path);
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// A file is synced only when tracked with the same hash
    pub fn is_file_synced(&self, path: &str, hash: &str) -> bool {
        matches!(self.entries.get(path), Some(LedgerEntry::File { hash: h, .. }) if h == hash)
    }

    /// An archive is synced only when tracked with the same hash
    pub fn is_archive_synced(&self, path: &str, hash: &str) -> bool {
        matches!(self.entries.get(path), Some(LedgerEntry::Archive { hash: h, .. }) if h == hash)
    }

    /// Whether every file an archive expanded into is under `root` with its
    /// recorded size
    ///
    /// An archive that expanded into nothing is trivially present.
    pub fn archive_files_present(&self, root: &Path, archive_path: &str) -> bool {
        match self.entries.get(archive_path) {
            Some(LedgerEntry::Archive { files, .. }) => {
                let parent = parent_of(archive_path);
                files
                    .iter()
                    .all(|(rel, size)| size_matches(root, &join(parent, rel), *size))
            }
            _ => false,
        }
    }

    /// Whether a tracked plain file is under `root` with its recorded size
    pub fn file_present(&self, root: &Path, path: &str) -> bool {
        match self.entries.get(path) {
            Some(LedgerEntry::File { size, .. }) => size_matches(root, path, *size),
            _ => false,
        }
    }

    pub fn entry(&self, path: &str) -> Option<&LedgerEntry> {
        self.entries.get(path)
    }

    pub fn file(&self, path: &str) -> Option<&LedgerEntry> {
        self.entries
            .get(path)
            .filter(|e| matches!(e, LedgerEntry::File { .. }))
    }

    pub fn archive(&self, path: &str) -> Option<&LedgerEntry> {
        self.entries
            .get(path)
            .filter(|e| matches!(e, LedgerEntry::Archive { .. }))
    }

    /// Ledger paths of every file an archive expanded into
    pub fn extracted_paths_of(&self, archive_path: &str) -> BTreeSet<String> {
        match self.entries.get(archive_path) {
            Some(LedgerEntry::Archive { files, .. }) => {
                let parent = parent_of(archive_path);
                files.keys().map(|rel| join(parent, rel)).collect()
            }
            _ => BTreeSet::new(),
        }
    }

    /// Every tracked path with its recorded size
    pub fn tracked_sizes(&self) -> BTreeMap<String, u64> {
        let mut sizes = BTreeMap::new();
        for (path, entry) in &self.entries {
            match entry {
                LedgerEntry::File { size, .. } => {
                    sizes.insert(path.clone(), *size);
                }
                LedgerEntry::Archive { files, .. } => {
                    let parent = parent_of(path);
                    for (rel, size) in files {
                        sizes.insert(join(parent, rel), *size);
                    }
                }
            }
        }
        sizes
    }

    /// Every tracked path: plain files and archive contents
    pub fn tracked_paths(&self) -> HashSet<String> {
        self.tracked_sizes().into_keys().collect()
    }

    pub fn stats(&self) -> LedgerStats {
        let total_archives = self
            .entries
            .values()
            .filter(|e| matches!(e, LedgerEntry::Archive { .. }))
            .count();
        LedgerStats {
            total_files: self.tracked_sizes().len(),
            total_archives,
            last_sync: self.last_sync,
        }
    }

    /// Tracked paths that are missing under `root`, or have a different size
    /// when `verify_sizes` is set
    pub fn missing_files<'a>(
        &self,
        root: &Path,
        paths: impl IntoIterator<Item = &'a str>,
        verify_sizes: bool,
    ) -> Vec<String> {
        let sizes = self.tracked_sizes();
        let mut missing = Vec::new();

        for path in paths {
            let on_disk = fs::metadata(root.join(path));
            let ok = match on_disk {
                Ok(meta) if verify_sizes => sizes.get(path).is_none_or(|s| *s == meta.len()),
                Ok(_) => true,
                Err(_) => false,
            };
            if !ok {
                missing.push(path.to_string());
            }
        }

        missing
    }

    /// Drop plain file entries whose file is gone from disk
    pub fn cleanup_orphaned_files(&mut self, root: &Path) -> usize {
        let plain: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| matches!(e, LedgerEntry::File { .. }))
            .map(|(p, _)| p.clone())
            .collect();

        let missing = self.missing_files(root, plain.iter().map(String::as_str), false);
        for path in &missing {
            self.entries.remove(path);
        }
        missing.len()
    }

    /// Drop archive entries that disagree with the manifest
    ///
    /// `manifest_archives` maps ledger paths to manifest hashes. An archive is
    /// stale when its path matches case-insensitively but not exactly, or when
    /// its hash differs. Archives the manifest doesn't mention are kept.
    pub fn cleanup_stale_archives(&mut self, manifest_archives: &HashMap<String, String>) -> usize {
        let manifest_lower: HashMap<String, (&str, &str)> = manifest_archives
            .iter()
            .map(|(path, hash)| (path.to_lowercase(), (path.as_str(), hash.as_str())))
            .collect();

        let stale: Vec<String> = self
            .entries
            .iter()
            .filter_map(|(path, entry)| {
                let LedgerEntry::Archive { hash, .. } = entry else {
                    return None;
                };
                let (manifest_path, manifest_hash) = manifest_lower.get(&path.to_lowercase())?;
                (path != manifest_path || hash != manifest_hash).then(|| path.clone())
            })
            .collect();

        for path in &stale {
            log::debug!("Dropping stale archive entry {}", path);
            self.entries.remove(path);
        }
        stale.len()
    }
}

fn size_matches(root: &Path, path: &str, size: u64) -> bool {
    fs::metadata(root.join(path)).is_ok_and(|meta| meta.is_file() && meta.len() == size)
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn join(parent: &str, rel: &str) -> String {
    if parent.is_empty() {
        rel.to_string()
    } else {
        format!("{parent}/{rel}")
    }
}
