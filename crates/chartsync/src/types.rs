//! Data types for the chartsync crate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::AddAssign;
use std::path::Path;

use crate::error::{Error, Result};
use crate::names::sanitize_path;

// ============================================================================
// Manifest (external, read-only input)
// ============================================================================

/// Remote manifest produced by the cloud scan
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, alias = "folders")]
    pub collections: Vec<Collection>,
}

/// One remote collection (a drive)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    /// Remote identifier, used as the settings key
    #[serde(alias = "folder_id")]
    pub id: String,
    /// Display name, also the local folder name and the override key
    pub name: String,
    /// User-defined collection that was not produced by the remote scan
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub files: Vec<ManifestFile>,
    /// Per sub-collection summaries; `None` when the scan didn't produce any
    #[serde(default, alias = "subfolders")]
    pub sub_collections: Option<Vec<SubCollectionSummary>>,
}

/// A remote file, path relative to its collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestFile {
    pub path: String,
    #[serde(alias = "md5")]
    pub hash: String,
    #[serde(default)]
    pub size: u64,
    /// Remote modification time, RFC 3339 text
    #[serde(default)]
    pub modified: Option<String>,
}

/// The scan's claims about one sub-collection (setlist)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubCollectionSummary {
    pub name: String,
    #[serde(default, alias = "chart_count")]
    pub claimed_item_count: Option<u64>,
    #[serde(default, alias = "total_size")]
    pub claimed_size: Option<u64>,
}

impl Manifest {
    /// Load a manifest from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a manifest from JSON text, normalizing path separators
    pub fn from_json(content: &str) -> Result<Self> {
        let mut manifest: Manifest = serde_json::from_str(content)?;
        for collection in &mut manifest.collections {
            for file in &mut collection.files {
                if file.path.contains('\\') {
                    file.path = file.path.replace('\\', "/");
                }
            }
        }
        Ok(manifest)
    }

    /// Find a collection by id
    pub fn collection(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }
}

impl Collection {
    /// Look up the scan summary for a sub-collection
    pub fn sub_collection(&self, name: &str) -> Option<&SubCollectionSummary> {
        self.sub_collections
            .as_ref()
            .and_then(|subs| subs.iter().find(|s| s.name == name))
    }

    /// Whether count adjustment is suppressed for this collection
    pub fn skips_adjustment(&self) -> bool {
        self.is_custom || self.sub_collections.is_none()
    }

    /// Manifest files belonging to a sub-collection
    pub fn files_in<'a>(&'a self, sub_collection: &'a str) -> impl Iterator<Item = &'a ManifestFile> {
        self.files
            .iter()
            .filter(move |f| top_level_name(&f.path) == sub_collection)
    }

    /// Sub-collection names: declared ones first, then any other top-level
    /// names found in the file list, each once
    pub fn sub_collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let declared = self.sub_collections.iter().flatten().map(|s| s.name.as_str());
        let derived = self.files.iter().map(|f| top_level_name(&f.path));
        for name in declared.chain(derived) {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        names
    }
}

/// First path segment, or the whole path for root-level files
pub fn top_level_name(path: &str) -> &str {
    path.split_once('/').map_or(path, |(head, _)| head)
}

/// Keep only the newest version of each path
///
/// Some charters upload several versions under the same name. Paths are
/// compared sanitized, since that's where they land on disk. Versions are
/// compared by their `modified` text; a missing timestamp sorts oldest and
/// ties keep the first occurrence. Order of first appearance is preserved.
pub fn dedupe_by_newest(files: &[ManifestFile]) -> Vec<ManifestFile> {
    let mut order: Vec<String> = Vec::new();
    let mut newest: HashMap<String, &ManifestFile> = HashMap::new();

    for file in files {
        let key = sanitize_path(&file.path);
        let replace = match newest.get(&key) {
            Some(existing) => file.modified > existing.modified,
            None => {
                order.push(key.clone());
                true
            }
        };
        if replace {
            newest.insert(key, file);
        }
    }

    order
        .iter()
        .filter_map(|key| newest.get(key).map(|f| (*f).clone()))
        .collect()
}

// ============================================================================
// Local scan results
// ============================================================================

/// Stats for a single sub-collection folder on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub name: String,
    /// Chart folders found
    pub item_count: u64,
    /// Bytes claimed by those charts
    pub total_size: u64,
    /// Archive files found, for comparison with the manifest
    pub archive_count: u64,
    pub scanned_at: DateTime<Utc>,
}

impl UnitStats {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_count: 0,
            total_size: 0,
            archive_count: 0,
            scanned_at: Utc::now(),
        }
    }
}

/// Stats for a whole collection folder on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub path: String,
    pub item_count: u64,
    pub total_size: u64,
    pub sub_collections: BTreeMap<String, UnitStats>,
    pub scanned_at: DateTime<Utc>,
}

// ============================================================================
// Reconciliation output
// ============================================================================

/// Charts and bytes available vs. synced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub total_charts: u64,
    pub total_size: u64,
    pub synced_charts: u64,
    pub synced_size: u64,
}

impl SyncStatus {
    pub fn missing_charts(&self) -> u64 {
        self.total_charts.saturating_sub(self.synced_charts)
    }

    pub fn missing_size(&self) -> u64 {
        self.total_size.saturating_sub(self.synced_size)
    }

    pub fn is_synced(&self) -> bool {
        self.synced_charts == self.total_charts
    }
}

impl AddAssign for SyncStatus {
    fn add_assign(&mut self, other: Self) {
        self.total_charts += other.total_charts;
        self.total_size += other.total_size;
        self.synced_charts += other.synced_charts;
        self.synced_size += other.synced_size;
    }
}

/// Which source supplied a sub-collection's chart total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    /// Custom collection or no sub-collection list: raw file count
    Unadjusted,
    /// Charts found on disk
    LocalScan,
    /// Admin override table
    Override,
    /// The scan's own claim
    Manifest,
    /// Disabled in settings
    Disabled,
}
