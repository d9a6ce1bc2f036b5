//! Purge planning: local files that shouldn't be there
//!
//! Works off the Flat File Cache listing, so the caller must invalidate it
//! after any filesystem mutation before planning again.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::ops::AddAssign;
use std::path::PathBuf;

use crate::context::SyncContext;
use crate::markers;
use crate::names::{normalize_path_key, sanitize_filename};
use crate::status::ledger_key;
use crate::types::{Collection, Manifest, top_level_name};

/// Why a file is purgeable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeReason {
    /// Collection or sub-collection turned off in settings
    Disabled,
    /// Interrupted download
    Partial,
    /// Neither in the ledger nor in the manifest
    Extra,
    /// Video file while video deletion is on
    Video,
}

/// Counts and sizes per purge category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeStats {
    pub disabled_count: u64,
    pub disabled_size: u64,
    pub extra_count: u64,
    pub extra_size: u64,
    pub partial_count: u64,
    pub partial_size: u64,
    pub video_count: u64,
    pub video_size: u64,
    /// Rough number of charts the purge would remove
    pub estimated_charts: u64,
}

impl PurgeStats {
    pub fn total_files(&self) -> u64 {
        self.disabled_count + self.extra_count + self.partial_count + self.video_count
    }

    pub fn total_size(&self) -> u64 {
        self.disabled_size + self.extra_size + self.partial_size + self.video_size
    }

    fn record(&mut self, reason: PurgeReason, size: u64) {
        let (count, bytes) = match reason {
            PurgeReason::Disabled => (&mut self.disabled_count, &mut self.disabled_size),
            PurgeReason::Partial => (&mut self.partial_count, &mut self.partial_size),
            PurgeReason::Extra => (&mut self.extra_count, &mut self.extra_size),
            PurgeReason::Video => (&mut self.video_count, &mut self.video_size),
        };
        *count += 1;
        *bytes += size;
    }
}

impl AddAssign for PurgeStats {
    fn add_assign(&mut self, other: Self) {
        self.disabled_count += other.disabled_count;
        self.disabled_size += other.disabled_size;
        self.extra_count += other.extra_count;
        self.extra_size += other.extra_size;
        self.partial_count += other.partial_count;
        self.partial_size += other.partial_size;
        self.video_count += other.video_count;
        self.video_size += other.video_size;
        self.estimated_charts += other.estimated_charts;
    }
}

/// A purgeable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeEntry {
    pub path: PathBuf,
    pub size: u64,
    pub reason: PurgeReason,
}

/// Files to delete and their summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgePlan {
    pub files: Vec<PurgeEntry>,
    pub stats: PurgeStats,
}

impl PurgePlan {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// `(path, size)` pairs, the shape deletion works on
    pub fn paths(&self) -> Vec<(PathBuf, u64)> {
        self.files.iter().map(|f| (f.path.clone(), f.size)).collect()
    }

    fn merge(&mut self, other: Self) {
        self.files.extend(other.files);
        self.stats += other.stats;
    }
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

impl SyncContext {
    /// Purge plan for one collection folder
    pub fn purge_plan(&mut self, collection: &Collection) -> PurgePlan {
        let root = self.collection_path(&collection.name);
        let listing = self.files.scan(&root);
        let mut plan = PurgePlan::default();
        if listing.is_empty() {
            return plan;
        }

        let enabled = self.settings.is_collection_enabled(&collection.id);
        let disabled_subs: HashSet<String> = self
            .settings
            .disabled_sub_collections(&collection.id)
            .iter()
            .map(|name| normalize_path_key(&sanitize_filename(name)))
            .collect();
        let delete_videos = self.settings.delete_videos;

        let tracked: HashSet<String> = self
            .ledger
            .tracked_paths()
            .iter()
            .map(|p| normalize_path_key(p))
            .collect();
        let declared: HashSet<String> = collection
            .files
            .iter()
            .map(|f| normalize_path_key(&ledger_key(collection, f)))
            .collect();
        let folder = sanitize_filename(&collection.name);

        let mut disabled_dirs: BTreeSet<&str> = BTreeSet::new();

        for (rel, size) in &listing {
            // Listing names are as found on disk; compare in NFC
            let key = normalize_path_key(&format!("{folder}/{rel}"));

            let reason = if !enabled
                || disabled_subs.contains(&normalize_path_key(top_level_name(rel)))
            {
                PurgeReason::Disabled
            } else if markers::is_partial_download(rel) {
                PurgeReason::Partial
            } else if !tracked.contains(&key) && !declared.contains(&key) {
                PurgeReason::Extra
            } else if delete_videos && markers::is_video(rel) {
                PurgeReason::Video
            } else {
                continue;
            };

            match reason {
                PurgeReason::Disabled if markers::is_archive(rel) => plan.stats.estimated_charts += 1,
                PurgeReason::Disabled => {
                    disabled_dirs.insert(parent_dir(rel));
                }
                PurgeReason::Partial => plan.stats.estimated_charts += 1,
                PurgeReason::Extra if markers::is_archive(rel) => plan.stats.estimated_charts += 1,
                PurgeReason::Extra | PurgeReason::Video => {}
            }

            plan.stats.record(reason, *size);
            plan.files.push(PurgeEntry {
                path: root.join(rel),
                size: *size,
                reason,
            });
        }

        plan.stats.estimated_charts += disabled_dirs.len() as u64;

        log::debug!(
            "{}: {} purgeable files ({} extra)",
            collection.name,
            plan.stats.total_files(),
            plan.stats.extra_count
        );
        plan
    }

    /// Purge plan for every collection in a manifest
    pub fn plan_library_purge(&mut self, manifest: &Manifest) -> PurgePlan {
        let mut plan = PurgePlan::default();
        for collection in &manifest.collections {
            plan.merge(self.purge_plan(collection));
        }
        plan
    }
}
