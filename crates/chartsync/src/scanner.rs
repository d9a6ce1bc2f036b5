//! Local chart scanning
//!
//! Counts charts by looking at what is actually extracted on disk, which is
//! more reliable than the manifest for archives that expand into many charts.
//!
//! Every caller that needs chart counts goes through [`count_units`], so
//! nested charts are handled the same way everywhere.

use chrono::{TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::markers;
use crate::names::normalize_fs_name;
use crate::types::{TreeStats, UnitStats};

/// Result of a nested chart walk over one directory tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitScan {
    /// Chart folders found at any depth
    pub item_count: u64,
    /// Bytes claimed by those charts, each byte counted once
    pub total_size: u64,
    /// Archive files found at any depth
    pub archive_count: u64,
    /// Bytes at the root that no chart claimed
    pub unclaimed_size: u64,
}

/// Walk a directory tree and count the charts in it
///
/// A directory is a chart if it directly contains a marker file. A chart owns
/// its direct files plus every loose byte beneath it that isn't inside a
/// deeper chart; nested charts are counted separately and never double
/// counted. Unreadable directories contribute nothing.
pub fn count_units(root: &Path) -> UnitScan {
    let mut scan = UnitScan::default();
    scan.unclaimed_size = walk(root, &mut scan);
    scan
}

/// Returns the size this directory leaves unclaimed for its parent
fn walk(dir: &Path, scan: &mut UnitScan) -> u64 {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut has_marker = false;
    let mut direct_size = 0u64;
    let mut subdirs = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_file() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if markers::is_chart_marker(&name) {
                has_marker = true;
            }
            if markers::is_archive(&name) {
                scan.archive_count += 1;
            }
            if let Ok(meta) = entry.metadata() {
                direct_size += meta.len();
            }
        } else if file_type.is_dir() {
            subdirs.push(entry.path());
        }
    }

    let nested_unclaimed: u64 = subdirs.iter().map(|subdir| walk(subdir, scan)).sum();

    if has_marker {
        scan.item_count += 1;
        scan.total_size += direct_size + nested_unclaimed;
        0
    } else {
        direct_size + nested_unclaimed
    }
}

fn cache_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Chart scanner with a time-based cache per path
///
/// Cached results are returned while younger than the TTL. Callers that
/// modify the filesystem should call [`TreeScanner::clear`] instead of
/// waiting for expiry.
#[derive(Debug)]
pub struct TreeScanner {
    ttl: TimeDelta,
    units: HashMap<String, UnitStats>,
    trees: HashMap<String, TreeStats>,
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

impl TreeScanner {
    /// Five minutes
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            units: HashMap::new(),
            trees: HashMap::new(),
        }
    }

    fn is_fresh(&self, scanned_at: chrono::DateTime<Utc>) -> bool {
        Utc::now() - scanned_at < self.ttl
    }

    /// Stats for a single sub-collection folder
    pub fn unit_stats(&mut self, path: &Path) -> UnitStats {
        let key = cache_key(path);
        if let Some(cached) = self.units.get(&key)
            && self.is_fresh(cached.scanned_at)
        {
            log::trace!("Unit cache hit: {}", key);
            return cached.clone();
        }

        let stats = scan_unit(path);
        self.units.insert(key, stats.clone());
        stats
    }

    /// Stats for a collection folder, one entry per sub-collection folder
    ///
    /// Sub-collections named in `disabled` are left out of the result and its
    /// totals; the cache keeps the unfiltered scan.
    pub fn collection_stats(&mut self, path: &Path, disabled: &HashSet<String>) -> TreeStats {
        let key = cache_key(path);
        let stats = match self.trees.get(&key) {
            Some(cached) if self.is_fresh(cached.scanned_at) => {
                log::trace!("Collection cache hit: {}", key);
                cached.clone()
            }
            _ => {
                let stats = self.scan_collection(path);
                self.trees.insert(key, stats.clone());
                stats
            }
        };

        if disabled.is_empty() {
            stats
        } else {
            filter_disabled(stats, disabled)
        }
    }

    /// Whether a fresh result is cached for this path
    pub fn is_cached(&self, path: &Path) -> bool {
        let key = cache_key(path);
        let tree_fresh = self
            .trees
            .get(&key)
            .is_some_and(|t| self.is_fresh(t.scanned_at));
        let unit_fresh = self
            .units
            .get(&key)
            .is_some_and(|u| self.is_fresh(u.scanned_at));
        tree_fresh || unit_fresh
    }

    /// Drop cached results affected by a change at a path, or all of them
    ///
    /// A scoped clear removes the path itself, every cached path under it and
    /// every cached path above it, since a change anywhere below a folder
    /// stales that folder's counts.
    pub fn clear(&mut self, path: Option<&Path>) {
        match path {
            None => {
                self.trees.clear();
                self.units.clear();
            }
            Some(path) => {
                let related = |key: &String| {
                    let cached = Path::new(key);
                    cached.starts_with(path) || path.starts_with(cached)
                };
                self.trees.retain(|k, _| !related(k));
                self.units.retain(|k, _| !related(k));
            }
        }
    }

    fn scan_collection(&mut self, path: &Path) -> TreeStats {
        let mut stats = TreeStats {
            path: cache_key(path),
            item_count: 0,
            total_size: 0,
            sub_collections: BTreeMap::new(),
            scanned_at: Utc::now(),
        };

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Cannot scan collection {}: {}", path.display(), e);
                return stats;
            }
        };

        for entry in entries.filter_map(std::result::Result::ok) {
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            let name = normalize_fs_name(&entry.file_name().to_string_lossy());
            if !is_dir || name.starts_with('.') {
                continue;
            }

            let sub_path = entry.path();
            let unit = scan_unit(&sub_path);
            stats.item_count += unit.item_count;
            stats.total_size += unit.total_size;
            self.units.insert(cache_key(&sub_path), unit.clone());
            stats.sub_collections.insert(name, unit);
        }

        log::debug!(
            "Scanned {}: {} charts in {} sub-collections",
            path.display(),
            stats.item_count,
            stats.sub_collections.len()
        );
        stats
    }
}

fn scan_unit(path: &Path) -> UnitStats {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let scan = count_units(path);
    UnitStats {
        name,
        item_count: scan.item_count,
        total_size: scan.total_size,
        archive_count: scan.archive_count,
        scanned_at: Utc::now(),
    }
}

fn filter_disabled(mut stats: TreeStats, disabled: &HashSet<String>) -> TreeStats {
    for name in disabled {
        if let Some(unit) = stats.sub_collections.remove(name) {
            stats.item_count = stats.item_count.saturating_sub(unit.item_count);
            stats.total_size = stats.total_size.saturating_sub(unit.total_size);
        }
    }
    stats
}
