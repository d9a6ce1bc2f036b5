//! Flat listing cache of local files
//!
//! Unlike [`crate::scanner::TreeScanner`] this cache never expires on its own.
//! Purge planning needs byte-exact listings, so callers invalidate it right
//! after any download, extraction or deletion.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use walkdir::WalkDir;

/// Relative path (`/`-separated) to size in bytes
pub type FileListing = BTreeMap<String, u64>;

/// Recursive file listings cached per root path
#[derive(Debug, Default)]
pub struct FileCache {
    listings: HashMap<String, FileListing>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing of every regular file under `root`
    ///
    /// A missing root yields an empty listing that is not cached.
    pub fn scan(&mut self, root: &Path) -> FileListing {
        let key = root.to_string_lossy().into_owned();
        if let Some(listing) = self.listings.get(&key) {
            return listing.clone();
        }

        if !root.exists() {
            return FileListing::new();
        }

        let listing = list_files(root);
        log::debug!("Listed {} files under {}", listing.len(), root.display());
        self.listings.insert(key, listing.clone());
        listing
    }

    /// Whether a listing is cached for this root
    pub fn is_cached(&self, root: &Path) -> bool {
        self.listings.contains_key(root.to_string_lossy().as_ref())
    }

    /// Drop listings affected by a change at `path`
    ///
    /// Removes the listing for `path` itself, for every cached root above it
    /// and for every cached root below it.
    pub fn invalidate(&mut self, path: &Path) {
        self.listings.retain(|key, _| {
            let cached = Path::new(key);
            !(path.starts_with(cached) || cached.starts_with(path))
        });
    }

    /// Drop every cached listing
    pub fn invalidate_all(&mut self) {
        self.listings.clear();
    }
}

fn list_files(root: &Path) -> FileListing {
    let mut listing = FileListing::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| match e {
        Ok(entry) => Some(entry),
        Err(err) => {
            log::debug!("Skipping unreadable entry under {}: {}", root.display(), err);
            None
        }
    }) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Ok(meta) = entry.metadata() else {
            continue;
        };

        let rel = rel_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        listing.insert(rel, meta.len());
    }

    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_lists_relative_paths() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("Set/Chart")).unwrap();
        fs::write(tmp.path().join("Set/Chart/song.ini"), "12345").unwrap();
        fs::write(tmp.path().join("top.txt"), "ab").unwrap();

        let mut cache = FileCache::new();
        let listing = cache.scan(tmp.path());
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.get("Set/Chart/song.ini"), Some(&5));
        assert_eq!(listing.get("top.txt"), Some(&2));
    }

    #[test]
    fn test_missing_root_not_cached() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");

        let mut cache = FileCache::new();
        assert!(cache.scan(&missing).is_empty());
        assert!(!cache.is_cached(&missing));
    }

    #[test]
    fn test_stale_until_invalidated() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();

        let mut cache = FileCache::new();
        assert_eq!(cache.scan(tmp.path()).len(), 1);

        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        fs::remove_file(tmp.path().join("a.txt")).unwrap();
        let stale = cache.scan(tmp.path());
        assert!(stale.contains_key("a.txt"));
        assert!(!stale.contains_key("b.txt"));

        cache.invalidate(tmp.path());
        let fresh = cache.scan(tmp.path());
        assert!(!fresh.contains_key("a.txt"));
        assert!(fresh.contains_key("b.txt"));
    }

    #[test]
    fn test_invalidate_child_clears_ancestor_listing() {
        let tmp = TempDir::new().unwrap();
        let drive = tmp.path().join("Drive");
        let other = tmp.path().join("Other");
        fs::create_dir_all(drive.join("Set")).unwrap();
        fs::create_dir_all(&other).unwrap();
        fs::write(drive.join("Set/a.txt"), "a").unwrap();
        fs::write(other.join("b.txt"), "b").unwrap();

        let mut cache = FileCache::new();
        cache.scan(&drive);
        cache.scan(&other);

        cache.invalidate(&drive.join("Set"));
        assert!(!cache.is_cached(&drive));
        assert!(cache.is_cached(&other));

        cache.invalidate_all();
        assert!(!cache.is_cached(&other));
    }
}
