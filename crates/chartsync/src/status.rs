//! Sync status: what's available vs. what's actually synced
//!
//! Totals come from [`crate::resolve`]; synced counts come from the ledger by
//! hash, confirmed against the files on disk. A partially synced sub-collection reports its literal synced file
//! count, never a share of an adjusted total.

use serde::Serialize;

use crate::context::SyncContext;
use crate::markers;
use crate::names::{sanitize_filename, sanitize_path};
use crate::resolve::{self, ResolveInput, Sources};
use crate::types::{
    Collection, CountSource, Manifest, ManifestFile, SyncStatus, dedupe_by_newest, top_level_name,
};

/// Status of one sub-collection
#[derive(Debug, Clone, Serialize)]
pub struct SubCollectionReport {
    pub name: String,
    pub status: SyncStatus,
    pub source: CountSource,
    /// Every declared file is in the ledger with a matching hash and on disk
    pub full_sync: bool,
}

/// Status of one collection, summed over its sub-collections
#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub status: SyncStatus,
    pub sub_collections: Vec<SubCollectionReport>,
    /// Local files neither in the manifest nor in the ledger
    pub purge_count: u64,
}

/// Status of every collection in a manifest
#[derive(Debug, Clone, Default, Serialize)]
pub struct LibraryReport {
    pub status: SyncStatus,
    pub collections: Vec<CollectionReport>,
}

/// Ledger key of a manifest file, which is also its path under the download
/// root
pub fn ledger_key(collection: &Collection, file: &ManifestFile) -> String {
    format!(
        "{}/{}",
        sanitize_filename(&collection.name),
        sanitize_path(&file.path)
    )
}

impl SyncContext {
    /// Whether a declared file is in the ledger with the same hash and what
    /// it wrote is still on disk
    ///
    /// For an archive that means every extracted file with its recorded size.
    pub fn is_manifest_file_synced(&self, collection: &Collection, file: &ManifestFile) -> bool {
        let key = ledger_key(collection, file);
        let root = self.download_root();
        if markers::is_archive(&file.path) {
            self.ledger.is_archive_synced(&key, &file.hash)
                && self.ledger.archive_files_present(root, &key)
        } else {
            self.ledger.is_file_synced(&key, &file.hash) && self.ledger.file_present(root, &key)
        }
    }

    /// Status of one sub-collection
    pub fn sub_collection_status(
        &mut self,
        collection: &Collection,
        sub_collection: &str,
    ) -> SubCollectionReport {
        let files = dedupe_by_newest(&collection.files);
        self.sub_collection_status_in(collection, &files, sub_collection)
    }

    fn sub_collection_status_in(
        &mut self,
        collection: &Collection,
        files: &[ManifestFile],
        sub_collection: &str,
    ) -> SubCollectionReport {
        if !self.settings.is_collection_enabled(&collection.id)
            || !self
                .settings
                .is_sub_collection_enabled(&collection.id, sub_collection)
        {
            return SubCollectionReport {
                name: sub_collection.to_string(),
                status: SyncStatus::default(),
                source: CountSource::Disabled,
                full_sync: false,
            };
        }

        let mut file_count = 0u64;
        let mut file_size = 0u64;
        let mut synced_count = 0u64;
        let mut synced_size = 0u64;
        for file in files
            .iter()
            .filter(|f| top_level_name(&f.path) == sub_collection)
        {
            file_count += 1;
            file_size += file.size;
            if self.is_manifest_file_synced(collection, file) {
                synced_count += 1;
                synced_size += file.size;
            }
        }
        // With nothing declared there is nothing to have fully synced
        let full_sync = file_count > 0 && synced_count == file_count;

        let local_path = self.sub_collection_path(&collection.name, sub_collection);
        let input = ResolveInput {
            collection,
            sub_collection,
            manifest_file_count: file_count,
            manifest_file_size: file_size,
            local_path: &local_path,
        };
        let mut sources = Sources {
            scanner: &mut self.scanner,
            overrides: &self.overrides,
        };
        let resolved = resolve::resolve(&input, &mut sources);

        let status = if full_sync {
            SyncStatus {
                total_charts: resolved.item_count,
                total_size: resolved.total_size,
                synced_charts: resolved.item_count,
                synced_size: resolved.total_size,
            }
        } else {
            SyncStatus {
                total_charts: resolved.item_count,
                total_size: resolved.total_size,
                synced_charts: synced_count,
                synced_size,
            }
        };

        log::debug!(
            "{}/{}: {}/{} charts ({:?}, full_sync={})",
            collection.name,
            sub_collection,
            status.synced_charts,
            status.total_charts,
            resolved.source,
            full_sync
        );

        SubCollectionReport {
            name: sub_collection.to_string(),
            status,
            source: resolved.source,
            full_sync,
        }
    }

    /// Status of a collection, summed over its sub-collections
    pub fn collection_status(&mut self, collection: &Collection) -> CollectionReport {
        let files = dedupe_by_newest(&collection.files);
        let mut report = CollectionReport {
            id: collection.id.clone(),
            name: collection.name.clone(),
            enabled: self.settings.is_collection_enabled(&collection.id),
            status: SyncStatus::default(),
            sub_collections: Vec::new(),
            purge_count: 0,
        };

        for name in collection.sub_collection_names() {
            let sub = self.sub_collection_status_in(collection, &files, &name);
            report.status += sub.status;
            report.sub_collections.push(sub);
        }

        report.purge_count = self.purge_plan(collection).stats.extra_count;
        report
    }

    /// Status of every collection
    pub fn library_status(&mut self, manifest: &Manifest) -> LibraryReport {
        let mut report = LibraryReport::default();
        for collection in &manifest.collections {
            let collection_report = self.collection_status(collection);
            report.status += collection_report.status;
            report.collections.push(collection_report);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::overrides::Overrides;
    use crate::scanner::TreeScanner;
    use crate::settings::FilterSettings;
    use crate::types::SubCollectionSummary;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn file(path: &str, hash: &str, size: u64) -> ManifestFile {
        ManifestFile {
            path: path.into(),
            hash: hash.into(),
            size,
            modified: None,
        }
    }

    fn rips(claimed: u64) -> Collection {
        Collection {
            id: "rips-id".into(),
            name: "Game Rips".into(),
            is_custom: false,
            files: vec![
                file("GH3/disc1.7z", "h1", 400),
                file("GH3/disc2.7z", "h2", 600),
            ],
            sub_collections: Some(vec![SubCollectionSummary {
                name: "GH3".into(),
                claimed_item_count: Some(claimed),
                claimed_size: Some(1000),
            }]),
        }
    }

    fn context(tmp: &Path) -> SyncContext {
        let mut settings = FilterSettings::new(tmp.join("settings.json"));
        settings.set_collection_enabled("rips-id", true);
        SyncContext::new(
            tmp.join("Songs"),
            TreeScanner::default(),
            Ledger::new(tmp.join("sync_state.json")),
            settings,
            Overrides::new(),
        )
    }

    fn seed_charts(root: &Path, count: usize) {
        for i in 0..count {
            let dir = root.join(format!("Chart {i}"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("song.ini"), "0123456789").unwrap();
        }
    }

    #[test]
    fn test_local_scan_wins() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        ctx.overrides.set_item_count("Game Rips", "GH3", 50);
        seed_charts(&ctx.collection_path("Game Rips").join("GH3"), 5);

        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert_eq!(report.status.total_charts, 5);
        assert_eq!(report.status.total_size, 50);
        assert_eq!(report.source, CountSource::LocalScan);
    }

    #[test]
    fn test_override_without_local_extraction() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        ctx.overrides.set_item_count("Game Rips", "GH3", 50);

        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert_eq!(report.status.total_charts, 50);
        assert_eq!(report.status.total_size, 1000);
        assert_eq!(report.source, CountSource::Override);
    }

    #[test]
    fn test_partial_sync_never_inflates() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        ctx.overrides.set_item_count("Game Rips", "GH3", 100);
        ctx.ledger
            .add_archive("Game Rips/GH3/disc1.7z", "h1", 400, BTreeMap::new());

        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert!(!report.full_sync);
        assert_eq!(report.status.total_charts, 100);
        assert_eq!(report.status.synced_charts, 1);
        assert_eq!(report.status.synced_size, 400);
    }

    #[test]
    fn test_full_sync_reports_adjusted_total() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        ctx.overrides.set_item_count("Game Rips", "GH3", 100);
        ctx.ledger
            .add_archive("Game Rips/GH3/disc1.7z", "h1", 400, BTreeMap::new());
        ctx.ledger
            .add_archive("Game Rips/GH3/disc2.7z", "h2", 600, BTreeMap::new());

        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert!(report.full_sync);
        assert_eq!(report.status.total_charts, 100);
        assert_eq!(report.status.synced_charts, 100);
        assert_eq!(report.status.synced_size, report.status.total_size);
        assert!(report.status.is_synced());
    }

    #[test]
    fn test_hash_mismatch_is_not_synced() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        ctx.ledger
            .add_archive("Game Rips/GH3/disc1.7z", "outdated", 400, BTreeMap::new());
        ctx.ledger
            .add_archive("Game Rips/GH3/disc2.7z", "h2", 600, BTreeMap::new());

        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert!(!report.full_sync);
        assert_eq!(report.status.synced_charts, 1);
    }

    #[test]
    fn test_disabled_yields_zero() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        ctx.overrides.set_item_count("Game Rips", "GH3", 100);
        seed_charts(&ctx.collection_path("Game Rips").join("GH3"), 5);
        ctx.ledger
            .add_archive("Game Rips/GH3/disc1.7z", "h1", 400, BTreeMap::new());

        ctx.settings
            .set_sub_collection_enabled("rips-id", "GH3", false);
        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert_eq!(report.status, SyncStatus::default());
        assert_eq!(report.source, CountSource::Disabled);

        ctx.settings
            .set_sub_collection_enabled("rips-id", "GH3", true);
        ctx.settings.set_collection_enabled("rips-id", false);
        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert_eq!(report.status, SyncStatus::default());
    }

    #[test]
    fn test_new_install_starts_disabled() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        let mut other = rips(1);
        other.id = "untouched".into();

        let report = ctx.collection_status(&other);
        assert!(!report.enabled);
        assert_eq!(report.status, SyncStatus::default());
    }

    #[test]
    fn test_custom_collection_counts_files() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        let mut custom = rips(1);
        custom.is_custom = true;
        ctx.overrides.set_item_count("Game Rips", "GH3", 100);
        ctx.ledger
            .add_archive("Game Rips/GH3/disc1.7z", "h1", 400, BTreeMap::new());

        let report = ctx.sub_collection_status(&custom, "GH3");
        assert_eq!(report.source, CountSource::Unadjusted);
        assert_eq!(report.status.total_charts, 2);
        assert_eq!(report.status.total_size, 1000);
        assert_eq!(report.status.synced_charts, 1);
    }

    #[test]
    fn test_collection_and_library_aggregate() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        let mut collection = rips(1);
        collection.files.push(file("Loose Set/Chart/song.ini", "s1", 10));
        collection.files.push(file("Loose Set/Chart/notes.mid", "s2", 20));
        ctx.ledger.add_file("Game Rips/Loose Set/Chart/song.ini", 10, "s1");
        ctx.ledger.add_file("Game Rips/Loose Set/Chart/notes.mid", 20, "s2");
        ctx.overrides.set_item_count("Game Rips", "GH3", 40);

        let chart = ctx.sub_collection_path("Game Rips", "Loose Set").join("Chart");
        fs::create_dir_all(&chart).unwrap();
        fs::write(chart.join("song.ini"), "0123456789").unwrap();
        fs::write(chart.join("notes.mid"), "01234567890123456789").unwrap();

        let report = ctx.collection_status(&collection);
        assert_eq!(report.sub_collections.len(), 2);
        assert_eq!(report.sub_collections[1].name, "Loose Set");
        // GH3: 40 via override, 0 synced. Loose Set: one chart on disk, fully synced.
        assert!(report.sub_collections[1].full_sync);
        assert_eq!(report.status.total_charts, 41);
        assert_eq!(report.status.synced_charts, 1);
        assert_eq!(report.status.synced_size, 30);

        let manifest = Manifest {
            collections: vec![collection.clone(), collection],
        };
        let library = ctx.library_status(&manifest);
        assert_eq!(library.collections.len(), 2);
        assert_eq!(library.status.total_charts, 82);
    }

    #[test]
    fn test_ledger_entry_without_files_is_not_synced() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        let mut extracted = BTreeMap::new();
        extracted.insert("Chart/song.ini".to_string(), 10);
        ctx.ledger
            .add_archive("Game Rips/GH3/disc1.7z", "h1", 400, extracted);
        ctx.ledger.add_file("Game Rips/GH3/readme.txt", 5, "r");
        let mut collection = rips(1);
        collection.files.push(file("GH3/readme.txt", "r", 5));

        // The user deleted the extracted folder and the loose file
        let report = ctx.sub_collection_status(&collection, "GH3");
        assert_eq!(report.status.synced_charts, 0);
        assert!(!ctx.is_manifest_file_synced(&collection, &collection.files[0]));
        assert!(!ctx.is_manifest_file_synced(&collection, &collection.files[2]));

        let set = ctx.sub_collection_path("Game Rips", "GH3");
        fs::create_dir_all(set.join("Chart")).unwrap();
        fs::write(set.join("Chart/song.ini"), "0123456789").unwrap();
        fs::write(set.join("readme.txt"), "12345").unwrap();

        assert!(ctx.is_manifest_file_synced(&collection, &collection.files[0]));
        assert!(ctx.is_manifest_file_synced(&collection, &collection.files[2]));
        ctx.invalidate(&set);
        let report = ctx.sub_collection_status(&collection, "GH3");
        assert_eq!(report.status.synced_charts, 2);
        assert_eq!(report.source, CountSource::LocalScan);
    }

    #[test]
    fn test_local_scan_with_partial_ledger() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        seed_charts(&ctx.sub_collection_path("Game Rips", "GH3"), 5);
        ctx.ledger
            .add_archive("Game Rips/GH3/disc1.7z", "h1", 400, BTreeMap::new());

        let report = ctx.sub_collection_status(&rips(1), "GH3");
        assert_eq!(report.source, CountSource::LocalScan);
        assert!(!report.full_sync);
        assert_eq!(report.status.total_charts, 5);
        assert_eq!(report.status.total_size, 50);
        assert_eq!(report.status.synced_charts, 1);
        assert_eq!(report.status.synced_size, 400);
    }

    #[test]
    fn test_names_with_illegal_characters_resolve_locally() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        let setlist = "Guitar Hero III: Legends of Rock";
        let collection = Collection {
            files: vec![file(&format!("{setlist}/disc1.7z"), "h1", 400)],
            sub_collections: None,
            ..rips(1)
        };
        seed_charts(
            &ctx.collection_path("Game Rips")
                .join("Guitar Hero III - Legends of Rock"),
            3,
        );
        ctx.ledger.add_archive(
            "Game Rips/Guitar Hero III - Legends of Rock/disc1.7z",
            "h1",
            400,
            BTreeMap::new(),
        );

        let report = ctx.sub_collection_status(&collection, setlist);
        assert_eq!(report.source, CountSource::LocalScan);
        assert_eq!(report.status.total_charts, 3);
        assert!(report.full_sync);
    }

    #[test]
    fn test_purge_count_reuses_listing() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = context(tmp.path());
        let drive = ctx.collection_path("Game Rips");
        fs::create_dir_all(drive.join("GH3")).unwrap();
        fs::write(drive.join("GH3/disc1.7z"), "archive").unwrap();
        fs::write(drive.join("GH3/leftover.txt"), "junk").unwrap();

        let report = ctx.collection_status(&rips(1));
        assert_eq!(report.purge_count, 1);
        assert!(ctx.files.is_cached(&drive));
    }
}
