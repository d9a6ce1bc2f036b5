//! # Chartsync
//!
//! Reconciles a local chart library against a remote manifest whose counts
//! can't be trusted.
//!
//! This crate provides functionality to:
//! - Count charts on disk, nested inside extracted archives included
//! - Cache recursive file listings for purge planning
//! - Track what was downloaded and extracted, by hash
//! - Apply admin chart-count overrides and per-user enable/disable filters
//! - Combine all of the above into synced vs. available totals
//!
//! ## Example
//!
//! ```no_run
//! use chartsync::{FilterSettings, Ledger, Manifest, Overrides, SyncContext, TreeScanner};
//! use std::path::Path;
//!
//! let data = Path::new("/path/to/Songs/.dm-sync");
//! let manifest = Manifest::load(Path::new("/path/to/manifest.json"))?;
//!
//! let mut ctx = SyncContext::new(
//!     "/path/to/Songs",
//!     TreeScanner::default(),
//!     Ledger::load(data.join("sync_state.json")),
//!     FilterSettings::load(data.join("settings.json")),
//!     Overrides::load(&data.join("overrides.json")),
//! );
//!
//! let report = ctx.library_status(&manifest);
//! println!(
//!     "{}/{} charts synced",
//!     report.status.synced_charts, report.status.total_charts
//! );
//! # Ok::<(), chartsync::Error>(())
//! ```

mod context;
mod error;
mod files;
mod ledger;
pub mod markers;
pub mod names;
mod overrides;
mod purge;
mod resolve;
mod scanner;
mod settings;
mod status;
mod types;

pub use context::SyncContext;
pub use error::{Error, Result};
pub use files::{FileCache, FileListing};
pub use ledger::{LEDGER_VERSION, Ledger, LedgerEntry, LedgerStats};
pub use overrides::{CollectionOverride, Overrides, SubCollectionOverride};
pub use purge::{PurgeEntry, PurgePlan, PurgeReason, PurgeStats};
pub use resolve::{Resolution, ResolveInput, Sources, resolve};
pub use scanner::{TreeScanner, UnitScan, count_units};
pub use settings::{DisplayMode, FilterSettings, normalize_setlist_name};
pub use status::{CollectionReport, LibraryReport, SubCollectionReport, ledger_key};
pub use types::{
    Collection, CountSource, Manifest, ManifestFile, SubCollectionSummary, SyncStatus, TreeStats,
    UnitStats, dedupe_by_newest, top_level_name,
};
