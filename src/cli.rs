use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dmsync")]
#[command(version)]
#[command(about = "Reconcile a local chart library against its remote manifest", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Folder holding one subfolder per collection
    #[arg(long, global = true, env = "DMSYNC_DOWNLOAD_PATH")]
    pub download_path: Option<PathBuf>,

    /// Config file (default: config.toml in the data dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show synced vs. available charts per collection
    Status {
        /// Manifest JSON produced by the remote scan
        manifest: PathBuf,

        /// Only this collection (name or id)
        #[arg(short, long)]
        collection: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Count charts in a local folder
    Scan {
        /// Sub-collection folder, or collection folder with --collection
        path: PathBuf,

        /// Treat the path as a collection and report each subfolder
        #[arg(short, long)]
        collection: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show which local files a cleanup would remove (read-only)
    Purge {
        /// Manifest JSON produced by the remote scan
        manifest: PathBuf,

        /// List every file instead of the summary only
        #[arg(short, long)]
        list: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Inspect or maintain the download ledger
    #[command(subcommand)]
    Ledger(LedgerCommand),

    /// Manage collection filters
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum LedgerCommand {
    /// Tracked file and archive counts
    Stats,

    /// Show one entry
    Show {
        /// Path relative to the download folder, e.g. "Drive/Setlist/pack.7z"
        path: String,
    },

    /// Drop entries for deleted files and archives the manifest replaced
    Cleanup {
        /// Manifest JSON produced by the remote scan
        manifest: PathBuf,

        /// Report without saving
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show enabled collections and disabled sub-collections
    Show {
        /// Manifest JSON produced by the remote scan
        manifest: PathBuf,
    },

    /// Enable a collection, or one of its sub-collections
    Enable {
        /// Collection name or id
        collection: String,

        /// Sub-collection (setlist) name
        sub_collection: Option<String>,

        /// Manifest JSON produced by the remote scan
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Disable a collection, or one of its sub-collections
    Disable {
        /// Collection name or id
        collection: String,

        /// Sub-collection (setlist) name
        sub_collection: Option<String>,

        /// Manifest JSON produced by the remote scan
        #[arg(short, long)]
        manifest: PathBuf,
    },

    /// Carry sub-collection toggles over remote renames
    SyncNames {
        /// Manifest JSON produced by the remote scan
        manifest: PathBuf,
    },
}
