//! Ledger - inspect and maintain the download ledger

use anyhow::{Context as _, Result, bail};
use chartsync::{Ledger, LedgerEntry, Manifest, dedupe_by_newest, ledger_key, markers};
use std::collections::HashMap;
use std::path::Path;

use crate::Context;
use crate::cli::LedgerCommand;
use crate::commands::load_manifest;
use crate::ui;

pub fn run(ctx: &Context, cmd: LedgerCommand) -> Result<()> {
    match cmd {
        LedgerCommand::Stats => stats(ctx),
        LedgerCommand::Show { path } => show(ctx, &path),
        LedgerCommand::Cleanup { manifest, dry_run } => cleanup(ctx, &manifest, dry_run),
    }
}

fn stats(ctx: &Context) -> Result<()> {
    let ledger = Ledger::load(ctx.config.ledger_path()?);
    let stats = ledger.stats();

    ui::header("Download Ledger");
    ui::kv("File", &ledger.path().display().to_string());
    ui::kv("Files", &stats.total_files.to_string());
    ui::kv("Archives", &stats.total_archives.to_string());
    ui::kv(
        "Last sync",
        &stats
            .last_sync
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
    );
    Ok(())
}

fn show(ctx: &Context, path: &str) -> Result<()> {
    let ledger = Ledger::load(ctx.config.ledger_path()?);
    let path = path.replace('\\', "/");
    let Some(entry) = ledger.entry(&path) else {
        bail!("'{}' is not in the ledger", path);
    };

    ui::header(&path);
    match entry {
        LedgerEntry::File {
            hash,
            size,
            synced_at,
        } => {
            ui::kv("Type", "file");
            ui::kv("Hash", hash);
            ui::kv("Size", &ui::format_size(*size));
            ui::kv("Synced", &synced_at.to_rfc3339());
        }
        LedgerEntry::Archive {
            hash,
            archive_size,
            extracted_at,
            files,
        } => {
            ui::kv("Type", "archive");
            ui::kv("Hash", hash);
            ui::kv("Size", &ui::format_size(*archive_size));
            ui::kv("Extracted", &extracted_at.to_rfc3339());
            ui::kv("Files", &files.len().to_string());
            if ctx.verbose > 0 {
                for extracted in ledger.extracted_paths_of(&path) {
                    ui::dim(&extracted);
                }
            }
        }
    }
    Ok(())
}

/// Ledger path to manifest hash for every archive the manifest declares
fn manifest_archives(manifest: &Manifest) -> HashMap<String, String> {
    let mut archives = HashMap::new();
    for collection in &manifest.collections {
        for file in dedupe_by_newest(&collection.files) {
            if markers::is_archive(&file.path) {
                archives.insert(ledger_key(collection, &file), file.hash);
            }
        }
    }
    archives
}

fn cleanup(ctx: &Context, manifest: &Path, dry_run: bool) -> Result<()> {
    let manifest = load_manifest(manifest)?;
    let download_root = ctx.config.download_root(ctx.download_path.as_deref())?;
    let mut ledger = Ledger::load(ctx.config.ledger_path()?);

    let stale = ledger.cleanup_stale_archives(&manifest_archives(&manifest));
    let orphaned = ledger.cleanup_orphaned_files(&download_root);

    ui::header("Ledger Cleanup");
    ui::kv("Stale archives", &stale.to_string());
    ui::kv("Deleted files", &orphaned.to_string());

    if stale + orphaned == 0 {
        ui::success("Ledger is up to date");
    } else if dry_run {
        ui::info("Dry run: ledger not saved");
    } else {
        ledger
            .save()
            .with_context(|| format!("Could not save {}", ledger.path().display()))?;
        ui::success(&format!("Removed {} entries", stale + orphaned));
    }
    Ok(())
}
