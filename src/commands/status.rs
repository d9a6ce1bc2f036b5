//! Status - synced vs. available charts per collection and sub-collection

use anyhow::Result;
use chartsync::{CollectionReport, CountSource, LibraryReport};
use colored::Colorize;
use std::path::Path;

use crate::Context;
use crate::commands::{find_collection, load_manifest, open_sync_context};
use crate::ui;

const NAME_WIDTH: usize = 40;

pub fn run(ctx: &Context, manifest: &Path, collection: Option<&str>, json: bool) -> Result<()> {
    let manifest = load_manifest(manifest)?;
    let mut sync = open_sync_context(ctx)?;

    let report = match collection {
        Some(key) => {
            let collection = find_collection(&manifest, key)?;
            let report = sync.collection_status(collection);
            LibraryReport {
                status: report.status,
                collections: vec![report],
            }
        }
        None => sync.library_status(&manifest),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    ui::header("Sync Status");
    for collection in &report.collections {
        print_collection(ctx, collection);
    }

    println!();
    ui::kv(
        "Charts",
        &ui::progress(report.status.synced_charts, report.status.total_charts),
    );
    ui::kv(
        "Size",
        &format!(
            "{} / {}",
            ui::format_size(report.status.synced_size),
            ui::format_size(report.status.total_size)
        ),
    );
    if report.status.missing_charts() > 0 {
        ui::kv(
            "Missing",
            &format!(
                "{} charts, {}",
                report.status.missing_charts(),
                ui::format_size(report.status.missing_size())
            ),
        );
    }

    if !ctx.quiet && report.collections.iter().all(|c| !c.enabled) {
        println!();
        ui::info("No collections are enabled. Try: dmsync settings enable <collection> -m <manifest>");
    }

    Ok(())
}

fn print_collection(ctx: &Context, collection: &CollectionReport) {
    if !collection.enabled {
        ui::section(&format!("{} {}", collection.name, "(disabled)".dimmed()));
        return;
    }

    ui::section(&collection.name);
    for sub in &collection.sub_collections {
        let name = ui::truncate_path(&sub.name, NAME_WIDTH);
        if sub.source == CountSource::Disabled {
            ui::dim(&format!("{name:<NAME_WIDTH$} disabled"));
            continue;
        }

        let mut line = format!(
            "  {name:<NAME_WIDTH$} {:>10}  {}",
            ui::format_size(sub.status.total_size),
            ui::progress(sub.status.synced_charts, sub.status.total_charts)
        );
        if ctx.verbose > 0 {
            line.push_str(&format!("  {}", source_label(sub.source).dimmed()));
        }
        println!("{line}");
    }

    if collection.purge_count > 0 {
        ui::warn(&format!(
            "{} local files not in the manifest (see: dmsync purge)",
            collection.purge_count
        ));
    }
}

fn source_label(source: CountSource) -> &'static str {
    match source {
        CountSource::Unadjusted => "files",
        CountSource::LocalScan => "local scan",
        CountSource::Override => "override",
        CountSource::Manifest => "manifest",
        CountSource::Disabled => "disabled",
    }
}
