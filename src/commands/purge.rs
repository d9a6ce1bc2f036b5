//! Purge - list local files a cleanup would remove
//!
//! Read-only: nothing is deleted here.

use anyhow::Result;
use chartsync::{PurgeReason, PurgeStats};
use colored::Colorize;
use std::path::Path;

use crate::Context;
use crate::commands::{load_manifest, open_sync_context};
use crate::ui;

pub fn run(ctx: &Context, manifest: &Path, list: bool, json: bool) -> Result<()> {
    let manifest = load_manifest(manifest)?;
    let mut sync = open_sync_context(ctx)?;
    let plan = sync.plan_library_purge(&manifest);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    ui::header("Purge Plan");
    if plan.is_empty() {
        ui::success("Nothing to purge");
        return Ok(());
    }

    if list {
        let root = sync.download_root();
        for file in &plan.files {
            let rel = file.path.strip_prefix(root).unwrap_or(&file.path);
            println!(
                "  {:<10} {:>10}  {}",
                reason_label(file.reason),
                ui::format_size(file.size),
                ui::truncate_path(&rel.display().to_string(), 80)
            );
        }
        println!();
    }

    print_stats(&plan.stats);
    if !ctx.quiet {
        ui::dim("Run with --list to see every file");
    }
    Ok(())
}

fn print_stats(stats: &PurgeStats) {
    let rows = [
        ("Disabled", stats.disabled_count, stats.disabled_size),
        ("Extra", stats.extra_count, stats.extra_size),
        ("Partial", stats.partial_count, stats.partial_size),
        ("Videos", stats.video_count, stats.video_size),
    ];
    for (label, count, size) in rows {
        if count > 0 {
            ui::kv(label, &format!("{count} files, {}", ui::format_size(size)));
        }
    }
    ui::kv(
        "Total",
        &format!(
            "{} files, {}",
            stats.total_files(),
            ui::format_size(stats.total_size()).bold()
        ),
    );
    if stats.estimated_charts > 0 {
        ui::kv("Charts", &format!("~{}", stats.estimated_charts));
    }
}

fn reason_label(reason: PurgeReason) -> &'static str {
    match reason {
        PurgeReason::Disabled => "disabled",
        PurgeReason::Partial => "partial",
        PurgeReason::Extra => "extra",
        PurgeReason::Video => "video",
    }
}
