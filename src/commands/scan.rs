//! Scan - count charts in a local folder

use anyhow::{Result, bail};
use chartsync::{TreeScanner, UnitStats};
use std::collections::HashSet;
use std::path::Path;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context, path: &Path, collection: bool, json: bool) -> Result<()> {
    if !path.is_dir() {
        bail!("{} is not a directory", path.display());
    }

    let mut scanner = TreeScanner::new(ctx.config.cache_ttl());

    if collection {
        let stats = scanner.collection_stats(path, &HashSet::new());
        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        ui::header(&format!("Collection: {}", path.display()));
        for unit in stats.sub_collections.values() {
            print_unit(unit);
        }
        println!();
        ui::kv("Charts", &stats.item_count.to_string());
        ui::kv("Size", &ui::format_size(stats.total_size));
    } else {
        let stats = scanner.unit_stats(path);
        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        ui::header(&format!("Folder: {}", path.display()));
        ui::kv("Charts", &stats.item_count.to_string());
        ui::kv("Size", &ui::format_size(stats.total_size));
        ui::kv("Archives", &stats.archive_count.to_string());
    }

    Ok(())
}

fn print_unit(unit: &UnitStats) {
    let archives = if unit.archive_count > 0 {
        format!("  {} archives", unit.archive_count)
    } else {
        String::new()
    };
    println!(
        "  {:<40} {:>6} charts {:>10}{}",
        ui::truncate_path(&unit.name, 40),
        unit.item_count,
        ui::format_size(unit.total_size),
        archives
    );
}
