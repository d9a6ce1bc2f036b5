//! Settings - collection filters and rename migration

use anyhow::{Context as _, Result, bail};
use chartsync::{Collection, FilterSettings, Manifest};
use colored::Colorize;
use std::path::Path;

use crate::Context;
use crate::cli::SettingsCommand;
use crate::commands::{find_collection, load_manifest};
use crate::ui;

pub fn run(ctx: &Context, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show { manifest } => show(ctx, &manifest),
        SettingsCommand::Enable {
            collection,
            sub_collection,
            manifest,
        } => toggle(ctx, &manifest, &collection, sub_collection.as_deref(), true),
        SettingsCommand::Disable {
            collection,
            sub_collection,
            manifest,
        } => toggle(ctx, &manifest, &collection, sub_collection.as_deref(), false),
        SettingsCommand::SyncNames { manifest } => sync_names(ctx, &manifest),
    }
}

fn load_settings(ctx: &Context) -> Result<FilterSettings> {
    Ok(FilterSettings::load(ctx.config.settings_path()?))
}

fn save_settings(settings: &FilterSettings) -> Result<()> {
    settings
        .save()
        .with_context(|| format!("Could not save {}", settings.path().display()))
}

fn show(ctx: &Context, manifest: &Path) -> Result<()> {
    let manifest = load_manifest(manifest)?;
    let settings = load_settings(ctx)?;

    ui::header("Collection Filters");
    for collection in &manifest.collections {
        if !settings.is_collection_enabled(&collection.id) {
            println!("  {} {}", "○".dimmed(), collection.name.dimmed());
            continue;
        }
        println!("  {} {}", "●".green(), collection.name);
        for name in settings.disabled_sub_collections(&collection.id) {
            ui::dim(&format!("  - {name} (disabled)"));
        }
    }

    println!();
    ui::kv("Delete videos", &settings.delete_videos.to_string());
    ui::kv("Display", settings.display_mode().as_str());
    if settings.is_new_install() && !ctx.quiet {
        ui::info("New install: collections stay disabled until enabled");
    }
    Ok(())
}

fn toggle(
    ctx: &Context,
    manifest: &Path,
    key: &str,
    sub_collection: Option<&str>,
    enabled: bool,
) -> Result<()> {
    let manifest = load_manifest(manifest)?;
    let collection = find_collection(&manifest, key)?;
    let mut settings = load_settings(ctx)?;
    let verb = if enabled { "Enabled" } else { "Disabled" };

    match sub_collection {
        Some(name) => {
            check_sub_collection(collection, name)?;
            settings.set_sub_collection_enabled(&collection.id, name, enabled);
            save_settings(&settings)?;
            ui::success(&format!("{verb} {} / {name}", collection.name));
        }
        None => {
            settings.set_collection_enabled(&collection.id, enabled);
            save_settings(&settings)?;
            ui::success(&format!("{verb} {}", collection.name));
        }
    }
    Ok(())
}

fn check_sub_collection(collection: &Collection, name: &str) -> Result<()> {
    if collection.sub_collection_names().iter().any(|n| n == name) {
        Ok(())
    } else {
        bail!("'{}' has no sub-collection named '{}'", collection.name, name)
    }
}

/// Rename migration for every collection; returns how many changed
fn migrate_names(settings: &mut FilterSettings, manifest: &Manifest) -> usize {
    manifest
        .collections
        .iter()
        .filter(|c| settings.sync_subfolder_names(&c.id, &c.sub_collection_names()))
        .count()
}

fn sync_names(ctx: &Context, manifest: &Path) -> Result<()> {
    let manifest = load_manifest(manifest)?;
    let mut settings = load_settings(ctx)?;

    let changed = migrate_names(&mut settings, &manifest);
    if changed == 0 {
        ui::success("Sub-collection toggles already match the manifest");
        return Ok(());
    }

    save_settings(&settings)?;
    ui::success(&format!("Migrated toggles for {changed} collections"));
    Ok(())
}
