mod cli;
mod commands;
mod config;
mod paths;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

use config::AppConfig;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: AppConfig,
    /// `--download-path`, wins over the config file
    pub download_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "dmsync", &mut io::stdout());
        return Ok(());
    }

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: AppConfig::load(cli.config.as_deref())?,
        download_path: cli.download_path,
    };

    match cli.command {
        Command::Status {
            manifest,
            collection,
            json,
        } => commands::status::run(&ctx, &manifest, collection.as_deref(), json),
        Command::Scan {
            path,
            collection,
            json,
        } => commands::scan::run(&ctx, &path, collection, json),
        Command::Purge {
            manifest,
            list,
            json,
        } => commands::purge::run(&ctx, &manifest, list, json),
        Command::Ledger(cmd) => commands::ledger::run(&ctx, cmd),
        Command::Settings(cmd) => commands::settings::run(&ctx, cmd),
        Command::Completions { .. } => Ok(()),
    }
}
