//! lathe - asset pipeline for static sites.

mod cli;
mod config;
mod core;
mod logger;
mod paths;
mod pipeline;
mod serve;
mod task;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};

use cli::{Cli, Commands};
use config::PipelineConfig;
use paths::PathTable;
use pipeline::BuildReport;

fn main() -> Result<()> {
    // Install the Ctrl+C handler before anything can block
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = PipelineConfig::load(&cli)?;
    let table = PathTable::new(&config);

    match &cli.command {
        None | Some(Commands::Watch { .. }) => watch_and_serve(config, table),
        Some(command) => {
            let report = match command.category() {
                Some(category) => pipeline::run_single(category, &config, &table)?,
                None => pipeline::run_build(&config, &table)?,
            };
            finish(report)
        }
    }
}

/// Default command: one full build, then watch and serve until Ctrl+C.
fn watch_and_serve(config: PipelineConfig, table: PathTable) -> Result<()> {
    let config = Arc::new(config);
    let table = Arc::new(table);

    // An initial build failure does not stop watch mode; the watcher picks
    // fixes up as they land
    if let Err(e) = pipeline::run_build(&config, &table) {
        log!("build"; "initial build failed: {e}");
    }

    let server = serve::bind_server(&config)?;
    server.run(config, table)
}

/// Exit non-zero when the report carries failures. They were already
/// logged step by step.
fn finish(report: BuildReport) -> Result<()> {
    if report.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}
