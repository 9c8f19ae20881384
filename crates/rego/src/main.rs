//! rego CLI - back up and restore a Linux desktop across reinstalls
//!
//! This is the main entry point for the rego command-line interface.

mod cli;
mod commands;
mod output;

use std::fs::{self, File, OpenOptions};
use std::sync::Mutex;

use anyhow::Result;
use clap::Parser;
use rego_core::RegoPaths;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Backup(args) => commands::backup::run(args, config).await,
        Commands::Light(args) => commands::light::run(args, config).await,
        Commands::Export(args) => commands::export::run(args, config).await,
        Commands::Import(args) => commands::import::run(args, config).await,
        Commands::Restore(args) => commands::restore::run(args, config).await,
        Commands::Check(args) => commands::check::run(args, config).await,
        Commands::List(args) => commands::list::run(args, config),
        Commands::Components => commands::components::run(config),
        Commands::Config(args) => commands::config::run(args, config),
    }
}

/// Initialize tracing: console output at the requested verbosity plus a
/// per-day log file under the rego config directory
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = open_log_file().map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
}

/// Today's log file, or `None` when the log directory is not writable
fn open_log_file() -> Option<File> {
    let paths = RegoPaths::resolve().ok()?;
    fs::create_dir_all(&paths.logs_dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(paths.log_file(chrono::Local::now().date_naive()))
        .ok()
}
