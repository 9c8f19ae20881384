//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use crate::commands::backup::BackupArgs;
pub use crate::commands::check::CheckArgs;
pub use crate::commands::config::ConfigArgs;
pub use crate::commands::export::ExportArgs;
pub use crate::commands::import::ImportArgs;
pub use crate::commands::light::LightArgs;
pub use crate::commands::list::ListArgs;
pub use crate::commands::restore::RestoreArgs;

/// rego - back up and restore a Linux desktop's applications, settings and dotfiles
#[derive(Parser, Debug)]
#[command(name = "rego")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the settings file (default: ~/.config/rego/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a full snapshot of this system
    Backup(BackupArgs),

    /// Capture a minimal snapshot (identifiers only, one JSON file)
    Light(LightArgs),

    /// Pack a snapshot into a portable .tar.gz archive
    Export(ExportArgs),

    /// Unpack an exported archive into the snapshot store
    Import(ImportArgs),

    /// Restore whatever is missing from a snapshot
    Restore(RestoreArgs),

    /// Show what a restore would change without applying anything
    Check(CheckArgs),

    /// List stored snapshots
    List(ListArgs),

    /// Show component adapters and their availability on this host
    Components,

    /// Show resolved paths and settings
    Config(ConfigArgs),
}
