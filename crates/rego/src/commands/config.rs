//! Config command: resolved paths and effective settings

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use rego_core::{RegoPaths, Settings};

use crate::output;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Write a settings file with the defaults if none exists
    #[arg(long)]
    pub init: bool,
}

pub fn run(args: ConfigArgs, config: Option<&Path>) -> Result<()> {
    let paths = RegoPaths::resolve()?;
    let config_file = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| paths.config_file());

    if args.init {
        if config_file.exists() {
            bail!("{} already exists", config_file.display());
        }
        if let Some(parent) = config_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&config_file, Settings::default().to_yaml()?)
            .with_context(|| format!("Failed to write {}", config_file.display()))?;
        output::success(&format!("Wrote default settings to {}", config_file.display()));
        return Ok(());
    }

    let settings = Settings::load(&config_file)?;
    let paths = paths.with_backup_dir(settings.backup_dir.as_deref());

    output::header("Paths");
    let state = if config_file.exists() {
        "found"
    } else {
        "not found, using defaults"
    };
    output::kv(
        "Settings file",
        &format!("{} ({})", config_file.display(), state),
    );
    output::kv("Snapshot store", &paths.backups_dir.display().to_string());
    output::kv("Logs", &paths.logs_dir.display().to_string());

    output::header("Settings");
    print!("{}", settings.to_yaml()?);
    Ok(())
}
