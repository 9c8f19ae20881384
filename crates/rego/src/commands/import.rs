//! Import command: unpack an exported archive into the snapshot store

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rego_backup::Archiver;

use super::Session;
use crate::output;

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Archive produced by `rego export`
    pub archive: PathBuf,

    /// Destination directory (default: a new directory in the snapshot store)
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

pub async fn run(args: ImportArgs, config: Option<&Path>) -> Result<()> {
    output::header("Importing snapshot");

    let session = Session::load(config)?;
    if !args.archive.is_file() {
        anyhow::bail!("{} is not a file", args.archive.display());
    }

    let dest = match args.dest {
        Some(dir) => dir,
        None => session.store.root().join(format!(
            "imported-{}",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        )),
    };

    let stats = Archiver::new()
        .with_progress(true)
        .unpack(&args.archive, &dest)
        .with_context(|| format!("Failed to unpack {}", args.archive.display()))?;

    let manifest = match session.store.load(&dest) {
        Ok(manifest) => manifest,
        Err(e) => {
            if let Err(cleanup) = fs::remove_dir_all(&dest) {
                tracing::warn!("Could not remove {}: {}", dest.display(), cleanup);
            }
            return Err(e).context("Archive does not contain a valid snapshot");
        }
    };

    output::kv("Host", &manifest.hostname);
    output::kv(
        "Taken",
        &manifest.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    output::kv("Components", &manifest.components.len().to_string());
    output::kv("Files", &stats.files.to_string());
    output::success(&format!("Imported into {}", dest.display()));
    output::info(&format!("Run `rego restore {}` to apply it", dest.display()));
    Ok(())
}
