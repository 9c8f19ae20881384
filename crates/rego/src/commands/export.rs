//! Export command: pack a snapshot into a portable archive

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use rego_backup::{Archiver, BackupOrchestrator, ProgressReporter};
use rego_core::utils::{format_bytes, format_percent};
use tempfile::TempDir;

use super::{cancel_on_ctrl_c, Session};
use crate::output;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Snapshot directory to pack (default: take a fresh backup first)
    pub snapshot: Option<PathBuf>,

    /// Archive file (default: ~/rego-backup-<hostname>-<date>.tar.gz)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Gzip compression level, 0-9 (default: from settings)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: Option<u32>,

    /// Components for a fresh backup, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub components: Vec<String>,
}

pub async fn run(args: ExportArgs, config: Option<&Path>) -> Result<()> {
    output::header("Exporting snapshot");

    let session = Session::load(config)?;
    let identity = session.identity();
    let dest = args.output.unwrap_or_else(|| {
        session
            .paths
            .default_export_path(&identity.hostname, chrono::Local::now().date_naive())
    });

    // fresh snapshots live only as long as the export
    let mut scratch: Option<TempDir> = None;
    let source = match args.snapshot {
        Some(dir) => {
            session
                .store
                .load(&dir)
                .with_context(|| format!("{} is not a valid snapshot", dir.display()))?;
            dir
        }
        None => {
            output::info("No snapshot given, taking a fresh backup");
            let temp = TempDir::new().context("Failed to create a scratch directory")?;
            let target = temp.path().join("snapshot");
            let selection = session.selection(&args.components);
            let orchestrator = BackupOrchestrator::new(&session.registry, &session.store, identity)
                .with_cancel(cancel_on_ctrl_c());

            let reporter = ProgressReporter::new(orchestrator.plan(selection.as_deref()).len());
            let result = orchestrator
                .run_with_progress(selection.as_deref(), &target, None, &mut |step| {
                    reporter.on_backup(step)
                })
                .await;
            reporter.finish();
            let manifest = result?;

            for kind in manifest.failed_kinds() {
                output::warning(&format!("{} could not be captured", kind.display_name()));
            }
            if manifest.results.values().all(|r| !r.succeeded) {
                bail!("Nothing was captured, refusing to export an empty snapshot");
            }
            scratch = Some(temp);
            target
        }
    };

    let level = args.level.unwrap_or(session.settings.compression_level);
    let packed = Archiver::new()
        .with_compression_level(level)
        .with_progress(true)
        .pack(&source, &dest)?;
    drop(scratch);

    output::kv("Files", &packed.stats.files.to_string());
    output::kv("Content", &format_bytes(packed.stats.bytes));
    output::kv(
        "Archive size",
        &format!(
            "{} ({} of content)",
            format_bytes(packed.size_bytes),
            format_percent(packed.size_bytes, packed.stats.bytes)
        ),
    );
    output::success(&format!("Exported to {}", packed.archive_path.display()));
    Ok(())
}
