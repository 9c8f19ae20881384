//! Backup command

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use rego_backup::{Archiver, BackupOrchestrator, ProgressReporter};
use rego_core::utils::{format_bytes, format_duration_ms};
use rego_core::SnapshotManifest;
use tabled::{settings::Style, Table, Tabled};

use super::{cancel_on_ctrl_c, Session};
use crate::output;

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Components to capture, comma separated (default: all available)
    #[arg(short, long, value_delimiter = ',')]
    pub components: Vec<String>,

    /// Snapshot directory (default: a new timestamped directory in the store)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Free-text description stored in the manifest
    #[arg(short, long)]
    pub description: Option<String>,

    /// Also pack the finished snapshot into this archive
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "Time")]
    duration: String,
    #[tabled(rename = "Error")]
    error: String,
}

pub async fn run(args: BackupArgs, config: Option<&Path>) -> Result<()> {
    output::header("Backing up system");

    let session = Session::load(config)?;
    let selection = session.selection(&args.components);
    let orchestrator = BackupOrchestrator::new(&session.registry, &session.store, session.identity())
        .with_cancel(cancel_on_ctrl_c());

    let plan = orchestrator.plan(selection.as_deref());
    if plan.is_empty() {
        output::warning("No selected component is available on this host");
        return Ok(());
    }

    let target = match args.output {
        Some(dir) => dir,
        None => session.store.new_snapshot_dir()?,
    };
    output::kv("Snapshot", &target.display().to_string());
    output::kv(
        "Components",
        &plan.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", "),
    );

    let reporter = ProgressReporter::new(plan.len());
    let result = orchestrator
        .run_with_progress(
            selection.as_deref(),
            &target,
            args.description,
            &mut |step| reporter.on_backup(step),
        )
        .await;
    reporter.finish();
    let manifest = result?;

    print_results(&manifest);

    let failed = manifest.failed_kinds();
    if let Some(archive) = args.archive {
        let packed = Archiver::new()
            .with_compression_level(session.settings.compression_level)
            .with_progress(true)
            .pack(&manifest.backup_path, &archive)?;
        output::success(&format!(
            "Archive written to {} ({})",
            packed.archive_path.display(),
            format_bytes(packed.size_bytes)
        ));
    }

    if !failed.is_empty() {
        bail!(
            "{} of {} components failed: {}",
            failed.len(),
            manifest.components.len(),
            failed.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
        );
    }

    output::success(&format!(
        "Captured {} items into {}",
        manifest.total_items(),
        manifest.backup_path.display()
    ));
    Ok(())
}

fn print_results(manifest: &SnapshotManifest) {
    let rows: Vec<ResultRow> = manifest
        .ordered_results()
        .map(|r| ResultRow {
            component: r.kind.display_name().to_string(),
            status: output::status(r.succeeded),
            items: r.item_count,
            duration: format_duration_ms(r.duration_ms),
            error: r.error_message.clone().unwrap_or_default(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
}
