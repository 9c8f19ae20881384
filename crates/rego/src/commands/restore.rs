//! Restore command

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use dialoguer::Confirm;
use rego_backup::{ProgressReporter, RestoreOrchestrator, RestoreReport, RestoreSource};
use rego_core::RestoreResult;
use tabled::{settings::Style, Table, Tabled};

use super::check::{join_kinds, print_check};
use super::{cancel_on_ctrl_c, open_source, OpenedSource, Session};
use crate::output;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Snapshot directory, manifest file, .tar.gz archive or minimal snapshot
    pub source: PathBuf,

    /// Components to restore, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub components: Vec<String>,

    /// Show what would be applied without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Tabled)]
struct RestoreRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Applied")]
    applied: String,
    #[tabled(rename = "Present")]
    present: usize,
    #[tabled(rename = "Errors")]
    errors: String,
}

pub async fn run(args: RestoreArgs, config: Option<&Path>) -> Result<()> {
    output::header(if args.dry_run {
        "Restore preview (dry run)"
    } else {
        "Restoring snapshot"
    });

    let session = Session::load(config)?;
    let selection = session.selection(&args.components);
    let opened = open_source(&session.store, &args.source)?;
    describe_source(&opened);

    let cancel = cancel_on_ctrl_c();
    let orchestrator =
        RestoreOrchestrator::new(&session.registry, &session.store).with_cancel(cancel);

    let spinner = output::spinner("Comparing snapshot with this system...");
    let preview = match &opened {
        OpenedSource::Snapshot { manifest, .. } => {
            orchestrator
                .check(RestoreSource::Snapshot(manifest), selection.as_deref())
                .await
        }
        OpenedSource::Minimal(snapshot) => {
            orchestrator
                .check(RestoreSource::Minimal(snapshot), selection.as_deref())
                .await
        }
    };
    spinner.finish_and_clear();
    let preview = preview?;
    print_check(&preview);

    if preview.check.is_satisfied() && preview.results.is_empty() {
        return Ok(());
    }

    if !args.dry_run && !args.yes {
        let proceed = Confirm::new()
            .with_prompt(format!(
                "Apply {} changes to this system?",
                preview.check.total_to_apply()
            ))
            .default(false)
            .interact()?;
        if !proceed {
            output::info("Restore cancelled");
            return Ok(());
        }
    }

    let reporter = ProgressReporter::new(preview.check.kinds.len() + preview.results.len());
    let mut on_progress = |step: &rego_backup::RestoreStep<'_>| reporter.on_restore(step);
    let result = match &opened {
        OpenedSource::Snapshot { path, .. } => {
            orchestrator
                .run_with_progress(path, selection.as_deref(), args.dry_run, &mut on_progress)
                .await
        }
        OpenedSource::Minimal(snapshot) => {
            orchestrator
                .run_minimal(snapshot, selection.as_deref(), args.dry_run, &mut on_progress)
                .await
        }
    };
    reporter.finish();
    let report = result?;

    print_results(&report);
    finish(&report)
}

fn describe_source(opened: &OpenedSource) {
    match opened {
        OpenedSource::Snapshot { manifest, .. } => {
            output::kv("Snapshot", &manifest.backup_path.display().to_string());
            output::kv("Host", &manifest.hostname);
            output::kv(
                "Taken",
                &manifest.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            );
            if let Some(description) = &manifest.description {
                output::kv("Description", description);
            }
        }
        OpenedSource::Minimal(snapshot) => {
            output::kv("Minimal snapshot from", &snapshot.hostname);
            output::kv(
                "Taken",
                &snapshot.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            );
        }
    }
}

fn restore_row(result: &RestoreResult) -> RestoreRow {
    let status = if result.dry_run {
        "dry run".to_string()
    } else {
        output::status(result.succeeded)
    };
    RestoreRow {
        component: result.kind.display_name().to_string(),
        status,
        applied: format!("{}/{}", result.items_succeeded, result.items_total),
        present: result.items_skipped,
        errors: result.errors.join("; "),
    }
}

fn print_results(report: &RestoreReport) {
    if report.results.is_empty() {
        return;
    }
    let mut table = Table::new(report.results.iter().map(restore_row));
    table.with(Style::sharp());
    println!("{}", table);
}

fn finish(report: &RestoreReport) -> Result<()> {
    if !report.unavailable.is_empty() {
        output::warning(&format!(
            "Skipped, not available on this host: {}",
            join_kinds(&report.unavailable)
        ));
    }
    if report.cancelled {
        bail!(
            "Restore interrupted after {} components; run it again to finish",
            report.results.len()
        );
    }

    let failed = report.failed();
    if !failed.is_empty() {
        for result in &failed {
            output::error(&format!(
                "{}: {} of {} items failed",
                result.kind.display_name(),
                result.items_failed,
                result.items_total
            ));
        }
        bail!(
            "{} components failed to restore: {}",
            failed.len(),
            failed
                .iter()
                .map(|r| r.kind.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    if report.dry_run {
        output::info(&format!(
            "Dry run: {} items would be applied, {} already present",
            report.items_applied(),
            report.items_skipped()
        ));
    } else {
        output::success(&format!(
            "Restore complete: {} items applied, {} already present",
            report.items_applied(),
            report.items_skipped()
        ));
    }
    Ok(())
}
