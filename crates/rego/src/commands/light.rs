//! Minimal (identifiers-only) backup command

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use rego_backup::{minimal, MinimalCapture};

use super::{cancel_on_ctrl_c, Session};
use crate::output;

#[derive(Args, Debug)]
pub struct LightArgs {
    /// Components to capture, comma separated (default: all available)
    #[arg(short, long, value_delimiter = ',')]
    pub components: Vec<String>,

    /// Snapshot file (default: ~/rego-<hostname>.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: LightArgs, config: Option<&Path>) -> Result<()> {
    output::header("Capturing minimal snapshot");

    let session = Session::load(config)?;
    let selection = session.selection(&args.components);
    let identity = session.identity();
    let path = args
        .output
        .unwrap_or_else(|| session.paths.default_minimal_path(&identity.hostname));

    let spinner = output::spinner("Querying installed state...");
    let report = MinimalCapture::new(&session.registry, identity)
        .with_cancel(cancel_on_ctrl_c())
        .run(selection.as_deref())
        .await;
    spinner.finish_and_clear();
    let report = report?;

    for kind in &report.unsupported {
        output::info(&format!(
            "{} needs a full backup and was left out",
            kind.display_name()
        ));
    }
    for (kind, message) in &report.failures {
        output::warning(&format!("{}: {}", kind.display_name(), message));
    }

    minimal::save(&report.snapshot, &path)?;
    for kind in &report.snapshot.components {
        let count = report
            .snapshot
            .items
            .get(kind)
            .map(|items| format!("{} items", items.len()))
            .unwrap_or_else(|| "settings".to_string());
        output::kv(kind.display_name(), &count);
    }

    if !report.failures.is_empty() {
        bail!(
            "Minimal snapshot written to {} but {} components failed",
            path.display(),
            report.failures.len()
        );
    }

    output::success(&format!(
        "Minimal snapshot with {} entries written to {}",
        report.snapshot.item_count(),
        path.display()
    ));
    Ok(())
}
