//! List command: stored snapshots

use std::path::Path;

use anyhow::Result;
use clap::Args;
use rego_core::SnapshotManifest;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::Session;
use crate::output;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled, Serialize)]
struct SnapshotRow {
    #[tabled(rename = "Taken")]
    created: String,
    #[tabled(rename = "Host")]
    hostname: String,
    #[tabled(rename = "Components")]
    components: usize,
    #[tabled(rename = "Items")]
    items: usize,
    #[tabled(rename = "Failed")]
    failed: usize,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Path")]
    path: String,
}

impl From<&SnapshotManifest> for SnapshotRow {
    fn from(manifest: &SnapshotManifest) -> Self {
        Self {
            created: manifest.created_at.format("%Y-%m-%d %H:%M").to_string(),
            hostname: manifest.hostname.clone(),
            components: manifest.components.len(),
            items: manifest.total_items(),
            failed: manifest.failed_kinds().len(),
            description: manifest.description.clone().unwrap_or_default(),
            path: manifest.backup_path.display().to_string(),
        }
    }
}

pub fn run(args: ListArgs, config: Option<&Path>) -> Result<()> {
    let session = Session::load(config)?;
    let manifests = session.store.list()?;
    let rows: Vec<SnapshotRow> = manifests.iter().map(SnapshotRow::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    output::header("Stored snapshots");
    output::kv("Store", &session.store.root().display().to_string());
    if rows.is_empty() {
        output::info("No snapshots yet, run `rego backup` to create one");
        return Ok(());
    }

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    Ok(())
}
