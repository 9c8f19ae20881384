//! Components command: registered adapters and their availability

use std::path::Path;

use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

use super::Session;
use crate::output;

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn run(config: Option<&Path>) -> Result<()> {
    output::header("Components");

    let session = Session::load(config)?;
    output::kv("Package manager", &format!("{:?}", session.host.package_manager));
    output::kv(
        "Distribution",
        session.host.distro.as_deref().unwrap_or("unknown"),
    );
    output::kv(
        "Desktop",
        &session
            .host
            .desktop
            .map(|d| format!("{:?}", d))
            .unwrap_or_else(|| "unknown".to_string()),
    );
    println!();

    let rows: Vec<ComponentRow> = session
        .registry
        .iter()
        .map(|(kind, adapter)| ComponentRow {
            kind: kind.as_str().to_string(),
            name: adapter.name().to_string(),
            available: if adapter.is_available() {
                "yes".to_string()
            } else {
                "no".to_string()
            },
            description: kind.description().to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    if let Some(defaults) = &session.settings.components {
        output::info(&format!(
            "Default selection from settings: {}",
            super::check::join_kinds(defaults)
        ));
    }
    Ok(())
}
