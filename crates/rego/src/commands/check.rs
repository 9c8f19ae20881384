//! Check command: drift preview without applying anything

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use rego_backup::restore::{preview, summarize_check};
use rego_backup::{RestoreOrchestrator, RestoreReport, RestoreSource};
use rego_core::{ComponentKind, Drift, KindCheck};
use tabled::{settings::Style, Table, Tabled};

use super::{open_source, OpenedSource, Session};
use crate::output;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Snapshot directory, manifest file, .tar.gz archive or minimal snapshot
    pub source: PathBuf,

    /// Components to check, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub components: Vec<String>,

    /// List every missing item
    #[arg(long)]
    pub items: bool,

    /// List everything the snapshot contains, present or not
    #[arg(long)]
    pub contents: bool,
}

#[derive(Tabled)]
struct DriftRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "To apply")]
    to_apply: String,
    #[tabled(rename = "Present")]
    present: usize,
    #[tabled(rename = "Note")]
    note: String,
}

pub async fn run(args: CheckArgs, config: Option<&Path>) -> Result<()> {
    output::header("Checking snapshot against this system");

    let session = Session::load(config)?;
    let selection = session.selection(&args.components);
    let opened = open_source(&session.store, &args.source)?;

    let spinner = output::spinner("Probing installed state...");
    let orchestrator = RestoreOrchestrator::new(&session.registry, &session.store);
    let report = match &opened {
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
    let report = report?;

    if args.contents {
        match &opened {
            OpenedSource::Snapshot { manifest, .. } => {
                for (kind, lines) in preview(&session.registry, manifest).await {
                    output::header(kind.display_name());
                    match lines {
                        Ok(lines) => lines.iter().for_each(|line| println!("  {}", line)),
                        Err(e) => output::warning(&format!("Cannot list contents: {}", e)),
                    }
                }
            }
            OpenedSource::Minimal(_) => {
                output::info("Minimal snapshots only record identifiers, use --items instead")
            }
        }
    }

    print_check(&report);
    if args.items {
        print_items(&report);
    }
    Ok(())
}

/// Drift table plus unavailable and unreadable kinds
pub(crate) fn print_check(report: &RestoreReport) {
    let rows: Vec<DriftRow> = report.check.kinds.iter().map(drift_row).collect();
    if rows.is_empty() {
        output::info("Nothing in this snapshot can be restored here");
    } else {
        let mut table = Table::new(rows);
        table.with(Style::sharp());
        println!("{}", table);
    }

    for result in &report.results {
        output::warning(&format!(
            "{} cannot be checked: {}",
            result.kind.display_name(),
            result.errors.join("; ")
        ));
    }
    if !report.unavailable.is_empty() {
        output::info(&format!(
            "Not available on this host: {}",
            join_kinds(&report.unavailable)
        ));
    }

    if report.check.is_satisfied() {
        output::success("System already matches the snapshot");
    } else {
        output::info(&summarize_check(&report.check));
    }
}

fn drift_row(check: &KindCheck) -> DriftRow {
    let (to_apply, note) = match &check.drift {
        Drift::Items {
            to_apply,
            probe_unavailable,
            ..
        } => {
            let note = if *probe_unavailable {
                "could not query installed state".to_string()
            } else {
                String::new()
            };
            (to_apply.len().to_string(), note)
        }
        Drift::Settings { present: true } => ("all".to_string(), "loaded as a whole".to_string()),
        Drift::Settings { present: false } => ("-".to_string(), "empty dump".to_string()),
    };
    DriftRow {
        component: check.kind.display_name().to_string(),
        to_apply,
        present: check.skipped_count(),
        note,
    }
}

fn print_items(report: &RestoreReport) {
    for check in report.check.kinds.iter().filter(|c| !c.to_apply().is_empty()) {
        output::header(check.kind.display_name());
        for item in check.to_apply() {
            println!("  {}", item);
        }
    }
}

pub(crate) fn join_kinds(kinds: &[ComponentKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drift_row_for_items() {
        let row = drift_row(&KindCheck {
            kind: ComponentKind::Flatpak,
            drift: Drift::Items {
                to_apply: vec!["org.gimp.GIMP".into()],
                skipped_count: 4,
                probe_unavailable: false,
            },
        });
        assert_eq!(row.to_apply, "1");
        assert_eq!(row.present, 4);
        assert!(row.note.is_empty());
    }

    #[test]
    fn test_drift_row_flags_failed_probe() {
        let row = drift_row(&KindCheck {
            kind: ComponentKind::SystemPackages,
            drift: Drift::Items {
                to_apply: vec!["vim".into(), "git".into()],
                skipped_count: 0,
                probe_unavailable: true,
            },
        });
        assert_eq!(row.to_apply, "2");
        assert!(row.note.contains("could not query"));
    }

    #[test]
    fn test_drift_row_for_settings() {
        let row = drift_row(&KindCheck {
            kind: ComponentKind::ShellSettings,
            drift: Drift::Settings { present: true },
        });
        assert_eq!(row.to_apply, "all");
        assert_eq!(row.component, "Shell Settings");
    }

    #[test]
    fn test_join_kinds() {
        assert_eq!(
            join_kinds(&[ComponentKind::Fonts, ComponentKind::Dotfiles]),
            "fonts, dotfiles"
        );
    }
}
