//! Drift detection between a snapshot's wanted state and the live host
//!
//! The detector is a pure set subtraction over plain identifiers:
//! `to_apply = dedupe(wanted) - installed`, keeping the order of `wanted`.
//! Identifiers are compared exactly (case-sensitive) after trimming.
//! Settings blobs are never diffed; they are either present or not.

use std::collections::HashSet;

use rego_core::{Component, ComponentKind, Drift, KindCheck, Result, Wanted};
use tracing::{debug, warn};

/// Result of diffing one identifier list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDrift {
    pub to_apply: Vec<String>,
    pub skipped_count: usize,
}

/// `wanted - installed`, deduplicated, in wanted order
pub fn filter_missing(wanted: &[String], installed: &[String]) -> ItemDrift {
    let installed: HashSet<&str> = installed
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut to_apply = Vec::new();
    let mut skipped_count = 0;

    for id in wanted.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !seen.insert(id) {
            continue;
        }
        if installed.contains(id) {
            skipped_count += 1;
        } else {
            to_apply.push(id.to_string());
        }
    }

    ItemDrift {
        to_apply,
        skipped_count,
    }
}

/// Drift for one kind given its wanted state and the outcome of the live probe.
///
/// A failed probe falls back to applying everything wanted.
pub fn detect(kind: ComponentKind, wanted: &Wanted, probe: Result<Vec<String>>) -> KindCheck {
    let drift = match wanted {
        Wanted::Settings(blob) => Drift::Settings {
            present: !blob.trim().is_empty(),
        },
        Wanted::Items(items) => match probe {
            Ok(installed) => {
                let ItemDrift {
                    to_apply,
                    skipped_count,
                } = filter_missing(items, &installed);
                Drift::Items {
                    to_apply,
                    skipped_count,
                    probe_unavailable: false,
                }
            }
            Err(e) => {
                warn!(
                    "Could not probe installed {}, restoring everything wanted: {}",
                    kind, e
                );
                let ItemDrift { to_apply, .. } = filter_missing(items, &[]);
                Drift::Items {
                    to_apply,
                    skipped_count: 0,
                    probe_unavailable: true,
                }
            }
        },
    };

    KindCheck { kind, drift }
}

/// Probe `adapter` and diff its live state against `wanted`
pub async fn check_component(adapter: &dyn Component, wanted: &Wanted) -> KindCheck {
    let kind = adapter.kind();
    let probe = match wanted {
        Wanted::Settings(_) => Ok(Vec::new()),
        Wanted::Items(items) => adapter.probe_installed(items).await,
    };
    if let Ok(installed) = &probe {
        debug!("Probed {} installed {} entries", kind, installed.len());
    }
    detect(kind, wanted, probe)
}
