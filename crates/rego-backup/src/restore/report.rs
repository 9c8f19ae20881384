//! Restore sources and the final per-component report

use std::path::Path;

use rego_core::{ComponentKind, MinimalSnapshot, RestoreCheck, RestoreResult, SnapshotManifest};

/// What a restore reads its wanted state from
#[derive(Debug, Clone, Copy)]
pub enum RestoreSource<'a> {
    /// Full snapshot directory with payload files
    Snapshot(&'a SnapshotManifest),
    /// Single-file minimal snapshot
    Minimal(&'a MinimalSnapshot),
}

impl<'a> RestoreSource<'a> {
    /// Kinds recorded in the snapshot, in recorded order
    pub fn kinds(&self) -> &'a [ComponentKind] {
        match *self {
            Self::Snapshot(manifest) => manifest.components.as_slice(),
            Self::Minimal(snapshot) => snapshot.components.as_slice(),
        }
    }

    pub fn snapshot_dir(&self) -> Option<&'a Path> {
        match *self {
            Self::Snapshot(manifest) => Some(manifest.backup_path.as_path()),
            Self::Minimal(_) => None,
        }
    }

    pub fn hostname(&self) -> &'a str {
        match *self {
            Self::Snapshot(manifest) => manifest.hostname.as_str(),
            Self::Minimal(snapshot) => snapshot.hostname.as_str(),
        }
    }
}

/// Outcome of one restore run
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    /// One result per processed kind, in processing order
    pub results: Vec<RestoreResult>,
    /// Kinds in the snapshot whose adapter is missing or unusable here
    pub unavailable: Vec<ComponentKind>,
    /// Drift computed for each processed kind
    pub check: RestoreCheck,
    pub dry_run: bool,
    /// The run stopped early; kinds after the last result were not processed
    pub cancelled: bool,
}

impl RestoreReport {
    pub fn failed(&self) -> Vec<&RestoreResult> {
        self.results.iter().filter(|r| !r.succeeded).collect()
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.results.iter().all(|r| r.succeeded)
    }

    pub fn items_applied(&self) -> usize {
        self.results.iter().map(|r| r.items_succeeded).sum()
    }

    pub fn items_skipped(&self) -> usize {
        self.results.iter().map(|r| r.items_skipped).sum()
    }

    pub fn result(&self, kind: &ComponentKind) -> Option<&RestoreResult> {
        self.results.iter().find(|r| &r.kind == kind)
    }
}
