//! Component adapter capability trait

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ComponentKind, ComponentResult, KindCheck, RestoreResult, Wanted};

/// Everything an adapter needs to apply one kind's restore
#[derive(Debug, Clone, Copy)]
pub struct ApplyRequest<'a> {
    /// Full snapshot directory, absent when restoring a minimal snapshot
    pub snapshot_dir: Option<&'a Path>,
    pub wanted: &'a Wanted,
    /// Drift against the live system; only `check.to_apply()` may be touched
    pub check: &'a KindCheck,
    pub dry_run: bool,
}

/// Captures and restores one category of system state.
///
/// Implementations must be cheap to query for availability and must never
/// mutate the host from `capture`, `preview_restore`, `wanted` or
/// `probe_installed`.
#[async_trait]
pub trait Component: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    fn kind(&self) -> ComponentKind;

    /// Whether the required tools or paths exist on this host
    fn is_available(&self) -> bool;

    /// Capture into `target_dir`, writing only the payload paths owned by this kind
    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult>;

    /// Identifiers (or settings blob) for a minimal snapshot.
    ///
    /// `None` means this kind has no minimal form.
    async fn capture_minimal(&self) -> Result<Option<Wanted>> {
        Ok(None)
    }

    /// Human-readable description of what a restore from `snapshot_dir` contains
    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>>;

    /// Desired state recorded in `snapshot_dir`
    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted>;

    /// Identifiers currently present on the host.
    ///
    /// `wanted` lets file-based kinds limit the probe to what matters.
    async fn probe_installed(&self, wanted: &[String]) -> Result<Vec<String>>;

    /// Apply the missing subset described by `request`
    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult>;
}
