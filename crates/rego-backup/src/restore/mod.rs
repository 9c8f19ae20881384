//! Restore orchestrator.
//!
//! Restores are uniformly diff-based: for every kind the wanted state is
//! loaded from the snapshot, diffed against a live probe, and only the
//! missing subset is handed to the adapter. Running a restore twice is
//! therefore a no-op the second time for every kind that fully succeeded.
//!
//! # Flow
//!
//! 1. Load and validate the manifest (fails fast on an unknown schema)
//! 2. Resolve kinds: snapshot ∩ selection, in registry order
//! 3. Per kind: load wanted state, probe, compute drift
//! 4. Dry run: synthesize a result; live: apply the missing subset

mod report;

pub use report::{RestoreReport, RestoreSource};

use std::path::Path;

use rego_core::{
    ApplyRequest, Component, ComponentKind, Drift, KindCheck, MinimalSnapshot, RestoreCheck,
    RestoreResult, Result, Wanted,
};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::drift::check_component;
use crate::progress::{RestoreStep, StepPhase};
use crate::registry::ComponentRegistry;
use crate::store::{SnapshotStore, StoreLock};

/// Applies snapshots back onto the live system
pub struct RestoreOrchestrator<'a> {
    registry: &'a ComponentRegistry,
    store: &'a SnapshotStore,
    cancel: CancelToken,
}

/// Kinds a restore will process and those it cannot
struct KindPlan {
    process: Vec<ComponentKind>,
    unavailable: Vec<ComponentKind>,
}

impl<'a> RestoreOrchestrator<'a> {
    pub fn new(registry: &'a ComponentRegistry, store: &'a SnapshotStore) -> Self {
        Self {
            registry,
            store,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(
        &self,
        manifest_path: &Path,
        selected: Option<&[ComponentKind]>,
        dry_run: bool,
    ) -> Result<RestoreReport> {
        self.run_with_progress(manifest_path, selected, dry_run, &mut |_| {})
            .await
    }

    /// Restore the full snapshot at `manifest_path` (directory or manifest file)
    pub async fn run_with_progress(
        &self,
        manifest_path: &Path,
        selected: Option<&[ComponentKind]>,
        dry_run: bool,
        on_progress: &mut (dyn FnMut(&RestoreStep<'_>) + Send),
    ) -> Result<RestoreReport> {
        let manifest = self.store.load(manifest_path)?;
        let _lock = StoreLock::acquire(&manifest.backup_path)?;
        info!(
            "Restoring snapshot from {} taken on {} ({})",
            manifest.backup_path.display(),
            manifest.hostname,
            manifest.created_at.format("%Y-%m-%d %H:%M")
        );
        self.restore(RestoreSource::Snapshot(&manifest), selected, dry_run, on_progress)
            .await
    }

    /// Restore a minimal snapshot through the same drift pipeline
    pub async fn run_minimal(
        &self,
        snapshot: &MinimalSnapshot,
        selected: Option<&[ComponentKind]>,
        dry_run: bool,
        on_progress: &mut (dyn FnMut(&RestoreStep<'_>) + Send),
    ) -> Result<RestoreReport> {
        info!(
            "Restoring minimal snapshot taken on {} ({})",
            snapshot.hostname,
            snapshot.created_at.format("%Y-%m-%d %H:%M")
        );
        self.restore(RestoreSource::Minimal(snapshot), selected, dry_run, on_progress)
            .await
    }

    /// Drift of every processable kind without applying anything
    pub async fn check(
        &self,
        source: RestoreSource<'_>,
        selected: Option<&[ComponentKind]>,
    ) -> Result<RestoreReport> {
        let plan = self.plan(source, selected)?;
        let mut report = RestoreReport {
            unavailable: plan.unavailable,
            dry_run: true,
            ..Default::default()
        };

        for kind in &plan.process {
            let Some(adapter) = self.registry.get(kind) else {
                continue;
            };
            match load_wanted(adapter.as_ref(), source).await {
                Ok(wanted) => report.check.push(check_component(adapter.as_ref(), &wanted).await),
                Err(message) => {
                    warn!("Cannot check {}: {}", kind, message);
                    report.results.push(RestoreResult::failed(kind.clone(), 0, message));
                }
            }
        }
        Ok(report)
    }

    fn plan(
        &self,
        source: RestoreSource<'_>,
        selected: Option<&[ComponentKind]>,
    ) -> Result<KindPlan> {
        let in_snapshot = source.kinds();
        if let Some(selected) = selected {
            for kind in selected.iter().filter(|k| !in_snapshot.contains(k)) {
                warn!("{} was requested but is not in this snapshot", kind);
            }
        }

        let mut process = Vec::new();
        let mut unavailable = Vec::new();
        let wanted_here = |kind: &ComponentKind| {
            in_snapshot.contains(kind) && selected.is_none_or(|s| s.contains(kind))
        };

        for (kind, adapter) in self.registry.iter() {
            if !wanted_here(kind) {
                continue;
            }
            if adapter.is_available() {
                process.push(kind.clone());
            } else {
                info!("Skipping {}: not available on this host", kind);
                unavailable.push(kind.clone());
            }
        }
        for kind in in_snapshot {
            if wanted_here(kind) && self.registry.get(kind).is_none() {
                info!("Skipping {}: no adapter registered", kind);
                unavailable.push(kind.clone());
            }
        }

        Ok(KindPlan {
            process,
            unavailable,
        })
    }

    async fn restore(
        &self,
        source: RestoreSource<'_>,
        selected: Option<&[ComponentKind]>,
        dry_run: bool,
        on_progress: &mut (dyn FnMut(&RestoreStep<'_>) + Send),
    ) -> Result<RestoreReport> {
        let plan = self.plan(source, selected)?;
        let total = plan.process.len();
        let mut report = RestoreReport {
            unavailable: plan.unavailable,
            dry_run,
            ..Default::default()
        };

        if dry_run {
            info!("Dry run: no changes will be made");
        }

        for (index, kind) in plan.process.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!(
                    "Restore cancelled after {} of {} components",
                    index, total
                );
                report.cancelled = true;
                break;
            }

            let Some(adapter) = self.registry.get(kind) else {
                continue;
            };
            let name = adapter.name().to_string();

            on_progress(&RestoreStep {
                phase: StepPhase::Started,
                kind,
                name: &name,
                current: index + 1,
                total,
                results: &report.results,
            });
            info!("Stage {}/{}: {}", index + 1, total, name);

            let result = match load_wanted(adapter.as_ref(), source).await {
                Ok(wanted) => {
                    let check = check_component(adapter.as_ref(), &wanted).await;
                    let result =
                        restore_kind(adapter.as_ref(), source, &wanted, &check, dry_run).await;
                    report.check.push(check);
                    result
                }
                Err(message) => {
                    warn!("Cannot restore {}: {}", name, message);
                    RestoreResult::failed(kind.clone(), 0, message)
                }
            };
            report.results.push(result);

            on_progress(&RestoreStep {
                phase: StepPhase::Finished,
                kind,
                name: &name,
                current: index + 1,
                total,
                results: &report.results,
            });
        }

        info!(
            "Restore {}: {} applied, {} already present, {} failed components",
            if dry_run { "preview complete" } else { "complete" },
            report.items_applied(),
            report.items_skipped(),
            report.failed().len()
        );
        Ok(report)
    }
}

/// Wanted state for one kind, or a message explaining why there is none
async fn load_wanted(
    adapter: &dyn Component,
    source: RestoreSource<'_>,
) -> std::result::Result<Wanted, String> {
    let kind = adapter.kind();
    match source {
        RestoreSource::Snapshot(manifest) => {
            if let Some(captured) = manifest.result(&kind) {
                if !captured.succeeded {
                    return Err(format!(
                        "not captured in this snapshot: {}",
                        captured.error_message.as_deref().unwrap_or("capture failed")
                    ));
                }
            }
            adapter
                .wanted(&manifest.backup_path)
                .await
                .map_err(|e| e.to_string())
        }
        RestoreSource::Minimal(snapshot) => snapshot
            .wanted(&kind)
            .ok_or_else(|| "no entries recorded in this snapshot".to_string()),
    }
}

/// Dry run or apply one kind given its drift
async fn restore_kind(
    adapter: &dyn Component,
    source: RestoreSource<'_>,
    wanted: &Wanted,
    check: &KindCheck,
    dry_run: bool,
) -> RestoreResult {
    let kind = adapter.kind();
    let actions = check.action_count();
    debug!(
        "{}: {} to apply, {} already present",
        kind,
        actions,
        check.skipped_count()
    );

    let mut result = if dry_run {
        RestoreResult::dry_run(kind.clone(), actions)
    } else if check.is_satisfied() {
        RestoreResult::new(kind.clone(), 0, 0, Vec::new())
    } else {
        let request = ApplyRequest {
            snapshot_dir: source.snapshot_dir(),
            wanted,
            check,
            dry_run: false,
        };
        match adapter.apply_restore(request).await {
            Ok(mut result) => {
                if !result.is_consistent() {
                    warn!(
                        "{} reported inconsistent counts ({} + {} != {}); correcting",
                        kind, result.items_succeeded, result.items_failed, result.items_total
                    );
                    result.normalize();
                }
                result.kind = kind.clone();
                result.dry_run = false;
                result
            }
            Err(e) => {
                warn!("{} restore failed: {}", kind, e);
                RestoreResult::failed(kind.clone(), actions, e.to_string())
            }
        }
    };

    result.items_skipped = check.skipped_count();
    result.probe_unavailable = matches!(
        check.drift,
        Drift::Items {
            probe_unavailable: true,
            ..
        }
    );
    result
}

/// Preview lines for every processable kind of a full snapshot
pub async fn preview(
    registry: &ComponentRegistry,
    manifest: &rego_core::SnapshotManifest,
) -> Vec<(ComponentKind, Result<Vec<String>>)> {
    let mut previews = Vec::new();
    for kind in &manifest.components {
        if let Some(adapter) = registry.get(kind).filter(|a| a.is_available()) {
            previews.push((
                kind.clone(),
                adapter.preview_restore(&manifest.backup_path).await,
            ));
        }
    }
    previews
}

/// Totals of a [`RestoreCheck`] for display
pub fn summarize_check(check: &RestoreCheck) -> String {
    let mut summary = format!(
        "{} to apply, {} already present",
        check.total_to_apply(),
        check.total_skipped()
    );
    if check.has_settings() {
        summary.push_str(", settings will be loaded");
    }
    summary
}
