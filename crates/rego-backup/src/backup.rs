//! Backup orchestrator.
//!
//! Runs the selected, available components one at a time against a target
//! directory and writes a single manifest once every component has finished.
//! A failing component is recorded in its result and the run continues.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rego_core::{
    utils, ComponentKind, ComponentResult, Error, HostCapabilities, Result, SnapshotManifest,
};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::progress::{BackupStep, StepPhase};
use crate::registry::ComponentRegistry;
use crate::store::{SnapshotStore, StoreLock};

/// Header fields stamped on every manifest
#[derive(Debug, Clone)]
pub struct HostIdentity {
    pub hostname: String,
    pub user: String,
    pub distro: Option<String>,
    pub desktop: Option<String>,
}

impl HostIdentity {
    /// Identity of the running machine and user
    pub fn current(host: &HostCapabilities) -> Self {
        Self {
            hostname: utils::hostname(),
            user: utils::username(),
            distro: host.distro.clone(),
            desktop: host.desktop.map(|d| d.to_string()),
        }
    }
}

/// Runs component captures into one snapshot directory
pub struct BackupOrchestrator<'a> {
    registry: &'a ComponentRegistry,
    store: &'a SnapshotStore,
    identity: HostIdentity,
    cancel: CancelToken,
}

impl<'a> BackupOrchestrator<'a> {
    pub fn new(
        registry: &'a ComponentRegistry,
        store: &'a SnapshotStore,
        identity: HostIdentity,
    ) -> Self {
        Self {
            registry,
            store,
            identity,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Kinds a run with `selected` would process, in order
    pub fn plan(&self, selected: Option<&[ComponentKind]>) -> Vec<ComponentKind> {
        let available = self.registry.available_kinds();
        self.registry
            .select(selected)
            .into_iter()
            .filter(|kind| {
                let usable = available.contains(kind);
                if !usable {
                    info!("Skipping {}: not available on this host", kind);
                }
                usable
            })
            .collect()
    }

    pub async fn run(
        &self,
        selected: Option<&[ComponentKind]>,
        target_dir: &Path,
        description: Option<String>,
    ) -> Result<SnapshotManifest> {
        self.run_with_progress(selected, target_dir, description, &mut |_| {})
            .await
    }

    /// Capture every selected, available kind into `target_dir`.
    ///
    /// `on_progress` is called before and after each component. Cancellation
    /// is checked between components; a cancelled run writes no manifest.
    pub async fn run_with_progress(
        &self,
        selected: Option<&[ComponentKind]>,
        target_dir: &Path,
        description: Option<String>,
        on_progress: &mut (dyn FnMut(&BackupStep<'_>) + Send),
    ) -> Result<SnapshotManifest> {
        let kinds = self.plan(selected);

        fs::create_dir_all(target_dir).map_err(|source| Error::TargetDirectory {
            path: target_dir.to_path_buf(),
            source,
        })?;
        let _lock = StoreLock::acquire(target_dir)?;

        let mut manifest =
            SnapshotManifest::new(target_dir, &self.identity.hostname, &self.identity.user)
                .with_description(description);
        manifest.distro = self.identity.distro.clone();
        manifest.desktop = self.identity.desktop.clone();

        info!(
            "Backing up {} components into {}",
            kinds.len(),
            target_dir.display()
        );

        let total = kinds.len();
        let mut results: Vec<ComponentResult> = Vec::with_capacity(total);
        let mut claimed: HashSet<PathBuf> = HashSet::new();

        for (index, kind) in kinds.iter().enumerate() {
            if self.cancel.is_cancelled() {
                warn!("Backup cancelled after {} of {} components", index, total);
                return Err(Error::Cancelled);
            }

            let Some(adapter) = self.registry.get(kind) else {
                continue;
            };
            let name = adapter.name().to_string();

            on_progress(&BackupStep {
                phase: StepPhase::Started,
                kind,
                name: &name,
                current: index + 1,
                total,
                results: &results,
            });
            info!("Stage {}/{}: {}", index + 1, total, name);

            let started = Instant::now();
            let mut result = match adapter.capture(target_dir).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("{} capture failed: {}", name, e);
                    ComponentResult::failed(kind.clone(), e.to_string())
                }
            };
            result.duration_ms = started.elapsed().as_millis() as u64;
            normalize_result(kind, &mut result, target_dir, &mut claimed);

            debug!(
                "{} finished in {}ms with {} items",
                name, result.duration_ms, result.item_count
            );
            results.push(result);

            on_progress(&BackupStep {
                phase: StepPhase::Finished,
                kind,
                name: &name,
                current: index + 1,
                total,
                results: &results,
            });
        }

        for result in results {
            manifest.record(result);
        }
        self.store.save(&manifest)?;

        let failed = manifest.failed_kinds().len();
        info!(
            "Backup complete: {} components, {} items, {} failed",
            manifest.components.len(),
            manifest.total_items(),
            failed
        );
        Ok(manifest)
    }
}

/// Enforce per-result invariants the adapters are trusted least with
fn normalize_result(
    kind: &ComponentKind,
    result: &mut ComponentResult,
    target_dir: &Path,
    claimed: &mut HashSet<PathBuf>,
) {
    if result.kind != *kind {
        warn!(
            "Adapter for {} reported kind {}; correcting",
            kind, result.kind
        );
        result.kind = kind.clone();
    }
    for item in &mut result.items {
        item.kind = kind.clone();
    }

    let duplicates = result.dedupe_items();
    if duplicates > 0 {
        warn!("{} reported {} duplicate items; keeping the first", kind, duplicates);
    }

    if let Some(payload) = result.payload_path.clone() {
        let relative = payload
            .strip_prefix(target_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| payload.clone());

        let conflict = if relative.is_absolute() {
            Some("payload was written outside the snapshot directory".to_string())
        } else if !claimed.insert(relative.clone()) {
            Some(format!(
                "payload {} is already owned by another component",
                relative.display()
            ))
        } else {
            None
        };

        if let Some(message) = conflict {
            warn!("{}: {}", kind, message);
            result.succeeded = false;
            result.error_message = Some(message);
        }
        result.payload_path = Some(relative);
    }
}
