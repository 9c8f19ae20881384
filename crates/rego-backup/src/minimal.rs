//! Minimal ("light") snapshots: identifiers only, a single JSON file

use std::fs;
use std::io::Write;
use std::path::Path;

use rego_core::{ComponentKind, Error, MinimalSnapshot, Result};
use tracing::{info, warn};

use crate::backup::HostIdentity;
use crate::cancel::CancelToken;
use crate::registry::ComponentRegistry;

/// Outcome of a minimal capture
#[derive(Debug, Clone)]
pub struct MinimalReport {
    pub snapshot: MinimalSnapshot,
    /// Kinds whose capture failed, with the reason
    pub failures: Vec<(ComponentKind, String)>,
    /// Kinds without a minimal form
    pub unsupported: Vec<ComponentKind>,
}

impl MinimalReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Captures identifier lists from every selected, available component
pub struct MinimalCapture<'a> {
    registry: &'a ComponentRegistry,
    identity: HostIdentity,
    cancel: CancelToken,
}

impl<'a> MinimalCapture<'a> {
    pub fn new(registry: &'a ComponentRegistry, identity: HostIdentity) -> Self {
        Self {
            registry,
            identity,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn run(&self, selected: Option<&[ComponentKind]>) -> Result<MinimalReport> {
        let mut snapshot = MinimalSnapshot::new(&self.identity.hostname, &self.identity.user);
        snapshot.distro = self.identity.distro.clone();
        snapshot.desktop = self.identity.desktop.clone();

        let mut failures = Vec::new();
        let mut unsupported = Vec::new();
        let available = self.registry.available_kinds();

        for kind in self.registry.select(selected) {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if !available.contains(&kind) {
                info!("Skipping {}: not available on this host", kind);
                continue;
            }
            let Some(adapter) = self.registry.get(&kind) else {
                continue;
            };

            match adapter.capture_minimal().await {
                Ok(Some(wanted)) => {
                    info!("Captured {} {} entries", wanted.items().len(), kind);
                    snapshot.insert(kind, wanted);
                }
                Ok(None) => unsupported.push(kind),
                Err(e) => {
                    warn!("{} capture failed: {}", adapter.name(), e);
                    failures.push((kind, e.to_string()));
                }
            }
        }

        Ok(MinimalReport {
            snapshot,
            failures,
            unsupported,
        })
    }
}

/// Write `snapshot` to `path` atomically
pub fn save(snapshot: &MinimalSnapshot, path: &Path) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(snapshot.to_json()?.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Read and validate a minimal snapshot
pub fn load(path: &Path) -> Result<MinimalSnapshot> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::manifest_invalid(path, format!("cannot read snapshot: {}", e)))?;
    MinimalSnapshot::from_json(&content, path)
}

/// Whether `path` holds a minimal snapshot rather than a full manifest
pub fn is_minimal_snapshot(path: &Path) -> bool {
    let Ok(content) = fs::read_to_string(path) else {
        return false;
    };
    serde_json::from_str::<serde_json::Value>(&content)
        .map(|v| v.get("items").is_some() || v.get("settings").is_some())
        .unwrap_or(false)
        && !content.contains("\"backup_path\"")
}
