//! CLI command implementations

pub mod backup;
pub mod check;
pub mod components;
pub mod config;
pub mod export;
pub mod import;
pub mod light;
pub mod list;
pub mod restore;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rego_backup::{minimal, Archiver, CancelToken, ComponentRegistry, HostIdentity, SnapshotStore};
use rego_components::{default_registry, AdapterContext};
use rego_core::{
    ComponentKind, HostCapabilities, MinimalSnapshot, RegoPaths, Settings, SnapshotManifest,
    SystemRunner,
};
use tempfile::TempDir;

/// Everything a command needs: resolved paths, settings, host and adapters
pub struct Session {
    pub paths: RegoPaths,
    pub settings: Settings,
    pub host: HostCapabilities,
    pub registry: ComponentRegistry,
    pub store: SnapshotStore,
}

impl Session {
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let paths = RegoPaths::resolve()?;
        let config_file = config
            .map(Path::to_path_buf)
            .unwrap_or_else(|| paths.config_file());
        let settings = Settings::load(&config_file)
            .with_context(|| format!("Failed to load settings from {}", config_file.display()))?;
        let paths = paths.with_backup_dir(settings.backup_dir.as_deref());

        let host = HostCapabilities::detect();
        tracing::debug!(
            "Detected package manager {:?}, desktop {:?}",
            host.package_manager,
            host.desktop
        );

        let ctx = AdapterContext::new(
            host.clone(),
            settings.clone(),
            Arc::new(SystemRunner),
            paths.home.clone(),
        );
        let registry = default_registry(&ctx);
        let store = SnapshotStore::new(paths.backups_dir.clone());

        Ok(Self {
            paths,
            settings,
            host,
            registry,
            store,
        })
    }

    /// Kinds named on the command line, else the configured default.
    /// `None` means every registered kind.
    pub fn selection(&self, names: &[String]) -> Option<Vec<ComponentKind>> {
        if names.is_empty() {
            return self.settings.components.clone();
        }
        Some(
            names
                .iter()
                .filter(|n| !n.trim().is_empty())
                .map(|n| ComponentKind::from(n.trim().to_string()))
                .collect(),
        )
    }

    pub fn identity(&self) -> HostIdentity {
        HostIdentity::current(&self.host)
    }
}

/// Token tripped by the first Ctrl-C
pub fn cancel_on_ctrl_c() -> CancelToken {
    let token = CancelToken::new();
    let handle = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current component");
            handle.cancel();
        }
    });
    token
}

/// A restore source opened from a user-supplied path
pub enum OpenedSource {
    Snapshot {
        path: PathBuf,
        manifest: Box<SnapshotManifest>,
        /// Keeps an unpacked archive alive until the restore finishes
        _extracted: Option<TempDir>,
    },
    Minimal(MinimalSnapshot),
}

/// Open a snapshot directory, manifest file, `.tar.gz` archive or minimal
/// snapshot file
pub fn open_source(store: &SnapshotStore, path: &Path) -> Result<OpenedSource> {
    if !path.exists() {
        anyhow::bail!("{} does not exist", path.display());
    }

    if path.is_file() && is_archive(path) {
        let extracted = TempDir::new().context("Failed to create extraction directory")?;
        let stats = Archiver::new()
            .with_progress(true)
            .unpack(path, extracted.path())
            .with_context(|| format!("Failed to unpack {}", path.display()))?;
        tracing::info!("Unpacked {} files from {}", stats.files, path.display());

        let manifest = store.load(extracted.path())?;
        return Ok(OpenedSource::Snapshot {
            path: extracted.path().to_path_buf(),
            manifest: Box::new(manifest),
            _extracted: Some(extracted),
        });
    }

    if path.is_file() && minimal::is_minimal_snapshot(path) {
        return Ok(OpenedSource::Minimal(minimal::load(path)?));
    }

    let manifest = store.load(path)?;
    Ok(OpenedSource::Snapshot {
        path: path.to_path_buf(),
        manifest: Box::new(manifest),
        _extracted: None,
    })
}

fn is_archive(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".tar.gz") || name.ends_with(".tgz")
}
