//! Home-directory configuration files

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rego_core::{
    ApplyRequest, CapturedItem, Component, ComponentKind, ComponentResult, Error, RestoreResult,
    Result, Wanted,
};
use tracing::{debug, info, warn};

use crate::files::{copy_file, existing_under, relative_files, resolve_under};
use crate::payload::require_snapshot;
use crate::AdapterContext;

/// Copies the configured home-relative files, keeping their relative layout
/// under `dotfiles/` in the snapshot.
pub struct DotfilesComponent {
    ctx: AdapterContext,
}

impl DotfilesComponent {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    fn home(&self) -> &Path {
        &self.ctx.home
    }

    /// Configured entries that exist, expanded to individual files
    fn present_files(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in &self.ctx.settings.dotfiles {
            let Some(path) = resolve_under(self.home(), entry) else {
                warn!("Ignoring dotfile entry outside home: {}", entry);
                continue;
            };
            if path.is_file() {
                files.push(entry.trim_end_matches('/').to_string());
            } else if path.is_dir() {
                let base = entry.trim_end_matches('/');
                for nested in relative_files(&path)? {
                    files.push(format!("{}/{}", base, nested));
                }
            } else {
                debug!("Dotfile {} not present, skipping", entry);
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn payload_dir(&self, root: &Path) -> PathBuf {
        ComponentKind::Dotfiles.payload_dir(root)
    }
}

#[async_trait]
impl Component for DotfilesComponent {
    fn name(&self) -> &str {
        "Dotfiles"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Dotfiles
    }

    fn is_available(&self) -> bool {
        self.home().is_dir()
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        let files = self
            .present_files()
            .map_err(|e| Error::capture(ComponentKind::Dotfiles, e.to_string()))?;
        let dest = self.payload_dir(target_dir);

        let mut items = Vec::with_capacity(files.len());
        for relative in files {
            let bytes = copy_file(&self.home().join(&relative), &dest.join(&relative))?;
            items.push(
                CapturedItem::new(ComponentKind::Dotfiles, relative)
                    .with_metadata("size", bytes.to_string()),
            );
        }
        info!("Captured {} dotfiles", items.len());

        Ok(ComponentResult::captured(ComponentKind::Dotfiles, items).with_payload(dest))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        Ok(relative_files(&self.payload_dir(snapshot_dir))?
            .into_iter()
            .map(|f| format!("~/{}", f))
            .collect())
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        Ok(Wanted::Items(relative_files(&self.payload_dir(snapshot_dir))?))
    }

    async fn probe_installed(&self, wanted: &[String]) -> Result<Vec<String>> {
        Ok(existing_under(self.home(), wanted))
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        let missing = request.check.to_apply();
        if request.dry_run {
            return Ok(RestoreResult::dry_run(ComponentKind::Dotfiles, missing.len()));
        }
        let source_dir = self.payload_dir(require_snapshot(
            &ComponentKind::Dotfiles,
            request.snapshot_dir,
        )?);

        let mut succeeded = 0;
        let mut errors = Vec::new();
        for relative in missing {
            let (Some(source), Some(target)) = (
                resolve_under(&source_dir, relative),
                resolve_under(self.home(), relative),
            ) else {
                errors.push(format!("Refusing unsafe dotfile path {}", relative));
                continue;
            };
            match copy_file(&source, &target) {
                Ok(_) => succeeded += 1,
                Err(e) => errors.push(format!("Failed to restore ~/{}: {}", relative, e)),
            }
        }

        Ok(RestoreResult::new(
            ComponentKind::Dotfiles,
            missing.len(),
            succeeded,
            errors,
        ))
    }
}
