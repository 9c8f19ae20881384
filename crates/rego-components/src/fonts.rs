//! Fonts installed in the user's font directory

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rego_core::{
    ApplyRequest, CapturedItem, CommandSpec, Component, ComponentKind, ComponentResult, Error,
    RestoreResult, Result, Wanted,
};
use tracing::{debug, info, warn};

use crate::files::{copy_file, existing_under, relative_files, resolve_under};
use crate::payload::require_snapshot;
use crate::AdapterContext;

pub struct FontsComponent {
    ctx: AdapterContext,
    fonts_dir: PathBuf,
}

impl FontsComponent {
    pub fn new(ctx: AdapterContext) -> Self {
        let fonts_dir = ctx.home.join(".local/share/fonts");
        Self { ctx, fonts_dir }
    }

    fn payload_dir(&self, root: &Path) -> PathBuf {
        ComponentKind::Fonts.payload_dir(root)
    }

    async fn refresh_cache(&self) {
        if !self.ctx.host.has_tool("fc-cache") {
            debug!("fc-cache not available, skipping font cache refresh");
            return;
        }
        let spec = CommandSpec::new("fc-cache", self.ctx.settings.timeouts.query()).arg("-f");
        match self.ctx.runner.run(&spec).await {
            Ok(output) if output.success() => debug!("Font cache refreshed"),
            Ok(output) => warn!("fc-cache failed: {}", output.stderr.trim()),
            Err(e) => warn!("fc-cache failed: {}", e),
        }
    }
}

#[async_trait]
impl Component for FontsComponent {
    fn name(&self) -> &str {
        "User Fonts"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Fonts
    }

    fn is_available(&self) -> bool {
        self.fonts_dir.is_dir()
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        let files = relative_files(&self.fonts_dir)
            .map_err(|e| Error::capture(ComponentKind::Fonts, e.to_string()))?;
        let dest = self.payload_dir(target_dir);

        let mut items = Vec::with_capacity(files.len());
        let mut total = 0u64;
        for relative in files {
            let bytes = copy_file(&self.fonts_dir.join(&relative), &dest.join(&relative))?;
            total += bytes;
            items.push(
                CapturedItem::new(ComponentKind::Fonts, relative)
                    .with_metadata("size", bytes.to_string()),
            );
        }
        info!(
            "Captured {} fonts ({})",
            items.len(),
            rego_core::utils::format_bytes(total)
        );

        Ok(ComponentResult::captured(ComponentKind::Fonts, items).with_payload(dest))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        Ok(relative_files(&self.payload_dir(snapshot_dir))?
            .into_iter()
            .map(|f| format!("Font: {}", f))
            .collect())
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        Ok(Wanted::Items(relative_files(&self.payload_dir(snapshot_dir))?))
    }

    async fn probe_installed(&self, wanted: &[String]) -> Result<Vec<String>> {
        Ok(existing_under(&self.fonts_dir, wanted))
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        let missing = request.check.to_apply();
        if request.dry_run {
            return Ok(RestoreResult::dry_run(ComponentKind::Fonts, missing.len()));
        }
        let source_dir =
            self.payload_dir(require_snapshot(&ComponentKind::Fonts, request.snapshot_dir)?);

        let mut succeeded = 0;
        let mut errors = Vec::new();
        for relative in missing {
            let (Some(source), Some(target)) = (
                resolve_under(&source_dir, relative),
                resolve_under(&self.fonts_dir, relative),
            ) else {
                errors.push(format!("Refusing unsafe font path {}", relative));
                continue;
            };
            match copy_file(&source, &target) {
                Ok(_) => succeeded += 1,
                Err(e) => errors.push(format!("Failed to restore font {}: {}", relative, e)),
            }
        }

        if succeeded > 0 {
            self.refresh_cache().await;
        }

        Ok(RestoreResult::new(
            ComponentKind::Fonts,
            missing.len(),
            succeeded,
            errors,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, item_check, ScriptedRunner};
    use rego_core::{HostCapabilities, PackageManager};
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn component(home: &Path, runner: Arc<ScriptedRunner>) -> FontsComponent {
        let host = HostCapabilities::new(PackageManager::Dnf).with_tool("fc-cache");
        FontsComponent::new(context(host, runner, home))
    }

    #[test]
    fn test_unavailable_without_font_dir() {
        let home = TempDir::new().unwrap();
        assert!(!component(home.path(), ScriptedRunner::new()).is_available());
    }

    #[tokio::test]
    async fn test_capture_and_restore_missing_fonts() {
        let source_home = TempDir::new().unwrap();
        let fonts = source_home.path().join(".local/share/fonts/Inter");
        fs::create_dir_all(&fonts).unwrap();
        fs::write(fonts.join("Inter-Regular.ttf"), vec![0u8; 64]).unwrap();
        fs::write(fonts.join("Inter-Bold.ttf"), vec![1u8; 64]).unwrap();

        let snap = TempDir::new().unwrap();
        let result = component(source_home.path(), ScriptedRunner::new())
            .capture(snap.path())
            .await
            .unwrap();
        assert_eq!(result.item_count, 2);
        assert_eq!(result.items[0].meta("size"), Some("64"));

        let target_home = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.fail("fc-cache", 1, "cache dir not writable");
        let adapter = component(target_home.path(), runner.clone());

        let wanted = adapter.wanted(snap.path()).await.unwrap();
        assert_eq!(
            wanted.items(),
            [
                "Inter/Inter-Bold.ttf".to_string(),
                "Inter/Inter-Regular.ttf".to_string()
            ]
            .as_slice()
        );

        let check = item_check(ComponentKind::Fonts, &["Inter/Inter-Bold.ttf"], 1);
        let restored = adapter
            .apply_restore(ApplyRequest {
                snapshot_dir: Some(snap.path()),
                wanted: &wanted,
                check: &check,
                dry_run: false,
            })
            .await
            .unwrap();

        // cache refresh failure is only logged
        assert!(restored.succeeded);
        assert!(runner.ran("fc-cache -f"));
        assert!(target_home
            .path()
            .join(".local/share/fonts/Inter/Inter-Bold.ttf")
            .is_file());
        assert!(!target_home
            .path()
            .join(".local/share/fonts/Inter/Inter-Regular.ttf")
            .exists());
    }
}
