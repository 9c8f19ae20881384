//! The dconf settings database, captured and loaded as one blob

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use rego_core::{
    ApplyRequest, CapturedItem, CommandSpec, Component, ComponentKind, ComponentResult, Error,
    RestoreResult, Result, Wanted,
};
use tracing::info;

use crate::AdapterContext;

const PAYLOAD_EXTENSION: &str = "dconf";

pub struct ShellSettingsComponent {
    ctx: AdapterContext,
}

impl ShellSettingsComponent {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    async fn dump(&self) -> Result<String> {
        let spec = CommandSpec::new("dconf", self.ctx.settings.timeouts.query()).args(["dump", "/"]);
        let output = self.ctx.runner.run(&spec).await?.into_success(&spec)?;
        Ok(output.stdout)
    }

    fn load(&self, snapshot_dir: &Path) -> Result<String> {
        let path = ComponentKind::ShellSettings.payload_file(snapshot_dir, PAYLOAD_EXTENSION);
        fs::read_to_string(&path).map_err(|e| {
            Error::apply(
                ComponentKind::ShellSettings,
                format!("settings backup not found at {}: {}", path.display(), e),
            )
        })
    }
}

/// Top-level `[path]` sections of a dconf dump
fn sections(blob: &str) -> Vec<String> {
    blob.lines()
        .filter_map(|line| line.trim().strip_prefix('[')?.strip_suffix(']'))
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl Component for ShellSettingsComponent {
    fn name(&self) -> &str {
        "Shell Settings"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::ShellSettings
    }

    fn is_available(&self) -> bool {
        self.ctx.host.has_tool("dconf")
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        let blob = self
            .dump()
            .await
            .map_err(|e| Error::capture(ComponentKind::ShellSettings, e.to_string()))?;

        let path = ComponentKind::ShellSettings.payload_file(target_dir, PAYLOAD_EXTENSION);
        fs::write(&path, &blob)?;

        let item = CapturedItem::new(ComponentKind::ShellSettings, "dconf database")
            .with_metadata("sections", sections(&blob).len().to_string())
            .with_metadata("bytes", blob.len().to_string());
        Ok(ComponentResult::captured(ComponentKind::ShellSettings, vec![item]).with_payload(path))
    }

    async fn capture_minimal(&self) -> Result<Option<Wanted>> {
        Ok(Some(Wanted::Settings(self.dump().await?)))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        let blob = self.load(snapshot_dir)?;
        Ok(vec![format!(
            "Full dconf database restore ({} sections)",
            sections(&blob).len()
        )])
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        Ok(Wanted::Settings(self.load(snapshot_dir)?))
    }

    async fn probe_installed(&self, _wanted: &[String]) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        let actions = request.check.action_count();
        if request.dry_run {
            return Ok(RestoreResult::dry_run(ComponentKind::ShellSettings, actions));
        }
        let Wanted::Settings(blob) = request.wanted else {
            return Err(Error::apply(
                ComponentKind::ShellSettings,
                "expected a settings blob",
            ));
        };

        info!("Loading dconf database ({} bytes)", blob.len());
        let spec = CommandSpec::new("dconf", self.ctx.settings.timeouts.query())
            .args(["load", "/"])
            .stdin(blob.as_str());
        let result = match self.ctx.runner.run(&spec).await {
            Ok(output) if output.success() => {
                RestoreResult::new(ComponentKind::ShellSettings, 1, 1, Vec::new())
            }
            Ok(output) => RestoreResult::failed(
                ComponentKind::ShellSettings,
                1,
                format!("dconf load failed: {}", output.stderr.trim()),
            ),
            Err(e) => RestoreResult::failed(ComponentKind::ShellSettings, 1, e.to_string()),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, ScriptedRunner};
    use rego_core::{Drift, HostCapabilities, KindCheck, PackageManager};
    use tempfile::TempDir;

    const DUMP: &str = "[org/gnome/desktop/interface]\ncolor-scheme='prefer-dark'\n\n[org/gnome/shell]\nfavorite-apps=['firefox.desktop']\n";

    fn host() -> HostCapabilities {
        HostCapabilities::new(PackageManager::Dnf).with_tool("dconf")
    }

    #[tokio::test]
    async fn test_capture_writes_dump() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.ok("dconf dump /", DUMP);
        let component = ShellSettingsComponent::new(context(host(), runner, temp.path()));

        let result = component.capture(temp.path()).await.unwrap();
        assert_eq!(result.item_count, 1);
        assert_eq!(result.items[0].meta("sections"), Some("2"));
        assert_eq!(
            fs::read_to_string(temp.path().join("shell-settings.dconf")).unwrap(),
            DUMP
        );
        assert_eq!(
            component.wanted(temp.path()).await.unwrap(),
            Wanted::Settings(DUMP.to_string())
        );
    }

    #[tokio::test]
    async fn test_apply_pipes_blob_to_dconf_load() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.ok("dconf load /", "");
        let component = ShellSettingsComponent::new(context(host(), runner.clone(), temp.path()));

        let wanted = Wanted::Settings(DUMP.to_string());
        let check = KindCheck {
            kind: ComponentKind::ShellSettings,
            drift: Drift::Settings { present: true },
        };
        let result = component
            .apply_restore(ApplyRequest {
                snapshot_dir: None,
                wanted: &wanted,
                check: &check,
                dry_run: false,
            })
            .await
            .unwrap();

        assert!(result.succeeded);
        assert_eq!(result.items_total, 1);
        assert_eq!(runner.specs()[0].stdin.as_deref(), Some(DUMP));
    }

    #[tokio::test]
    async fn test_failed_load_is_reported() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.fail("dconf load /", 1, "error: invalid key");
        let component = ShellSettingsComponent::new(context(host(), runner, temp.path()));

        let wanted = Wanted::Settings(DUMP.to_string());
        let check = KindCheck {
            kind: ComponentKind::ShellSettings,
            drift: Drift::Settings { present: true },
        };
        let result = component
            .apply_restore(ApplyRequest {
                snapshot_dir: None,
                wanted: &wanted,
                check: &check,
                dry_run: false,
            })
            .await
            .unwrap();

        assert!(!result.succeeded);
        assert!(result.errors[0].contains("invalid key"));
    }
}
