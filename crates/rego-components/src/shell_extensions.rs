//! GNOME Shell extensions

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use rego_core::{
    ApplyRequest, CapturedItem, CommandSpec, Component, ComponentKind, ComponentResult, Error,
    RestoreResult, Result, Wanted,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::payload::{read_json, write_json};
use crate::AdapterContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionEntry {
    pub uuid: String,
    pub enabled: bool,
}

/// Contents of `shell-extensions.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtensionsPayload {
    #[serde(default)]
    pub extensions: Vec<ExtensionEntry>,
}

impl ExtensionsPayload {
    /// Only enabled extensions are restored
    pub fn enabled(&self) -> Vec<String> {
        self.extensions
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.uuid.clone())
            .collect()
    }
}

pub struct ShellExtensionsComponent {
    ctx: AdapterContext,
}

impl ShellExtensionsComponent {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    async fn list(&self, enabled_only: bool) -> Result<Vec<String>> {
        let mut spec =
            CommandSpec::new("gnome-extensions", self.ctx.settings.timeouts.query()).arg("list");
        if enabled_only {
            spec = spec.arg("--enabled");
        }
        self.ctx.runner.query_lines(&spec).await
    }

    /// Install `uuid`, falling back to asking the running shell to fetch it
    /// from extensions.gnome.org
    async fn install(&self, uuid: &str) -> std::result::Result<(), String> {
        let timeout = self.ctx.settings.timeouts.item_install();
        let spec = CommandSpec::new("gnome-extensions", timeout).args(["install", uuid]);
        match self.ctx.runner.run(&spec).await {
            Ok(output) if output.success() => return Ok(()),
            Ok(output) => debug!("gnome-extensions install {}: {}", uuid, output.stderr.trim()),
            Err(e) => debug!("gnome-extensions install {}: {}", uuid, e),
        }

        let spec = CommandSpec::new("busctl", timeout).args([
            "--user",
            "call",
            "org.gnome.Shell.Extensions",
            "/org/gnome/Shell/Extensions",
            "org.gnome.Shell.Extensions",
            "InstallRemoteExtension",
            "s",
            uuid,
        ]);
        match self.ctx.runner.run(&spec).await {
            Ok(output) if output.success() && !output.stdout.contains("cancelled") => Ok(()),
            Ok(output) if output.success() => {
                Err(format!("Installing {} was declined in the shell", uuid))
            }
            Ok(output) => Err(format!(
                "Failed to install {}: {}",
                uuid,
                output.stderr.trim()
            )),
            Err(e) => Err(format!("Failed to install {}: {}", uuid, e)),
        }
    }

    fn load(&self, snapshot_dir: &Path) -> Result<ExtensionsPayload> {
        read_json(
            &ComponentKind::ShellExtensions,
            &ComponentKind::ShellExtensions.payload_file(snapshot_dir, "json"),
        )
    }
}

#[async_trait]
impl Component for ShellExtensionsComponent {
    fn name(&self) -> &str {
        "Shell Extensions"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::ShellExtensions
    }

    fn is_available(&self) -> bool {
        self.ctx.host.has_tool("gnome-extensions")
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        let all = self
            .list(false)
            .await
            .map_err(|e| Error::capture(ComponentKind::ShellExtensions, e.to_string()))?;
        let enabled: HashSet<String> = self
            .list(true)
            .await
            .map_err(|e| Error::capture(ComponentKind::ShellExtensions, e.to_string()))?
            .into_iter()
            .collect();

        let extensions: Vec<ExtensionEntry> = all
            .into_iter()
            .map(|uuid| ExtensionEntry {
                enabled: enabled.contains(&uuid),
                uuid,
            })
            .collect();

        let items = extensions
            .iter()
            .map(|e| {
                CapturedItem::new(ComponentKind::ShellExtensions, &e.uuid)
                    .with_metadata("enabled", e.enabled.to_string())
            })
            .collect();

        let path = ComponentKind::ShellExtensions.payload_file(target_dir, "json");
        write_json(&path, &ExtensionsPayload { extensions })?;
        Ok(ComponentResult::captured(ComponentKind::ShellExtensions, items).with_payload(path))
    }

    async fn capture_minimal(&self) -> Result<Option<Wanted>> {
        Ok(Some(Wanted::Items(self.list(true).await?)))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        Ok(self
            .load(snapshot_dir)?
            .enabled()
            .into_iter()
            .map(|uuid| format!("Extension: {}", uuid))
            .collect())
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        Ok(Wanted::Items(self.load(snapshot_dir)?.enabled()))
    }

    async fn probe_installed(&self, _wanted: &[String]) -> Result<Vec<String>> {
        self.list(true)
            .await
            .map_err(|e| Error::probe(ComponentKind::ShellExtensions, e.to_string()))
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        let missing = request.check.to_apply();
        if request.dry_run {
            return Ok(RestoreResult::dry_run(
                ComponentKind::ShellExtensions,
                missing.len(),
            ));
        }

        // Missing covers both disabled and absent extensions
        let installed: HashSet<String> = match self.list(false).await {
            Ok(all) => all.into_iter().collect(),
            Err(e) => {
                warn!("Cannot list installed extensions, installing all: {}", e);
                HashSet::new()
            }
        };

        let mut succeeded = 0;
        let mut errors = Vec::new();
        for uuid in missing {
            if !installed.contains(uuid) {
                info!("Installing extension {}", uuid);
                if let Err(message) = self.install(uuid).await {
                    warn!("{}", message);
                    errors.push(message);
                    continue;
                }
            }

            info!("Enabling extension {}", uuid);
            let spec = CommandSpec::new("gnome-extensions", self.ctx.settings.timeouts.query())
                .args(["enable", uuid.as_str()]);
            match self.ctx.runner.run(&spec).await {
                Ok(output) if output.success() => succeeded += 1,
                Ok(output) => {
                    warn!("Cannot enable {}: {}", uuid, output.stderr.trim());
                    errors.push(format!(
                        "Failed to enable {} (is it installed?): {}",
                        uuid,
                        output.stderr.trim()
                    ));
                }
                Err(e) => errors.push(format!("Failed to enable {}: {}", uuid, e)),
            }
        }

        Ok(RestoreResult::new(
            ComponentKind::ShellExtensions,
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
    use tempfile::TempDir;

    fn host() -> HostCapabilities {
        HostCapabilities::new(PackageManager::Dnf).with_tool("gnome-extensions")
    }

    #[tokio::test]
    async fn test_capture_marks_enabled() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.ok(
            "gnome-extensions list",
            "appindicatorsupport@rgcjonas.gmail.com\ndash-to-dock@micxgx.gmail.com\n",
        );
        runner.ok(
            "gnome-extensions list --enabled",
            "dash-to-dock@micxgx.gmail.com\n",
        );
        let component = ShellExtensionsComponent::new(context(host(), runner, temp.path()));

        let result = component.capture(temp.path()).await.unwrap();
        assert_eq!(result.item_count, 2);
        assert_eq!(result.items[0].meta("enabled"), Some("false"));

        let wanted = component.wanted(temp.path()).await.unwrap();
        assert_eq!(
            wanted.items(),
            ["dash-to-dock@micxgx.gmail.com".to_string()].as_slice()
        );
    }

    #[tokio::test]
    async fn test_apply_enables_each_missing() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.ok("gnome-extensions list", "a@x\ngone@x\n");
        runner.ok("gnome-extensions enable", "");
        runner.fail("gnome-extensions enable gone@x", 2, "Extension does not exist");
        let component =
            ShellExtensionsComponent::new(context(host(), runner.clone(), temp.path()));

        let wanted = Wanted::Items(vec!["a@x".into(), "gone@x".into()]);
        let check = item_check(ComponentKind::ShellExtensions, &["a@x", "gone@x"], 0);
        let result = component
            .apply_restore(ApplyRequest {
                snapshot_dir: None,
                wanted: &wanted,
                check: &check,
                dry_run: false,
            })
            .await
            .unwrap();

        assert_eq!((result.items_succeeded, result.items_failed), (1, 1));
        assert_eq!(
            runner.calls(),
            vec![
                "gnome-extensions list",
                "gnome-extensions enable a@x",
                "gnome-extensions enable gone@x"
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_installs_absent_before_enabling() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        runner.ok("gnome-extensions list", "disabled@x\n");
        runner.ok("gnome-extensions enable", "");
        runner.ok("gnome-extensions install local@x", "");
        runner.fail("gnome-extensions install remote@x", 2, "not a bundle");
        runner.fail("gnome-extensions install lost@x", 2, "not a bundle");
        runner.ok("busctl --user call", "s \"successful\"\n");
        runner.fail(
            "busctl --user call org.gnome.Shell.Extensions /org/gnome/Shell/Extensions \
             org.gnome.Shell.Extensions InstallRemoteExtension s lost@x",
            1,
            "No such extension",
        );
        let component =
            ShellExtensionsComponent::new(context(host(), runner.clone(), temp.path()));

        let names = ["disabled@x", "local@x", "remote@x", "lost@x"];
        let wanted = Wanted::Items(names.iter().map(|s| s.to_string()).collect());
        let check = item_check(ComponentKind::ShellExtensions, &names, 0);
        let result = component
            .apply_restore(ApplyRequest {
                snapshot_dir: None,
                wanted: &wanted,
                check: &check,
                dry_run: false,
            })
            .await
            .unwrap();

        assert_eq!(result.items_total, 4);
        assert_eq!((result.items_succeeded, result.items_failed), (3, 1));
        assert!(result.errors[0].contains("lost@x"));
        assert!(!runner.ran("gnome-extensions install disabled@x"));
        assert!(runner.ran("gnome-extensions enable remote@x"));
        assert!(!runner.ran("gnome-extensions enable lost@x"));

        let calls = runner.calls();
        let install = calls
            .iter()
            .position(|c| c == "gnome-extensions install local@x")
            .unwrap();
        let enable = calls
            .iter()
            .position(|c| c == "gnome-extensions enable local@x")
            .unwrap();
        assert!(install < enable);
    }

    #[tokio::test]
    async fn test_dry_run_runs_nothing() {
        let temp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        let component =
            ShellExtensionsComponent::new(context(host(), runner.clone(), temp.path()));
        let wanted = Wanted::Items(vec!["a@x".into()]);
        let check = item_check(ComponentKind::ShellExtensions, &["a@x"], 0);
        let result = component
            .apply_restore(ApplyRequest {
                snapshot_dir: None,
                wanted: &wanted,
                check: &check,
                dry_run: true,
            })
            .await
            .unwrap();
        assert!(result.dry_run);
        assert!(runner.calls().is_empty());
    }
}
