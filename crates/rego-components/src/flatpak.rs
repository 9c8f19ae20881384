//! Flatpak applications and remotes

use std::collections::BTreeMap;
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

const FLATHUB_URL: &str = "https://flathub.org/repo/flathub.flatpakrepo";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatpakApp {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatpakRemote {
    pub name: String,
    pub url: String,
}

/// Contents of `flatpak.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatpakPayload {
    #[serde(default)]
    pub applications: Vec<FlatpakApp>,
    #[serde(default)]
    pub remotes: Vec<FlatpakRemote>,
}

pub struct FlatpakComponent {
    ctx: AdapterContext,
}

impl FlatpakComponent {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    fn query(&self, args: &[&str]) -> CommandSpec {
        CommandSpec::new("flatpak", self.ctx.settings.timeouts.query()).args(args.iter().copied())
    }

    async fn list_apps(&self) -> Result<Vec<FlatpakApp>> {
        let spec = self.query(&["list", "--app", "--columns=application,name,branch,origin"]);
        let lines = self.ctx.runner.query_lines(&spec).await?;
        Ok(parse_apps(&lines))
    }

    async fn list_remotes(&self) -> Result<Vec<FlatpakRemote>> {
        let spec = self.query(&["remotes", "--columns=name,url"]);
        let lines = self.ctx.runner.query_lines(&spec).await?;
        Ok(parse_remotes(&lines))
    }

    fn load(&self, snapshot_dir: &Path) -> Result<FlatpakPayload> {
        read_json(
            &ComponentKind::Flatpak,
            &ComponentKind::Flatpak.payload_file(snapshot_dir, "json"),
        )
    }

    /// Make sure every remote the apps come from is configured
    async fn add_remotes(&self, remotes: &[FlatpakRemote]) {
        for remote in remotes {
            let url = if remote.name == "flathub" {
                FLATHUB_URL
            } else if remote.url.is_empty() {
                continue;
            } else {
                remote.url.as_str()
            };

            let spec = self
                .query(&["remote-add", "--if-not-exists"])
                .args([remote.name.as_str(), url]);
            match self.ctx.runner.run(&spec).await {
                Ok(output) if output.success() => debug!("Remote {} ready", remote.name),
                Ok(output) => warn!(
                    "Failed to add flatpak remote {}: {}",
                    remote.name,
                    output.stderr.trim()
                ),
                Err(e) => warn!("Failed to add flatpak remote {}: {}", remote.name, e),
            }
        }
    }
}

#[async_trait]
impl Component for FlatpakComponent {
    fn name(&self) -> &str {
        "Flatpak Applications"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Flatpak
    }

    fn is_available(&self) -> bool {
        self.ctx.host.has_tool("flatpak")
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        let applications = self
            .list_apps()
            .await
            .map_err(|e| Error::capture(ComponentKind::Flatpak, e.to_string()))?;

        // apps matter more than remotes; a remote listing failure is not fatal
        let remotes = self.list_remotes().await.unwrap_or_else(|e| {
            warn!("Failed to list flatpak remotes: {}", e);
            Vec::new()
        });

        let items = applications
            .iter()
            .map(|app| {
                let mut item = CapturedItem::new(ComponentKind::Flatpak, &app.id);
                if let Some(name) = &app.name {
                    item = item.with_description(name);
                }
                if let Some(branch) = &app.branch {
                    item = item.with_metadata("branch", branch);
                }
                if let Some(origin) = &app.origin {
                    item = item.with_metadata("origin", origin);
                }
                item
            })
            .collect();

        let path = ComponentKind::Flatpak.payload_file(target_dir, "json");
        write_json(
            &path,
            &FlatpakPayload {
                applications,
                remotes,
            },
        )?;
        Ok(ComponentResult::captured(ComponentKind::Flatpak, items).with_payload(path))
    }

    async fn capture_minimal(&self) -> Result<Option<Wanted>> {
        let apps = self.list_apps().await?;
        Ok(Some(Wanted::Items(apps.into_iter().map(|a| a.id).collect())))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        let payload = self.load(snapshot_dir)?;
        let remotes = payload
            .remotes
            .iter()
            .map(|r| format!("Remote: {} ({})", r.name, r.url));
        let apps = payload.applications.iter().map(|a| format!("App: {}", a.id));
        Ok(remotes.chain(apps).collect())
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        let payload = self.load(snapshot_dir)?;
        Ok(Wanted::Items(
            payload.applications.into_iter().map(|a| a.id).collect(),
        ))
    }

    async fn probe_installed(&self, _wanted: &[String]) -> Result<Vec<String>> {
        let spec = self.query(&["list", "--app", "--columns=application"]);
        self.ctx
            .runner
            .query_lines(&spec)
            .await
            .map_err(|e| Error::probe(ComponentKind::Flatpak, e.to_string()))
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        let to_apply = request.check.to_apply();
        if request.dry_run {
            return Ok(RestoreResult::dry_run(ComponentKind::Flatpak, to_apply.len()));
        }

        let default_remote = self.ctx.settings.flatpak_default_remote.clone();
        let payload = match request.snapshot_dir {
            Some(dir) => self.load(dir)?,
            None => FlatpakPayload::default(),
        };

        let mut remotes = payload.remotes.clone();
        if !remotes.iter().any(|r| r.name == default_remote) {
            remotes.push(FlatpakRemote {
                name: default_remote.clone(),
                url: String::new(),
            });
        }
        self.add_remotes(&remotes).await;

        let origins: BTreeMap<&str, &str> = payload
            .applications
            .iter()
            .filter_map(|a| a.origin.as_deref().map(|o| (a.id.as_str(), o)))
            .collect();

        let mut succeeded = 0;
        let mut errors = Vec::new();
        for app in to_apply {
            let origin = origins.get(app.as_str()).copied().unwrap_or(default_remote.as_str());
            info!("Installing {} from {}", app, origin);

            let spec = CommandSpec::new("flatpak", self.ctx.settings.timeouts.item_install())
                .args(["install", "-y", "--noninteractive", origin, app.as_str()]);
            match self.ctx.runner.run(&spec).await {
                Ok(output) if output.success() => succeeded += 1,
                Ok(output) => errors.push(format!(
                    "Failed to install {}: {}",
                    app,
                    output.stderr.trim()
                )),
                Err(e) => errors.push(format!("Failed to install {}: {}", app, e)),
            }
        }

        Ok(RestoreResult::new(
            ComponentKind::Flatpak,
            to_apply.len(),
            succeeded,
            errors,
        ))
    }
}

/// Parse `flatpak list --columns=application,name,branch,origin` output
fn parse_apps(lines: &[String]) -> Vec<FlatpakApp> {
    let column = |parts: &[&str], i: usize| {
        parts
            .get(i)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    lines
        .iter()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split('\t').collect();
            let id = column(&parts, 0)?;
            Some(FlatpakApp {
                id,
                name: column(&parts, 1),
                branch: column(&parts, 2),
                origin: column(&parts, 3),
            })
        })
        .collect()
}

fn parse_remotes(lines: &[String]) -> Vec<FlatpakRemote> {
    lines
        .iter()
        .filter_map(|line| {
            let (name, url) = line.split_once('\t')?;
            let name = name.trim();
            (!name.is_empty()).then(|| FlatpakRemote {
                name: name.to_string(),
                url: url.trim().to_string(),
            })
        })
        .collect()
}
