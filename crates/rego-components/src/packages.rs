//! Distribution packages installed on purpose by the user
//!
//! Only dnf and apt hosts are supported. Capture records the user-installed
//! set, restore installs the missing subset in one transaction and, when the
//! transaction fails, re-probes so partial success is counted per package.

use std::collections::HashSet;
use std::path::Path;

use async_trait::async_trait;
use rego_core::{
    ApplyRequest, CapturedItem, CommandSpec, Component, ComponentKind, ComponentResult, Error,
    PackageManager, RestoreResult, Result, Wanted,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::payload::{normalize_names, read_json, write_json};
use crate::AdapterContext;

/// Packages every installation carries; never worth recording
const BASE_PACKAGES: &[&str] = &[
    "basesystem",
    "bash",
    "coreutils",
    "fedora-gpg-keys",
    "fedora-release",
    "fedora-repos",
    "filesystem",
    "glibc",
    "glibc-common",
    "kernel",
    "kernel-core",
    "kernel-modules",
    "kernel-modules-core",
    "setup",
    "systemd",
];

/// Contents of `system-packages.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagesPayload {
    pub package_manager: PackageManager,
    #[serde(default)]
    pub packages: Vec<String>,
}

pub struct SystemPackagesComponent {
    ctx: AdapterContext,
}

impl SystemPackagesComponent {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }

    fn manager(&self) -> PackageManager {
        self.ctx.host.package_manager
    }

    fn query(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program, self.ctx.settings.timeouts.query())
    }

    async fn list_user_installed(&self) -> Result<Vec<String>> {
        let runner = &self.ctx.runner;
        let lines = match self.manager() {
            PackageManager::Dnf => {
                let spec = self
                    .query("dnf")
                    .args(["repoquery", "--userinstalled", "--qf", "%{name}\\n"]);
                match runner.query_lines(&spec).await {
                    Ok(lines) => lines,
                    Err(e) => {
                        warn!("dnf repoquery failed, falling back to history: {}", e);
                        let spec = self.query("dnf").args(["history", "userinstalled"]);
                        runner.query_lines(&spec).await?
                    }
                }
            }
            PackageManager::Apt => {
                runner
                    .query_lines(&self.query("apt-mark").arg("showmanual"))
                    .await?
            }
            other => {
                return Err(Error::unavailable(
                    ComponentKind::SystemPackages,
                    format!("unsupported package manager: {}", other),
                ))
            }
        };

        Ok(normalize_names(
            lines
                .into_iter()
                .filter(|name| !BASE_PACKAGES.contains(&name.as_str())),
        ))
    }

    async fn list_installed(&self) -> Result<Vec<String>> {
        match self.manager() {
            PackageManager::Dnf => {
                let spec = self.query("rpm").args(["-qa", "--qf", "%{NAME}\\n"]);
                self.ctx.runner.query_lines(&spec).await
            }
            PackageManager::Apt => {
                let spec = self
                    .query("dpkg-query")
                    .args(["-W", "-f=${db:Status-Abbrev} ${Package}\\n"]);
                let lines = self.ctx.runner.query_lines(&spec).await?;
                Ok(dpkg_installed(&lines))
            }
            other => Err(Error::unavailable(
                ComponentKind::SystemPackages,
                format!("unsupported package manager: {}", other),
            )),
        }
    }

    fn install_spec(&self, packages: &[String]) -> CommandSpec {
        let program = match self.manager() {
            PackageManager::Apt => "apt-get",
            _ => "dnf",
        };
        CommandSpec::new(program, self.ctx.settings.timeouts.install())
            .args(["install", "-y"])
            .args(packages.iter().cloned())
            .elevated(self.ctx.settings.use_sudo)
    }

    fn load(&self, snapshot_dir: &Path) -> Result<PackagesPayload> {
        let payload: PackagesPayload = read_json(
            &ComponentKind::SystemPackages,
            &ComponentKind::SystemPackages.payload_file(snapshot_dir, "json"),
        )?;
        if payload.package_manager != self.manager() {
            warn!(
                "Snapshot packages were captured with {}, this host uses {}; names may differ",
                payload.package_manager,
                self.manager()
            );
        }
        Ok(payload)
    }
}

#[async_trait]
impl Component for SystemPackagesComponent {
    fn name(&self) -> &str {
        "System Packages"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::SystemPackages
    }

    fn is_available(&self) -> bool {
        matches!(self.manager(), PackageManager::Dnf | PackageManager::Apt)
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        let packages = self
            .list_user_installed()
            .await
            .map_err(|e| Error::capture(ComponentKind::SystemPackages, e.to_string()))?;

        let path = ComponentKind::SystemPackages.payload_file(target_dir, "json");
        write_json(
            &path,
            &PackagesPayload {
                package_manager: self.manager(),
                packages: packages.clone(),
            },
        )?;

        let items = packages
            .into_iter()
            .map(|name| CapturedItem::new(ComponentKind::SystemPackages, name))
            .collect();
        Ok(ComponentResult::captured(ComponentKind::SystemPackages, items).with_payload(path))
    }

    async fn capture_minimal(&self) -> Result<Option<Wanted>> {
        Ok(Some(Wanted::Items(self.list_user_installed().await?)))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        let payload = self.load(snapshot_dir)?;
        Ok(payload
            .packages
            .iter()
            .map(|p| format!("Package: {}", p))
            .collect())
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        Ok(Wanted::Items(self.load(snapshot_dir)?.packages))
    }

    async fn probe_installed(&self, _wanted: &[String]) -> Result<Vec<String>> {
        self.list_installed()
            .await
            .map_err(|e| Error::probe(ComponentKind::SystemPackages, e.to_string()))
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        let missing = request.check.to_apply();
        if request.dry_run {
            return Ok(RestoreResult::dry_run(
                ComponentKind::SystemPackages,
                missing.len(),
            ));
        }
        if missing.is_empty() {
            return Ok(RestoreResult::new(
                ComponentKind::SystemPackages,
                0,
                0,
                Vec::new(),
            ));
        }

        let spec = self.install_spec(missing);
        info!(
            "Installing {} packages (this may take a while)...",
            missing.len()
        );

        let failure = match self.ctx.runner.run(&spec).await {
            Ok(output) if output.success() => None,
            Ok(output) => Some(format!(
                "{} exited with {:?}: {}",
                spec.program,
                output.code,
                output.stderr.trim()
            )),
            Err(e) => Some(e.to_string()),
        };

        let Some(failure) = failure else {
            return Ok(RestoreResult::new(
                ComponentKind::SystemPackages,
                missing.len(),
                missing.len(),
                Vec::new(),
            ));
        };

        // the transaction failed; find out which packages made it anyway
        warn!("Package installation failed: {}", failure);
        let installed: HashSet<String> = match self.list_installed().await {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                warn!("Cannot re-probe installed packages: {}", e);
                HashSet::new()
            }
        };

        let mut errors = vec![failure];
        let mut succeeded = 0;
        for package in missing {
            if installed.contains(package) {
                succeeded += 1;
            } else {
                errors.push(format!("{} was not installed", package));
            }
        }

        Ok(RestoreResult::new(
            ComponentKind::SystemPackages,
            missing.len(),
            succeeded,
            errors,
        ))
    }
}

/// Package names from `dpkg-query` status lines whose state is installed.
///
/// Removed packages that left config files behind (`rc`) are still listed by
/// dpkg and must not count as present.
fn dpkg_installed(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let status = fields.next()?;
            let name = fields.next()?;
            (status.chars().nth(1) == Some('i')).then(|| name.to_string())
        })
        .collect()
}
