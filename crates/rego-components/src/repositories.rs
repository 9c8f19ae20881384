//! Third-party package repository definitions

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rego_core::{
    ApplyRequest, CapturedItem, CommandSpec, Component, ComponentKind, ComponentResult, Error,
    PackageManager, RestoreResult, Result, Wanted,
};
use tracing::{debug, info, warn};

use crate::files::{copy_file, existing_under, relative_files, resolve_under};
use crate::AdapterContext;

/// Definitions shipped by the distribution itself
const DISTRIBUTION_REPO_FILES: &[&str] = &[
    "fedora.repo",
    "fedora-updates.repo",
    "fedora-updates-testing.repo",
    "fedora-cisco-openh264.repo",
    "ubuntu.sources",
    "debian.sources",
];

pub struct RepositoriesComponent {
    ctx: AdapterContext,
    repo_dir: PathBuf,
}

impl RepositoriesComponent {
    pub fn new(ctx: AdapterContext) -> Self {
        let repo_dir = match ctx.host.package_manager {
            PackageManager::Apt => PathBuf::from("/etc/apt/sources.list.d"),
            _ => PathBuf::from("/etc/yum.repos.d"),
        };
        Self { ctx, repo_dir }
    }

    /// Read and write definitions under `dir` instead of the system location
    pub fn with_repo_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.repo_dir = dir.into();
        self
    }

    fn extensions(&self) -> &'static [&'static str] {
        match self.ctx.host.package_manager {
            PackageManager::Apt => &["list", "sources"],
            _ => &["repo"],
        }
    }

    /// Third-party definition files directly under the repository directory
    fn definition_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.repo_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let matches_ext = Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| self.extensions().contains(&e));
            if matches_ext && !DISTRIBUTION_REPO_FILES.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn payload_dir(&self, root: &Path) -> PathBuf {
        ComponentKind::Repositories.payload_dir(root)
    }
}

#[async_trait]
impl Component for RepositoriesComponent {
    fn name(&self) -> &str {
        "Package Repositories"
    }

    fn kind(&self) -> ComponentKind {
        ComponentKind::Repositories
    }

    fn is_available(&self) -> bool {
        matches!(
            self.ctx.host.package_manager,
            PackageManager::Dnf | PackageManager::Apt
        ) && self.repo_dir.is_dir()
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        let names = self.definition_files().map_err(|e| {
            Error::capture(
                ComponentKind::Repositories,
                format!("cannot read {}: {}", self.repo_dir.display(), e),
            )
        })?;

        let dest = self.payload_dir(target_dir);
        fs::create_dir_all(&dest)?;

        let mut items = Vec::with_capacity(names.len());
        for name in names {
            let source = self.repo_dir.join(&name);
            copy_file(&source, &dest.join(&name))?;

            let mut item = CapturedItem::new(ComponentKind::Repositories, &name);
            let ids = section_ids(&fs::read_to_string(&source).unwrap_or_default());
            if !ids.is_empty() {
                item = item.with_metadata("repo_ids", ids.join(","));
            }
            items.push(item);
        }

        Ok(ComponentResult::captured(ComponentKind::Repositories, items).with_payload(dest))
    }

    async fn capture_minimal(&self) -> Result<Option<Wanted>> {
        let names = self.definition_files().map_err(|e| {
            Error::capture(
                ComponentKind::Repositories,
                format!("cannot read {}: {}", self.repo_dir.display(), e),
            )
        })?;
        Ok(Some(Wanted::Items(names)))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        Ok(self
            .wanted(snapshot_dir)
            .await?
            .items()
            .iter()
            .map(|name| format!("Repository: {}", name))
            .collect())
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        Ok(Wanted::Items(relative_files(&self.payload_dir(snapshot_dir))?))
    }

    async fn probe_installed(&self, wanted: &[String]) -> Result<Vec<String>> {
        if !self.repo_dir.is_dir() {
            return Err(Error::probe(
                ComponentKind::Repositories,
                format!("{} does not exist", self.repo_dir.display()),
            ));
        }
        Ok(existing_under(&self.repo_dir, wanted))
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        let missing = request.check.to_apply();
        if request.dry_run {
            return Ok(RestoreResult::dry_run(ComponentKind::Repositories, missing.len()));
        }
        // Minimal snapshots only record file names, so missing definitions are reported
        let Some(snapshot) = request.snapshot_dir else {
            warn!(
                "{} repository definitions are missing and need a full snapshot",
                missing.len()
            );
            return Ok(RestoreResult::new(
                ComponentKind::Repositories,
                missing.len(),
                0,
                vec![format!(
                    "Not restored, definitions need a full snapshot: {}",
                    missing.join(", ")
                )],
            ));
        };
        let source_dir = self.payload_dir(snapshot);

        let mut succeeded = 0;
        let mut errors = Vec::new();
        for name in missing {
            let (Some(source), Some(target)) = (
                resolve_under(&source_dir, name),
                resolve_under(&self.repo_dir, name),
            ) else {
                errors.push(format!("Refusing unsafe repository path {}", name));
                continue;
            };

            info!("Installing repository definition {}", name);
            let spec = CommandSpec::new("install", self.ctx.settings.timeouts.query())
                .args(["-m", "0644"])
                .arg(source.to_string_lossy())
                .arg(target.to_string_lossy())
                .elevated(self.ctx.settings.use_sudo);

            match self.ctx.runner.run(&spec).await {
                Ok(output) if output.success() => {
                    debug!("Installed {}", target.display());
                    succeeded += 1;
                }
                Ok(output) => {
                    warn!("Failed to install {}: {}", name, output.stderr.trim());
                    errors.push(format!("Failed to install {}: {}", name, output.stderr.trim()));
                }
                Err(e) => errors.push(format!("Failed to install {}: {}", name, e)),
            }
        }

        Ok(RestoreResult::new(
            ComponentKind::Repositories,
            missing.len(),
            succeeded,
            errors,
        ))
    }
}

/// `[section]` headers of a dnf `.repo` file
fn section_ids(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(str::to_string)
        .collect()
}
