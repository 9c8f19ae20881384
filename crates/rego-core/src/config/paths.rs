//! Well-known locations under the user's config directory

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::get_home_dir;

/// Override for the settings file
pub const CONFIG_ENV: &str = "REGO_CONFIG";

/// Override for the snapshot store root
pub const BACKUP_DIR_ENV: &str = "REGO_BACKUP_DIR";

/// Resolved rego directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegoPaths {
    pub home: PathBuf,
    /// `~/.config/rego`
    pub config_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl RegoPaths {
    /// Resolve paths for the current user
    pub fn resolve() -> Result<Self> {
        Ok(Self::from_home(get_home_dir()?))
    }

    /// Layout rooted at an explicit home directory
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let config_dir = home.join(".config").join("rego");
        Self {
            backups_dir: config_dir.join("backups"),
            logs_dir: config_dir.join("logs"),
            config_dir,
            home,
        }
    }

    /// Apply the settings and environment overrides for the store root
    pub fn with_backup_dir(mut self, backup_dir: Option<&Path>) -> Self {
        if let Some(dir) = std::env::var_os(BACKUP_DIR_ENV).filter(|v| !v.is_empty()) {
            self.backups_dir = PathBuf::from(dir);
        } else if let Some(dir) = backup_dir {
            self.backups_dir = dir.to_path_buf();
        }
        self
    }

    pub fn config_file(&self) -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config_dir.join("config.yaml"))
    }

    /// Per-day log file
    pub fn log_file(&self, date: chrono::NaiveDate) -> PathBuf {
        self.logs_dir
            .join(format!("rego_{}.log", date.format("%Y-%m-%d")))
    }

    /// Default minimal snapshot file, `~/rego-<host>.json`
    pub fn default_minimal_path(&self, hostname: &str) -> PathBuf {
        self.home.join(format!("rego-{}.json", hostname))
    }

    /// Default export archive, `~/rego-backup-<host>-<date>.tar.gz`
    pub fn default_export_path(&self, hostname: &str, date: chrono::NaiveDate) -> PathBuf {
        self.home.join(format!(
            "rego-backup-{}-{}.tar.gz",
            hostname,
            date.format("%Y-%m-%d")
        ))
    }
}
