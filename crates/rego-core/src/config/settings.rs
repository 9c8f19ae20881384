//! User settings loaded from `config.yaml`

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ComponentKind;

/// Home-relative files captured by the dotfiles component unless overridden
pub const DEFAULT_DOTFILES: &[&str] = &[
    ".bashrc",
    ".bash_profile",
    ".bash_aliases",
    ".zshrc",
    ".zprofile",
    ".profile",
    ".gitconfig",
    ".gitignore_global",
    ".vimrc",
    ".tmux.conf",
    ".ssh/config",
    ".config/fish/config.fish",
    ".config/starship.toml",
    ".config/alacritty/alacritty.toml",
    ".config/kitty/kitty.conf",
];

/// Timeouts for external commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Read-only queries
    pub query_secs: u64,
    /// Package manager transactions
    pub install_secs: u64,
    /// Installing a single application
    pub item_install_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            query_secs: 30,
            install_secs: 30 * 60,
            item_install_secs: 5 * 60,
        }
    }
}

impl Timeouts {
    pub fn query(&self) -> Duration {
        Duration::from_secs(self.query_secs)
    }

    pub fn install(&self) -> Duration {
        Duration::from_secs(self.install_secs)
    }

    pub fn item_install(&self) -> Duration {
        Duration::from_secs(self.item_install_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Snapshot store root
    pub backup_dir: Option<PathBuf>,
    /// Default kind selection
    pub components: Option<Vec<ComponentKind>>,
    pub dotfiles: Vec<String>,
    pub timeouts: Timeouts,
    pub compression_level: u32,
    /// Prefix privileged commands with `sudo`
    pub use_sudo: bool,
    pub flatpak_default_remote: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backup_dir: None,
            components: None,
            dotfiles: DEFAULT_DOTFILES.iter().map(|s| s.to_string()).collect(),
            timeouts: Timeouts::default(),
            compression_level: 6,
            use_sudo: true,
            flatpak_default_remote: "flathub".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml_ng::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compression_level > 9 {
            return Err(Error::invalid_config(format!(
                "compression_level must be between 0 and 9, got {}",
                self.compression_level
            )));
        }
        if self.timeouts.query_secs == 0
            || self.timeouts.install_secs == 0
            || self.timeouts.item_install_secs == 0
        {
            return Err(Error::invalid_config("timeouts must be greater than zero"));
        }
        if let Some(bad) = self
            .dotfiles
            .iter()
            .find(|p| Path::new(p).is_absolute() || p.split('/').any(|c| c == ".."))
        {
            return Err(Error::invalid_config(format!(
                "dotfile '{}' must be a path relative to the home directory",
                bad
            )));
        }
        Ok(())
    }
}
