//! Component kind identifiers

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of system state captured by one adapter.
///
/// Persisted in manifests as its kebab-case identifier. Identifiers this build
/// does not know round-trip through [`ComponentKind::Custom`] so newer snapshots
/// still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ComponentKind {
    Flatpak,
    SystemPackages,
    Repositories,
    ShellExtensions,
    ShellSettings,
    Dotfiles,
    Fonts,
    Custom(String),
}

impl ComponentKind {
    /// Built-in kinds in their default processing order
    pub const BUILTIN: [ComponentKind; 7] = [
        ComponentKind::Flatpak,
        ComponentKind::SystemPackages,
        ComponentKind::Repositories,
        ComponentKind::ShellExtensions,
        ComponentKind::ShellSettings,
        ComponentKind::Dotfiles,
        ComponentKind::Fonts,
    ];

    /// Stable identifier used in manifests and payload names
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flatpak => "flatpak",
            Self::SystemPackages => "system-packages",
            Self::Repositories => "repositories",
            Self::ShellExtensions => "shell-extensions",
            Self::ShellSettings => "shell-settings",
            Self::Dotfiles => "dotfiles",
            Self::Fonts => "fonts",
            Self::Custom(name) => name,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Flatpak => "Flatpak Applications",
            Self::SystemPackages => "System Packages",
            Self::Repositories => "Package Repositories",
            Self::ShellExtensions => "Shell Extensions",
            Self::ShellSettings => "Shell Settings",
            Self::Dotfiles => "Dotfiles",
            Self::Fonts => "User Fonts",
            Self::Custom(name) => name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Flatpak => "Installed Flatpak applications and their remotes",
            Self::SystemPackages => "User-installed distribution packages",
            Self::Repositories => "Third-party package repository definitions",
            Self::ShellExtensions => "Enabled desktop shell extensions",
            Self::ShellSettings => "Full desktop settings database dump",
            Self::Dotfiles => "Shell, editor and tool configuration files",
            Self::Fonts => "Fonts installed in the user's font directory",
            Self::Custom(_) => "Component provided by an external adapter",
        }
    }

    /// Payload file `<root>/<kind>.<ext>` owned by this kind
    pub fn payload_file(&self, root: &Path, extension: &str) -> PathBuf {
        root.join(format!("{}.{}", self.as_str(), extension))
    }

    /// Payload directory `<root>/<kind>/` owned by this kind
    pub fn payload_dir(&self, root: &Path) -> PathBuf {
        root.join(self.as_str())
    }

    /// Whether a top-level snapshot entry belongs to this kind
    pub fn owns_entry(&self, entry_name: &str) -> bool {
        let stem = entry_name.split('.').next().unwrap_or(entry_name);
        stem == self.as_str()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ComponentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "flatpak" => Self::Flatpak,
            "system-packages" => Self::SystemPackages,
            "repositories" => Self::Repositories,
            "shell-extensions" => Self::ShellExtensions,
            "shell-settings" => Self::ShellSettings,
            "dotfiles" => Self::Dotfiles,
            "fonts" => Self::Fonts,
            _ => Self::Custom(value),
        }
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl FromStr for ComponentKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.trim().to_string()))
    }
}
