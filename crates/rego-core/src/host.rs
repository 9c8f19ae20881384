//! Host capabilities
//!
//! Detected once at startup and handed to every component adapter, so no
//! adapter re-queries the machine for its package manager or tools. Tests
//! build a [`HostCapabilities`] by hand instead of detecting.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tools the built-in components look for
pub const KNOWN_TOOLS: &[&str] = &[
    "flatpak",
    "dnf",
    "rpm",
    "apt",
    "apt-get",
    "apt-mark",
    "dpkg-query",
    "pacman",
    "zypper",
    "gnome-extensions",
    "dconf",
    "fc-cache",
    "sudo",
];

/// System package manager of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// APT (Debian/Ubuntu)
    Apt,
    /// DNF (Fedora/RHEL)
    Dnf,
    /// Pacman (Arch)
    Pacman,
    /// Zypper (openSUSE)
    Zypper,
    Unknown,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apt => write!(f, "apt"),
            Self::Dnf => write!(f, "dnf"),
            Self::Pacman => write!(f, "pacman"),
            Self::Zypper => write!(f, "zypper"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Desktop environment of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Desktop {
    Gnome,
    Kde,
    Other,
}

impl std::fmt::Display for Desktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gnome => write!(f, "GNOME"),
            Self::Kde => write!(f, "KDE Plasma"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// What this machine offers to the component adapters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostCapabilities {
    pub package_manager: PackageManager,
    pub distro: Option<String>,
    pub desktop: Option<Desktop>,
    tools: BTreeSet<String>,
}

impl HostCapabilities {
    /// Empty capabilities for `package_manager`, used by tests
    pub fn new(package_manager: PackageManager) -> Self {
        Self {
            package_manager,
            distro: None,
            desktop: None,
            tools: BTreeSet::new(),
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tools.insert(tool.into());
        self
    }

    pub fn with_desktop(mut self, desktop: Desktop) -> Self {
        self.desktop = Some(desktop);
        self
    }

    pub fn with_distro(mut self, distro: impl Into<String>) -> Self {
        self.distro = Some(distro.into());
        self
    }

    /// Probe the running system
    pub fn detect() -> Self {
        let tools: BTreeSet<String> = KNOWN_TOOLS
            .iter()
            .filter(|tool| which::which(tool).is_ok())
            .map(|tool| tool.to_string())
            .collect();

        let package_manager = detect_package_manager(&tools);
        let distro = fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| parse_os_release_name(&content));
        let desktop = std::env::var("XDG_CURRENT_DESKTOP")
            .ok()
            .and_then(|value| parse_desktop(&value));

        tracing::debug!(
            "Detected host: package manager {}, distro {:?}, desktop {:?}, tools {:?}",
            package_manager,
            distro,
            desktop,
            tools
        );

        Self {
            package_manager,
            distro,
            desktop,
            tools,
        }
    }

    pub fn has_tool(&self, tool: &str) -> bool {
        self.tools.contains(tool)
    }

    pub fn tools(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(String::as_str)
    }
}

/// apt needs a Debian marker file as well as the binary; the rest go by binary
fn detect_package_manager(tools: &BTreeSet<String>) -> PackageManager {
    if tools.contains("apt") && Path::new("/etc/debian_version").exists() {
        PackageManager::Apt
    } else if tools.contains("dnf") {
        PackageManager::Dnf
    } else if tools.contains("pacman") {
        PackageManager::Pacman
    } else if tools.contains("zypper") {
        PackageManager::Zypper
    } else {
        PackageManager::Unknown
    }
}

/// `PRETTY_NAME` from an os-release file, falling back to `NAME`
pub fn parse_os_release_name(content: &str) -> Option<String> {
    let field = |key: &str| {
        content.lines().find_map(|line| {
            line.strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| value.trim().trim_matches('"').to_string())
                .filter(|value| !value.is_empty())
        })
    };
    field("PRETTY_NAME").or_else(|| field("NAME"))
}

/// Desktop from `XDG_CURRENT_DESKTOP`, which may list several names (`ubuntu:GNOME`)
pub fn parse_desktop(value: &str) -> Option<Desktop> {
    if value.trim().is_empty() {
        return None;
    }
    let upper = value.to_uppercase();
    if upper.split(':').any(|d| d == "GNOME") {
        Some(Desktop::Gnome)
    } else if upper.split(':').any(|d| d == "KDE") {
        Some(Desktop::Kde)
    } else {
        Some(Desktop::Other)
    }
}
