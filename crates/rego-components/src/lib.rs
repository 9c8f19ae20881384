//! Linux desktop component adapters for rego
//!
//! Each adapter captures and restores one [`ComponentKind`] through the
//! [`Component`] trait:
//! - Flatpak applications and remotes
//! - Distribution packages (dnf, apt)
//! - Third-party repository definitions
//! - GNOME Shell extensions and the dconf database
//! - Dotfiles and user fonts
//!
//! All external commands go through an injected [`CommandRunner`] and every
//! availability decision is taken from an injected [`HostCapabilities`], so
//! adapters are testable without the real tools installed.

pub mod dotfiles;
pub mod flatpak;
pub mod fonts;
pub mod packages;
pub mod repositories;
pub mod shell_extensions;
pub mod shell_settings;

mod files;
mod payload;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use rego_backup::ComponentRegistry;
use rego_core::{CommandRunner, Component, ComponentKind, HostCapabilities, Settings};

pub use dotfiles::DotfilesComponent;
pub use flatpak::FlatpakComponent;
pub use fonts::FontsComponent;
pub use packages::SystemPackagesComponent;
pub use repositories::RepositoriesComponent;
pub use shell_extensions::ShellExtensionsComponent;
pub use shell_settings::ShellSettingsComponent;

/// Shared dependencies handed to every adapter at construction
#[derive(Clone)]
pub struct AdapterContext {
    pub host: HostCapabilities,
    pub settings: Settings,
    pub runner: Arc<dyn CommandRunner>,
    /// Home directory dotfiles and fonts are resolved against
    pub home: PathBuf,
}

impl AdapterContext {
    pub fn new(
        host: HostCapabilities,
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        home: impl Into<PathBuf>,
    ) -> Self {
        Self {
            host,
            settings,
            runner,
            home: home.into(),
        }
    }
}

impl std::fmt::Debug for AdapterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterContext")
            .field("host", &self.host)
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

/// Adapter for a built-in kind, `None` for custom kinds
pub fn builtin(kind: &ComponentKind, ctx: &AdapterContext) -> Option<Arc<dyn Component>> {
    let adapter: Arc<dyn Component> = match kind {
        ComponentKind::Flatpak => Arc::new(FlatpakComponent::new(ctx.clone())),
        ComponentKind::SystemPackages => Arc::new(SystemPackagesComponent::new(ctx.clone())),
        ComponentKind::Repositories => Arc::new(RepositoriesComponent::new(ctx.clone())),
        ComponentKind::ShellExtensions => Arc::new(ShellExtensionsComponent::new(ctx.clone())),
        ComponentKind::ShellSettings => Arc::new(ShellSettingsComponent::new(ctx.clone())),
        ComponentKind::Dotfiles => Arc::new(DotfilesComponent::new(ctx.clone())),
        ComponentKind::Fonts => Arc::new(FontsComponent::new(ctx.clone())),
        ComponentKind::Custom(_) => return None,
    };
    Some(adapter)
}

/// Registry holding every built-in adapter in default processing order
pub fn default_registry(ctx: &AdapterContext) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    for kind in ComponentKind::BUILTIN {
        if let Some(adapter) = builtin(&kind, ctx) {
            registry.register(kind, adapter);
        }
    }
    registry
}
