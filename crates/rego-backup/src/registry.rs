//! Component registry: kind → adapter, in registration order

use std::sync::Arc;

use rego_core::{Component, ComponentKind};
use tracing::warn;

/// Ordered map from component kind to its adapter.
///
/// Registration order is the default processing order. Registering a kind a
/// second time replaces the earlier adapter in place.
#[derive(Default, Clone)]
pub struct ComponentRegistry {
    entries: Vec<(ComponentKind, Arc<dyn Component>)>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter` under `kind`; a previous registration is replaced
    pub fn register(&mut self, kind: ComponentKind, adapter: Arc<dyn Component>) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == kind) {
            warn!(
                "Component '{}' registered twice; replacing '{}' with '{}'",
                kind,
                slot.1.name(),
                adapter.name()
            );
            slot.1 = adapter;
        } else {
            self.entries.push((kind, adapter));
        }
    }

    /// Register an adapter under its own kind
    pub fn add(&mut self, adapter: Arc<dyn Component>) {
        self.register(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: &ComponentKind) -> Option<Arc<dyn Component>> {
        self.entries
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, adapter)| Arc::clone(adapter))
    }

    /// All registered kinds in processing order
    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Kinds whose adapter is usable on this host, in processing order
    pub fn available_kinds(&self) -> Vec<ComponentKind> {
        self.entries
            .iter()
            .filter(|(_, adapter)| adapter.is_available())
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered kinds restricted to `selected`, in registration order.
    ///
    /// `None` selects everything. Kinds with no registered adapter are
    /// logged and left out.
    pub fn select(&self, selected: Option<&[ComponentKind]>) -> Vec<ComponentKind> {
        let Some(selected) = selected else {
            return self.kinds();
        };

        for unknown in selected.iter().filter(|k| self.get(k).is_none()) {
            warn!("Skipping {}: no adapter is registered for it", unknown);
        }

        self.entries
            .iter()
            .filter(|(k, _)| selected.contains(k))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// `(kind, adapter)` pairs in processing order
    pub fn iter(&self) -> impl Iterator<Item = (&ComponentKind, &Arc<dyn Component>)> {
        self.entries.iter().map(|(k, a)| (k, a))
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.iter().map(|(k, _)| k)).finish()
    }
}
