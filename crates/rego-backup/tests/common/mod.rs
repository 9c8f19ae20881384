//! Shared helpers for rego-backup integration tests
//!
//! Provides a scripted in-memory component that records every call, so
//! orchestrator behavior can be asserted without touching the host.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rego_backup::{ComponentRegistry, HostIdentity, SnapshotStore};
use rego_core::{
    ApplyRequest, CapturedItem, Component, ComponentKind, ComponentResult, Error, Result,
    RestoreResult, Wanted,
};

/// Live state of a fake component, shared with the test body
#[derive(Debug, Default)]
pub struct FakeState {
    pub installed: Vec<String>,
    pub settings: Option<String>,
    pub calls: Vec<String>,
}

/// Scripted component adapter
#[derive(Clone)]
pub struct FakeComponent {
    kind: ComponentKind,
    name: String,
    available: bool,
    /// Items reported by capture (or the blob for settings kinds)
    captured: Vec<String>,
    settings_blob: Option<String>,
    capture_error: Option<String>,
    probe_error: bool,
    failing_items: HashSet<String>,
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeComponent {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            name: kind.display_name().to_string(),
            kind,
            available: true,
            captured: Vec::new(),
            settings_blob: None,
            capture_error: None,
            probe_error: false,
            failing_items: HashSet::new(),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn with_items(mut self, items: &[&str]) -> Self {
        self.captured = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_installed(self, items: &[&str]) -> Self {
        self.state.lock().unwrap().installed = items.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_settings(mut self, blob: &str) -> Self {
        self.settings_blob = Some(blob.to_string());
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn failing_capture(mut self, message: &str) -> Self {
        self.capture_error = Some(message.to_string());
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.probe_error = true;
        self
    }

    pub fn failing_item(mut self, item: &str) -> Self {
        self.failing_items.insert(item.to_string());
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn installed(&self) -> Vec<String> {
        self.state.lock().unwrap().installed.clone()
    }

    pub fn live_settings(&self) -> Option<String> {
        self.state.lock().unwrap().settings.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls().iter().any(|c| c == method)
    }

    fn record(&self, method: &str) {
        self.state.lock().unwrap().calls.push(method.to_string());
    }

    fn payload(&self, dir: &Path) -> std::path::PathBuf {
        self.kind.payload_file(dir, "json")
    }
}

#[async_trait]
impl Component for FakeComponent {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ComponentKind {
        self.kind.clone()
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn capture(&self, target_dir: &Path) -> Result<ComponentResult> {
        self.record("capture");
        if let Some(message) = &self.capture_error {
            return Err(Error::capture(self.kind.clone(), message.clone()));
        }

        let payload = self.payload(target_dir);
        let wanted = match &self.settings_blob {
            Some(blob) => serde_json::json!({ "settings": blob }),
            None => serde_json::json!({ "items": self.captured }),
        };
        std::fs::write(&payload, serde_json::to_string(&wanted)?)?;

        let items = self
            .captured
            .iter()
            .map(|name| CapturedItem::new(self.kind.clone(), name.clone()))
            .collect();
        Ok(ComponentResult::captured(self.kind.clone(), items).with_payload(payload))
    }

    async fn capture_minimal(&self) -> Result<Option<Wanted>> {
        self.record("capture_minimal");
        Ok(Some(match &self.settings_blob {
            Some(blob) => Wanted::Settings(blob.clone()),
            None => Wanted::Items(self.captured.clone()),
        }))
    }

    async fn preview_restore(&self, snapshot_dir: &Path) -> Result<Vec<String>> {
        self.record("preview");
        Ok(self.wanted(snapshot_dir).await?.items().to_vec())
    }

    async fn wanted(&self, snapshot_dir: &Path) -> Result<Wanted> {
        self.record("wanted");
        let content = std::fs::read_to_string(self.payload(snapshot_dir))?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        if let Some(blob) = value.get("settings").and_then(|v| v.as_str()) {
            return Ok(Wanted::Settings(blob.to_string()));
        }
        let items = value
            .get("items")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Wanted::Items(items))
    }

    async fn probe_installed(&self, _wanted: &[String]) -> Result<Vec<String>> {
        self.record("probe");
        if self.probe_error {
            return Err(Error::probe(self.kind.clone(), "probe tool missing"));
        }
        Ok(self.installed())
    }

    async fn apply_restore(&self, request: ApplyRequest<'_>) -> Result<RestoreResult> {
        self.record("apply");
        if request.dry_run {
            return Ok(RestoreResult::dry_run(
                self.kind.clone(),
                request.check.action_count(),
            ));
        }

        if let Wanted::Settings(blob) = request.wanted {
            self.state.lock().unwrap().settings = Some(blob.clone());
            return Ok(RestoreResult::new(self.kind.clone(), 1, 1, Vec::new()));
        }

        let to_apply = request.check.to_apply();
        let mut errors = Vec::new();
        let mut succeeded = 0;
        for item in to_apply {
            if self.failing_items.contains(item) {
                errors.push(format!("{} failed to install", item));
            } else {
                self.state.lock().unwrap().installed.push(item.clone());
                succeeded += 1;
            }
        }
        Ok(RestoreResult::new(
            self.kind.clone(),
            to_apply.len(),
            succeeded,
            errors,
        ))
    }
}

pub fn registry_of(components: &[FakeComponent]) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    for component in components {
        registry.add(Arc::new(component.clone()));
    }
    registry
}

pub fn identity() -> HostIdentity {
    HostIdentity {
        hostname: "test-host".to_string(),
        user: "tester".to_string(),
        distro: Some("Fedora Linux 41".to_string()),
        desktop: Some("GNOME".to_string()),
    }
}

pub fn store_in(dir: &Path) -> SnapshotStore {
    SnapshotStore::new(dir.join("backups"))
}
