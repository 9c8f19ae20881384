//! Snapshot manifest and its on-disk schema

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ComponentKind, ComponentResult};
use crate::error::{Error, Result};

/// Schema version written by this build
pub const SCHEMA_VERSION: &str = "1.0";

/// Manifest file name inside a snapshot directory
pub const MANIFEST_FILE: &str = "manifest.json";

/// Reject any document whose `schema_version` this build does not understand.
///
/// Runs on the raw JSON value so a missing or foreign version is reported as
/// such instead of as a field-level parse error.
pub fn check_schema_version(value: &serde_json::Value, path: &Path) -> Result<()> {
    match value.get("schema_version") {
        None | Some(serde_json::Value::Null) => {
            Err(Error::manifest_invalid(path, "missing schema version"))
        }
        Some(serde_json::Value::String(version)) if version == SCHEMA_VERSION => Ok(()),
        Some(serde_json::Value::String(version)) => Err(Error::manifest_invalid(
            path,
            format!(
                "unsupported schema version '{}' (this build understands {})",
                version, SCHEMA_VERSION
            ),
        )),
        Some(other) => Err(Error::manifest_invalid(
            path,
            format!("schema version must be a string, found {}", other),
        )),
    }
}

/// Root record of one full backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotManifest {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub hostname: String,
    pub user: String,
    /// Included kinds in processing order
    pub components: Vec<ComponentKind>,
    pub results: BTreeMap<ComponentKind, ComponentResult>,
    pub backup_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,
}

impl SnapshotManifest {
    /// Fresh manifest header for a run writing into `backup_path`
    pub fn new(
        backup_path: impl Into<PathBuf>,
        hostname: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            hostname: hostname.into(),
            user: user.into(),
            components: Vec::new(),
            results: BTreeMap::new(),
            backup_path: backup_path.into(),
            description: None,
            distro: None,
            desktop: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Append one adapter's outcome
    pub fn record(&mut self, result: ComponentResult) {
        if !self.components.contains(&result.kind) {
            self.components.push(result.kind.clone());
        }
        self.results.insert(result.kind.clone(), result);
    }

    pub fn result(&self, kind: &ComponentKind) -> Option<&ComponentResult> {
        self.results.get(kind)
    }

    /// Results in processing order
    pub fn ordered_results(&self) -> impl Iterator<Item = &ComponentResult> {
        self.components.iter().filter_map(|kind| self.results.get(kind))
    }

    pub fn failed_kinds(&self) -> Vec<&ComponentKind> {
        self.ordered_results()
            .filter(|r| !r.succeeded)
            .map(|r| &r.kind)
            .collect()
    }

    pub fn total_items(&self) -> usize {
        self.results.values().map(|r| r.item_count).sum()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a manifest read from `path`
    pub fn from_json(json: &str, path: &Path) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::manifest_invalid(path, format!("corrupt manifest: {}", e)))?;
        check_schema_version(&value, path)?;
        serde_json::from_value(value)
            .map_err(|e| Error::manifest_invalid(path, format!("corrupt manifest: {}", e)))
    }
}
