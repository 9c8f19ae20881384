//! Minimal ("light") snapshot: names and blobs only, one file

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::manifest::{check_schema_version, SCHEMA_VERSION};
use super::{ComponentKind, Wanted};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinimalSnapshot {
    pub schema_version: String,
    pub created_at: DateTime<Utc>,
    pub hostname: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop: Option<String>,
    #[serde(default)]
    pub components: Vec<ComponentKind>,
    /// Identifier lists per kind
    #[serde(default)]
    pub items: BTreeMap<ComponentKind, Vec<String>>,
    /// Opaque settings blobs per kind
    #[serde(default)]
    pub settings: BTreeMap<ComponentKind, String>,
}

impl MinimalSnapshot {
    pub fn new(hostname: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            created_at: Utc::now(),
            hostname: hostname.into(),
            user: user.into(),
            distro: None,
            desktop: None,
            components: Vec::new(),
            items: BTreeMap::new(),
            settings: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, kind: ComponentKind, wanted: Wanted) {
        if !self.components.contains(&kind) {
            self.components.push(kind.clone());
        }
        match wanted {
            Wanted::Items(items) => {
                self.items.insert(kind, items);
            }
            Wanted::Settings(blob) => {
                self.settings.insert(kind, blob);
            }
        }
    }

    /// Stored wanted state for `kind`
    pub fn wanted(&self, kind: &ComponentKind) -> Option<Wanted> {
        if let Some(items) = self.items.get(kind) {
            return Some(Wanted::Items(items.clone()));
        }
        self.settings
            .get(kind)
            .map(|blob| Wanted::Settings(blob.clone()))
    }

    pub fn item_count(&self) -> usize {
        self.items.values().map(Vec::len).sum::<usize>() + self.settings.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str, path: &Path) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| Error::manifest_invalid(path, format!("corrupt snapshot: {}", e)))?;
        check_schema_version(&value, path)?;
        serde_json::from_value(value)
            .map_err(|e| Error::manifest_invalid(path, format!("corrupt snapshot: {}", e)))
    }
}
