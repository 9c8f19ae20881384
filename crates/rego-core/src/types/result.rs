//! Per-component backup and restore outcomes

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ComponentKind;

/// One discrete thing a component captured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedItem {
    /// Unique within its kind
    pub name: String,
    pub kind: ComponentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl CapturedItem {
    pub fn new(kind: ComponentKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// Outcome of running one adapter during backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentResult {
    pub kind: ComponentKind,
    pub succeeded: bool,
    #[serde(default)]
    pub items: Vec<CapturedItem>,
    pub item_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_path: Option<PathBuf>,
    /// Elapsed capture time
    #[serde(default)]
    pub duration_ms: u64,
}

impl ComponentResult {
    /// Successful capture of `items`
    pub fn captured(kind: ComponentKind, items: Vec<CapturedItem>) -> Self {
        Self {
            kind,
            succeeded: true,
            item_count: items.len(),
            items,
            error_message: None,
            timestamp: Utc::now(),
            payload_path: None,
            duration_ms: 0,
        }
    }

    /// Failed capture
    pub fn failed(kind: ComponentKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            succeeded: false,
            items: Vec::new(),
            item_count: 0,
            error_message: Some(message.into()),
            timestamp: Utc::now(),
            payload_path: None,
            duration_ms: 0,
        }
    }

    pub fn with_payload(mut self, path: impl Into<PathBuf>) -> Self {
        self.payload_path = Some(path.into());
        self
    }

    /// Drop items whose name repeats an earlier one, returning how many were removed
    pub fn dedupe_items(&mut self) -> usize {
        let mut seen = std::collections::HashSet::new();
        let before = self.items.len();
        self.items.retain(|item| seen.insert(item.name.clone()));
        self.item_count = self.items.len();
        before - self.items.len()
    }
}

/// Outcome of applying one adapter's restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreResult {
    pub kind: ComponentKind,
    pub succeeded: bool,
    pub items_total: usize,
    pub items_succeeded: usize,
    pub items_failed: usize,
    /// Wanted items already present on the host
    #[serde(default)]
    pub items_skipped: usize,
    #[serde(default)]
    pub errors: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
    /// The live probe failed and every wanted item was attempted
    #[serde(default)]
    pub probe_unavailable: bool,
}

impl RestoreResult {
    /// Result with `succeeded` of `total` items applied
    pub fn new(kind: ComponentKind, total: usize, succeeded: usize, errors: Vec<String>) -> Self {
        let items_succeeded = succeeded.min(total);
        let items_failed = total - items_succeeded;
        Self {
            kind,
            succeeded: items_failed == 0 && errors.is_empty(),
            items_total: total,
            items_succeeded,
            items_failed,
            items_skipped: 0,
            errors,
            timestamp: Utc::now(),
            dry_run: false,
            probe_unavailable: false,
        }
    }

    /// Synthesized dry-run result: everything would succeed, nothing is touched
    pub fn dry_run(kind: ComponentKind, total: usize) -> Self {
        let mut result = Self::new(kind, total, total, Vec::new());
        result.dry_run = true;
        result
    }

    /// Every item failed with a single error
    pub fn failed(kind: ComponentKind, total: usize, error: impl Into<String>) -> Self {
        Self::new(kind, total, 0, vec![error.into()])
    }

    pub fn with_skipped(mut self, skipped: usize) -> Self {
        self.items_skipped = skipped;
        self
    }

    /// Restore the `succeeded + failed == total` accounting after an adapter
    /// reported inconsistent counts
    pub fn normalize(&mut self) {
        self.items_succeeded = self.items_succeeded.min(self.items_total);
        self.items_failed = self.items_total - self.items_succeeded;
        if self.items_failed > 0 {
            self.succeeded = false;
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.items_succeeded + self.items_failed == self.items_total
    }
}
