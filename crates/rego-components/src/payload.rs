//! JSON payload files written by adapters

use std::fs;
use std::path::Path;

use rego_core::{ComponentKind, Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Write `value` as pretty JSON to `path`
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Read a payload written by [`write_json`], naming the kind on failure
pub(crate) fn read_json<T: DeserializeOwned>(kind: &ComponentKind, path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        Error::apply(
            kind.clone(),
            format!("cannot read {}: {}", path.display(), e),
        )
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::apply(
            kind.clone(),
            format!("cannot parse {}: {}", path.display(), e),
        )
    })
}

/// Snapshot directory of a restore request, or an error for kinds that need one
pub(crate) fn require_snapshot<'a>(
    kind: &ComponentKind,
    snapshot_dir: Option<&'a Path>,
) -> Result<&'a Path> {
    snapshot_dir.ok_or_else(|| {
        Error::apply(
            kind.clone(),
            "restoring this component needs a full snapshot",
        )
    })
}

/// Sorted, de-duplicated, non-empty identifiers
pub(crate) fn normalize_names(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names
}
