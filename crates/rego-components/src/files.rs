//! File-tree helpers for the copy-based kinds (dotfiles, fonts, repositories)

use std::fs;
use std::path::{Component as PathComponent, Path, PathBuf};

use rego_core::Result;
use tracing::debug;
use walkdir::WalkDir;

/// Relative paths of every regular file under `root`, sorted.
///
/// Symlinks are not followed. A missing root yields an empty list.
pub(crate) fn relative_files(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_string_lossy().into_owned());
        }
    }
    Ok(files)
}

/// Whether `relative` stays beneath the directory it is joined to
pub(crate) fn is_safe_relative(relative: &str) -> bool {
    let path = Path::new(relative);
    !relative.is_empty()
        && path
            .components()
            .all(|c| matches!(c, PathComponent::Normal(_) | PathComponent::CurDir))
}

/// Copy `src` to `dst`, creating parent directories and keeping permissions
pub(crate) fn copy_file(src: &Path, dst: &Path) -> Result<u64> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let bytes = fs::copy(src, dst)?;
    debug!("Copied {} -> {} ({} bytes)", src.display(), dst.display(), bytes);
    Ok(bytes)
}

/// Entries of `wanted` that exist as files under `root`
pub(crate) fn existing_under(root: &Path, wanted: &[String]) -> Vec<String> {
    wanted
        .iter()
        .filter(|relative| is_safe_relative(relative) && root.join(relative).is_file())
        .cloned()
        .collect()
}

/// `root/relative`, rejecting paths that would leave `root`
pub(crate) fn resolve_under(root: &Path, relative: &str) -> Option<PathBuf> {
    is_safe_relative(relative).then(|| root.join(relative))
}
