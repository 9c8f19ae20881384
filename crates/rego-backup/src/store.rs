//! Snapshot store: one self-contained directory per backup.
//!
//! ```text
//! ~/.config/rego/backups/
//!   2026-10-18_093012/
//!     manifest.json
//!     flatpak.json
//!     dotfiles/...
//!   2026-10-18_093012.lock
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use fs4::fs_std::FileExt;
use rego_core::{Error, RegoPaths, Result, SnapshotManifest, MANIFEST_FILE};
use tracing::{debug, warn};

/// Directory name format for new snapshots
const SNAPSHOT_DIR_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Persists and enumerates snapshot manifests under a root directory
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.config/rego/backups`, or `$REGO_BACKUP_DIR` when set
    pub fn default_location() -> Result<PathBuf> {
        Ok(RegoPaths::resolve()?.with_backup_dir(None).backups_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a fresh timestamped snapshot directory under the root
    pub fn new_snapshot_dir(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|source| Error::TargetDirectory {
            path: self.root.clone(),
            source,
        })?;

        let base = Local::now().format(SNAPSHOT_DIR_FORMAT).to_string();
        let mut candidate = self.root.join(&base);
        let mut suffix = 2;
        loop {
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    debug!("Created snapshot directory {}", candidate.display());
                    return Ok(candidate);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = self.root.join(format!("{}-{}", base, suffix));
                    suffix += 1;
                }
                Err(source) => {
                    return Err(Error::TargetDirectory {
                        path: candidate,
                        source,
                    })
                }
            }
        }
    }

    /// Write `manifest` into its snapshot directory.
    ///
    /// The file is written to a temporary name and renamed so a reader never
    /// sees a half-written manifest.
    pub fn save(&self, manifest: &SnapshotManifest) -> Result<PathBuf> {
        let dir = &manifest.backup_path;
        fs::create_dir_all(dir).map_err(|source| Error::TargetDirectory {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(MANIFEST_FILE);
        let json = manifest.to_json()?;
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        debug!("Wrote manifest {}", path.display());
        Ok(path)
    }

    /// Load and validate the manifest at `path` (a snapshot directory or the
    /// manifest file itself).
    ///
    /// `backup_path` is rewritten to the directory the manifest was found in,
    /// so imported or moved snapshots resolve their payloads locally.
    pub fn load(&self, path: &Path) -> Result<SnapshotManifest> {
        let (dir, file) = resolve_manifest_path(path);
        let content = fs::read_to_string(&file).map_err(|e| {
            Error::manifest_invalid(&file, format!("cannot read manifest: {}", e))
        })?;
        let mut manifest = SnapshotManifest::from_json(&content, &file)?;
        manifest.backup_path = dir;
        Ok(manifest)
    }

    /// All valid snapshots under the root, newest first.
    ///
    /// Subdirectories without a readable, supported manifest are skipped.
    pub fn list(&self) -> Result<Vec<SnapshotManifest>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut manifests = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            match self.load(&entry.path()) {
                Ok(manifest) => manifests.push(manifest),
                Err(e) => warn!("Skipping {}: {}", entry.path().display(), e),
            }
        }

        manifests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(manifests)
    }
}

/// Snapshot directory and manifest file for a user-supplied path
pub fn resolve_manifest_path(path: &Path) -> (PathBuf, PathBuf) {
    if path.is_dir() {
        (path.to_path_buf(), path.join(MANIFEST_FILE))
    } else {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (dir, path.to_path_buf())
    }
}

/// Exclusive lock serializing runs against one snapshot directory.
///
/// Held on the sibling file `<dir>.lock` and released when dropped.
#[derive(Debug)]
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Block until the lock for `dir` is acquired
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = lock_path(dir);
        let locked = |message: String| Error::Locked {
            path: path.clone(),
            message,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| locked(e.to_string()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| locked(e.to_string()))?;

        debug!("Waiting for lock {}", path.display());
        FileExt::lock_exclusive(&file).map_err(|e| locked(e.to_string()))?;

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn lock_path(dir: &Path) -> PathBuf {
    match dir.file_name() {
        Some(name) => {
            let mut lock_name = name.to_os_string();
            lock_name.push(".lock");
            dir.with_file_name(lock_name)
        }
        None => dir.join(".rego.lock"),
    }
}
