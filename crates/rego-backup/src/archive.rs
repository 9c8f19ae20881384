//! Archive packing and unpacking for snapshot directories.
//!
//! Snapshots are packed into a gzip-compressed tar stream whose entry names
//! are relative to the snapshot root. Unpacking validates every entry in a
//! first pass over the stream and only then extracts in a second pass, so a
//! malicious or corrupt archive is rejected before anything is written.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Component as PathComponent, Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use rego_core::{Error, Result};
use tar::{Archive, Builder as TarBuilder, EntryType};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::progress::archive_spinner;

/// Default gzip level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Extension appended to destinations given without one
pub const ARCHIVE_EXTENSION: &str = "tar.gz";

/// Counts from a pack or unpack run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub files: usize,
    pub directories: usize,
    pub symlinks: usize,
    /// Uncompressed payload bytes
    pub bytes: u64,
}

/// Result of packing a snapshot
#[derive(Debug, Clone)]
pub struct PackResult {
    pub archive_path: PathBuf,
    /// Size of the compressed archive
    pub size_bytes: u64,
    pub stats: ArchiveStats,
}

/// Packs and unpacks snapshot directories
#[derive(Debug, Clone)]
pub struct Archiver {
    compression_level: u32,
    show_progress: bool,
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver {
    pub fn new() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            show_progress: false,
        }
    }

    /// Sets the gzip level (0-9).
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Sets whether to show a spinner.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Pack `source_dir` into `dest_file`.
    ///
    /// A destination without an extension gets `.tar.gz`. The archive is
    /// streamed into a temporary file next to the destination and renamed
    /// into place when complete.
    pub fn pack(&self, source_dir: &Path, dest_file: &Path) -> Result<PackResult> {
        if !source_dir.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", source_dir.display()),
            )));
        }

        let dest_file = with_default_extension(dest_file);
        let dest_parent = dest_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dest_parent)?;

        let source_canonical = source_dir.canonicalize()?;
        if dest_parent.canonicalize()?.starts_with(&source_canonical) {
            return Err(Error::archive(format!(
                "destination {} is inside the snapshot being packed",
                dest_file.display()
            )));
        }

        let spinner = self
            .show_progress
            .then(|| archive_spinner(&format!("Packing {}...", source_dir.display())));

        let temp = tempfile::NamedTempFile::new_in(&dest_parent)?;
        let encoder = GzEncoder::new(
            BufWriter::new(temp.as_file().try_clone()?),
            Compression::new(self.compression_level),
        );
        let mut tar = TarBuilder::new(encoder);
        tar.follow_symlinks(false);

        let mut stats = ArchiveStats::default();
        for entry in WalkDir::new(source_dir)
            .follow_links(false)
            .min_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let rel_path = entry.path().strip_prefix(source_dir).map_err(|_| {
                Error::archive(format!("{} escaped the source tree", entry.path().display()))
            })?;
            let file_type = entry.file_type();

            if file_type.is_dir() {
                tar.append_dir(rel_path, entry.path())?;
                stats.directories += 1;
            } else if file_type.is_file() {
                tar.append_path_with_name(entry.path(), rel_path)?;
                stats.files += 1;
                stats.bytes += entry.metadata()?.len();
            } else if file_type.is_symlink() {
                tar.append_path_with_name(entry.path(), rel_path)?;
                stats.symlinks += 1;
            } else {
                warn!("Skipping special file {}", entry.path().display());
                continue;
            }

            if let Some(spinner) = &spinner {
                spinner.set_message(format!("Packing {}", rel_path.display()));
            }
        }

        let writer = tar.into_inner()?.finish()?;
        writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))?
            .sync_all()?;
        temp.persist(&dest_file).map_err(|e| Error::Io(e.error))?;

        let size_bytes = fs::metadata(&dest_file)?.len();
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        info!(
            "Packed {} files ({} bytes) into {}",
            stats.files,
            stats.bytes,
            dest_file.display()
        );

        Ok(PackResult {
            archive_path: dest_file,
            size_bytes,
            stats,
        })
    }

    /// Unpack `archive_file` into `dest_dir`, which must be missing or empty.
    ///
    /// Any entry that is absolute, contains `..`, is a hard link, is a symlink
    /// pointing outside the destination, or sits beneath a symlink fails the
    /// whole operation before a single file is written. Symlink targets may
    /// only name another symlink as their last component, so chains cannot
    /// climb out through a link.
    pub fn unpack(&self, archive_file: &Path, dest_dir: &Path) -> Result<ArchiveStats> {
        let plan = validate_archive(archive_file)?;
        debug!(
            "Validated {} entries in {}",
            plan.len(),
            archive_file.display()
        );

        if dest_dir.exists() && fs::read_dir(dest_dir)?.next().is_some() {
            return Err(Error::TargetDirectory {
                path: dest_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "destination is not empty",
                ),
            });
        }
        fs::create_dir_all(dest_dir).map_err(|source| Error::TargetDirectory {
            path: dest_dir.to_path_buf(),
            source,
        })?;

        let spinner = self
            .show_progress
            .then(|| archive_spinner(&format!("Unpacking {}...", archive_file.display())));

        let mut archive = open_archive(archive_file)?;
        let mut stats = ArchiveStats::default();
        for (index, entry) in archive.entries().map_err(corrupt)?.enumerate() {
            let mut entry = entry.map_err(corrupt)?;
            let Some(planned) = plan.get(index) else {
                return Err(Error::archive("archive changed while unpacking"));
            };
            let Some(rel_path) = &planned.path else {
                continue;
            };
            let target = dest_dir.join(rel_path);

            match planned.kind {
                PlannedKind::Directory => {
                    fs::create_dir_all(&target)?;
                    stats.directories += 1;
                }
                PlannedKind::File => {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    entry.unpack(&target).map_err(corrupt)?;
                    stats.files += 1;
                    stats.bytes += entry.header().size().unwrap_or(0);
                }
                PlannedKind::Symlink => {
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    if let Some(link) = &planned.link_target {
                        std::os::unix::fs::symlink(link, &target)?;
                        stats.symlinks += 1;
                    }
                }
                PlannedKind::Skip => {}
            }

            if let Some(spinner) = &spinner {
                spinner.set_message(format!("Unpacking {}", rel_path.display()));
            }
        }

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        info!(
            "Unpacked {} files into {}",
            stats.files,
            dest_dir.display()
        );
        Ok(stats)
    }

    /// Relative entry paths in archive order, without extracting
    pub fn inspect(&self, archive_file: &Path) -> Result<Vec<PathBuf>> {
        Ok(validate_archive(archive_file)?
            .into_iter()
            .filter_map(|p| p.path)
            .collect())
    }
}

/// Append `.tar.gz` to a path that has no extension
pub fn with_default_extension(path: &Path) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(ARCHIVE_EXTENSION);
        PathBuf::from(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlannedKind {
    Directory,
    File,
    Symlink,
    Skip,
}

/// Validated entry, in archive order
#[derive(Debug, Clone)]
struct PlannedEntry {
    /// `None` for the archive root entry (`./`)
    path: Option<PathBuf>,
    kind: PlannedKind,
    link_target: Option<PathBuf>,
}

fn open_archive(archive_file: &Path) -> Result<Archive<GzDecoder<BufReader<File>>>> {
    let file = File::open(archive_file)?;
    Ok(Archive::new(GzDecoder::new(BufReader::new(file))))
}

fn corrupt(e: std::io::Error) -> Error {
    Error::archive(format!("malformed archive: {}", e))
}

/// First pass: read every header and reject anything unsafe
fn validate_archive(archive_file: &Path) -> Result<Vec<PlannedEntry>> {
    let mut archive = open_archive(archive_file)?;
    let mut plan = Vec::new();
    let mut symlinks: HashSet<PathBuf> = HashSet::new();

    for entry in archive.entries().map_err(corrupt)? {
        let entry = entry.map_err(corrupt)?;
        let raw_path = entry.path().map_err(corrupt)?.into_owned();
        let rel_path = relative_entry_path(&raw_path)?;

        if let Some(rel) = &rel_path {
            if let Some(link) = rel.ancestors().find(|a| symlinks.contains(*a)) {
                return Err(Error::archive(format!(
                    "entry '{}' is beneath symlink '{}'",
                    raw_path.display(),
                    link.display()
                )));
            }
        }

        let entry_type = entry.header().entry_type();
        let (kind, link_target) = match entry_type {
            EntryType::Directory => (PlannedKind::Directory, None),
            EntryType::Regular | EntryType::Continuous => (PlannedKind::File, None),
            EntryType::Symlink => {
                let Some(rel) = &rel_path else {
                    return Err(Error::archive("archive root cannot be a symlink"));
                };
                let target = entry
                    .link_name()
                    .map_err(corrupt)?
                    .ok_or_else(|| Error::archive(format!("symlink '{}' has no target", rel.display())))?
                    .into_owned();
                check_symlink_target(rel, &target, &symlinks)?;
                symlinks.insert(rel.clone());
                (PlannedKind::Symlink, Some(target))
            }
            EntryType::XGlobalHeader => (PlannedKind::Skip, None),
            EntryType::Link => {
                return Err(Error::archive(format!(
                    "hard link '{}' is not allowed",
                    raw_path.display()
                )))
            }
            other => {
                return Err(Error::archive(format!(
                    "entry '{}' has unsupported type {:?}",
                    raw_path.display(),
                    other
                )))
            }
        };

        plan.push(PlannedEntry {
            path: rel_path,
            kind,
            link_target,
        });
    }

    // Drain to the gzip trailer so a truncated stream is caught here
    let mut decoder = archive.into_inner();
    std::io::copy(&mut decoder, &mut std::io::sink()).map_err(corrupt)?;

    // Links recorded later in the stream can change how earlier entries resolve
    for planned in &plan {
        let Some(rel) = &planned.path else {
            continue;
        };
        if let Some(link) = rel.ancestors().skip(1).find(|a| symlinks.contains(*a)) {
            return Err(Error::archive(format!(
                "entry '{}' is beneath symlink '{}'",
                rel.display(),
                link.display()
            )));
        }
        if let Some(target) = &planned.link_target {
            check_symlink_target(rel, target, &symlinks)?;
        }
    }

    Ok(plan)
}

/// Normalize an entry name to a path below the destination root.
///
/// Returns `None` for the root itself.
fn relative_entry_path(path: &Path) -> Result<Option<PathBuf>> {
    let mut rel = PathBuf::new();
    for component in path.components() {
        match component {
            PathComponent::Normal(part) => rel.push(part),
            PathComponent::CurDir => {}
            PathComponent::ParentDir => {
                return Err(Error::archive(format!(
                    "entry '{}' escapes the destination directory",
                    path.display()
                )))
            }
            PathComponent::RootDir | PathComponent::Prefix(_) => {
                return Err(Error::archive(format!(
                    "entry '{}' has an absolute path",
                    path.display()
                )))
            }
        }
    }
    Ok((!rel.as_os_str().is_empty()).then_some(rel))
}

/// A symlink at `link_path` pointing at `target` must stay below the root
/// without resolving through any path in `symlinks` on the way
fn check_symlink_target(
    link_path: &Path,
    target: &Path,
    symlinks: &HashSet<PathBuf>,
) -> Result<()> {
    let escapes = || {
        Error::archive(format!(
            "symlink '{}' points outside the destination ({})",
            link_path.display(),
            target.display()
        ))
    };

    let mut depth: Vec<&std::ffi::OsStr> = link_path
        .parent()
        .map(|p| p.iter().collect())
        .unwrap_or_default();

    let mut components = target.components().peekable();
    while let Some(component) = components.next() {
        match component {
            PathComponent::Normal(part) => {
                depth.push(part);
                if components.peek().is_some() {
                    let prefix: PathBuf = depth.iter().collect();
                    if symlinks.contains(&prefix) {
                        return Err(Error::archive(format!(
                            "symlink '{}' resolves through symlink '{}'",
                            link_path.display(),
                            prefix.display()
                        )));
                    }
                }
            }
            PathComponent::CurDir => {}
            PathComponent::ParentDir => {
                if depth.pop().is_none() {
                    return Err(escapes());
                }
            }
            PathComponent::RootDir | PathComponent::Prefix(_) => return Err(escapes()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_snapshot(base: &Path) {
        fs::write(base.join("manifest.json"), r#"{"schema_version":"1.0"}"#).unwrap();
        fs::write(base.join("flatpak.json"), "[]").unwrap();
        fs::create_dir_all(base.join("dotfiles/.config/fish")).unwrap();
        fs::write(base.join("dotfiles/.bashrc"), "export EDITOR=vim\n").unwrap();
        fs::write(
            base.join("dotfiles/.config/fish/config.fish"),
            "set -x PATH $PATH\n",
        )
        .unwrap();
        fs::create_dir_all(base.join("fonts/empty-family")).unwrap();
        let big: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(base.join("fonts/Inter.ttf"), big).unwrap();
    }

    fn file_set(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
        let mut files: Vec<_> = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                (
                    e.path().strip_prefix(root).unwrap().to_path_buf(),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    /// Archive with a single file entry whose raw name bypasses tar's own checks
    fn write_raw_archive(path: &Path, name: &[u8], data: &[u8]) {
        let file = File::create(path).unwrap();
        let mut builder = TarBuilder::new(GzEncoder::new(file, Compression::default()));

        let mut ok_header = tar::Header::new_gnu();
        ok_header.set_path("harmless.txt").unwrap();
        ok_header.set_size(2);
        ok_header.set_mode(0o644);
        ok_header.set_cksum();
        builder.append(&ok_header, &b"ok"[..]).unwrap();

        let mut header = tar::Header::new_gnu();
        header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        builder.append(&header, data).unwrap();

        builder.into_inner().unwrap().finish().unwrap().flush().unwrap();
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let source = TempDir::new().unwrap();
        create_snapshot(source.path());
        let out = TempDir::new().unwrap();

        let archiver = Archiver::new();
        let packed = archiver
            .pack(source.path(), &out.path().join("snap.tar.gz"))
            .unwrap();
        assert_eq!(packed.stats.files, 5);
        assert!(packed.size_bytes > 0);

        let dest = out.path().join("restored");
        let stats = archiver.unpack(&packed.archive_path, &dest).unwrap();
        assert_eq!(stats.files, 5);
        assert_eq!(file_set(source.path()), file_set(&dest));
        assert!(dest.join("fonts/empty-family").is_dir());
    }

    #[test]
    fn test_entries_are_relative() {
        let source = TempDir::new().unwrap();
        create_snapshot(source.path());
        let out = TempDir::new().unwrap();

        let archiver = Archiver::new();
        let packed = archiver.pack(source.path(), &out.path().join("a")).unwrap();
        assert_eq!(packed.archive_path, out.path().join("a.tar.gz"));

        let entries = archiver.inspect(&packed.archive_path).unwrap();
        assert!(entries.contains(&PathBuf::from("manifest.json")));
        assert!(entries.contains(&PathBuf::from("dotfiles/.bashrc")));
        assert!(entries.iter().all(|p| p.is_relative()));
    }

    #[test]
    fn test_rejects_parent_escape_without_writing() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar.gz");
        write_raw_archive(&archive, b"../../etc/passwd", b"root::0:0::/:/bin/sh\n");

        let dest = temp.path().join("a/b/dest");
        let err = Archiver::new().unpack(&archive, &dest).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity { .. }));
        assert!(!dest.exists());
        assert!(!temp.path().join("etc/passwd").exists());
        assert!(!temp.path().join("a/etc/passwd").exists());
    }

    #[test]
    fn test_rejects_absolute_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("abs.tar.gz");
        write_raw_archive(&archive, b"/tmp/rego-owned", b"x");

        let dest = temp.path().join("dest");
        let err = Archiver::new().unpack(&archive, &dest).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_symlinks_round_trip_and_escapes_rejected() {
        let source = TempDir::new().unwrap();
        create_snapshot(source.path());
        std::os::unix::fs::symlink(".bashrc", source.path().join("dotfiles/.bashrc-link"))
            .unwrap();
        let out = TempDir::new().unwrap();
        let archiver = Archiver::new();

        let packed = archiver.pack(source.path(), &out.path().join("ok.tar.gz")).unwrap();
        assert_eq!(packed.stats.symlinks, 1);
        let dest = out.path().join("ok");
        archiver.unpack(&packed.archive_path, &dest).unwrap();
        assert_eq!(
            fs::read_link(dest.join("dotfiles/.bashrc-link")).unwrap(),
            PathBuf::from(".bashrc")
        );

        std::os::unix::fs::symlink("../../../etc", source.path().join("dotfiles/escape"))
            .unwrap();
        let packed = archiver.pack(source.path(), &out.path().join("bad.tar.gz")).unwrap();
        let dest = out.path().join("bad");
        assert!(matches!(
            archiver.unpack(&packed.archive_path, &dest),
            Err(Error::ArchiveIntegrity { .. })
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_garbage_file_is_integrity_failure() {
        let out = TempDir::new().unwrap();
        let archive = out.path().join("t.tar.gz");
        fs::write(&archive, b"this is not a gzip stream at all").unwrap();

        let dest = out.path().join("t");
        let err = Archiver::new().unpack(&archive, &dest).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_refuses_destination_inside_source() {
        let source = TempDir::new().unwrap();
        create_snapshot(source.path());
        let err = Archiver::new()
            .pack(source.path(), &source.path().join("self.tar.gz"))
            .unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity { .. }));
    }

    #[test]
    fn test_refuses_non_empty_destination() {
        let source = TempDir::new().unwrap();
        create_snapshot(source.path());
        let out = TempDir::new().unwrap();
        let packed = Archiver::new()
            .pack(source.path(), &out.path().join("s.tar.gz"))
            .unwrap();

        let dest = out.path().join("busy");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("keep.txt"), "mine").unwrap();
        assert!(Archiver::new().unpack(&packed.archive_path, &dest).is_err());
        assert_eq!(fs::read_to_string(dest.join("keep.txt")).unwrap(), "mine");
    }

    /// Archive of `(name, entry type, link target)` entries with no payload
    fn write_link_archive(path: &Path, entries: &[(&str, EntryType, Option<&str>)]) {
        let file = File::create(path).unwrap();
        let mut builder = TarBuilder::new(GzEncoder::new(file, Compression::default()));
        for (name, entry_type, target) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_path(name).unwrap();
            header.set_entry_type(*entry_type);
            header.set_size(0);
            header.set_mode(0o755);
            if let Some(target) = target {
                header.set_link_name(target).unwrap();
            }
            header.set_cksum();
            builder.append(&header, std::io::empty()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap().flush().unwrap();
    }

    #[test]
    fn test_rejects_symlink_chain_escape() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("secret"), "outside").unwrap();
        let archive = temp.path().join("chain.tar.gz");
        write_link_archive(
            &archive,
            &[
                ("p/", EntryType::Directory, None),
                ("p/q", EntryType::Symlink, Some("..")),
                ("fonts", EntryType::Symlink, Some("p/q/..")),
            ],
        );

        let dest = temp.path().join("dest");
        let err = Archiver::new().unpack(&archive, &dest).unwrap_err();
        assert!(matches!(err, Error::ArchiveIntegrity { .. }));
        assert!(!dest.exists());
    }

    #[test]
    fn test_rejects_chain_through_later_symlink() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("late.tar.gz");
        write_link_archive(
            &archive,
            &[
                ("p/", EntryType::Directory, None),
                ("repositories", EntryType::Symlink, Some("p/q/../../etc")),
                ("p/q", EntryType::Symlink, Some("..")),
            ],
        );

        let dest = temp.path().join("dest");
        assert!(matches!(
            Archiver::new().unpack(&archive, &dest),
            Err(Error::ArchiveIntegrity { .. })
        ));
        assert!(!dest.exists());
    }

    #[test]
    fn test_symlink_to_symlink_is_allowed() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("alias.tar.gz");
        write_link_archive(
            &archive,
            &[
                ("dotfiles/", EntryType::Directory, None),
                ("dotfiles/.vimrc", EntryType::Symlink, Some(".vimrc.local")),
                ("dotfiles/.vimrc-alias", EntryType::Symlink, Some(".vimrc")),
            ],
        );

        let dest = temp.path().join("dest");
        let stats = Archiver::new().unpack(&archive, &dest).unwrap();
        assert_eq!(stats.symlinks, 2);
    }

    #[test]
    fn test_check_symlink_target() {
        let none = HashSet::new();
        assert!(check_symlink_target(Path::new("a/b/link"), Path::new("../c"), &none).is_ok());
        assert!(check_symlink_target(Path::new("a/link"), Path::new("../../x"), &none).is_err());
        assert!(check_symlink_target(Path::new("link"), Path::new("/etc/passwd"), &none).is_err());

        let links: HashSet<PathBuf> = [PathBuf::from("p/q")].into_iter().collect();
        assert!(check_symlink_target(Path::new("fonts"), Path::new("p/q/.."), &links).is_err());
        assert!(check_symlink_target(Path::new("fonts"), Path::new("p/q"), &links).is_ok());
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(
            with_default_extension(Path::new("/tmp/backup")),
            PathBuf::from("/tmp/backup.tar.gz")
        );
        assert_eq!(
            with_default_extension(Path::new("/tmp/backup.tgz")),
            PathBuf::from("/tmp/backup.tgz")
        );
    }
}
