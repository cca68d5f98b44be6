//! Whole-directory copies between the working tree and the cache root
//!
//! Every copy replaces the destination subtree wholesale; nothing is ever
//! merged into an existing tree. The first directory that fails aborts the
//! whole operation.

use crate::cache::directories::CacheDirectorySet;
use crate::cache::layout::CacheLayout;
use crate::error::{DepcacheError, DepcacheResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// What happened to one directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Copied in full
    Copied { files: u64, bytes: u64 },
    /// Source did not exist
    Skipped,
}

/// Per-directory result of a restore or save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub directory: String,
    pub outcome: ArchiveOutcome,
}

/// Result of a restore or save, in directory-set order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveReport {
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveReport {
    /// Number of directories copied
    pub fn count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, ArchiveOutcome::Copied { .. }))
            .count()
    }

    /// Directories whose source was missing
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == ArchiveOutcome::Skipped)
            .map(|e| e.directory.as_str())
    }

    /// Total bytes copied
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| match e.outcome {
                ArchiveOutcome::Copied { bytes, .. } => bytes,
                ArchiveOutcome::Skipped => 0,
            })
            .sum()
    }
}

/// Copy cached directories back into the working tree
pub fn restore(
    cache_root: &Path,
    working_root: &Path,
    directories: &CacheDirectorySet,
) -> DepcacheResult<ArchiveReport> {
    let layout = CacheLayout::new(cache_root);
    transfer("restore", directories, |dir| {
        (layout.cached_dir(Path::new(dir)), working_root.join(dir))
    })
}

/// Copy working-tree directories into the cache root
pub fn save(
    working_root: &Path,
    cache_root: &Path,
    directories: &CacheDirectorySet,
) -> DepcacheResult<ArchiveReport> {
    let layout = CacheLayout::new(cache_root);
    transfer("save", directories, |dir| {
        (working_root.join(dir), layout.cached_dir(Path::new(dir)))
    })
}

/// Remove everything this layout version has stored under `cache_root`
pub fn clear(cache_root: &Path) -> DepcacheResult<()> {
    let base = CacheLayout::new(cache_root).base();
    remove_path(&base).map_err(|source| DepcacheError::CacheClear { path: base.clone(), source })?;
    debug!("Cleared {}", base.display());
    Ok(())
}

fn transfer<F>(
    operation: &'static str,
    directories: &CacheDirectorySet,
    paths: F,
) -> DepcacheResult<ArchiveReport>
where
    F: Fn(&str) -> (PathBuf, PathBuf),
{
    let mut report = ArchiveReport::default();

    for dir in directories.iter() {
        let (src, dst) = paths(dir);

        let outcome = if exists(&src) {
            let stats = replace_tree(&src, &dst)
                .map_err(|e| DepcacheError::archive(operation, dir, e))?;
            info!("{}: {} ({} files)", operation, dir, stats.files);
            ArchiveOutcome::Copied {
                files: stats.files,
                bytes: stats.bytes,
            }
        } else {
            debug!("{}: {} not present, skipping", operation, dir);
            ArchiveOutcome::Skipped
        };

        report.entries.push(ArchiveEntry {
            directory: dir.to_string(),
            outcome,
        });
    }

    Ok(report)
}

fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

#[derive(Debug, Default, Clone, Copy)]
struct CopyStats {
    files: u64,
    bytes: u64,
}

/// Remove whatever is at `dst`, then copy `src` there in full
fn replace_tree(src: &Path, dst: &Path) -> io::Result<CopyStats> {
    remove_path(dst)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut stats = CopyStats::default();
    // Directory permissions are applied last so read-only dirs can be filled
    let mut dir_permissions = Vec::new();

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = if rel.as_os_str().is_empty() {
            dst.to_path_buf()
        } else {
            dst.join(rel)
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir(&target)?;
            dir_permissions.push((target, entry.metadata()?.permissions()));
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else if file_type.is_file() {
            stats.bytes += clone_file(entry.path(), &target)?;
            stats.files += 1;
        } else {
            warn!("Skipping special file {}", entry.path().display());
        }
    }

    for (dir, permissions) in dir_permissions.into_iter().rev() {
        fs::set_permissions(&dir, permissions)?;
    }

    Ok(stats)
}

fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => {
            make_owner_writable(path)?;
            fs::remove_dir_all(path)
        }
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Grant the owner rwx on every directory under `root` so its entries can be
/// unlinked
#[cfg(unix)]
fn make_owner_writable(root: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let mut permissions = entry.metadata()?.permissions();
        let mode = permissions.mode();
        if mode & 0o700 != 0o700 {
            permissions.set_mode(mode | 0o700);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_owner_writable(root: &Path) -> io::Result<()> {
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        let mut permissions = entry.metadata()?.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

/// Copy one file, preferring a copy-on-write clone. Returns the byte count.
fn clone_file(src: &Path, dst: &Path) -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        if let Some(len) = reflink(src, dst)? {
            return Ok(len);
        }
    }

    fs::copy(src, dst)
}

/// Try a FICLONE reflink. `Ok(None)` means the filesystem can't clone.
#[cfg(target_os = "linux")]
fn reflink(src: &Path, dst: &Path) -> io::Result<Option<u64>> {
    use std::os::unix::io::AsRawFd;

    // _IOW(0x94, 9, int)
    const FICLONE: libc::c_ulong = 0x4004_9409;

    let source = fs::File::open(src)?;
    let meta = source.metadata()?;
    let dest = fs::File::create(dst)?;

    // SAFETY: both descriptors are open for the duration of the call
    let rc = unsafe { libc::ioctl(dest.as_raw_fd(), FICLONE as _, source.as_raw_fd()) };
    if rc != 0 {
        drop(dest);
        fs::remove_file(dst)?;
        return Ok(None);
    }

    fs::set_permissions(dst, meta.permissions())?;
    Ok(Some(meta.len()))
}
