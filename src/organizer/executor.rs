//! Move execution - performs (or, in dry-run, only checks) one relocation

use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::OrganizeError;
use crate::config::Settings;

/// One planned relocation. Lives only for the duration of a single move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOperation {
    pub source: PathBuf,
    /// Path computed from the rule or caller, before collision handling
    pub desired_destination: PathBuf,
    /// Path chosen by the collision resolver
    pub actual_destination: PathBuf,
}

impl MoveOperation {
    pub fn new(source: impl Into<PathBuf>, desired: impl Into<PathBuf>) -> Self {
        let desired = desired.into();
        Self {
            source: source.into(),
            actual_destination: desired.clone(),
            desired_destination: desired,
        }
    }

    /// Whether collision handling picked a different name
    pub fn was_renamed(&self) -> bool {
        self.desired_destination != self.actual_destination
    }
}

/// Check that `source` is a readable regular file.
///
/// Runs identically for dry-run and live moves.
pub fn check_source(source: &Path) -> Result<(), OrganizeError> {
    if source.as_os_str().is_empty() {
        return Err(OrganizeError::EmptySource);
    }

    let metadata = match fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(OrganizeError::SourceNotFound(source.to_path_buf()));
        }
        Err(e) => {
            return Err(OrganizeError::SourceUnreadable {
                path: source.to_path_buf(),
                source: e,
            });
        }
    };

    if metadata.is_dir() {
        return Err(OrganizeError::SourceIsDirectory(source.to_path_buf()));
    }

    File::open(source).map_err(|e| OrganizeError::SourceUnreadable {
        path: source.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

/// Run one move under `settings`.
///
/// Every check is made in both modes; only the writes are gated on
/// `settings.dry_run`, so a preview reports exactly what a live run would do.
pub fn execute(op: &MoveOperation, settings: &Settings) -> Result<(), OrganizeError> {
    execute_with(op, settings, |p| p.exists())
}

/// [`execute`] with the destination existence check supplied by the caller,
/// for batches that account for moves made earlier in the same call
pub fn execute_with(
    op: &MoveOperation,
    settings: &Settings,
    exists: impl Fn(&Path) -> bool,
) -> Result<(), OrganizeError> {
    check_source(&op.source)?;

    let dest = &op.actual_destination;
    let dest_dir = parent_dir(dest);

    if !dest_dir.is_dir() {
        if dest_dir.exists() {
            return Err(OrganizeError::NotADirectory(dest_dir.to_path_buf()));
        }
        if !settings.create_dirs {
            return Err(OrganizeError::DestinationDirMissing(dest_dir.to_path_buf()));
        }
        if settings.dry_run {
            debug!("[dry-run] would create {}", dest_dir.display());
        } else {
            fs::create_dir_all(dest_dir).map_err(|e| OrganizeError::CreateDirFailed {
                path: dest_dir.to_path_buf(),
                source: e,
            })?;
            debug!("Created directory {}", dest_dir.display());
        }
    }

    // The resolver already steered around existing names, so this only
    // triggers when something appeared in between.
    let overwrite = exists(dest);
    if overwrite && !settings.backup {
        return Err(OrganizeError::DestinationExists(dest.clone()));
    }

    if settings.dry_run {
        info!(
            "[dry-run] {} -> {}",
            op.source.display(),
            dest.display()
        );
        return Ok(());
    }

    if overwrite {
        let backup = backup_existing(dest)?;
        info!("Backed up {} -> {}", dest.display(), backup.display());
    }

    relocate(&op.source, dest)?;
    info!("Moved {} -> {}", op.source.display(), dest.display());
    Ok(())
}

/// Copy an existing file to `<name>.bak` (or `<name>.bak.N`) beside it
pub fn backup_existing(path: &Path) -> Result<PathBuf, OrganizeError> {
    let backup = backup_path(path, |p| p.exists());
    fs::copy(path, &backup).map_err(|e| OrganizeError::io("back up", path, e))?;
    Ok(backup)
}

fn backup_path(path: &Path, exists: impl Fn(&Path) -> bool) -> PathBuf {
    let name = path.file_name().map(OsString::from).unwrap_or_default();

    let mut first = name.clone();
    first.push(".bak");
    let candidate = path.with_file_name(&first);
    if !exists(&candidate) {
        return candidate;
    }

    let mut n: u64 = 1;
    loop {
        let mut numbered = first.clone();
        numbered.push(format!(".{n}"));
        let candidate = path.with_file_name(&numbered);
        if !exists(&candidate) {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}

/// Rename, falling back to copy-then-remove across filesystems
fn relocate(src: &Path, dest: &Path) -> Result<(), OrganizeError> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            debug!(
                "Cross-filesystem move, copying instead: {} -> {}",
                src.display(),
                dest.display()
            );
            copy_then_remove(src, dest)
        }
        Err(e) => Err(OrganizeError::io("move", src, e)),
    }
}

fn copy_then_remove(src: &Path, dest: &Path) -> Result<(), OrganizeError> {
    let dest_dir = parent_dir(dest);
    let tmp = temp_path(dest_dir);

    let copied = fs::copy(src, &tmp).and_then(|_| File::open(&tmp)?.sync_all());
    if let Err(e) = copied {
        let _ = fs::remove_file(&tmp);
        let kind = e.kind();
        return Err(if kind == io::ErrorKind::PermissionDenied {
            OrganizeError::io("write", dest_dir, e)
        } else {
            OrganizeError::io("copy", src, e)
        });
    }

    if let Err(e) = fs::rename(&tmp, dest) {
        let _ = fs::remove_file(&tmp);
        return Err(OrganizeError::io("move", dest, e));
    }

    if let Err(e) = fs::remove_file(src) {
        // Don't leave two copies behind
        if let Err(cleanup) = fs::remove_file(dest) {
            warn!(
                "Failed to remove copy {} after source removal failed: {}",
                dest.display(),
                cleanup
            );
        }
        return Err(OrganizeError::io("remove", src, e));
    }

    Ok(())
}

fn temp_path(dir: &Path) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    dir.join(format!(".sortd.{}.{}.tmp", std::process::id(), nanos))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

fn is_cross_device(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }
    #[cfg(unix)]
    if e.raw_os_error() == Some(libc::EXDEV) {
        return true;
    }
    // ERROR_NOT_SAME_DEVICE
    #[cfg(windows)]
    if e.raw_os_error() == Some(17) {
        return true;
    }
    false
}
