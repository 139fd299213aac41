//! Error types for the organizer engine

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::OrganizeResult;

/// Failure while organizing a single file.
///
/// Every variant carries the path(s) involved so callers can show the
/// message verbatim beside the offending file.
#[derive(Debug, Error)]
pub enum OrganizeError {
    #[error("source path is empty")]
    EmptySource,

    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("source is a directory, expected a file: {0}")]
    SourceIsDirectory(PathBuf),

    #[error("cannot read source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination already exists: {destination} (source: {source_path})")]
    AlreadyExists {
        source_path: PathBuf,
        destination: PathBuf,
    },

    #[error("destination directory missing: {0} (enable settings.create_dirs)")]
    DestinationDirMissing(PathBuf),

    #[error("cannot create destination directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("permission denied while trying to {op} {path}")]
    PermissionDenied {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to overwrite {0} without settings.backup")]
    DestinationExists(PathBuf),

    #[error("no free name left for {0}")]
    NoFreeName(PathBuf),

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrganizeError {
    /// Classify an I/O failure, splitting permission problems out of the generic case
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::PermissionDenied {
            OrganizeError::PermissionDenied { op, path, source }
        } else {
            OrganizeError::Io { op, path, source }
        }
    }

    /// Whether the underlying cause is a vanished file
    pub fn is_not_found(&self) -> bool {
        match self {
            OrganizeError::SourceNotFound(_) => true,
            OrganizeError::Io { source, .. } => source.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// A batch stopped at its first failing file.
///
/// Files processed before the failure stay where they were moved; there is
/// no rollback across files. `completed` holds their results followed by the
/// result of the failing file.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct BatchAborted {
    pub completed: Vec<OrganizeResult>,
    #[source]
    pub error: OrganizeError,
}

impl BatchAborted {
    /// Number of files actually moved before the abort
    pub fn moved_count(&self) -> usize {
        self.completed.iter().filter(|r| r.moved).count()
    }
}
