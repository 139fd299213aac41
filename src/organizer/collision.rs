//! Collision resolution - what to do when the destination path is taken
//!
//! Policy:
//! - Rename: pick `name (n).ext` for the first free n >= 1.
//! - Skip: leave the file at its source; not an error.
//! - Fail: report the destination as already existing.
//!
//! The existence check is injected so resolution can be exercised without
//! touching the filesystem.

use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

use super::OrganizeError;

/// Upper bound on `name (n)` candidates tried before giving up
const MAX_TRIES: u32 = 10_000;

/// Strategy applied when a computed destination already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append a numeric disambiguator before the extension
    #[default]
    Rename,
    /// Leave the source where it is
    Skip,
    /// Abort with an "already exists" error
    Fail,
}

impl CollisionPolicy {
    pub fn all() -> &'static [CollisionPolicy] {
        &[
            CollisionPolicy::Rename,
            CollisionPolicy::Skip,
            CollisionPolicy::Fail,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionPolicy::Rename => "rename",
            CollisionPolicy::Skip => "skip",
            CollisionPolicy::Fail => "fail",
        }
    }
}

impl std::fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CollisionPolicy::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| format!("unknown collision policy {:?} (expected rename, skip or fail)", s))
    }
}

/// Outcome of resolving one destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Write the file at this path
    Proceed(PathBuf),
    /// Leave the file at its source
    Skip,
}

/// Destination conflicts the resolver can't settle on its own
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollisionError {
    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("no free name left for {0}")]
    NoFreeName(PathBuf),
}

impl CollisionError {
    /// Attach the file being moved
    pub fn for_source(self, source: &Path) -> OrganizeError {
        match self {
            CollisionError::AlreadyExists(destination) => OrganizeError::AlreadyExists {
                source_path: source.to_path_buf(),
                destination,
            },
            CollisionError::NoFreeName(dest) => OrganizeError::NoFreeName(dest),
        }
    }
}

/// Decide the final write path for `dest` under `policy`.
///
/// When `exists(dest)` is false the result is always `Proceed(dest)`.
pub fn resolve(
    dest: &Path,
    policy: CollisionPolicy,
    exists: impl Fn(&Path) -> bool,
) -> Result<Resolution, CollisionError> {
    if !exists(dest) {
        return Ok(Resolution::Proceed(dest.to_path_buf()));
    }

    match policy {
        CollisionPolicy::Fail => Err(CollisionError::AlreadyExists(dest.to_path_buf())),
        CollisionPolicy::Skip => {
            debug!("Destination taken, skipping: {}", dest.display());
            Ok(Resolution::Skip)
        }
        CollisionPolicy::Rename => {
            let renamed = disambiguate(dest, &exists)?;
            debug!(
                "Destination taken, renaming: {} -> {}",
                dest.display(),
                renamed.display()
            );
            Ok(Resolution::Proceed(renamed))
        }
    }
}

/// Find the first `stem (n).ext` next to `dest` that `exists` reports free
fn disambiguate(dest: &Path, exists: &impl Fn(&Path) -> bool) -> Result<PathBuf, CollisionError> {
    let name = dest
        .file_name()
        .ok_or_else(|| CollisionError::NoFreeName(dest.to_path_buf()))?;
    let base = Path::new(name);
    let stem = base.file_stem().unwrap_or(name);
    let ext = base.extension();

    for n in 1..=MAX_TRIES {
        let mut candidate_name = OsString::from(stem);
        candidate_name.push(format!(" ({n})"));
        if let Some(ext) = ext {
            candidate_name.push(".");
            candidate_name.push(ext);
        }

        let candidate = dest.with_file_name(&candidate_name);
        if !exists(&candidate) {
            return Ok(candidate);
        }
        trace!("Candidate also taken: {}", candidate.display());
    }

    Err(CollisionError::NoFreeName(dest.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn taken(paths: &[&str]) -> impl Fn(&Path) -> bool {
        let set: HashSet<PathBuf> = paths.iter().map(PathBuf::from).collect();
        move |p: &Path| set.contains(p)
    }

    #[test]
    fn test_free_destination_unchanged_under_every_policy() {
        let dest = Path::new("/out/a.txt");
        for policy in CollisionPolicy::all() {
            let res = resolve(dest, *policy, taken(&[])).unwrap();
            assert_eq!(res, Resolution::Proceed(dest.to_path_buf()));
        }
    }

    #[test]
    fn test_fail_policy() {
        let err = resolve(
            Path::new("/out/a.txt"),
            CollisionPolicy::Fail,
            taken(&["/out/a.txt"]),
        )
        .unwrap_err();
        assert_eq!(err, CollisionError::AlreadyExists(PathBuf::from("/out/a.txt")));
        assert!(err.to_string().contains("already exists"));

        let err = err.for_source(Path::new("/in/a.txt"));
        assert!(matches!(err, OrganizeError::AlreadyExists { .. }));
        assert!(err.to_string().contains("/in/a.txt"));
    }

    #[test]
    fn test_skip_policy() {
        let res = resolve(
            Path::new("/out/a.txt"),
            CollisionPolicy::Skip,
            taken(&["/out/a.txt"]),
        )
        .unwrap();
        assert_eq!(res, Resolution::Skip);
    }

    #[test]
    fn test_rename_policy_increments_until_free() {
        let res = resolve(
            Path::new("/out/a.txt"),
            CollisionPolicy::Rename,
            taken(&["/out/a.txt", "/out/a (1).txt", "/out/a (2).txt"]),
        )
        .unwrap();
        assert_eq!(res, Resolution::Proceed(PathBuf::from("/out/a (3).txt")));
    }

    #[test]
    fn test_rename_names_without_extension() {
        let res = resolve(
            Path::new("/out/.hidden"),
            CollisionPolicy::Rename,
            taken(&["/out/.hidden"]),
        )
        .unwrap();
        assert_eq!(res, Resolution::Proceed(PathBuf::from("/out/.hidden (1)")));

        let res = resolve(
            Path::new("/out/Makefile"),
            CollisionPolicy::Rename,
            taken(&["/out/Makefile"]),
        )
        .unwrap();
        assert_eq!(res, Resolution::Proceed(PathBuf::from("/out/Makefile (1)")));
    }

    #[test]
    fn test_rename_splits_at_last_dot() {
        let res = resolve(
            Path::new("/out/archive.tar.gz"),
            CollisionPolicy::Rename,
            taken(&["/out/archive.tar.gz"]),
        )
        .unwrap();
        assert_eq!(
            res,
            Resolution::Proceed(PathBuf::from("/out/archive.tar (1).gz"))
        );
    }

    #[test]
    fn test_rename_gives_up_eventually() {
        let err = resolve(
            Path::new("/out/a.txt"),
            CollisionPolicy::Rename,
            |_: &Path| true,
        )
        .unwrap_err();
        assert!(matches!(err, CollisionError::NoFreeName(_)));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("skip".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Skip));
        assert_eq!(CollisionPolicy::Fail.to_string(), "fail");
        assert!("overwrite".parse::<CollisionPolicy>().is_err());
    }
}
