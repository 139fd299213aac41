//! Sortd - pattern-driven file organizer
//!
//! Classifies loose files by name and moves them into a target directory
//! tree according to user-defined rules, from the command line or a TUI.

pub mod analysis;
pub mod app;
pub mod config;
pub mod organizer;
pub mod theme;
pub mod watcher;

pub use config::{Config, Settings};
pub use organizer::{
    BatchAborted, CollisionPolicy, DefaultFactory, FileOrganizer, OrganizeError, OrganizeResult,
    Organizer, OrganizerFactory, Rule,
};
pub use theme::Theme;
pub use watcher::Watcher;

use regex::Regex;
use std::sync::LazyLock;

/// Current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Expand a leading `~` and environment variables (`$VAR`, `${VAR}`) in a path.
///
/// Rule destinations, `target_dir` and watch paths all go through here.
pub fn expand_path(path: &std::path::Path) -> std::path::PathBuf {
    let home_relative = path
        .strip_prefix("~")
        .ok()
        .zip(dirs::home_dir())
        .map(|(rest, home)| {
            if rest.as_os_str().is_empty() {
                home
            } else {
                home.join(rest)
            }
        });

    match home_relative {
        Some(p) => expand_env(&p),
        None => expand_env(path),
    }
}

/// Substitute `$VAR` / `${VAR}`; unknown variables are left as written
fn expand_env(path: &std::path::Path) -> std::path::PathBuf {
    static VAR: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\$(?:\{([^}]+)\}|([A-Za-z_][A-Za-z0-9_]*))").expect("variable pattern compiles")
    });

    // Leave non-UTF-8 paths untouched rather than lossily rewriting them
    let Some(s) = path.to_str() else {
        return path.to_path_buf();
    };
    if !s.contains('$') {
        return path.to_path_buf();
    }

    let expanded = VAR.replace_all(s, |caps: &regex::Captures| {
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        std::env::var(name).unwrap_or_else(|_| caps[0].to_string())
    });

    std::path::PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_expand_home() {
        let expanded = expand_path(Path::new("~/Downloads"));
        if dirs::home_dir().is_some() {
            assert!(!expanded.to_string_lossy().contains('~'));
        }
    }

    #[test]
    fn test_plain_paths_untouched() {
        assert_eq!(
            expand_path(Path::new("documents/")),
            PathBuf::from("documents/")
        );
        assert_eq!(
            expand_path(Path::new("/srv/$SORTD_SURELY_UNSET_VAR/x")),
            PathBuf::from("/srv/$SORTD_SURELY_UNSET_VAR/x")
        );
    }

    #[test]
    fn test_expand_env_var() {
        let Ok(path) = std::env::var("PATH") else {
            return;
        };
        assert_eq!(
            expand_path(Path::new("${PATH}")),
            PathBuf::from(path)
        );
    }
}
