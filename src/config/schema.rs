//! Configuration schema

use crate::organizer::{CollisionPolicy, Rule};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// General application settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Organizer behaviour
    #[serde(default)]
    pub settings: Settings,

    /// Ordered organization rules
    #[serde(default)]
    pub organize: OrganizeConfig,

    /// Watched folders
    #[serde(default, rename = "watch", skip_serializing_if = "Vec::is_empty")]
    pub watches: Vec<WatchConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to log file (used by the TUI so logs don't scribble over the screen)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Seconds to wait before handing a changed file to the organizer again
    #[serde(default = "default_debounce")]
    pub debounce_seconds: u64,

    /// Polling interval in seconds for watching file changes
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,

    /// Theme name
    #[serde(default)]
    pub theme: Option<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            debounce_seconds: default_debounce(),
            polling_interval_secs: default_polling_interval(),
            theme: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_debounce() -> u64 {
    2
}

fn default_polling_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

/// How the organizer treats the filesystem.
///
/// Unknown `collision` values fail deserialization, so inside the engine the
/// policy is always one of the three known strategies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Compute and report decisions without touching the filesystem
    #[serde(default)]
    pub dry_run: bool,

    /// Create missing destination directories (with parents)
    #[serde(default = "default_true")]
    pub create_dirs: bool,

    /// Copy an existing destination aside before it is replaced
    #[serde(default)]
    pub backup: bool,

    /// What to do when the destination already exists
    #[serde(default)]
    pub collision: CollisionPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dry_run: false,
            create_dirs: true,
            backup: false,
            collision: CollisionPolicy::default(),
        }
    }
}

/// Pattern list and destination root
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OrganizeConfig {
    /// Root that relative rule destinations are resolved against.
    /// When unset they are resolved against each file's own directory.
    #[serde(default)]
    pub target_dir: Option<PathBuf>,

    /// Descend into subdirectories when organizing a whole directory
    #[serde(default)]
    pub recursive: bool,

    /// Rules in priority order; first match wins
    #[serde(default)]
    pub patterns: Vec<Rule>,
}

/// Configuration for a watched folder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchConfig {
    /// Path to watch
    pub path: PathBuf,

    /// Watch subdirectories recursively
    #[serde(default)]
    pub recursive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            [[organize.patterns]]
            glob = "*.txt"
            destination = "documents"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.organize.patterns.len(), 1);
        assert_eq!(config.settings, Settings::default());
        assert!(config.settings.create_dirs);
        assert_eq!(config.settings.collision, CollisionPolicy::Rename);
        assert!(config.watches.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [general]
            log_level = "debug"
            debounce_seconds = 5

            [settings]
            dry_run = true
            create_dirs = false
            backup = true
            collision = "fail"

            [organize]
            target_dir = "~/Sorted"
            recursive = true

            [[organize.patterns]]
            match = "Screenshot*"
            prefixes = ["Screenshot"]
            suffixes = ["_edit"]
            target = "images/screens"

            [[organize.patterns]]
            glob = "*.pdf"
            dest_dir = "documents"

            [[watch]]
            path = "~/Downloads"
            recursive = true
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.debounce_seconds, 5);
        assert!(config.settings.dry_run);
        assert!(!config.settings.create_dirs);
        assert!(config.settings.backup);
        assert_eq!(config.settings.collision, CollisionPolicy::Fail);
        assert_eq!(config.organize.target_dir, Some(PathBuf::from("~/Sorted")));
        assert!(config.organize.recursive);
        assert_eq!(config.organize.patterns.len(), 2);
        assert_eq!(config.organize.patterns[0].glob, "Screenshot*");
        assert_eq!(
            config.organize.patterns[1].destination,
            PathBuf::from("documents")
        );
        assert_eq!(config.watches.len(), 1);
        assert!(config.watches[0].recursive);
    }

    #[test]
    fn test_unknown_collision_policy_rejected() {
        let toml = r#"
            [settings]
            collision = "overwrite"
        "#;

        assert!(toml::from_str::<Config>(toml).is_err());
    }
}
