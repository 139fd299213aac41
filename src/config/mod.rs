//! Configuration management

mod schema;

pub use schema::{Config, GeneralConfig, OrganizeConfig, Settings, WatchConfig};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::organizer::matcher;

/// A structurally valid TOML file that still can't drive the organizer
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pattern #{index}: glob is empty")]
    EmptyGlob { index: usize },

    #[error("pattern #{index}: invalid glob {glob:?}: {source}")]
    InvalidGlob {
        index: usize,
        glob: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("pattern #{index}: destination is empty")]
    EmptyDestination { index: usize },

    #[error("pattern #{index}: empty string in {field}")]
    EmptyAffix { index: usize, field: &'static str },

    #[error("watch #{index}: path is empty")]
    EmptyWatchPath { index: usize },
}

impl Config {
    /// Load configuration from a file or default location, then validate it
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(Self::default_path)
            .context("Could not determine config path")?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config = Self::parse(&content).with_context(|| {
                format!("Invalid config in {}", config_path.display())
            })?;

            Ok(config)
        } else {
            tracing::debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Check everything serde can't: globs compile, destinations are set
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, rule) in self.organize.patterns.iter().enumerate() {
            let index = i + 1;
            if rule.glob.is_empty() {
                return Err(ConfigError::EmptyGlob { index });
            }
            matcher::validate_glob(&rule.glob).map_err(|source| ConfigError::InvalidGlob {
                index,
                glob: rule.glob.clone(),
                source,
            })?;
            if rule.destination.as_os_str().is_empty() {
                return Err(ConfigError::EmptyDestination { index });
            }
            if rule.prefixes.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyAffix {
                    index,
                    field: "prefixes",
                });
            }
            if rule.suffixes.iter().any(String::is_empty) {
                return Err(ConfigError::EmptyAffix {
                    index,
                    field: "suffixes",
                });
            }
        }

        for (i, watch) in self.watches.iter().enumerate() {
            if watch.path.as_os_str().is_empty() {
                return Err(ConfigError::EmptyWatchPath { index: i + 1 });
            }
        }

        Ok(())
    }

    /// Save configuration to a file (with advisory file locking)
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(Self::default_path)
            .context("Could not determine config path")?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        // Use a lockfile to prevent concurrent writes
        let lock_path = config_path.with_extension("toml.lock");
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

        use fs2::FileExt;
        lock_file
            .lock_exclusive()
            .with_context(|| "Failed to acquire config file lock")?;

        let result = std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {}", config_path.display()));

        let _ = lock_file.unlock();

        result
    }

    /// Get the default config file path
    /// Uses the platform config directory (via dirs::config_dir), falling back to ~/.config
    pub fn default_path() -> Option<PathBuf> {
        let config_base =
            dirs::config_dir().or_else(|| dirs::home_dir().map(|d| d.join(".config")))?;
        Some(config_base.join("sortd").join("config.toml"))
    }

    /// Default log file for the TUI
    pub fn default_log_file() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("sortd")
            .join("sortd.log")
    }
}
