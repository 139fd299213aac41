//! Pattern matching - decides which rule (if any) claims a file name

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

// Compiled globs are cached per thread.
// Capped at 1000 entries; cleared entirely when the cap is exceeded.
const CACHE_MAX_ENTRIES: usize = 1000;

std::thread_local! {
    static GLOB_CACHE: std::cell::RefCell<HashMap<String, Option<glob::Pattern>>> =
        std::cell::RefCell::new(HashMap::new());
}

/// Hidden names are ordinary names here, so `*` also matches `.bashrc`
const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A configured pattern mapped to a destination directory.
///
/// Order in the configured list matters: the first satisfying rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Glob matched against the file's base name
    #[serde(alias = "match")]
    pub glob: String,

    /// Base name must start with one of these (ignored when empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,

    /// Name without its extension must end with one of these (ignored when empty)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suffixes: Vec<String>,

    /// Directory the file is moved into
    #[serde(alias = "target", alias = "dest_dir")]
    pub destination: PathBuf,
}

impl Rule {
    /// Create a rule with just a glob and a destination
    pub fn new(glob: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            glob: glob.into(),
            prefixes: Vec::new(),
            suffixes: Vec::new(),
            destination: destination.into(),
        }
    }

    /// Builder: add an accepted name prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    /// Builder: add an accepted stem suffix
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffixes.push(suffix.into());
        self
    }

    /// Check if a base name satisfies this rule
    pub fn matches(&self, file_name: &str) -> bool {
        if !check_glob(file_name, &self.glob) {
            return false;
        }

        if !self.prefixes.is_empty() && !self.prefixes.iter().any(|p| file_name.starts_with(p)) {
            return false;
        }

        if !self.suffixes.is_empty() {
            let stem = stem_of(file_name);
            if !self.suffixes.iter().any(|s| stem.ends_with(s)) {
                return false;
            }
        }

        true
    }
}

/// Return the first rule whose conditions all hold for `file_name`
pub fn match_rule<'a>(file_name: &str, rules: &'a [Rule]) -> Option<&'a Rule> {
    let found = rules.iter().find(|rule| rule.matches(file_name));
    if found.is_none() {
        trace!("No rule matched {}", file_name);
    }
    found
}

/// Destination directory of the first matching rule
pub fn match_destination<'a>(file_name: &str, rules: &'a [Rule]) -> Option<&'a Path> {
    match_rule(file_name, rules).map(|rule| rule.destination.as_path())
}

/// Check that a glob expression compiles
pub fn validate_glob(pattern: &str) -> Result<(), glob::PatternError> {
    glob::Pattern::new(pattern).map(|_| ())
}

/// Name before the last extension; dotfiles without another dot keep their full name
fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

fn check_glob(file_name: &str, pattern: &str) -> bool {
    GLOB_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if cache.len() >= CACHE_MAX_ENTRIES && !cache.contains_key(pattern) {
            cache.clear();
        }
        let compiled = cache
            .entry(pattern.to_string())
            .or_insert_with(|| match glob::Pattern::new(pattern) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("Ignoring invalid glob {:?}: {}", pattern, e);
                    None
                }
            });
        compiled
            .as_ref()
            .is_some_and(|p| p.matches_with(file_name, MATCH_OPTIONS))
    })
}
