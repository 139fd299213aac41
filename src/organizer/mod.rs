//! Organizer engine - pattern matching, collision handling and moves
//!
//! The engine is single-threaded per call: inputs are processed strictly in
//! order, one filesystem mutation at a time. Callers sharing one `Config`
//! between a watcher and interactive actions must serialize those calls
//! themselves.

mod batch;
pub mod collision;
mod error;
pub mod executor;
pub mod matcher;

pub use batch::{FileOrganizer, destination_dir, destination_dirs};
pub use collision::{CollisionError, CollisionPolicy, Resolution};
pub use error::{BatchAborted, OrganizeError};
pub use executor::MoveOperation;
pub use matcher::Rule;

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::Config;

/// Outcome for one input file of a batch. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizeResult {
    pub source_path: PathBuf,
    /// Where the file went (or would go); `None` when no rule matched
    pub destination_path: Option<PathBuf>,
    /// True when the file was relocated (or, in dry-run, would be)
    pub moved: bool,
    /// Error text for the file that stopped the batch
    pub error: Option<String>,
    /// Whether this result was computed without touching the filesystem
    pub dry_run: bool,
}

impl OrganizeResult {
    pub(crate) fn moved(source: &Path, destination: PathBuf, dry_run: bool) -> Self {
        Self {
            source_path: source.to_path_buf(),
            destination_path: Some(destination),
            moved: true,
            error: None,
            dry_run,
        }
    }

    pub(crate) fn unmatched(source: &Path, dry_run: bool) -> Self {
        Self {
            source_path: source.to_path_buf(),
            destination_path: None,
            moved: false,
            error: None,
            dry_run,
        }
    }

    pub(crate) fn left_in_place(source: &Path, destination: PathBuf, dry_run: bool) -> Self {
        Self {
            source_path: source.to_path_buf(),
            destination_path: Some(destination),
            moved: false,
            error: None,
            dry_run,
        }
    }

    pub(crate) fn failed(
        source: &Path,
        destination: Option<PathBuf>,
        error: &OrganizeError,
        dry_run: bool,
    ) -> Self {
        Self {
            source_path: source.to_path_buf(),
            destination_path: destination,
            moved: false,
            error: Some(error.to_string()),
            dry_run,
        }
    }

    /// Short label for display
    pub fn status(&self) -> &'static str {
        match (self.moved, self.error.is_some(), self.destination_path.is_some()) {
            (_, true, _) => "failed",
            (true, _, _) if self.dry_run => "would move",
            (true, _, _) => "moved",
            (false, false, true) => "skipped",
            (false, false, false) => "no match",
        }
    }
}

/// The engine's operation set, as seen by the CLI, the TUI and the watcher
pub trait Organizer {
    /// Replace the configuration used for subsequent calls
    fn set_config(&mut self, config: Config);

    fn config(&self) -> &Config;

    /// Override `settings.dry_run` for subsequent calls
    fn set_dry_run(&mut self, dry_run: bool);

    fn is_dry_run(&self) -> bool;

    /// Append a rule (lowest priority)
    fn add_pattern(&mut self, rule: Rule);

    /// Match then move a single file
    fn organize_file(&mut self, path: &Path) -> Result<OrganizeResult, OrganizeError>;

    /// Move a file to an explicit destination path, honouring the collision policy
    fn move_file(
        &mut self,
        source: &Path,
        destination: &Path,
    ) -> Result<OrganizeResult, OrganizeError>;

    /// Move every file into `dest_dir`, without consulting the rules
    fn organize_files(
        &mut self,
        paths: &[PathBuf],
        dest_dir: &Path,
    ) -> Result<Vec<OrganizeResult>, BatchAborted>;

    /// Full pipeline: match each file, move the ones a rule claims
    fn organize_by_patterns(&mut self, paths: &[PathBuf])
    -> Result<Vec<OrganizeResult>, BatchAborted>;

    /// Expand a directory to its files and organize them by pattern
    fn organize_dir(&mut self, dir: &Path) -> Result<Vec<OrganizeResult>, BatchAborted>;

    /// Destination a file would be sent to, ignoring collisions
    fn preview(&self, path: &Path) -> Option<PathBuf>;
}

/// Builds the organizer used by the CLI and TUI.
///
/// Passed in explicitly by whoever composes the application, so tests can
/// hand in a double without any global state.
pub trait OrganizerFactory {
    fn create(&self, config: Config) -> Box<dyn Organizer>;
}

/// Production factory producing a [`FileOrganizer`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactory;

impl OrganizerFactory for DefaultFactory {
    fn create(&self, config: Config) -> Box<dyn Organizer> {
        Box::new(FileOrganizer::new(config))
    }
}

impl<F> OrganizerFactory for F
where
    F: Fn(Config) -> Box<dyn Organizer>,
{
    fn create(&self, config: Config) -> Box<dyn Organizer> {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        let src = Path::new("/in/a.txt");
        let dst = PathBuf::from("/out/a.txt");

        assert_eq!(OrganizeResult::moved(src, dst.clone(), false).status(), "moved");
        assert_eq!(
            OrganizeResult::moved(src, dst.clone(), true).status(),
            "would move"
        );
        assert_eq!(
            OrganizeResult::left_in_place(src, dst.clone(), false).status(),
            "skipped"
        );
        assert_eq!(OrganizeResult::unmatched(src, false).status(), "no match");
        assert_eq!(
            OrganizeResult::failed(src, Some(dst), &OrganizeError::EmptySource, false).status(),
            "failed"
        );
    }

    struct Recording {
        config: Config,
        calls: std::rc::Rc<std::cell::RefCell<Vec<String>>>,
    }

    impl Organizer for Recording {
        fn set_config(&mut self, config: Config) {
            self.config = config;
        }
        fn config(&self) -> &Config {
            &self.config
        }
        fn set_dry_run(&mut self, _dry_run: bool) {}
        fn is_dry_run(&self) -> bool {
            true
        }
        fn add_pattern(&mut self, rule: Rule) {
            self.config.organize.patterns.push(rule);
        }
        fn organize_file(&mut self, path: &Path) -> Result<OrganizeResult, OrganizeError> {
            self.calls.borrow_mut().push(format!("file {}", path.display()));
            Ok(OrganizeResult::unmatched(path, true))
        }
        fn move_file(
            &mut self,
            source: &Path,
            destination: &Path,
        ) -> Result<OrganizeResult, OrganizeError> {
            Ok(OrganizeResult::moved(source, destination.to_path_buf(), true))
        }
        fn organize_files(
            &mut self,
            paths: &[PathBuf],
            _dest_dir: &Path,
        ) -> Result<Vec<OrganizeResult>, BatchAborted> {
            Ok(paths.iter().map(|p| OrganizeResult::unmatched(p, true)).collect())
        }
        fn organize_by_patterns(
            &mut self,
            paths: &[PathBuf],
        ) -> Result<Vec<OrganizeResult>, BatchAborted> {
            self.calls
                .borrow_mut()
                .push(format!("patterns {}", paths.len()));
            Ok(Vec::new())
        }
        fn organize_dir(&mut self, _dir: &Path) -> Result<Vec<OrganizeResult>, BatchAborted> {
            Ok(Vec::new())
        }
        fn preview(&self, _path: &Path) -> Option<PathBuf> {
            None
        }
    }

    #[test]
    fn test_closure_factory_substitutes_engine() {
        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let shared = calls.clone();
        let factory = move |config: Config| -> Box<dyn Organizer> {
            Box::new(Recording {
                config,
                calls: shared.clone(),
            })
        };

        let mut organizer = factory.create(Config::default());
        organizer.add_pattern(Rule::new("*.txt", "docs"));
        organizer.organize_file(Path::new("a.txt")).unwrap();
        organizer
            .organize_by_patterns(&[PathBuf::from("a"), PathBuf::from("b")])
            .unwrap();

        assert_eq!(organizer.config().organize.patterns.len(), 1);
        assert_eq!(*calls.borrow(), vec!["file a.txt", "patterns 2"]);
    }

    #[test]
    fn test_default_factory_builds_file_organizer() {
        let mut config = Config::default();
        config.settings.dry_run = true;
        let organizer = DefaultFactory.create(config);
        assert!(organizer.is_dry_run());
    }
}
