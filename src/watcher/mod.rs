//! File system watcher feeding newly observed files to the organizer

mod handler;

pub use handler::EventHandler;

use anyhow::{Context, Result};
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::organizer::{self, OrganizeResult, Organizer};

/// A watched root and whether its subdirectories count
#[derive(Debug, Clone)]
struct WatchedRoot {
    path: PathBuf,
    recursive: bool,
}

/// Watches directories and hands new files to an [`Organizer`]
pub struct Watcher {
    watcher: RecommendedWatcher,
    rx: mpsc::Receiver<Result<notify::Event, notify::Error>>,
    event_handler: EventHandler,
    roots: Vec<WatchedRoot>,
    files_processed: u64,
}

impl Watcher {
    /// Create a new watcher with the given polling interval and debounce duration
    pub fn new(polling_interval_secs: u64, debounce_seconds: u64) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let watcher = RecommendedWatcher::new(
            move |res| {
                if let Err(e) = tx.send(res) {
                    error!("Failed to send watch event: {}", e);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(polling_interval_secs)),
        )?;

        Ok(Self {
            watcher,
            rx,
            event_handler: EventHandler::new(debounce_seconds),
            roots: Vec::new(),
            files_processed: 0,
        })
    }

    /// Start watching a directory
    pub fn watch(&mut self, path: &Path, recursive: bool) -> Result<()> {
        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        self.watcher
            .watch(path, mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.roots.push(WatchedRoot {
            path: canonical,
            recursive,
        });
        info!("Watching: {} (recursive: {})", path.display(), recursive);
        Ok(())
    }

    /// Stop watching a directory
    pub fn unwatch(&mut self, path: &Path) -> Result<()> {
        self.watcher.unwatch(path)?;
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.roots.retain(|r| r.path != canonical);
        info!("Stopped watching: {}", path.display());
        Ok(())
    }

    /// Watched directories
    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|r| r.path.as_path())
    }

    /// Drain pending events (non-blocking)
    pub fn poll(&self) -> Vec<notify::Event> {
        let mut events = Vec::new();

        while let Ok(result) = self.rx.try_recv() {
            match result {
                Ok(event) => events.push(event),
                Err(e) => error!("Watch error: {}", e),
            }
        }

        events
    }

    /// Debounced regular files from `events` that aren't already in a rule destination
    pub fn candidates(&mut self, events: &[notify::Event], config: &crate::Config) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut paths = Vec::new();

        for event in events {
            debug!("Event: {:?}", event.kind);
            for path in self.event_handler.candidates(event) {
                if !path.is_file() || !seen.insert(path.clone()) {
                    continue;
                }
                if self.in_destination(&path, config) {
                    debug!("Ignoring file inside a destination: {}", path.display());
                    continue;
                }
                paths.push(path);
            }
        }

        self.event_handler.cleanup();
        paths
    }

    /// Whether `path` sits inside a rule destination of the root that covers it
    fn in_destination(&self, path: &Path, config: &crate::Config) -> bool {
        let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let Some(root) = self.root_for(&canonical) else {
            return false;
        };
        organizer::destination_dirs(config, &root.path)
            .iter()
            .any(|dest| canonical.starts_with(dest))
    }

    /// Deepest watched root containing `path`
    fn root_for(&self, path: &Path) -> Option<&WatchedRoot> {
        self.roots
            .iter()
            .filter(|r| {
                path.starts_with(&r.path) && (r.recursive || path.parent() == Some(r.path.as_path()))
            })
            .max_by_key(|r| r.path.as_os_str().len())
    }

    /// Organize already-polled events.
    ///
    /// Each candidate goes through its own `organize_by_patterns` call, so one
    /// failing file doesn't hold back unrelated events.
    pub fn process_polled_events(
        &mut self,
        events: Vec<notify::Event>,
        organizer: &mut dyn Organizer,
    ) -> Vec<OrganizeResult> {
        let paths = self.candidates(&events, organizer.config());
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            if organizer.preview(&path).as_deref() == Some(path.as_path()) {
                debug!("Already filed: {}", path.display());
                continue;
            }
            info!("File event detected: {}", path.display());
            match organizer.organize_by_patterns(std::slice::from_ref(&path)) {
                Ok(batch) => results.extend(batch),
                Err(aborted) if aborted.error.is_not_found() => {
                    debug!("File disappeared before processing: {}", path.display());
                }
                Err(aborted) => {
                    error!("Organizing {} failed: {}", path.display(), aborted.error);
                    results.extend(aborted.completed);
                }
            }
        }

        self.files_processed += results.iter().filter(|r| r.moved).count() as u64;
        results
    }

    /// Poll and process in one go
    pub fn process_events(&mut self, organizer: &mut dyn Organizer) -> Vec<OrganizeResult> {
        let events = self.poll();
        if events.is_empty() {
            return Vec::new();
        }
        self.process_polled_events(events, organizer)
    }

    /// Total number of files moved through this watcher
    pub fn files_processed(&self) -> u64 {
        self.files_processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::organizer::{FileOrganizer, Rule};
    use notify::EventKind;
    use notify::event::CreateKind;

    fn created(path: &Path) -> notify::Event {
        notify::Event::new(EventKind::Create(CreateKind::File)).add_path(path.to_path_buf())
    }

    #[test]
    fn test_polled_events_are_organized() {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        let file = root.join("a.txt");
        std::fs::write(&file, "x").unwrap();

        let mut config = crate::Config::default();
        config.organize.patterns = vec![Rule::new("*.txt", "documents")];
        let mut organizer = FileOrganizer::new(config);

        let mut watcher = Watcher::new(1, 0).unwrap();
        watcher.watch(&root, true).unwrap();

        let results = watcher.process_polled_events(vec![created(&file)], &mut organizer);

        assert_eq!(results.len(), 1);
        assert!(results[0].moved);
        assert!(root.join("documents").join("a.txt").exists());
        assert_eq!(watcher.files_processed(), 1);

        // The move itself shows up as a create inside the destination
        let moved = root.join("documents").join("a.txt");
        let results = watcher.process_polled_events(vec![created(&moved)], &mut organizer);
        assert!(results.is_empty());
    }

    #[test]
    fn test_subdirectory_moves_are_not_renested() {
        let dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(dir.path()).unwrap();
        let sub = root.join("sub");
        std::fs::create_dir(&sub).unwrap();
        let file = sub.join("a.txt");
        std::fs::write(&file, "x").unwrap();

        let mut config = crate::Config::default();
        config.organize.patterns = vec![Rule::new("*.txt", "documents")];
        let mut organizer = FileOrganizer::new(config);

        let mut watcher = Watcher::new(1, 0).unwrap();
        watcher.watch(&root, true).unwrap();

        let results = watcher.process_polled_events(vec![created(&file)], &mut organizer);
        let moved = sub.join("documents").join("a.txt");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].destination_path.as_deref(), Some(moved.as_path()));

        // The create event for the moved file lands outside root/documents
        let results = watcher.process_polled_events(vec![created(&moved)], &mut organizer);
        assert!(results.is_empty());
        assert!(moved.exists());
        assert!(!sub.join("documents").join("documents").exists());
        assert_eq!(watcher.files_processed(), 1);
    }

    #[test]
    fn test_vanished_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut organizer = FileOrganizer::new(crate::Config::default());
        let mut watcher = Watcher::new(1, 0).unwrap();

        let gone = dir.path().join("gone.txt");
        let results = watcher.process_polled_events(vec![created(&gone)], &mut organizer);
        assert!(results.is_empty());
    }
}
