//! Application state management

use std::collections::{BTreeSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::analysis::{self, FileKind};
use crate::organizer::{BatchAborted, OrganizeResult, Organizer};
use crate::theme::Theme;

/// Maximum number of activity log entries kept in memory
const MAX_LOG_ENTRIES: usize = 1000;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Browsing the file list
    #[default]
    Normal,
    /// Help dialog
    Help,
    /// Typing the directory to move the selection into
    MoveTarget,
    /// Confirming a whole-directory run
    ConfirmOrganizeDir,
}

/// A candidate file in the browsed directory
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    /// Advisory content type, for display only
    pub kind: FileKind,
    /// Where the rules would send this file
    pub preview: Option<PathBuf>,
}

/// A log entry for activity tracking
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Local>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Main application state
pub struct AppState {
    /// Current input mode
    pub mode: Mode,

    /// Engine every action goes through
    pub organizer: Box<dyn Organizer>,

    /// Directory being browsed
    pub dir: PathBuf,

    /// Regular files of `dir`, sorted by name
    pub entries: Vec<FileEntry>,

    /// Index of the row under the cursor
    pub cursor: usize,

    /// Paths picked with space
    pub selected: BTreeSet<PathBuf>,

    /// Current theme
    pub theme: Theme,

    /// Activity log entries
    pub log_entries: VecDeque<LogEntry>,

    /// Text typed into the move-target prompt
    pub input: String,

    /// Status message to display
    pub status_message: Option<String>,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Animation frame counter
    pub frame: u64,
}

impl AppState {
    /// Create a new application state browsing `dir`
    pub fn new(organizer: Box<dyn Organizer>, dir: PathBuf, theme: Theme) -> Self {
        let mut state = Self {
            mode: Mode::default(),
            organizer,
            dir,
            entries: Vec::new(),
            cursor: 0,
            selected: BTreeSet::new(),
            theme,
            log_entries: VecDeque::new(),
            input: String::new(),
            status_message: None,
            should_quit: false,
            frame: 0,
        };

        state.log(LogLevel::Info, "Sortd started");
        state.log(
            LogLevel::Info,
            format!(
                "Loaded {} patterns, collision policy: {}",
                state.organizer.config().organize.patterns.len(),
                state.organizer.config().settings.collision
            ),
        );
        state.refresh();
        state
    }

    /// Re-read the directory listing, keeping the cursor in range
    pub fn refresh(&mut self) {
        let mut entries = Vec::new();
        match std::fs::read_dir(&self.dir) {
            Ok(rd) => {
                for entry in rd.flatten() {
                    let path = entry.path();
                    if !entry.file_type().is_ok_and(|ft| ft.is_file()) {
                        continue;
                    }
                    entries.push(FileEntry {
                        name: entry.file_name().to_string_lossy().to_string(),
                        kind: analysis::sniff(&path),
                        preview: self.organizer.preview(&path),
                        path,
                    });
                }
            }
            Err(e) => {
                self.log(
                    LogLevel::Error,
                    format!("Cannot read {}: {}", self.dir.display(), e),
                );
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        self.selected
            .retain(|p| entries.iter().any(|e| &e.path == p));
        self.entries = entries;
        if self.cursor >= self.entries.len() {
            self.cursor = self.entries.len().saturating_sub(1);
        }
    }

    /// Entry under the cursor
    pub fn current(&self) -> Option<&FileEntry> {
        self.entries.get(self.cursor)
    }

    pub fn cursor_down(&mut self) {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.entries.len().saturating_sub(1);
    }

    /// Toggle selection of the entry under the cursor and advance
    pub fn toggle_selected(&mut self) {
        let Some(path) = self.current().map(|e| e.path.clone()) else {
            return;
        };
        if !self.selected.remove(&path) {
            self.selected.insert(path);
        }
        self.cursor_down();
    }

    /// Select everything, or clear the selection if everything is selected
    pub fn toggle_select_all(&mut self) {
        if self.selected.len() == self.entries.len() {
            self.selected.clear();
        } else {
            self.selected = self.entries.iter().map(|e| e.path.clone()).collect();
        }
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.selected.contains(path)
    }

    /// Files an action applies to: the selection, or the cursor row if nothing is selected.
    /// Listing order is kept so results line up with what the user sees.
    pub fn action_targets(&self) -> Vec<PathBuf> {
        if self.selected.is_empty() {
            return self.current().map(|e| vec![e.path.clone()]).unwrap_or_default();
        }
        self.entries
            .iter()
            .filter(|e| self.selected.contains(&e.path))
            .map(|e| e.path.clone())
            .collect()
    }

    /// Organize the targeted files by pattern
    pub fn organize_selection(&mut self) {
        let targets = self.action_targets();
        if targets.is_empty() {
            self.set_status("Nothing to organize");
            return;
        }
        let outcome = self.organizer.organize_by_patterns(&targets);
        self.finish_batch(outcome);
    }

    /// Move the targeted files into the directory typed at the prompt
    pub fn move_selection(&mut self) {
        let input = std::mem::take(&mut self.input);
        let dest = input.trim();
        if dest.is_empty() {
            self.set_status("No destination given");
            return;
        }
        let dest = PathBuf::from(dest);
        let dest = if dest.is_relative() && !dest.starts_with("~") {
            self.dir.join(dest)
        } else {
            dest
        };

        let targets = self.action_targets();
        let outcome = self.organizer.organize_files(&targets, &dest);
        self.finish_batch(outcome);
    }

    /// Organize every file in the browsed directory
    pub fn organize_dir(&mut self) {
        let dir = self.dir.clone();
        let outcome = self.organizer.organize_dir(&dir);
        self.finish_batch(outcome);
    }

    pub fn toggle_dry_run(&mut self) {
        let dry_run = !self.organizer.is_dry_run();
        self.organizer.set_dry_run(dry_run);
        let msg = if dry_run {
            "Dry-run enabled: actions are previewed only"
        } else {
            "Dry-run disabled: actions move files"
        };
        self.log(LogLevel::Warning, msg);
        self.set_status(msg);
    }

    /// Log a batch outcome, refresh the listing and clear the selection
    pub fn finish_batch(&mut self, outcome: Result<Vec<OrganizeResult>, BatchAborted>) {
        match outcome {
            Ok(results) => {
                let moved = results.iter().filter(|r| r.moved).count();
                self.record_results(&results);
                self.set_status(format!(
                    "{} {} of {} file(s)",
                    if self.organizer.is_dry_run() {
                        "Would move"
                    } else {
                        "Moved"
                    },
                    moved,
                    results.len()
                ));
            }
            Err(aborted) => {
                self.record_results(&aborted.completed);
                self.set_status(format!(
                    "Stopped after {} move(s): {}",
                    aborted.moved_count(),
                    aborted.error
                ));
            }
        }
        self.selected.clear();
        self.refresh();
    }

    /// One log line per result; errors are shown verbatim beside the path
    pub fn record_results(&mut self, results: &[OrganizeResult]) {
        for r in results {
            let src = r.source_path.display();
            let (level, message) = match (&r.error, &r.destination_path) {
                (Some(err), _) => (LogLevel::Error, format!("{}: {}", src, err)),
                (None, Some(dst)) if r.moved => (
                    LogLevel::Success,
                    format!("{} {} → {}", r.status(), src, dst.display()),
                ),
                (None, Some(dst)) if *dst == r.source_path => {
                    (LogLevel::Info, format!("{} already in place", src))
                }
                (None, Some(dst)) => (
                    LogLevel::Warning,
                    format!("skipped {} ({} exists)", src, dst.display()),
                ),
                (None, None) => (LogLevel::Info, format!("no rule for {}", src)),
            };
            self.log(level, message);
        }
    }

    /// Add a log entry
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log_entries.push_back(LogEntry {
            timestamp: chrono::Local::now(),
            level,
            message: message.into(),
        });

        // Keep log bounded
        while self.log_entries.len() > MAX_LOG_ENTRIES {
            self.log_entries.pop_front();
        }
    }

    /// Set a temporary status message
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    /// Increment frame counter
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::organizer::{FileOrganizer, Rule};
    use std::fs;

    fn state(dir: &Path) -> AppState {
        let mut config = Config::default();
        config.organize.patterns = vec![Rule::new("*.txt", "documents")];
        AppState::new(
            Box::new(FileOrganizer::new(config)),
            dir.to_path_buf(),
            Theme::default(),
        )
    }

    #[test]
    fn test_listing_and_cursor() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.bin"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let mut state = state(dir.path());
        let names: Vec<_> = state.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.bin", "b.txt"]);
        assert!(state.entries[0].preview.is_none());
        assert_eq!(
            state.entries[1].preview,
            Some(dir.path().join("documents").join("b.txt"))
        );

        state.cursor_up();
        assert_eq!(state.cursor, 0);
        state.cursor_down();
        state.cursor_down();
        assert_eq!(state.cursor, 1);
    }

    #[test]
    fn test_selection_targets() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        let mut state = state(dir.path());

        assert_eq!(state.action_targets(), vec![dir.path().join("a.txt")]);

        state.toggle_selected();
        state.toggle_selected();
        assert_eq!(
            state.action_targets(),
            vec![dir.path().join("a.txt"), dir.path().join("b.txt")]
        );

        state.toggle_select_all();
        assert_eq!(state.selected.len(), 3);
        state.toggle_select_all();
        assert!(state.selected.is_empty());
    }

    #[test]
    fn test_organize_selection_moves_and_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::write(dir.path().join("z.bin"), "").unwrap();
        let mut state = state(dir.path());

        state.toggle_select_all();
        state.organize_selection();

        assert!(dir.path().join("documents").join("a.txt").exists());
        assert_eq!(state.entries.len(), 1);
        assert!(state.selected.is_empty());
        assert!(
            state
                .log_entries
                .iter()
                .any(|e| e.level == LogLevel::Info && e.message.contains("no rule"))
        );
    }

    #[test]
    fn test_dry_run_toggle_previews_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        let mut state = state(dir.path());

        state.toggle_dry_run();
        state.organize_selection();

        assert!(dir.path().join("a.txt").exists());
        assert!(
            state
                .status_message
                .as_deref()
                .is_some_and(|s| s.starts_with("Would move 1"))
        );
    }

    #[test]
    fn test_move_selection_relative_to_browsed_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), "").unwrap();
        let mut state = state(dir.path());

        state.input = "picked".to_string();
        state.move_selection();

        assert!(dir.path().join("picked").join("a.bin").exists());
        assert!(state.input.is_empty());
    }
}
