//! Turns raw notify events into debounced candidate paths

use indexmap::IndexMap;
use notify::{Event, EventKind};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Maximum number of entries in the debounce map before forcing a cleanup
const MAX_DEBOUNCE_ENTRIES: usize = 10_000;

/// Debounces file system events so a file being written is handed over once
pub struct EventHandler {
    /// Last time each path was handed out (insertion order keeps cleanup fair)
    recent: IndexMap<PathBuf, Instant>,

    debounce: Duration,
}

impl EventHandler {
    pub fn new(debounce_seconds: u64) -> Self {
        Self {
            recent: IndexMap::new(),
            debounce: Duration::from_secs(debounce_seconds),
        }
    }

    /// Whether an event kind can introduce a new candidate file
    pub fn is_relevant(kind: &EventKind) -> bool {
        matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
    }

    /// Paths of `event` not handed out within the debounce window
    pub fn candidates(&mut self, event: &Event) -> Vec<PathBuf> {
        if !Self::is_relevant(&event.kind) {
            return Vec::new();
        }

        let now = Instant::now();
        let mut fresh = Vec::new();

        for path in &event.paths {
            let due = self
                .recent
                .get(path)
                .is_none_or(|&last| now.duration_since(last) > self.debounce);

            if due {
                self.recent.insert(path.clone(), now);
                fresh.push(path.clone());
            }
        }

        if self.recent.len() > MAX_DEBOUNCE_ENTRIES {
            self.cleanup();
        }

        fresh
    }

    /// Drop entries older than ten debounce periods
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        let threshold = self.debounce * 10;

        self.recent
            .retain(|_, &mut last| now.duration_since(last) < threshold);
    }
}
