//! TUI Application module

mod events;
mod state;
mod ui;

pub use state::AppState;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::organizer::OrganizerFactory;
use crate::theme::Theme;
use crate::watcher::Watcher;

/// Run the TUI browsing `dir`, with every action going through an organizer
/// built by `factory`
pub async fn run(config: Config, dir: PathBuf, factory: &dyn OrganizerFactory) -> Result<()> {
    let theme = Theme::load(&config);
    let mut embedded_watcher = if config.watches.is_empty() {
        None
    } else {
        match create_embedded_watcher(&config) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::error!("Failed to start embedded watcher: {}", e);
                None
            }
        }
    };

    let mut state = AppState::new(factory.create(config), dir, theme);
    if let Some(watcher) = &embedded_watcher {
        let roots = watcher.roots().count();
        state.set_status(format!("Watching {} folder(s)", roots));
    }

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut state, &mut embedded_watcher);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    embedded_watcher: &mut Option<Watcher>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, state))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            events::handle_key(state, key);
        }

        // Watcher events share the organizer with interactive actions; both
        // run on this loop so calls never overlap
        if let Some(watcher) = embedded_watcher {
            let events = watcher.poll();
            if !events.is_empty() {
                let results = watcher.process_polled_events(events, state.organizer.as_mut());
                if !results.is_empty() {
                    tracing::info!("Watcher handled {} file(s)", results.len());
                    state.record_results(&results);
                    state.refresh();
                }
            }
        }

        state.tick();

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

/// Watcher over every configured watch folder
pub(crate) fn create_embedded_watcher(config: &Config) -> Result<Watcher> {
    let mut watcher = Watcher::new(
        config.general.polling_interval_secs,
        config.general.debounce_seconds,
    )?;

    for watch in &config.watches {
        let expanded_path = crate::expand_path(&watch.path);
        if let Err(e) = watcher.watch(&expanded_path, watch.recursive) {
            tracing::error!("Failed to watch {}: {}", expanded_path.display(), e);
        }
    }

    Ok(watcher)
}
