//! Event handling for the TUI

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::state::{AppState, Mode};

/// Handle a key event and update state
pub fn handle_key(state: &mut AppState, key: KeyEvent) {
    // Handle mode-specific input first
    match state.mode {
        Mode::Help => {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')
            ) {
                state.mode = Mode::Normal;
            }
            return;
        }
        Mode::MoveTarget => {
            handle_move_target_key(state, key);
            return;
        }
        Mode::ConfirmOrganizeDir => {
            handle_confirm_key(state, key);
            return;
        }
        Mode::Normal => {}
    }

    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Char('q')) => {
            state.should_quit = true;
        }
        (_, KeyCode::Char('?')) | (_, KeyCode::F(1)) => {
            state.mode = Mode::Help;
        }
        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => state.cursor_down(),
        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => state.cursor_up(),
        (_, KeyCode::Home) | (_, KeyCode::Char('g')) => state.cursor_home(),
        (_, KeyCode::End) | (_, KeyCode::Char('G')) => state.cursor_end(),
        (_, KeyCode::Char(' ')) => state.toggle_selected(),
        (_, KeyCode::Char('a')) => state.toggle_select_all(),
        (_, KeyCode::Char('o')) | (_, KeyCode::Enter) => state.organize_selection(),
        (_, KeyCode::Char('m')) => {
            if state.action_targets().is_empty() {
                state.set_status("Nothing selected");
            } else {
                state.input.clear();
                state.mode = Mode::MoveTarget;
            }
        }
        (_, KeyCode::Char('O')) => {
            state.mode = Mode::ConfirmOrganizeDir;
        }
        (_, KeyCode::Char('d')) => state.toggle_dry_run(),
        (_, KeyCode::Char('r')) => {
            state.refresh();
            state.set_status("Refreshed");
        }
        (_, KeyCode::Char('t')) => {
            state.theme = state.theme.next();
            state.set_status(format!("Theme: {}", state.theme.name()));
        }
        (_, KeyCode::Esc) => {
            state.selected.clear();
            state.clear_status();
        }
        _ => {}
    }
}

fn handle_move_target_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            state.input.clear();
            state.mode = Mode::Normal;
        }
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            state.move_selection();
        }
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Char(c) => {
            state.input.push(c);
        }
        _ => {}
    }
}

fn handle_confirm_key(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            state.mode = Mode::Normal;
            state.organize_dir();
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            state.mode = Mode::Normal;
            state.set_status("Cancelled");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::organizer::{FileOrganizer, Rule};
    use crate::theme::Theme;
    use std::fs;

    fn press(state: &mut AppState, code: KeyCode) {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn state(dir: &std::path::Path) -> AppState {
        let mut config = Config::default();
        config.organize.patterns = vec![Rule::new("*.txt", "documents")];
        AppState::new(
            Box::new(FileOrganizer::new(config)),
            dir.to_path_buf(),
            Theme::default(),
        )
    }

    #[test]
    fn test_move_prompt_flow() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.bin"), "").unwrap();
        let mut state = state(dir.path());

        press(&mut state, KeyCode::Char('m'));
        assert_eq!(state.mode, Mode::MoveTarget);
        for c in "outx".chars() {
            press(&mut state, KeyCode::Char(c));
        }
        press(&mut state, KeyCode::Backspace);
        press(&mut state, KeyCode::Enter);

        assert_eq!(state.mode, Mode::Normal);
        assert!(dir.path().join("out").join("a.bin").exists());
    }

    #[test]
    fn test_confirm_can_be_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        let mut state = state(dir.path());

        press(&mut state, KeyCode::Char('O'));
        assert_eq!(state.mode, Mode::ConfirmOrganizeDir);
        press(&mut state, KeyCode::Esc);
        assert!(dir.path().join("a.txt").exists());

        press(&mut state, KeyCode::Char('O'));
        press(&mut state, KeyCode::Char('y'));
        assert!(dir.path().join("documents").join("a.txt").exists());
    }

    #[test]
    fn test_help_and_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state(dir.path());

        press(&mut state, KeyCode::Char('?'));
        assert_eq!(state.mode, Mode::Help);
        press(&mut state, KeyCode::Char('q'));
        assert_eq!(state.mode, Mode::Normal);
        assert!(!state.should_quit);

        press(&mut state, KeyCode::Char('q'));
        assert!(state.should_quit);
    }
}
