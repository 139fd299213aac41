//! UI rendering for the TUI

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

use super::state::{AppState, LogLevel, Mode};

/// Render the entire UI
pub fn render(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();

    let area = frame.area();
    let bg_block = Block::default().style(Style::default().bg(colors.bg));
    frame.render_widget(bg_block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Files + activity
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, state, chunks[0]);

    let main = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    render_files(frame, state, main[0]);
    render_log(frame, state, main[1]);
    render_status_bar(frame, state, chunks[2]);

    match state.mode {
        Mode::Help => render_help_popup(frame, state),
        Mode::MoveTarget => render_move_prompt(frame, state),
        Mode::ConfirmOrganizeDir => render_confirm_popup(frame, state),
        Mode::Normal => {}
    }
}

fn render_header(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();
    let config = state.organizer.config();

    let mut spans = vec![
        Span::styled(" sortd ", colors.title()),
        Span::styled(format!("v{}  ", crate::VERSION), colors.text_muted()),
        Span::styled(state.dir.display().to_string(), colors.text()),
        Span::styled(
            format!(
                "   {} patterns · collision: {}",
                config.organize.patterns.len(),
                config.settings.collision
            ),
            colors.text_muted(),
        ),
    ];
    if state.organizer.is_dry_run() {
        spans.push(Span::styled(
            "  DRY-RUN ",
            colors.text_warning().add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.block()),
    );
    frame.render_widget(header, area);
}

fn render_files(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(colors.block_focus())
        .title(format!(
            " Files ({}) · {} selected ",
            state.entries.len(),
            state.selected.len()
        ))
        .title_style(colors.title());

    if state.entries.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::styled("  No files here", colors.text_muted()),
            Line::from(""),
            Line::from(vec![
                Span::styled("  Press ", colors.text_muted()),
                Span::styled("r", colors.key_hint()),
                Span::styled(" to refresh", colors.text_muted()),
            ]),
        ])
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = state
        .entries
        .iter()
        .map(|entry| {
            let marker = if state.is_selected(&entry.path) {
                Span::styled(" ● ", colors.picked())
            } else {
                Span::styled("   ", colors.text_muted())
            };

            let preview = match &entry.preview {
                Some(dest) => Span::styled(
                    format!("  → {}", relative_to(dest, &state.dir)),
                    colors.text_info(),
                ),
                None => Span::styled("  (no match)", colors.text_muted()),
            };

            ListItem::new(Line::from(vec![
                marker,
                Span::raw(format!("{} ", entry.kind.category.icon())),
                Span::styled(entry.name.as_str(), colors.text()),
                preview,
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(colors.cursor());

    let mut list_state = ListState::default().with_selected(Some(state.cursor));
    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Display `path` relative to the browsed directory when it sits below it
fn relative_to(path: &std::path::Path, dir: &std::path::Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn render_log(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(colors.block())
        .title(format!(" Activity ({}) ", state.log_entries.len()))
        .title_style(colors.title());

    let items: Vec<ListItem> = state
        .log_entries
        .iter()
        .rev()
        .map(|entry| {
            let (icon, level_style) = match entry.level {
                LogLevel::Info => ("ℹ", colors.text_info()),
                LogLevel::Success => ("✓", colors.text_success()),
                LogLevel::Warning => ("⚠", colors.text_warning()),
                LogLevel::Error => ("✗", colors.text_error()),
            };

            let time = entry.timestamp.format("%H:%M:%S").to_string();

            ListItem::new(Line::from(vec![
                Span::styled(format!(" {} ", icon), level_style),
                Span::styled(format!("[{}] ", time), colors.text_muted()),
                Span::styled(entry.message.as_str(), colors.text()),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let colors = state.theme.colors();

    let content = if let Some(ref msg) = state.status_message {
        vec![
            Span::styled(" ", Style::default()),
            Span::styled(msg.as_str(), colors.text()),
        ]
    } else {
        let mut spans = vec![Span::styled(" ", Style::default())];
        for (key, label) in [
            ("space", "select  "),
            ("o", "organize  "),
            ("m", "move  "),
            ("O", "organize dir  "),
            ("d", "dry-run  "),
            ("?", "help  "),
            ("q", "quit"),
        ] {
            spans.push(Span::styled(key, colors.key_hint()));
            spans.push(Span::styled(format!(": {}", label), colors.text_muted()));
        }
        spans
    };

    let status = Paragraph::new(Line::from(content)).style(Style::default().bg(colors.selection));
    frame.render_widget(status, area);
}

fn help_row<'a>(key: &'a str, description: &'a str, state: &AppState) -> Line<'a> {
    let colors = state.theme.colors();
    Line::from(vec![
        Span::styled(format!("  {:<16}", key), colors.key_hint()),
        Span::styled(description, colors.text()),
    ])
}

fn render_help_popup(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let popup_area = centered_rect(60, 70, frame.area());

    frame.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("  {}", title),
            colors.title().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_content = vec![
        Line::from(""),
        section("Navigation"),
        help_row("j/k or ↑/↓", "Move cursor", state),
        help_row("g/G", "First / last file", state),
        help_row("r", "Refresh listing", state),
        Line::from(""),
        section("Selection"),
        help_row("space", "Select file under cursor", state),
        help_row("a", "Select / deselect all", state),
        help_row("Esc", "Clear selection", state),
        Line::from(""),
        section("Actions"),
        help_row("o / Enter", "Organize selection by pattern", state),
        help_row("m", "Move selection to a directory", state),
        help_row("O", "Organize the whole directory", state),
        help_row("d", "Toggle dry-run", state),
        Line::from(""),
        section("General"),
        help_row("t", "Next theme", state),
        help_row("?", "Toggle this help", state),
        help_row("q / Ctrl+c", "Quit", state),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", colors.text_muted()),
            Span::styled("Esc", colors.key_hint()),
            Span::styled(" or ", colors.text_muted()),
            Span::styled("?", colors.key_hint()),
            Span::styled(" to close", colors.text_muted()),
        ]),
    ];

    let help = Paragraph::new(help_content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.block_focus())
            .title(" ⌨ Keyboard Shortcuts ")
            .title_style(colors.title())
            .style(Style::default().bg(colors.bg)),
    );

    frame.render_widget(help, popup_area);
}

fn render_move_prompt(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let area = centered_rect(60, 20, frame.area());

    frame.render_widget(Clear, area);

    let cursor = if (state.frame / 5) % 2 == 0 { "▏" } else { " " };
    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Move ", colors.text_muted()),
            Span::styled(
                format!("{} file(s)", state.action_targets().len()),
                colors.text(),
            ),
            Span::styled(" into:", colors.text_muted()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  > ", colors.key_hint()),
            Span::styled(state.input.as_str(), colors.text()),
            Span::styled(cursor, colors.text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter", colors.key_hint()),
            Span::styled(": move  ", colors.text_muted()),
            Span::styled("Esc", colors.key_hint()),
            Span::styled(": cancel", colors.text_muted()),
        ]),
    ];

    let prompt = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.block_focus())
            .title(" Move To ")
            .title_style(colors.title())
            .style(Style::default().bg(colors.bg)),
    );
    frame.render_widget(prompt, area);
}

fn render_confirm_popup(frame: &mut Frame, state: &AppState) {
    let colors = state.theme.colors();
    let area = centered_rect(50, 20, frame.area());

    frame.render_widget(Clear, area);

    let verb = if state.organizer.is_dry_run() {
        "Preview"
    } else {
        "Organize"
    };
    let content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("  {} every file in ", verb), colors.text()),
            Span::styled(state.dir.display().to_string(), colors.text_info()),
            Span::styled("?", colors.text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", colors.key_hint()),
            Span::styled(": yes  ", colors.text_muted()),
            Span::styled("n", colors.key_hint()),
            Span::styled(": no", colors.text_muted()),
        ]),
    ];

    let confirm = Paragraph::new(content).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(colors.text_warning())
            .title(" Confirm ")
            .title_style(colors.text_warning())
            .style(Style::default().bg(colors.bg)),
    );
    frame.render_widget(confirm, area);
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
