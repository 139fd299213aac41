//! Theme configuration and colors.
//!
//! Palettes come from the `ratatui-themes` crate; `ThemeColors` derives the
//! handful of styles the file browser needs from them.

use ratatui::style::{Color, Modifier, Style};
use ratatui_themes::{ThemeName, ThemePalette};
use serde::{Deserialize, Serialize};

/// Theme wrapper around `ThemeName` from ratatui-themes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme(pub ThemeName);

impl Theme {
    /// Next theme in rotation
    #[must_use]
    pub fn next(&self) -> Theme {
        Theme(self.0.next())
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.0.display_name()
    }

    /// Load theme from config or use default
    pub fn load(config: &crate::config::Config) -> Theme {
        config
            .general
            .theme
            .as_deref()
            .and_then(|name| name.parse::<ThemeName>().ok())
            .map(Theme)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn colors(&self) -> ThemeColors {
        ThemeColors::from_palette(self.0.palette())
    }

    /// Kebab-case slug for config files
    #[must_use]
    pub fn slug(&self) -> &'static str {
        self.0.slug()
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Styles used by the TUI, derived from a theme palette
#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,
    pub selection: Color,
}

impl ThemeColors {
    #[must_use]
    pub fn from_palette(p: ThemePalette) -> Self {
        Self {
            bg: p.bg,
            fg: p.fg,
            muted: p.muted,
            accent: p.accent,
            secondary: p.secondary,
            success: p.success,
            warning: p.warning,
            error: p.error,
            info: p.info,
            selection: p.selection,
        }
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.fg)
    }

    pub fn text_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn text_success(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn text_warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn text_error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn text_info(&self) -> Style {
        Style::default().fg(self.info)
    }

    pub fn block(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn block_focus(&self) -> Style {
        Style::default().fg(self.accent)
    }

    /// Row under the cursor
    pub fn cursor(&self) -> Style {
        Style::default()
            .bg(self.selection)
            .fg(self.fg)
            .add_modifier(Modifier::BOLD)
    }

    /// Marker for files picked with space
    pub fn picked(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    /// Key hint style (for shortcuts)
    pub fn key_hint(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::BOLD)
    }
}
