//! Help screen showing keybindings

use crate::tui::theme::{Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

pub fn render(frame: &mut Frame, area: Rect) {
    let theme = get_theme();

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = vec![
        section_header("Navigation", &theme),
        keybind("j / Down", "Move down", &theme),
        keybind("k / Up", "Move up", &theme),
        keybind("g / G", "Top / bottom", &theme),
        keybind("Ctrl+d / u", "Page down / up", &theme),
        keybind("h / l", "Previous / next screen", &theme),
        keybind("Tab", "Next screen", &theme),
        keybind("1 2 3", "Search / Playlist / Help", &theme),
        Line::default(),
        section_header("Search", &theme),
        keybind("Enter", "Run query / add result", &theme),
        keybind("a", "Add result to playlist", &theme),
        keybind("x", "Clear search results", &theme),
        keybind("Down", "Focus results", &theme),
        keybind("/ or i", "Back to the query", &theme),
        keybind("Ctrl+u", "Clear query", &theme),
    ];
    frame.render_widget(Paragraph::new(left).wrap(Wrap { trim: false }), cols[0]);

    let right = vec![
        section_header("Playlist", &theme),
        keybind("Enter / p", "Start playback", &theme),
        keybind("n", "Skip current entry", &theme),
        keybind("d / Del", "Remove selected entry", &theme),
        keybind("c", "Clear playlist", &theme),
        keybind("s", "Save to file", &theme),
        keybind("o", "Load from file", &theme),
        Line::default(),
        section_header("Playback", &theme),
        keybind("Space", "Toggle pause", &theme),
        keybind("+ / -", "Volume up / down", &theme),
        keybind("] / [", "Seek 10s forward / back", &theme),
        Line::default(),
        keybind("q / Esc", "Quit", &theme),
    ];
    frame.render_widget(Paragraph::new(right).wrap(Wrap { trim: false }), cols[1]);
}

fn section_header(title: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![Span::styled(
        format!("━━ {title} ━━"),
        Style::default()
            .fg(theme.palette.accent)
            .add_modifier(Modifier::BOLD),
    )])
}

fn keybind(key: &str, desc: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("{key:12}"),
            Style::default()
                .fg(theme.palette.accent_alt)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), Style::default().fg(theme.palette.fg_primary)),
    ])
}
