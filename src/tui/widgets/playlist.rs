//! Playlist screen: the entries in playback order, head first.

use super::truncate_str;
use crate::app::state::AppState;
use crate::playlist::{PlaybackPhase, PlaylistController};
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

const HINTS: &str = "Enter/p: Play  n: Skip  d: Remove  c: Clear  s: Save  o: Load";

pub fn render(frame: &mut Frame, state: &mut AppState, controller: &PlaylistController, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area)[1];

    if controller.is_empty() {
        let lines = vec![
            Line::from(Span::styled(
                "Playlist is empty. Add results from the search screen or load a file.",
                Style::default().fg(theme.palette.fg_secondary),
            )),
            Line::default(),
            Line::from(Span::styled(HINTS, Style::default().fg(theme.palette.fg_secondary))),
        ];
        frame.render_widget(Paragraph::new(lines), padded);
        return;
    }

    let phase = match controller.phase() {
        PlaybackPhase::Loading(_) => "resolving",
        PlaybackPhase::Playing(_) if state.paused => "paused",
        PlaybackPhase::Playing(_) => "playing",
        PlaybackPhase::Stopped => "stopped",
        PlaybackPhase::Idle => "idle",
    };
    let header = Line::from(vec![
        Span::styled(
            format!("{} entries", controller.len()),
            Style::default().fg(theme.palette.fg_secondary),
        ),
        Span::raw("  "),
        Span::styled(phase, Style::default().fg(theme.palette.accent)),
    ]);

    // header, blank line, hints
    let visible_height = padded.height.saturating_sub(3) as usize;
    state.playlist_cursor.update_scroll(visible_height);
    let cursor = state.playlist_cursor;
    let max_width = padded.width.saturating_sub(7) as usize;

    let mut lines: Vec<Line> = vec![header, Line::default()];

    for (i, entry) in controller
        .entries()
        .iter()
        .enumerate()
        .skip(cursor.scroll_offset)
        .take(visible_height)
    {
        let is_current = controller.current_index() == Some(i);
        let is_selected = i == cursor.selected;

        let marker = match controller.phase() {
            _ if !is_current => "  ".to_string(),
            PlaybackPhase::Loading(_) => format!("{} ", icons.music),
            _ if state.paused => format!("{} ", icons.pause),
            _ => format!("{} ", icons.play),
        };

        let style = if is_selected {
            Style::default()
                .fg(theme.palette.fg_primary)
                .bg(theme.palette.bg_highlight)
                .add_modifier(Modifier::BOLD)
        } else if is_current {
            Style::default()
                .fg(theme.palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.palette.fg_primary)
        };

        lines.push(Line::from(vec![
            Span::styled(marker, Style::default().fg(theme.palette.accent)),
            Span::styled(
                format!("{:>3}. ", i + 1),
                Style::default().fg(theme.palette.fg_secondary),
            ),
            Span::styled(truncate_str(entry.display(), max_width), style),
        ]));
    }

    let height = padded.height as usize;
    while lines.len() + 1 < height {
        lines.push(Line::default());
    }
    lines.push(Line::from(Span::styled(
        HINTS,
        Style::default().fg(theme.palette.fg_secondary),
    )));

    frame.render_widget(Paragraph::new(lines), padded);
}
