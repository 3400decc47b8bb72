//! Player bar: current entry, progress, time readout, volume and toasts.

use super::truncate_str;
use crate::app::state::{AppState, ToastKind};
use crate::playlist::{PlaybackPhase, PlaylistController};
use crate::tui::theme::{Icons, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn render(frame: &mut Frame, state: &AppState, controller: &PlaylistController, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(format!(" {} Player ", icons.music))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner)[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1), // status
            Constraint::Length(1), // progress bar
            Constraint::Length(1), // time + volume
            Constraint::Min(0),    // toast
        ])
        .split(padded);

    let content_width = padded.width.saturating_sub(1) as usize;

    let title = match (controller.phase(), controller.current_entry()) {
        (PlaybackPhase::Loading(_), Some(e)) => format!("Resolving {}", e.display()),
        (PlaybackPhase::Playing(_), Some(e)) => e.display().to_string(),
        _ => "Not playing".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_str(&title, content_width),
            Style::default()
                .fg(theme.palette.fg_primary)
                .add_modifier(Modifier::BOLD),
        ))),
        rows[0],
    );

    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_str(&state.status, content_width),
            Style::default().fg(theme.palette.fg_secondary),
        ))),
        rows[1],
    );

    let ratio = if controller.duration_secs() > 0.0 {
        (controller.position_secs() / controller.duration_secs()).clamp(0.0, 1.0)
    } else {
        0.0
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            render_progress_bar(rows[2].width as usize, ratio, icons),
            Style::default().fg(theme.palette.accent),
        ))),
        rows[2],
    );

    let state_icon = if !controller.is_playing() {
        icons.stop
    } else if state.paused {
        icons.pause
    } else {
        icons.play
    };
    let vol_icon = if state.volume == 0 {
        icons.volume_mute
    } else if state.volume < 50 {
        icons.volume_low
    } else {
        icons.volume_high
    };

    let controls = Line::from(vec![
        Span::styled(state_icon, Style::default().fg(theme.palette.accent)),
        Span::raw(" "),
        Span::styled(
            controller.time_label(),
            Style::default().fg(theme.palette.fg_secondary),
        ),
        Span::raw("  "),
        Span::styled(vol_icon, Style::default().fg(theme.palette.fg_secondary)),
        Span::raw(" "),
        Span::styled(
            format!("{}%", state.volume),
            Style::default().fg(theme.palette.fg_secondary),
        ),
    ]);
    frame.render_widget(Paragraph::new(controls), rows[3]);

    if let Some(toast) = &state.toast
        && !toast.is_expired()
    {
        let (prefix, color) = match toast.kind {
            ToastKind::Success => (icons.success, theme.palette.accent),
            ToastKind::Error => (icons.error, theme.palette.error),
        };
        let toast_line = Line::from(vec![
            Span::styled(format!("{prefix} "), Style::default().fg(color)),
            Span::styled(
                truncate_str(&toast.message, content_width.saturating_sub(3)),
                Style::default().fg(color),
            ),
        ]);
        frame.render_widget(Paragraph::new(toast_line), rows[4]);
    }
}

fn render_progress_bar(width: usize, ratio: f64, icons: &Icons) -> String {
    if width < 3 {
        return String::new();
    }

    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    bar.push_str(&icons.progress_full.repeat(filled));
    bar.push_str(icons.progress_head);
    bar.push_str(&icons.progress_empty.repeat(empty));
    bar
}
