//! Root layout widget - orchestrates main layout structure

use crate::app::state::{AppState, Screen};
use crate::config::Config;
use crate::playlist::PlaylistController;
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::{help, now_playing, playlist, search, sidebar};

/// ┌──────────┬─────────────────────────────┐
/// │  Menu    │        Main Content         │
/// │  Search  │   (Search/Playlist/Help)    │
/// │  Playlist│                             │
/// │  Help    │                             │
/// ├──────────┴─────────────────────────────┤
/// │                 Player                 │
/// └────────────────────────────────────────┘
pub fn render(frame: &mut Frame, cfg: &Config, state: &mut AppState, controller: &PlaylistController) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(7)])
        .split(frame.area());

    let top_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(40)])
        .split(rows[0]);

    sidebar::render(frame, state, controller.len(), top_cols[0]);
    render_main_content(frame, cfg, state, controller, top_cols[1]);
    now_playing::render(frame, state, controller, rows[1]);
}

fn render_main_content(
    frame: &mut Frame,
    cfg: &Config,
    state: &mut AppState,
    controller: &PlaylistController,
    area: Rect,
) {
    let theme = get_theme();
    let icons = &theme.icons;

    let title = match state.screen {
        Screen::Search => format!(" {} Search ", icons.search),
        Screen::Playlist => format!(" {} Playlist ", icons.playlist),
        Screen::Help => format!(" {} Keybinds ", icons.help),
    };

    let main = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(title)
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = main.inner(area);
    frame.render_widget(main, area);

    match state.screen {
        Screen::Search => search::render(frame, state, inner),
        Screen::Playlist => playlist::render(frame, state, controller, inner),
        Screen::Help => help::render(frame, inner),
    }

    if state.prompt.is_some() {
        render_prompt(frame, cfg, state, inner);
    }
}

/// File name prompt drawn over the bottom of the content area.
fn render_prompt(frame: &mut Frame, cfg: &Config, state: &AppState, area: Rect) {
    let Some(prompt) = &state.prompt else {
        return;
    };
    let theme = get_theme();

    let height = 3.min(area.height);
    let rect = Rect::new(area.x, area.y + area.height - height, area.width, height);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.accent))
        .title(format!(" {} {} ", theme.icons.file, prompt.kind.label()))
        .title_bottom(format!(" in {} ", cfg.paths.playlist_dir.display()))
        .title_style(Style::default().fg(theme.palette.accent));

    let line = Line::from(vec![
        Span::styled(prompt.input.clone(), Style::default().fg(theme.palette.fg_primary)),
        Span::styled("▏", Style::default().fg(theme.palette.accent)),
    ]);

    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(line).block(block), rect);
}
