use crate::app::state::{AppState, Screen};
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

pub fn render(frame: &mut Frame, state: &AppState, playlist_len: usize, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.border))
        .title(" Menu ")
        .title_style(Style::default().fg(theme.palette.accent));

    let playlist_label = format!("Playlist ({playlist_len})");
    let menu = [
        (Screen::Search, icons.search, "Search".to_string()),
        (Screen::Playlist, icons.playlist, playlist_label),
        (Screen::Help, icons.help, "Help".to_string()),
    ];

    let items: Vec<ListItem> = menu
        .into_iter()
        .map(|(screen, icon, label)| {
            let is_selected = screen == state.screen;

            let style = if is_selected {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };
            let icon_style = if is_selected {
                Style::default().fg(theme.palette.accent)
            } else {
                Style::default().fg(theme.palette.fg_secondary)
            };
            let prefix = if is_selected { icons.selected } else { icons.unselected };

            ListItem::new(Line::from(vec![
                Span::styled(prefix, icon_style),
                Span::raw(" "),
                Span::styled(icon, icon_style),
                Span::raw(" "),
                Span::styled(label, style),
            ]))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.screen.index()));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("");

    frame.render_stateful_widget(list, area, &mut list_state);
}
