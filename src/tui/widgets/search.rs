//! Search screen: query box and the result list.

use super::truncate_str;
use crate::app::state::{AppState, SearchFocus};
use crate::tui::theme::{LoadingSpinner, Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

pub fn render(frame: &mut Frame, state: &mut AppState, area: Rect) {
    let sub = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);
    render_search_box(frame, state, sub[0]);
    render_results(frame, state, sub[1]);
}

fn render_search_box(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();

    let is_focused = state.search_focus == SearchFocus::Input;
    let border_color = if is_focused {
        theme.palette.accent
    } else {
        theme.palette.border
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(border_color))
        .title(" Query ")
        .title_style(Style::default().fg(theme.palette.accent));

    let prompt = if state.searching {
        format!("{} {}", state.search_query, LoadingSpinner::frame(state.tick))
    } else {
        let cursor = if is_focused { "▏" } else { "" };
        format!("{}{}", state.search_query, cursor)
    };

    let p = Paragraph::new(Line::from(prompt))
        .style(Style::default().fg(theme.palette.fg_primary))
        .block(block);
    frame.render_widget(p, area);
}

fn render_results(frame: &mut Frame, state: &mut AppState, area: Rect) {
    let theme = get_theme();

    if state.searching && state.results.is_empty() {
        let spinner = LoadingSpinner::frame(state.tick);
        let loading = Paragraph::new(Line::from(format!("{spinner} Searching...")))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(loading, area);
        return;
    }

    if state.results.is_empty() {
        let msg = match &state.last_search {
            Some(q) => format!("No results for \"{q}\""),
            None => "Type a query and press Enter".to_string(),
        };
        let empty = Paragraph::new(Line::from(msg))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(empty, area);
        return;
    }

    let visible_height = area.height as usize;
    state.results_cursor.update_scroll(visible_height);
    let cursor = state.results_cursor;
    let focused = state.search_focus == SearchFocus::Results;

    let query = state.last_search.as_deref().unwrap_or("").to_lowercase();
    let max_width = area.width.saturating_sub(2) as usize;

    let items: Vec<ListItem> = state
        .results
        .iter()
        .enumerate()
        .skip(cursor.scroll_offset)
        .take(visible_height)
        .map(|(i, r)| {
            let base_style = if focused && i == cursor.selected {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };
            let title = truncate_str(&r.title, max_width);
            ListItem::new(Line::from(highlight_text(title, &query, base_style, &theme)))
        })
        .collect();

    let mut list_state = ListState::default();
    if focused {
        list_state.select(Some(cursor.selected.saturating_sub(cursor.scroll_offset)));
    }

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("\u{f054} ");
    frame.render_stateful_widget(list, area, &mut list_state);

    if state.results.len() > visible_height {
        let pos_text = format!("{}/{}", cursor.selected + 1, state.results.len());
        let pos_len = pos_text.len() as u16;
        let pos_x = area.x + area.width.saturating_sub(pos_len);
        if pos_x > area.x {
            frame.render_widget(
                Paragraph::new(pos_text).style(Style::default().fg(theme.palette.fg_secondary)),
                Rect::new(pos_x, area.y, pos_len, 1),
            );
        }
    }
}

/// Split `text` into spans, highlighting each whitespace-separated word of
/// `query` (already lower-cased).
fn highlight_text(text: String, query: &str, base_style: Style, theme: &Theme) -> Vec<Span<'static>> {
    let highlight_style = base_style.bg(theme.palette.accent_alt).fg(theme.palette.bg_primary);
    let lower = text.to_lowercase();
    // Lower-casing can change byte lengths; fall back to plain text then.
    if query.trim().is_empty() || lower.len() != text.len() {
        return vec![Span::styled(text, base_style)];
    }

    let mut matches: Vec<(usize, usize)> = Vec::new();
    for word in query.split_whitespace() {
        let mut from = 0;
        while let Some(pos) = lower[from..].find(word) {
            let start = from + pos;
            let end = start + word.len();
            matches.push((start, end));
            from = end;
        }
    }
    matches.sort_unstable();

    let mut spans = Vec::new();
    let mut last_end = 0;
    for (start, end) in matches {
        if start < last_end || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base_style));
        }
        spans.push(Span::styled(text[start..end].to_string(), highlight_style));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base_style));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn highlight_keeps_text_intact() {
        let theme = get_theme();
        let base = Style::default();
        let spans = highlight_text("Daft Punk - Around the World".into(), "punk world", base, &theme);
        assert_eq!(joined(&spans), "Daft Punk - Around the World");
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[1].content, "Punk");
        assert_eq!(spans[3].content, "World");
    }

    #[test]
    fn empty_query_is_one_span() {
        let theme = get_theme();
        let spans = highlight_text("abc".into(), "", Style::default(), &theme);
        assert_eq!(spans.len(), 1);
    }
}
