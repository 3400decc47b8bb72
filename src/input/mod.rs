use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::{AppState, PromptKind, Screen, SearchFocus};
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const POLL_PERIOD: Duration = Duration::from_millis(250);

pub fn spawn_input_task(tx: mpsc::Sender<Event>, mouse_enabled: bool) {
    tokio::task::spawn_blocking(move || {
        read_terminal_events(&tx, mouse_enabled, || {
            if event::poll(POLL_PERIOD)? {
                event::read().map(Some)
            } else {
                Ok(None)
            }
        });
    });
}

/// Forward terminal events until the inbox closes or the terminal errors.
/// `next` yields `None` when nothing arrived within one poll period.
fn read_terminal_events<F>(tx: &mpsc::Sender<Event>, mouse_enabled: bool, mut next: F)
where
    F: FnMut() -> io::Result<Option<CtEvent>>,
{
    while !tx.is_closed() {
        let ev = match next() {
            Ok(Some(CtEvent::Key(k))) if k.kind == KeyEventKind::Press => InputEvent::Key(k),
            Ok(Some(CtEvent::Mouse(m))) if mouse_enabled => InputEvent::Mouse(m),
            Ok(Some(CtEvent::Resize(_, _))) => InputEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "terminal input failed");
                break;
            }
        };
        if tx.blocking_send(Event::Input(ev)).is_err() {
            break;
        }
    }
    debug!("input reader stopped");
}

pub fn map_input_to_action(state: &AppState, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::ListUp),
            MouseEventKind::ScrollDown => Some(Action::ListDown),
            _ => None,
        },
        InputEvent::Key(k) => {
            // An open prompt swallows every key.
            if state.prompt.is_some() {
                return handle_prompt(k);
            }
            match state.screen {
                Screen::Search => match state.search_focus {
                    SearchFocus::Input => handle_search_input(state, k),
                    SearchFocus::Results => handle_search_results(k),
                },
                Screen::Playlist => handle_playlist_screen(k),
                Screen::Help => handle_global(k),
            }
        }
    }
}

fn handle_prompt(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc => Some(Action::PromptCancel),
        KeyCode::Enter => Some(Action::PromptSubmit),
        KeyCode::Backspace => Some(Action::PromptBackspace),
        KeyCode::Char(c) => Some(Action::PromptChar(c)),
        _ => None,
    }
}

fn handle_search_input(state: &AppState, k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextScreen),
        KeyCode::BackTab => Some(Action::PrevScreen),
        KeyCode::Enter => Some(Action::StartSearch),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Down if !state.results.is_empty() => {
            Some(Action::SetSearchFocus(SearchFocus::Results))
        }
        KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::ClearInput),
        KeyCode::Char(c) => Some(Action::InputChar(c)),
        _ => None,
    }
}

fn handle_search_results(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc | KeyCode::Char('/') | KeyCode::Char('i') => {
            Some(Action::SetSearchFocus(SearchFocus::Input))
        }
        KeyCode::Enter | KeyCode::Char('a') => Some(Action::AddSelected),
        KeyCode::Char('x') => Some(Action::ClearSearches),
        KeyCode::Char('p') => Some(Action::StartPlayback),
        _ => handle_list_and_global(k),
    }
}

fn handle_playlist_screen(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Enter | KeyCode::Char('p') => Some(Action::StartPlayback),
        KeyCode::Char('d') if !k.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::RemoveSelected)
        }
        KeyCode::Delete => Some(Action::RemoveSelected),
        KeyCode::Char('c') => Some(Action::ClearPlaylist),
        KeyCode::Char('n') => Some(Action::Skip),
        KeyCode::Char('s') => Some(Action::OpenPrompt(PromptKind::Save)),
        KeyCode::Char('o') => Some(Action::OpenPrompt(PromptKind::Load)),
        _ => handle_list_and_global(k),
    }
}

fn handle_list_and_global(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ListUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ListDown),
        KeyCode::Char('g') => Some(Action::GoTop),
        KeyCode::Char('G') => Some(Action::GoBottom),
        KeyCode::Char('d') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageDown),
        KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        _ => handle_global(k),
    }
}

fn handle_global(k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),

        KeyCode::Left | KeyCode::Char('h') => Some(Action::SidebarUp),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::SidebarDown),
        KeyCode::Tab => Some(Action::NextScreen),
        KeyCode::BackTab => Some(Action::PrevScreen),
        KeyCode::Char('1') => Some(Action::SetScreen(Screen::Search)),
        KeyCode::Char('2') => Some(Action::SetScreen(Screen::Playlist)),
        KeyCode::Char('3') | KeyCode::Char('?') | KeyCode::F(1) => {
            Some(Action::SetScreen(Screen::Help))
        }

        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('=') | KeyCode::Char('+') => Some(Action::VolumeUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::VolumeDown),
        KeyCode::Char(']') => Some(Action::SeekForward),
        KeyCode::Char('[') => Some(Action::SeekBack),

        _ => None,
    }
}
