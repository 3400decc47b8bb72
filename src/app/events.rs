use crate::playlist::controller::Generation;
use crate::youtube::ResolveError;
use crate::youtube::models::{ResolvedStream, SearchResultEntry};

#[derive(Debug)]
pub enum Event {
    Input(InputEvent),
    Player(PlayerEvent),
    Network(NetworkEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Resumed,
    Paused,
    /// The current file played to its end.
    Ended,
    /// mpv could not play the stream it was given.
    Failed(String),
    Log(String),
    Clock {
        generation: Generation,
        position_secs: f64,
        duration_secs: f64,
    },
}

#[derive(Debug)]
pub enum NetworkEvent {
    SearchResults {
        query: String,
        items: Vec<SearchResultEntry>,
    },
    SearchFailed {
        query: String,
        error: String,
    },
    Resolved {
        generation: Generation,
        result: Result<ResolvedStream, ResolveError>,
    },
    TitleResolved {
        url: String,
        title: String,
    },
}
