use crate::youtube::models::SearchResultEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Search,
    Playlist,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    Input,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Save,
    Load,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            PromptKind::Save => "Save playlist as",
            PromptKind::Load => "Load playlist from",
        }
    }
}

/// Single-line text prompt for playlist file names.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            input: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(3)
    }
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Search, Screen::Playlist, Screen::Help];

    pub fn next(self) -> Self {
        match self {
            Screen::Search => Screen::Playlist,
            Screen::Playlist => Screen::Help,
            Screen::Help => Screen::Search,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Screen::Search => Screen::Help,
            Screen::Playlist => Screen::Search,
            Screen::Help => Screen::Playlist,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Screen::Search => 0,
            Screen::Playlist => 1,
            Screen::Help => 2,
        }
    }

    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx.min(Self::ALL.len() - 1)]
    }
}

/// Selection and scroll position over a list owned elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCursor {
    pub selected: usize,
    pub scroll_offset: usize,
}

impl ListCursor {
    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn page_up(&mut self) {
        self.selected = self.selected.saturating_sub(10);
    }

    pub fn page_down(&mut self, len: usize) {
        self.selected = (self.selected + 10).min(len.saturating_sub(1));
    }

    pub fn go_top(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn go_bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    /// Keep the selection inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
        self.scroll_offset = self.scroll_offset.min(self.selected);
    }

    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub struct AppState {
    pub should_quit: bool,
    pub tick: u64,

    pub screen: Screen,

    // Search
    pub search_query: String,
    pub last_search: Option<String>,
    pub search_focus: SearchFocus,
    pub searching: bool,
    pub results: Vec<SearchResultEntry>,
    pub results_cursor: ListCursor,

    // Playlist
    pub playlist_cursor: ListCursor,
    pub prompt: Option<Prompt>,

    // Playback
    pub paused: bool,
    pub volume: u8,

    // Toast notification
    pub toast: Option<Toast>,

    pub status: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            tick: 0,
            screen: Screen::Search,
            search_query: String::new(),
            last_search: None,
            search_focus: SearchFocus::Input,
            searching: false,
            results: Vec::new(),
            results_cursor: ListCursor::default(),
            playlist_cursor: ListCursor::default(),
            prompt: None,
            paused: false,
            volume: 80,
            toast: None,
            status: String::new(),
        }
    }

    pub fn selected_result(&self) -> Option<&SearchResultEntry> {
        self.results.get(self.results_cursor.selected)
    }

    pub fn set_results(&mut self, query: String, results: Vec<SearchResultEntry>) {
        self.last_search = Some(query);
        self.results = results;
        self.results_cursor.reset();
        self.searching = false;
    }

    pub fn clear_searches(&mut self) {
        self.search_query.clear();
        self.results.clear();
        self.results_cursor.reset();
        self.search_focus = SearchFocus::Input;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_stays_in_bounds() {
        let mut c = ListCursor::default();
        c.select_prev();
        assert_eq!(c.selected, 0);
        c.select_next(3);
        c.select_next(3);
        c.select_next(3);
        assert_eq!(c.selected, 2);
        c.clamp(1);
        assert_eq!(c.selected, 0);
        c.select_next(0);
        assert_eq!(c.selected, 0);
        c.page_down(25);
        assert_eq!(c.selected, 10);
        c.go_bottom(25);
        assert_eq!(c.selected, 24);
    }

    #[test]
    fn scroll_follows_selection() {
        let mut c = ListCursor {
            selected: 12,
            scroll_offset: 0,
        };
        c.update_scroll(5);
        assert_eq!(c.scroll_offset, 8);
        c.selected = 3;
        c.update_scroll(5);
        assert_eq!(c.scroll_offset, 3);
    }

    #[test]
    fn screens_cycle() {
        for s in Screen::ALL {
            assert_eq!(s.next().prev(), s);
            assert_eq!(Screen::from_index(s.index()), s);
        }
        assert_eq!(Screen::from_index(99), Screen::Help);
    }
}
