pub mod actions;
pub mod events;
pub mod headless;
pub mod playback;
pub mod state;

use crate::config::Config;
use crate::input;
use crate::player::mpv::MpvHandle;
use crate::playlist::{PlaylistEntry, file as playlist_file};
use crate::storage::StorageHandle;
use crate::tui::{self, TuiTerminal};
use crate::youtube::YtDlp;
use actions::Action;
use events::{Event, NetworkEvent, PlayerEvent};
use playback::{Notice, Playback};
use state::{AppState, Prompt, PromptKind, Screen, SearchFocus, Toast};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct App {
    cfg: Config,
    config_path: std::path::PathBuf,
    state: AppState,
    ytdlp: YtDlp,
    storage: StorageHandle,
    playback: Playback,
}

impl App {
    pub fn new(cfg: Config, config_path: std::path::PathBuf) -> anyhow::Result<Self> {
        let ytdlp = YtDlp::new(&cfg.ytdlp);
        let db_path = cfg.paths.data_dir.join("cache.sqlite3");
        // Fail early on an unusable data dir rather than on the first lookup.
        crate::storage::Storage::open(&db_path)?;

        let mut state = AppState::new();
        state.volume = cfg.player.volume.min(100);

        Ok(Self {
            playback: Playback::new(ytdlp.clone(), None),
            cfg,
            config_path,
            state,
            ytdlp,
            storage: StorageHandle::new(db_path),
        })
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        input::spawn_input_task(tx.clone(), self.cfg.input.mouse);

        // Best-effort: search and playlist editing still work without mpv.
        let mpv_log = self.cfg.paths.data_dir.join("mpv.log");
        let mpv = match MpvHandle::spawn(
            &self.cfg.player.binary,
            tx.clone(),
            self.cfg.player.audio_device.as_deref(),
            Some(&mpv_log),
        )
        .await
        {
            Ok(h) => {
                if let Err(e) = h.set_volume(self.state.volume).await {
                    warn!(error = %format!("{e:#}"), "set initial volume");
                }
                Some(h)
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "mpv unavailable");
                self.state.toast = Some(Toast::error(format!("mpv disabled: {e:#}")));
                None
            }
        };
        self.playback = Playback::new(self.ytdlp.clone(), mpv);

        tui::draw(terminal, &self.cfg, &mut self.state, self.playback.controller())?;

        while let Some(ev) = rx.recv().await {
            match ev {
                Event::Input(input_ev) => {
                    if let Some(action) = input::map_input_to_action(&self.state, input_ev) {
                        self.handle_action(action, &tx).await;
                    }
                }
                Event::Player(pe) => self.handle_player(pe, &tx).await,
                Event::Network(ne) => self.handle_network(ne, &tx).await,
            }

            if self.state.should_quit {
                break;
            }

            self.state
                .playlist_cursor
                .clamp(self.playback.controller().len());
            self.state.results_cursor.clamp(self.state.results.len());
            tui::draw(terminal, &self.cfg, &mut self.state, self.playback.controller())?;
        }

        self.save_state_on_quit();
        Ok(())
    }

    fn save_state_on_quit(&mut self) {
        self.cfg.player.volume = self.state.volume;
        if let Err(e) = crate::config::save(&self.cfg, Some(&self.config_path)) {
            warn!(error = %format!("{e:#}"), "save config on quit");
        }
    }

    async fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::StartSearch => self.spawn_search(tx),
            Action::AddSelected => self.add_selected(),
            Action::StartPlayback => {
                if self.playback.controller().is_empty() {
                    self.state.status = "Playlist is empty".into();
                    return;
                }
                let notices = self.playback.start(tx).await;
                self.show_notices(notices);
            }
            Action::RemoveSelected => {
                let idx = self.state.playlist_cursor.selected;
                if idx < self.playback.controller().len() {
                    let notices = self.playback.remove_at(idx, tx).await;
                    self.show_notices(notices);
                }
            }
            Action::ClearPlaylist => {
                let notices = self.playback.clear(tx).await;
                self.state.playlist_cursor.reset();
                self.state.status = "Playlist cleared".into();
                self.show_notices(notices);
            }
            Action::Skip => {
                let notices = self.playback.skip(tx).await;
                self.show_notices(notices);
            }
            Action::PromptSubmit => self.submit_prompt(tx).await,
            Action::TogglePause => {
                if let Some(mpv) = self.playback.player()
                    && let Err(e) = mpv.toggle_pause().await
                {
                    self.state.status = format!("mpv error: {e:#}");
                }
            }
            Action::VolumeUp | Action::VolumeDown => {
                let v = if action == Action::VolumeUp {
                    self.state.volume.saturating_add(5).min(100)
                } else {
                    self.state.volume.saturating_sub(5)
                };
                self.state.volume = v;
                if let Some(mpv) = self.playback.player() {
                    let _ = mpv.set_volume(v).await;
                }
            }
            Action::SeekForward | Action::SeekBack => {
                let delta = if action == Action::SeekForward { 10.0 } else { -10.0 };
                if let Some(mpv) = self.playback.player() {
                    let _ = mpv.seek_relative(delta).await;
                }
            }
            _ => self.reduce(action),
        }
    }

    /// State-only actions.
    fn reduce(&mut self, action: Action) {
        let playlist_len = self.playback.controller().len();
        let state = &mut self.state;
        match action {
            Action::Quit => state.should_quit = true,
            Action::NextScreen | Action::PrevScreen | Action::SetScreen(_) | Action::SidebarUp
            | Action::SidebarDown => {
                let screen = match action {
                    Action::NextScreen => state.screen.next(),
                    Action::PrevScreen => state.screen.prev(),
                    Action::SetScreen(screen) => screen,
                    Action::SidebarUp => Screen::from_index(state.screen.index().saturating_sub(1)),
                    _ => Screen::from_index(state.screen.index() + 1),
                };
                set_screen(state, screen);
            }
            Action::SetSearchFocus(f) => state.search_focus = f,

            Action::ListUp | Action::ListDown | Action::GoTop | Action::GoBottom
            | Action::PageUp | Action::PageDown => {
                let (cursor, len) = match state.screen {
                    Screen::Search => (&mut state.results_cursor, state.results.len()),
                    Screen::Playlist => (&mut state.playlist_cursor, playlist_len),
                    Screen::Help => return,
                };
                match action {
                    Action::ListUp => cursor.select_prev(),
                    Action::ListDown => cursor.select_next(len),
                    Action::GoTop => cursor.go_top(),
                    Action::GoBottom => cursor.go_bottom(len),
                    Action::PageUp => cursor.page_up(),
                    _ => cursor.page_down(len),
                }
            }

            Action::InputChar(c) => state.search_query.push(c),
            Action::Backspace => {
                state.search_query.pop();
            }
            Action::ClearInput => state.search_query.clear(),
            Action::ClearSearches => {
                state.clear_searches();
                state.status = "Search results cleared".into();
            }

            Action::OpenPrompt(kind) => state.prompt = Some(Prompt::new(kind)),
            Action::PromptChar(c) => {
                if let Some(p) = &mut state.prompt {
                    p.input.push(c);
                }
            }
            Action::PromptBackspace => {
                if let Some(p) = &mut state.prompt {
                    p.input.pop();
                }
            }
            Action::PromptCancel => state.prompt = None,

            // Redrawn by the caller.
            Action::Resize => {}

            Action::StartSearch
            | Action::AddSelected
            | Action::StartPlayback
            | Action::RemoveSelected
            | Action::ClearPlaylist
            | Action::Skip
            | Action::PromptSubmit
            | Action::TogglePause
            | Action::VolumeUp
            | Action::VolumeDown
            | Action::SeekForward
            | Action::SeekBack => {}
        }
    }

    fn spawn_search(&mut self, tx: &mpsc::Sender<Event>) {
        if self.state.searching {
            return;
        }
        let query = self.state.search_query.trim().to_string();
        if query.is_empty() {
            self.state.status = "Type a query first".into();
            return;
        }
        self.state.searching = true;
        self.state.status = format!("Searching: {query}");

        let ytdlp = self.ytdlp.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let ev = match ytdlp.search(&query).await {
                Ok(items) => NetworkEvent::SearchResults { query, items },
                Err(e) => NetworkEvent::SearchFailed {
                    query,
                    error: format!("{e:#}"),
                },
            };
            let _ = tx.send(Event::Network(ev)).await;
        });
    }

    fn add_selected(&mut self) {
        // Nothing selected: silently ignore.
        let Some(result) = self.state.selected_result().cloned() else {
            return;
        };
        self.spawn_cache_title(result.url.clone(), result.title.clone());
        self.state.status = format!("Added: {}", result.title);
        self.playback.add(PlaylistEntry::from(result));
        self.state.search_query.clear();
    }

    async fn submit_prompt(&mut self, tx: &mpsc::Sender<Event>) {
        let Some(prompt) = self.state.prompt.take() else {
            return;
        };
        let Some(path) = playlist_file::resolve_path(&prompt.input, &self.cfg.paths.playlist_dir)
        else {
            self.state.toast = Some(Toast::error("Enter a file name"));
            return;
        };

        match prompt.kind {
            PromptKind::Save => {
                let urls = self.playback.controller().urls();
                match playlist_file::write_playlist(&path, &urls) {
                    Ok(()) => {
                        info!(path = %path.display(), entries = urls.len(), "playlist saved");
                        self.state.toast = Some(Toast::success(format!(
                            "Saved {} entries to {}",
                            urls.len(),
                            path.display()
                        )));
                    }
                    Err(e) => {
                        warn!(error = %format!("{e:#}"), "save playlist");
                        self.state.toast = Some(Toast::error(format!("Save failed: {e:#}")));
                    }
                }
            }
            PromptKind::Load => match playlist_file::read_playlist(&path) {
                Ok(urls) => {
                    info!(path = %path.display(), entries = urls.len(), "playlist loaded");
                    let entries = urls.iter().cloned().map(PlaylistEntry::new).collect();
                    let notices = self.playback.load(entries, tx).await;
                    self.show_notices(notices);
                    self.state.playlist_cursor.reset();
                    self.state.toast = Some(Toast::success(format!(
                        "Loaded {} entries",
                        urls.len()
                    )));
                    playback::spawn_title_lookup(
                        urls,
                        self.ytdlp.clone(),
                        self.storage.clone(),
                        tx.clone(),
                    );
                }
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "load playlist");
                    self.state.toast = Some(Toast::error(format!("Load failed: {e:#}")));
                }
            },
        }
    }

    fn show_notices(&mut self, notices: Vec<Notice>) {
        for notice in notices {
            match notice {
                Notice::NowPlaying { title } => {
                    self.state.paused = false;
                    self.state.status = format!("Playing: {title}");
                }
                Notice::Dropped { url, reason } => {
                    self.state.toast = Some(Toast::error(format!("Skipped {url}: {reason}")));
                }
                Notice::Halted { reason } => {
                    self.state.status = "Playback stopped".into();
                    self.state.toast = Some(Toast::error(format!("Playback stopped: {reason}")));
                }
            }
        }
    }

    async fn handle_player(&mut self, pe: PlayerEvent, tx: &mpsc::Sender<Event>) {
        match &pe {
            PlayerEvent::Resumed => self.state.paused = false,
            PlayerEvent::Paused => self.state.paused = true,
            PlayerEvent::Log(msg) => debug!(%msg, "mpv"),
            PlayerEvent::Ended | PlayerEvent::Failed(_) | PlayerEvent::Clock { .. } => {}
        }
        let notices = self.playback.on_player_event(&pe, tx).await;
        self.show_notices(notices);
    }

    async fn handle_network(&mut self, ne: NetworkEvent, tx: &mpsc::Sender<Event>) {
        match ne {
            NetworkEvent::SearchResults { query, items } => {
                self.state.status = format!("Results: {}", items.len());
                let has_results = !items.is_empty();
                self.state.set_results(query, items);
                if has_results {
                    self.state.search_focus = SearchFocus::Results;
                }
            }
            NetworkEvent::SearchFailed { query, error } => {
                warn!(%query, %error, "search failed");
                self.state.set_results(query, Vec::new());
                self.state.status = "Results: 0".into();
                self.state.toast = Some(Toast::error(format!("Search failed: {error}")));
            }
            NetworkEvent::Resolved { generation, result } => {
                if let Ok(stream) = &result
                    && self.playback.controller().active_generation() == Some(generation)
                    && let Some(entry) = self.playback.controller().current_entry()
                {
                    self.spawn_cache_title(entry.url.clone(), stream.title.clone());
                }
                let notices = self.playback.on_resolved(generation, result, tx).await;
                self.show_notices(notices);
            }
            NetworkEvent::TitleResolved { url, title } => self.playback.set_title(&url, &title),
        }
    }

    fn spawn_cache_title(&self, url: String, title: String) {
        let storage = self.storage.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.cache_title(&url, &title).await {
                warn!(error = %format!("{e:#}"), "cache title");
            }
        });
    }
}

fn set_screen(state: &mut AppState, screen: Screen) {
    state.screen = screen;
    if screen == Screen::Search {
        state.search_focus = SearchFocus::Input;
    }
}
