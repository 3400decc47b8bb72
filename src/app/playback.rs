//! Carries out playlist controller commands against yt-dlp and mpv.

use super::events::{Event, NetworkEvent, PlayerEvent};
use crate::player::StreamPlayer;
use crate::player::mpv::MpvHandle;
use crate::playlist::controller::Generation;
use crate::playlist::{Command, PlaylistController, PlaylistEntry};
use crate::storage::StorageHandle;
use crate::youtube::models::ResolvedStream;
use crate::youtube::{ResolveError, YtDlp};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const CLOCK_PERIOD: Duration = Duration::from_secs(1);

/// Something the front end should tell the user about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NowPlaying { title: String },
    Dropped { url: String, reason: String },
    Halted { reason: String },
}

pub struct Playback<P = MpvHandle> {
    controller: PlaylistController,
    ytdlp: YtDlp,
    player: Option<Arc<P>>,
    resolver: Option<JoinHandle<()>>,
    active: watch::Sender<Option<Generation>>,
}

impl<P: StreamPlayer> Playback<P> {
    pub fn new(ytdlp: YtDlp, player: Option<P>) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            controller: PlaylistController::new(),
            ytdlp,
            player: player.map(Arc::new),
            resolver: None,
            active,
        }
    }

    pub fn controller(&self) -> &PlaylistController {
        &self.controller
    }

    pub fn player(&self) -> Option<&P> {
        self.player.as_deref()
    }

    /// Nothing loading or playing and nothing left to play.
    pub fn is_finished(&self) -> bool {
        self.controller.active_generation().is_none() && self.controller.is_empty()
    }

    pub fn add(&mut self, entry: PlaylistEntry) {
        self.controller.add(entry);
    }

    pub fn set_title(&mut self, url: &str, title: &str) {
        self.controller.set_title(url, title);
    }

    pub async fn start(&mut self, tx: &mpsc::Sender<Event>) -> Vec<Notice> {
        if self.player.is_none() {
            return vec![Notice::Halted {
                reason: "mpv not available".into(),
            }];
        }
        let cmds = self.controller.start();
        self.apply(cmds, tx).await
    }

    pub async fn remove_at(&mut self, index: usize, tx: &mpsc::Sender<Event>) -> Vec<Notice> {
        let cmds = self.controller.remove_at(index);
        self.apply(cmds, tx).await
    }

    pub async fn skip(&mut self, tx: &mpsc::Sender<Event>) -> Vec<Notice> {
        let cmds = self.controller.skip();
        self.apply(cmds, tx).await
    }

    pub async fn clear(&mut self, tx: &mpsc::Sender<Event>) -> Vec<Notice> {
        let cmds = self.controller.clear();
        self.apply(cmds, tx).await
    }

    pub async fn load(
        &mut self,
        entries: Vec<PlaylistEntry>,
        tx: &mpsc::Sender<Event>,
    ) -> Vec<Notice> {
        let cmds = self.controller.load(entries);
        self.apply(cmds, tx).await
    }

    pub async fn on_resolved(
        &mut self,
        generation: Generation,
        result: Result<ResolvedStream, ResolveError>,
        tx: &mpsc::Sender<Event>,
    ) -> Vec<Notice> {
        let cmds = self.controller.on_resolved(generation, result);
        self.apply(cmds, tx).await
    }

    /// Feed an mpv event through the controller. Pause and log events are
    /// left to the caller.
    pub async fn on_player_event(&mut self, pe: &PlayerEvent, tx: &mpsc::Sender<Event>) -> Vec<Notice> {
        let cmds = match pe {
            PlayerEvent::Ended => self.controller.on_track_ended(),
            PlayerEvent::Failed(reason) => self.controller.on_playback_failed(reason),
            PlayerEvent::Clock {
                generation,
                position_secs,
                duration_secs,
            } => {
                self.controller
                    .on_clock(*generation, *position_secs, *duration_secs);
                Vec::new()
            }
            PlayerEvent::Resumed | PlayerEvent::Paused | PlayerEvent::Log(_) => Vec::new(),
        };
        self.apply(cmds, tx).await
    }

    async fn apply(&mut self, cmds: Vec<Command>, tx: &mpsc::Sender<Event>) -> Vec<Notice> {
        let mut queue: VecDeque<Command> = cmds.into();
        let mut notices = Vec::new();

        while let Some(cmd) = queue.pop_front() {
            match cmd {
                Command::Resolve { generation, url } => self.spawn_resolve(generation, url, tx),
                Command::Play {
                    generation,
                    stream_url,
                } => {
                    let Some(player) = self.player.clone() else {
                        queue.extend(self.controller.halt("mpv not available"));
                        continue;
                    };
                    match player.load_url(&stream_url).await {
                        Ok(()) => {
                            let title = self
                                .controller
                                .current_entry()
                                .map(|e| e.display().to_string())
                                .unwrap_or_default();
                            // Publish before the clock task first looks.
                            self.active.send_replace(self.controller.active_generation());
                            spawn_clock(generation, player, self.active.subscribe(), tx.clone());
                            notices.push(Notice::NowPlaying { title });
                        }
                        // A broken IPC pipe is the player's fault, not the entry's.
                        Err(e) => queue.extend(self.controller.halt(&format!("{e:#}"))),
                    }
                }
                Command::Stop => {
                    // An in-flight resolution is left to finish and arrives stale.
                    if let Some(player) = &self.player
                        && let Err(e) = player.stop().await
                    {
                        warn!(error = %format!("{e:#}"), "mpv stop failed");
                    }
                }
                Command::EntryDropped { url, reason } => notices.push(Notice::Dropped { url, reason }),
                Command::Halted { reason } => notices.push(Notice::Halted { reason }),
            }
        }

        self.active.send_replace(self.controller.active_generation());
        notices
    }

    fn spawn_resolve(&mut self, generation: Generation, url: String, tx: &mpsc::Sender<Event>) {
        // One resolution at a time; aborting kills the superseded yt-dlp child.
        if let Some(handle) = self.resolver.take() {
            handle.abort();
        }
        debug!(generation, %url, "resolving");

        let ytdlp = self.ytdlp.clone();
        let tx = tx.clone();
        self.resolver = Some(tokio::spawn(async move {
            let result = ytdlp.resolve(&url).await;
            let _ = tx
                .send(Event::Network(NetworkEvent::Resolved { generation, result }))
                .await;
        }));
    }
}

/// Poll the player once a second for as long as `generation` is the one
/// published on `active`.
fn spawn_clock<P: StreamPlayer>(
    generation: Generation,
    player: Arc<P>,
    active: watch::Receiver<Option<Generation>>,
    tx: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLOCK_PERIOD);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if *active.borrow() != Some(generation) {
                break;
            }
            let (position_secs, duration_secs) = player.clock().await;
            let ev = Event::Player(PlayerEvent::Clock {
                generation,
                position_secs,
                duration_secs,
            });
            if tx.send(ev).await.is_err() {
                break;
            }
        }
        debug!(generation, "clock stopped");
    })
}

/// Fill in display titles for loaded URLs: title cache first, then yt-dlp.
/// Entries whose lookup fails keep showing their URL.
pub fn spawn_title_lookup(
    urls: Vec<String>,
    ytdlp: YtDlp,
    storage: StorageHandle,
    tx: mpsc::Sender<Event>,
) {
    tokio::spawn(async move {
        for url in urls {
            let cached = match storage.get_title(&url).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %format!("{e:#}"), "title cache read failed");
                    None
                }
            };
            let title = match cached {
                Some(t) => t,
                None => match ytdlp.resolve_title(&url).await {
                    Ok(t) => {
                        if let Err(e) = storage.cache_title(&url, &t).await {
                            warn!(error = %format!("{e:#}"), "title cache write failed");
                        }
                        t
                    }
                    Err(e) => {
                        debug!(%url, error = %format!("{e:#}"), "title lookup failed");
                        continue;
                    }
                },
            };
            let ev = Event::Network(NetworkEvent::TitleResolved { url, title });
            if tx.send(ev).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::YtDlpConfig;
    use crate::playlist::PlaybackPhase;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    pub(crate) struct FakePlayer {
        pub broken: bool,
        pub loaded: Mutex<Vec<String>>,
        pub stops: AtomicUsize,
    }

    impl StreamPlayer for FakePlayer {
        async fn load_url(&self, url: &str) -> anyhow::Result<()> {
            if self.broken {
                anyhow::bail!("ipc pipe closed");
            }
            self.loaded.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn clock(&self) -> (f64, f64) {
            (12.0, 200.0)
        }
    }

    pub(crate) fn missing_ytdlp() -> YtDlp {
        YtDlp::new(&YtDlpConfig {
            binary: "tubeline-test-no-such-binary".into(),
            ..YtDlpConfig::default()
        })
    }

    pub(crate) fn stream(url: &str) -> Result<ResolvedStream, ResolveError> {
        Ok(ResolvedStream {
            stream_url: format!("stream://{url}"),
            title: format!("Title {url}"),
        })
    }

    /// Start playback and answer the head's resolution by hand.
    async fn start_playing(
        pb: &mut Playback<FakePlayer>,
        tx: &mpsc::Sender<Event>,
    ) -> (Generation, Vec<Notice>) {
        assert!(pb.start(tx).await.is_empty());
        let generation = pb.controller().active_generation().unwrap();
        let notices = pb.on_resolved(generation, stream("https://a"), tx).await;
        (generation, notices)
    }

    async fn next_clock(rx: &mut mpsc::Receiver<Event>) -> (Generation, f64, f64) {
        let wait = async {
            loop {
                match rx.recv().await {
                    Some(Event::Player(PlayerEvent::Clock {
                        generation,
                        position_secs,
                        duration_secs,
                    })) => return (generation, position_secs, duration_secs),
                    Some(_) => continue,
                    None => panic!("inbox closed"),
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn start_without_player_keeps_entries() {
        let (tx, _rx) = mpsc::channel(8);
        let mut pb = Playback::<FakePlayer>::new(missing_ytdlp(), None);
        pb.add(PlaylistEntry::new("https://a"));

        let notices = pb.start(&tx).await;
        assert!(matches!(notices.as_slice(), [Notice::Halted { .. }]));
        assert_eq!(pb.controller().len(), 1);
        assert!(!pb.is_finished());

        assert!(pb.clear(&tx).await.is_empty());
        assert!(pb.is_finished());
    }

    #[tokio::test]
    async fn play_starts_clock_for_active_generation() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut pb = Playback::new(missing_ytdlp(), Some(FakePlayer::default()));
        pb.add(PlaylistEntry::new("https://a"));
        pb.add(PlaylistEntry::new("https://b"));

        let (generation, notices) = start_playing(&mut pb, &tx).await;
        assert_eq!(
            notices,
            vec![Notice::NowPlaying {
                title: "Title https://a".into()
            }]
        );
        assert_eq!(pb.controller().phase(), PlaybackPhase::Playing(generation));
        let player = pb.player().unwrap();
        assert_eq!(*player.loaded.lock().unwrap(), vec!["stream://https://a"]);

        assert_eq!(next_clock(&mut rx).await, (generation, 12.0, 200.0));

        assert!(pb.clear(&tx).await.is_empty());
        assert_eq!(pb.player().unwrap().stops.load(Ordering::SeqCst), 1);
        assert!(pb.is_finished());
    }

    #[tokio::test]
    async fn broken_player_halts_and_keeps_entries() {
        let (tx, _rx) = mpsc::channel(16);
        let player = FakePlayer {
            broken: true,
            ..FakePlayer::default()
        };
        let mut pb = Playback::new(missing_ytdlp(), Some(player));
        pb.add(PlaylistEntry::new("https://a"));
        pb.add(PlaylistEntry::new("https://b"));

        let (_, notices) = start_playing(&mut pb, &tx).await;
        assert!(matches!(notices.as_slice(), [Notice::Halted { reason }] if reason.contains("ipc pipe closed")));
        assert_eq!(pb.controller().phase(), PlaybackPhase::Idle);
        assert_eq!(pb.controller().urls(), vec!["https://a", "https://b"]);
        assert!(!pb.is_finished());
    }

    #[tokio::test]
    async fn clock_exits_once_generation_is_replaced() {
        for next in [Some(8), None] {
            let (active_tx, active_rx) = watch::channel(Some(7));
            let (tx, mut rx) = mpsc::channel(16);
            let clock = spawn_clock(7, Arc::new(FakePlayer::default()), active_rx, tx);

            assert_eq!(next_clock(&mut rx).await.0, 7);
            active_tx.send_replace(next);
            tokio::time::timeout(Duration::from_secs(5), clock)
                .await
                .unwrap()
                .unwrap();
            drop(rx);
        }
    }

    #[tokio::test]
    async fn title_lookup_prefers_cache_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let storage = StorageHandle::new(dir.path().join("cache.sqlite3"));
        storage.cache_title("https://cached", "Cached Title").await.unwrap();

        let (tx, mut rx) = mpsc::channel(8);
        spawn_title_lookup(
            vec!["https://cached".into(), "https://unknown".into()],
            missing_ytdlp(),
            storage,
            tx,
        );

        match rx.recv().await {
            Some(Event::Network(NetworkEvent::TitleResolved { url, title })) => {
                assert_eq!(url, "https://cached");
                assert_eq!(title, "Cached Title");
            }
            other => panic!("unexpected {other:?}"),
        }
        // yt-dlp cannot run, so the second URL keeps its fallback.
        assert!(rx.recv().await.is_none());
    }
}
