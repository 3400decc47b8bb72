//! Sequential playback of a saved playlist without the terminal UI.

use super::events::{Event, NetworkEvent};
use super::playback::{self, Notice, Playback};
use crate::config::Config;
use crate::player::StreamPlayer;
use crate::player::mpv::MpvHandle;
use crate::playlist::{PlaylistEntry, file as playlist_file};
use crate::storage::StorageHandle;
use crate::youtube::YtDlp;
use anyhow::Context;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub async fn run_headless(cfg: &Config, file: &Path) -> anyhow::Result<()> {
    let urls = playlist_file::read_playlist(file)?;
    if urls.is_empty() {
        println!("{} has no entries", file.display());
        return Ok(());
    }

    let (tx, mut rx) = mpsc::channel::<Event>(256);
    let mpv = MpvHandle::spawn(
        &cfg.player.binary,
        tx.clone(),
        cfg.player.audio_device.as_deref(),
        Some(&cfg.paths.data_dir.join("mpv.log")),
    )
    .await
    .context("start mpv")?;
    mpv.set_volume(cfg.player.volume.min(100)).await?;

    let ytdlp = YtDlp::new(&cfg.ytdlp);
    let storage = StorageHandle::new(cfg.paths.data_dir.join("cache.sqlite3"));
    let mut playback = Playback::new(ytdlp.clone(), Some(mpv));

    info!(path = %file.display(), entries = urls.len(), "playing playlist");
    let entries = urls.iter().cloned().map(PlaylistEntry::new).collect();
    print_notices(playback.load(entries, &tx).await);
    playback::spawn_title_lookup(urls, ytdlp, storage, tx.clone());
    print_notices(playback.start(&tx).await);

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "no ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };
    play_until_done(&mut playback, &mut rx, &tx, interrupt).await
}

/// Feed events to `playback` until the playlist runs dry or `interrupt` fires.
async fn play_until_done<P: StreamPlayer>(
    playback: &mut Playback<P>,
    rx: &mut mpsc::Receiver<Event>,
    tx: &mpsc::Sender<Event>,
    interrupt: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    tokio::pin!(interrupt);

    while !playback.is_finished() {
        let ev = tokio::select! {
            biased;
            _ = &mut interrupt => {
                info!("interrupted");
                print_notices(playback.clear(tx).await);
                break;
            }
            ev = rx.recv() => match ev {
                Some(ev) => ev,
                None => break,
            },
        };

        let notices = match ev {
            Event::Player(pe) => playback.on_player_event(&pe, tx).await,
            Event::Network(NetworkEvent::Resolved { generation, result }) => {
                playback.on_resolved(generation, result, tx).await
            }
            Event::Network(NetworkEvent::TitleResolved { url, title }) => {
                playback.set_title(&url, &title);
                Vec::new()
            }
            other => {
                debug!(event = ?other, "ignored");
                Vec::new()
            }
        };
        print_notices(notices);

        // Halted leaves entries behind; nothing will restart it here.
        if playback.controller().active_generation().is_none() && !playback.is_finished() {
            anyhow::bail!("playback halted with {} entries left", playback.controller().len());
        }
    }

    Ok(())
}

fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice {
            Notice::NowPlaying { title } => println!("▶ {title}"),
            Notice::Dropped { url, reason } => eprintln!("skipped {url}: {reason}"),
            Notice::Halted { reason } => eprintln!("stopped: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::PlayerEvent;
    use crate::app::playback::tests::{FakePlayer, missing_ytdlp, stream};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    async fn playing(urls: &[&str], tx: &mpsc::Sender<Event>) -> Playback<FakePlayer> {
        let mut pb = Playback::new(missing_ytdlp(), Some(FakePlayer::default()));
        for url in urls {
            pb.add(PlaylistEntry::new(*url));
        }
        pb.start(tx).await;
        let generation = pb.controller().active_generation().unwrap();
        pb.on_resolved(generation, stream(urls[0]), tx).await;
        assert!(pb.controller().is_playing());
        pb
    }

    #[tokio::test]
    async fn pending_interrupt_wins_over_queued_events() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut pb = playing(&["https://a", "https://b"], &tx).await;
        tx.send(Event::Player(PlayerEvent::Ended)).await.unwrap();

        play_until_done(&mut pb, &mut rx, &tx, std::future::ready(()))
            .await
            .unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.player().unwrap().stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn returns_after_last_track_ends() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut pb = playing(&["https://a"], &tx).await;
        tx.send(Event::Player(PlayerEvent::Ended)).await.unwrap();

        let run = play_until_done(&mut pb, &mut rx, &tx, std::future::pending());
        tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .unwrap()
            .unwrap();
        assert!(pb.is_finished());
        assert_eq!(pb.player().unwrap().stops.load(Ordering::SeqCst), 0);
    }
}
