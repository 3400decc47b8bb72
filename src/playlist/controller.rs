//! Playlist controller: the playback state machine.
//!
//! The controller never performs I/O. Every operation returns the [`Command`]s
//! the owner must carry out (resolve a URL, hand a stream to the player, stop),
//! and results come back through the `on_*` methods. Resolutions are tagged
//! with the [`Generation`] that asked for them; anything tagged with a
//! superseded generation is ignored.
//!
//! Playback always works on the head of the list. Finished or broken entries
//! are evicted, never kept as history and never retried.

use super::PlaylistEntry;
use crate::youtube::ResolveError;
use crate::youtube::models::ResolvedStream;
use tracing::{debug, info, warn};

pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// Nothing loaded.
    #[default]
    Idle,
    /// Waiting for the head entry to resolve.
    Loading(Generation),
    /// Stream handed to the player; waiting for end of track.
    Playing(Generation),
    /// Explicitly stopped by clear or by removing the active entry.
    Stopped,
}

/// Work the owner of the controller has to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Resolve { generation: Generation, url: String },
    Play { generation: Generation, stream_url: String },
    Stop,
    /// An entry failed and was removed from the playlist.
    EntryDropped { url: String, reason: String },
    /// Playback gave up without blaming any entry.
    Halted { reason: String },
}

#[derive(Debug, Default)]
pub struct PlaylistController {
    entries: Vec<PlaylistEntry>,
    current_index: Option<usize>,
    phase: PlaybackPhase,
    generation: Generation,
    position_secs: f64,
    duration_secs: f64,
}

impl PlaylistController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_entry(&self) -> Option<&PlaylistEntry> {
        self.current_index.and_then(|i| self.entries.get(i))
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.phase, PlaybackPhase::Playing(_))
    }

    /// Generation of the in-flight load or playback, if any.
    pub fn active_generation(&self) -> Option<Generation> {
        match self.phase {
            PlaybackPhase::Loading(g) | PlaybackPhase::Playing(g) => Some(g),
            PlaybackPhase::Idle | PlaybackPhase::Stopped => None,
        }
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// `MM:SS / MM:SS` while playing, zeros otherwise.
    pub fn time_label(&self) -> String {
        if self.is_playing() {
            format!(
                "{} / {}",
                format_clock(self.position_secs),
                format_clock(self.duration_secs)
            )
        } else {
            format!("{} / {}", format_clock(0.0), format_clock(0.0))
        }
    }

    /// Playlist URLs in playback order, head first.
    pub fn urls(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.url.as_str()).collect()
    }

    pub fn add(&mut self, entry: PlaylistEntry) {
        debug!(url = %entry.url, "playlist add");
        self.entries.push(entry);
    }

    /// Fill in a display title for every untitled entry with this URL.
    pub fn set_title(&mut self, url: &str, title: &str) {
        for e in self.entries.iter_mut().filter(|e| e.url == url && e.title.is_none()) {
            e.title = Some(title.to_string());
        }
    }

    /// Remove one entry, keeping the identity of the active entry intact.
    pub fn remove_at(&mut self, index: usize) -> Vec<Command> {
        if index >= self.entries.len() {
            return Vec::new();
        }

        match self.current_index {
            Some(current) if current == index => {
                let removed = self.entries.remove(index);
                info!(url = %removed.url, "removed active entry");
                let mut cmds = vec![Command::Stop];
                self.stop_machine();
                if !self.entries.is_empty() {
                    self.advance(&mut cmds);
                }
                cmds
            }
            Some(current) if index < current => {
                self.entries.remove(index);
                self.current_index = Some(current - 1);
                Vec::new()
            }
            _ => {
                self.entries.remove(index);
                Vec::new()
            }
        }
    }

    /// Abandon the active entry and move on to the next one.
    pub fn skip(&mut self) -> Vec<Command> {
        match self.current_index {
            Some(i) => self.remove_at(i),
            None => Vec::new(),
        }
    }

    pub fn clear(&mut self) -> Vec<Command> {
        self.entries.clear();
        self.stop_machine();
        vec![Command::Stop]
    }

    /// Replace the playlist wholesale. Does not start playback.
    pub fn load(&mut self, entries: Vec<PlaylistEntry>) -> Vec<Command> {
        let cmds = self.clear();
        self.entries.extend(entries);
        cmds
    }

    /// Begin playing from the head. A no-op while a load or playback is active.
    pub fn start(&mut self) -> Vec<Command> {
        if let Some(generation) = self.active_generation() {
            debug!(generation, "start ignored, playback already active");
            return Vec::new();
        }
        let mut cmds = Vec::new();
        self.advance(&mut cmds);
        cmds
    }

    pub fn on_resolved(
        &mut self,
        generation: Generation,
        result: Result<ResolvedStream, ResolveError>,
    ) -> Vec<Command> {
        if self.phase != PlaybackPhase::Loading(generation) {
            debug!(generation, phase = ?self.phase, "dropping stale resolution");
            return Vec::new();
        }

        match result {
            Ok(stream) => {
                if let Some(head) = self.entries.first_mut()
                    && head.title.is_none()
                {
                    head.title = Some(stream.title.clone());
                }
                info!(generation, title = %stream.title, "playing");
                self.phase = PlaybackPhase::Playing(generation);
                vec![Command::Play {
                    generation,
                    stream_url: stream.stream_url,
                }]
            }
            Err(err) if err.is_entry_fault() => self.drop_head_and_advance(err.to_string()),
            Err(err) => self.halt(&err.to_string()),
        }
    }

    /// Give up on playback without evicting anything. A stream already
    /// handed to the player is stopped first.
    pub fn halt(&mut self, reason: &str) -> Vec<Command> {
        warn!(phase = ?self.phase, %reason, "halting playback");
        let mut cmds = Vec::new();
        if self.is_playing() {
            cmds.push(Command::Stop);
        }
        self.generation += 1;
        self.phase = PlaybackPhase::Idle;
        self.current_index = None;
        self.reset_clock();
        cmds.push(Command::Halted {
            reason: reason.to_string(),
        });
        cmds
    }

    pub fn on_track_ended(&mut self) -> Vec<Command> {
        if !self.is_playing() {
            return Vec::new();
        }
        let mut cmds = Vec::new();
        if let Some(done) = self.evict_head() {
            debug!(url = %done.url, "track finished");
        }
        self.advance(&mut cmds);
        cmds
    }

    /// The player rejected the stream it was given.
    pub fn on_playback_failed(&mut self, reason: &str) -> Vec<Command> {
        if !self.is_playing() {
            return Vec::new();
        }
        self.drop_head_and_advance(reason.to_string())
    }

    pub fn on_clock(&mut self, generation: Generation, position_secs: f64, duration_secs: f64) {
        if self.phase == PlaybackPhase::Playing(generation) {
            self.position_secs = position_secs.max(0.0);
            self.duration_secs = duration_secs.max(0.0);
        }
    }

    fn drop_head_and_advance(&mut self, reason: String) -> Vec<Command> {
        let mut cmds = Vec::new();
        if let Some(entry) = self.evict_head() {
            warn!(url = %entry.url, %reason, "dropping playlist entry");
            cmds.push(Command::EntryDropped {
                url: entry.url,
                reason,
            });
        }
        self.advance(&mut cmds);
        cmds
    }

    fn evict_head(&mut self) -> Option<PlaylistEntry> {
        self.current_index = None;
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    fn advance(&mut self, cmds: &mut Vec<Command>) {
        self.reset_clock();
        let Some(head) = self.entries.first() else {
            self.phase = PlaybackPhase::Idle;
            self.current_index = None;
            return;
        };

        self.generation += 1;
        self.phase = PlaybackPhase::Loading(self.generation);
        self.current_index = Some(0);
        cmds.push(Command::Resolve {
            generation: self.generation,
            url: head.url.clone(),
        });
    }

    fn stop_machine(&mut self) {
        // Bumping the generation turns any in-flight resolution stale.
        self.generation += 1;
        self.phase = PlaybackPhase::Stopped;
        self.current_index = None;
        self.reset_clock();
    }

    fn reset_clock(&mut self) {
        self.position_secs = 0.0;
        self.duration_secs = 0.0;
    }
}

pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn entries(urls: &[&str]) -> Vec<PlaylistEntry> {
        urls.iter().map(|u| PlaylistEntry::new(*u)).collect()
    }

    fn ok(url: &str) -> Result<ResolvedStream, ResolveError> {
        Ok(ResolvedStream {
            stream_url: format!("stream://{url}"),
            title: format!("Title {url}"),
        })
    }

    fn urls(c: &PlaylistController) -> Vec<String> {
        c.urls().into_iter().map(str::to_string).collect()
    }

    /// Answer every `Resolve` with `outcome` until the controller settles.
    fn drive<F>(c: &mut PlaylistController, cmds: Vec<Command>, outcome: F) -> Vec<Command>
    where
        F: Fn(&str) -> Result<ResolvedStream, ResolveError>,
    {
        let mut queue: VecDeque<Command> = cmds.into();
        let mut seen = Vec::new();
        while let Some(cmd) = queue.pop_front() {
            if let Command::Resolve { generation, url } = &cmd {
                queue.extend(c.on_resolved(*generation, outcome(url)));
            }
            seen.push(cmd);
        }
        seen
    }

    fn plays(cmds: &[Command]) -> usize {
        cmds.iter().filter(|c| matches!(c, Command::Play { .. })).count()
    }

    fn loaded(urls: &[&str]) -> PlaylistController {
        let mut c = PlaylistController::new();
        for e in entries(urls) {
            c.add(e);
        }
        c
    }

    #[test]
    fn add_has_no_playback_side_effect() {
        let c = loaded(&["a", "b"]);
        assert_eq!(c.len(), 2);
        assert_eq!(c.phase(), PlaybackPhase::Idle);
        assert_eq!(c.current_index(), None);
    }

    #[test]
    fn start_on_empty_stays_idle() {
        let mut c = PlaylistController::new();
        assert!(c.start().is_empty());
        assert_eq!(c.phase(), PlaybackPhase::Idle);
        assert_eq!(c.current_index(), None);
    }

    #[test]
    fn start_resolves_head_then_plays() {
        let mut c = loaded(&["a", "b"]);
        let cmds = c.start();
        let generation = match cmds.as_slice() {
            [Command::Resolve { generation, url }] if url == "a" => *generation,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(c.phase(), PlaybackPhase::Loading(generation));
        assert_eq!(c.current_index(), Some(0));

        let cmds = c.on_resolved(generation, ok("a"));
        assert_eq!(
            cmds,
            vec![Command::Play {
                generation,
                stream_url: "stream://a".into()
            }]
        );
        assert!(c.is_playing());
        assert_eq!(c.current_entry().unwrap().display(), "Title a");
    }

    #[test]
    fn resolved_title_does_not_override_search_title() {
        let mut c = PlaylistController::new();
        c.add(PlaylistEntry::with_title("a", "From search"));
        let cmds = c.start();
        drive(&mut c, cmds, ok);
        assert_eq!(c.entries()[0].display(), "From search");
    }

    #[test]
    fn failing_entries_are_dropped_until_one_plays() {
        let mut c = loaded(&["a", "b", "c"]);
        let cmds = c.start();
        let seen = drive(&mut c, cmds, |url| match url {
            "c" => ok(url),
            _ => Err(ResolveError::Failed("video unavailable".into())),
        });

        assert_eq!(urls(&c), vec!["c"]);
        assert_eq!(c.current_index(), Some(0));
        assert!(c.is_playing());
        assert_eq!(plays(&seen), 1);
        let dropped: Vec<&str> = seen
            .iter()
            .filter_map(|c| match c {
                Command::EntryDropped { url, .. } => Some(url.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(dropped, vec!["a", "b"]);
    }

    #[test]
    fn run_of_failures_before_success_leaves_one_playback() {
        for n in 0..6 {
            let mut names: Vec<String> = (0..n).map(|i| format!("bad{i}")).collect();
            names.push("good".into());
            names.push("later".into());
            let mut c = PlaylistController::new();
            for name in &names {
                c.add(PlaylistEntry::new(name.clone()));
            }

            let cmds = c.start();
            let seen = drive(&mut c, cmds, |url| {
                if url.starts_with("bad") {
                    Err(ResolveError::NoStream)
                } else {
                    ok(url)
                }
            });
            assert_eq!(plays(&seen), 1);
            assert_eq!(urls(&c), vec!["good", "later"]);
            assert!(c.is_playing());
        }
    }

    #[test]
    fn all_failing_drains_to_idle() {
        let mut c = loaded(&["a", "b"]);
        let cmds = c.start();
        drive(&mut c, cmds, |_| Err(ResolveError::Malformed("eof".into())));
        assert!(c.is_empty());
        assert_eq!(c.phase(), PlaybackPhase::Idle);
        assert_eq!(c.current_index(), None);
    }

    #[test]
    fn launch_failure_halts_without_dropping() {
        let mut c = loaded(&["a", "b"]);
        let cmds = c.start();
        let seen = drive(&mut c, cmds, |_| {
            Err(ResolveError::Launch(std::io::Error::from(
                std::io::ErrorKind::NotFound,
            )))
        });
        assert!(matches!(seen.last(), Some(Command::Halted { .. })));
        assert_eq!(urls(&c), vec!["a", "b"]);
        assert_eq!(c.phase(), PlaybackPhase::Idle);
        assert_eq!(c.current_index(), None);
    }

    #[test]
    fn halt_keeps_entries_and_allows_restart() {
        let mut c = loaded(&["a", "b"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        let cmds = c.halt("player went away");
        assert!(matches!(
            cmds.as_slice(),
            [Command::Stop, Command::Halted { reason }] if reason == "player went away"
        ));
        assert_eq!(urls(&c), vec!["a", "b"]);
        assert_eq!(c.phase(), PlaybackPhase::Idle);
        assert!(c.on_track_ended().is_empty());
        assert!(matches!(c.start().as_slice(), [Command::Resolve { url, .. }] if url == "a"));
    }

    #[test]
    fn halt_while_loading_has_nothing_to_stop() {
        let mut c = loaded(&["a"]);
        let stale = c.start();
        assert!(matches!(c.phase(), PlaybackPhase::Loading(_)));

        let cmds = c.halt("yt-dlp missing");
        assert!(matches!(cmds.as_slice(), [Command::Halted { .. }]));
        assert_eq!(c.phase(), PlaybackPhase::Idle);
        assert_eq!(urls(&c), vec!["a"]);
        // The resolution started before the halt lands stale.
        let Some(Command::Resolve { generation, .. }) = stale.first() else {
            panic!("expected a resolve, got {stale:?}");
        };
        assert!(c.on_resolved(*generation, ok("a")).is_empty());
    }

    #[test]
    fn track_end_advances_to_next() {
        let mut c = loaded(&["a", "b"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        let cmds = c.on_track_ended();
        assert!(matches!(cmds.as_slice(), [Command::Resolve { url, .. }] if url == "b"));
        assert_eq!(urls(&c), vec!["b"]);
        drive(&mut c, cmds, ok);
        assert!(c.is_playing());

        assert!(c.on_track_ended().is_empty());
        assert!(c.is_empty());
        assert_eq!(c.phase(), PlaybackPhase::Idle);
        assert_eq!(c.current_index(), None);
    }

    #[test]
    fn track_end_outside_playback_is_ignored() {
        let mut c = loaded(&["a"]);
        assert!(c.on_track_ended().is_empty());
        let _ = c.start();
        assert!(c.on_track_ended().is_empty());
        assert_eq!(urls(&c), vec!["a"]);
    }

    #[test]
    fn playback_failure_takes_the_error_path() {
        let mut c = loaded(&["a", "b"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        let cmds = c.on_playback_failed("unsupported codec");
        assert!(matches!(
            cmds.first(),
            Some(Command::EntryDropped { url, .. }) if url == "a"
        ));
        assert!(matches!(cmds.get(1), Some(Command::Resolve { url, .. }) if url == "b"));
    }

    #[test]
    fn second_start_while_loading_is_ignored() {
        let mut c = loaded(&["a", "b"]);
        let first = c.start();
        assert_eq!(first.len(), 1);
        assert!(c.start().is_empty());
        drive(&mut c, first, ok);
        assert!(c.start().is_empty());
        assert_eq!(urls(&c), vec!["a", "b"]);
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let mut c = loaded(&["a", "b"]);
        let stale = match c.start().as_slice() {
            [Command::Resolve { generation, .. }] => *generation,
            other => panic!("unexpected {other:?}"),
        };

        // Removing the loading head restarts on "b" with a new generation.
        let cmds = c.remove_at(0);
        assert_eq!(cmds.first(), Some(&Command::Stop));
        let fresh = match cmds.get(1) {
            Some(Command::Resolve { generation, url }) if url == "b" => *generation,
            other => panic!("unexpected {other:?}"),
        };
        assert_ne!(stale, fresh);

        assert!(c.on_resolved(stale, ok("a")).is_empty());
        assert!(!c.is_playing());
        assert!(c.on_resolved(stale, Err(ResolveError::NoStream)).is_empty());
        assert_eq!(urls(&c), vec!["b"]);

        assert_eq!(plays(&c.on_resolved(fresh, ok("b"))), 1);
    }

    #[test]
    fn result_arriving_after_clear_is_discarded() {
        let mut c = loaded(&["a"]);
        let generation = match c.start().as_slice() {
            [Command::Resolve { generation, .. }] => *generation,
            other => panic!("unexpected {other:?}"),
        };
        c.clear();
        assert!(c.on_resolved(generation, ok("a")).is_empty());
        assert_eq!(c.phase(), PlaybackPhase::Stopped);
    }

    #[test]
    fn removing_active_entry_stops_and_restarts_at_head() {
        let mut c = loaded(&["a", "b", "c"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        let cmds = c.remove_at(0);
        assert_eq!(cmds.first(), Some(&Command::Stop));
        assert!(matches!(cmds.get(1), Some(Command::Resolve { url, .. }) if url == "b"));
        assert_eq!(c.current_index(), Some(0));
        assert_eq!(urls(&c), vec!["b", "c"]);
    }

    #[test]
    fn removing_last_active_entry_stops() {
        let mut c = loaded(&["a"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        assert_eq!(c.remove_at(0), vec![Command::Stop]);
        assert_eq!(c.phase(), PlaybackPhase::Stopped);
        assert_eq!(c.current_index(), None);
        assert!(c.is_empty());
    }

    #[test]
    fn removing_before_current_keeps_active_identity() {
        for len in 2..6usize {
            for current in 1..len {
                for i in 0..current {
                    let names: Vec<String> = (0..len).map(|n| format!("e{n}")).collect();
                    let mut c = PlaylistController::new();
                    for n in &names {
                        c.add(PlaylistEntry::new(n.clone()));
                    }
                    c.current_index = Some(current);
                    c.phase = PlaybackPhase::Playing(7);

                    let active = c.current_entry().unwrap().url.clone();
                    assert!(c.remove_at(i).is_empty());
                    assert_eq!(c.current_index(), Some(current - 1));
                    assert_eq!(c.current_entry().unwrap().url, active);
                    assert_eq!(c.phase(), PlaybackPhase::Playing(7));
                }
            }
        }
    }

    #[test]
    fn removing_after_current_or_out_of_range_leaves_current() {
        let mut c = loaded(&["a", "b", "c"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        assert!(c.remove_at(2).is_empty());
        assert!(c.remove_at(9).is_empty());
        assert_eq!(c.current_index(), Some(0));
        assert_eq!(urls(&c), vec!["a", "b"]);
        assert!(c.is_playing());
    }

    #[test]
    fn remove_without_playback_is_plain_removal() {
        let mut c = loaded(&["a", "b"]);
        assert!(c.remove_at(0).is_empty());
        assert_eq!(urls(&c), vec!["b"]);
        assert_eq!(c.phase(), PlaybackPhase::Idle);
    }

    #[test]
    fn skip_moves_to_next_entry() {
        let mut c = loaded(&["a", "b"]);
        assert!(c.skip().is_empty());
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        let cmds = c.skip();
        assert_eq!(cmds.first(), Some(&Command::Stop));
        assert_eq!(urls(&c), vec!["b"]);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut c = loaded(&["a", "b"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        assert_eq!(c.clear(), vec![Command::Stop]);
        assert!(c.is_empty());
        assert_eq!(c.current_index(), None);
        assert_eq!(c.phase(), PlaybackPhase::Stopped);

        assert_eq!(c.clear(), vec![Command::Stop]);
        assert!(c.is_empty());
        assert_eq!(c.current_index(), None);
        assert_eq!(c.phase(), PlaybackPhase::Stopped);
    }

    #[test]
    fn load_replaces_without_starting() {
        let mut c = loaded(&["a"]);
        let cmds = c.start();
        drive(&mut c, cmds, ok);

        let cmds = c.load(entries(&["x", "y"]));
        assert_eq!(cmds, vec![Command::Stop]);
        assert_eq!(urls(&c), vec!["x", "y"]);
        assert_eq!(c.current_index(), None);
        assert!(!c.is_playing());

        // A stopped controller starts again from the new head.
        assert!(matches!(c.start().as_slice(), [Command::Resolve { url, .. }] if url == "x"));
    }

    #[test]
    fn set_title_only_fills_blanks() {
        let mut c = PlaylistController::new();
        c.add(PlaylistEntry::new("a"));
        c.add(PlaylistEntry::with_title("a", "Kept"));
        c.add(PlaylistEntry::new("b"));
        c.set_title("a", "Looked up");

        let shown: Vec<&str> = c.entries().iter().map(|e| e.display()).collect();
        assert_eq!(shown, vec!["Looked up", "Kept", "b"]);
    }

    #[test]
    fn clock_follows_active_generation_only() {
        let mut c = loaded(&["a"]);
        assert_eq!(c.time_label(), "00:00 / 00:00");

        let cmds = c.start();
        let generation = c.active_generation().unwrap();
        c.on_clock(generation, 5.0, 10.0);
        assert_eq!(c.time_label(), "00:00 / 00:00");

        drive(&mut c, cmds, ok);
        c.on_clock(generation, 75.9, 184.2);
        assert_eq!(c.time_label(), "01:15 / 03:04");

        c.on_clock(generation + 1, 1.0, 1.0);
        assert_eq!(c.time_label(), "01:15 / 03:04");

        c.clear();
        assert_eq!(c.time_label(), "00:00 / 00:00");
    }

    #[test]
    fn format_clock_handles_odd_values() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(-3.0), "00:00");
        assert_eq!(format_clock(f64::NAN), "00:00");
        assert_eq!(format_clock(59.99), "00:59");
        assert_eq!(format_clock(6000.0), "100:00");
    }
}
