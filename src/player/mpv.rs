use crate::app::events::{Event, PlayerEvent};
use anyhow::Context;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::{mpsc, oneshot},
};

const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>;

/// An idle mpv child driven over its JSON IPC socket.
#[derive(Debug)]
pub struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
    pending: Pending,
}

impl MpvHandle {
    pub async fn spawn(
        binary: &str,
        event_tx: mpsc::Sender<Event>,
        audio_device: Option<&str>,
        log_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let socket_path =
            std::env::temp_dir().join(format!("tubeline-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new(binary);
        cmd.args([
            "--no-video",
            "--idle=yes",
            "--input-terminal=no",
            "--really-quiet",
        ]);
        if let Some(dev) = audio_device {
            cmd.arg(format!("--audio-device={dev}"));
        }
        if let Some(p) = log_file {
            cmd.arg(format!("--log-file={}", p.display()));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawn mpv")?;

        // mpv creates the socket shortly after starting.
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        let pending: Pending = Arc::default();
        tokio::spawn(read_events_loop(reader, event_tx, pending.clone()));

        let this = Self {
            child,
            socket_path,
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
            pending,
        };

        // Load failures show up as warn-level log messages before end-file.
        this.command(json!({"command":["request_log_messages", "warn"]}))
            .await?;
        this.command(json!({"command":["observe_property", 1, "pause"]}))
            .await?;

        Ok(this)
    }

    pub async fn load_url(&self, url: &str) -> anyhow::Result<()> {
        self.command(json!({"command":["set_property", "pause", false]}))
            .await?;
        self.command(json!({"command":["loadfile", url, "replace"]})).await
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.command(json!({"command":["stop"]})).await
    }

    pub async fn toggle_pause(&self) -> anyhow::Result<()> {
        self.command(json!({"command":["cycle", "pause"]})).await
    }

    pub async fn seek_relative(&self, seconds: f64) -> anyhow::Result<()> {
        self.command(json!({"command":["seek", seconds, "relative"]}))
            .await
    }

    pub async fn set_volume(&self, volume_0_100: u8) -> anyhow::Result<()> {
        self.command(json!({"command":["set_property", "volume", volume_0_100]}))
            .await
    }

    /// Seconds into the current file, `None` when nothing is loaded.
    pub async fn elapsed_seconds(&self) -> anyhow::Result<Option<f64>> {
        self.get_number("time-pos").await
    }

    /// Length of the current file, `None` when unknown.
    pub async fn duration_seconds(&self) -> anyhow::Result<Option<f64>> {
        self.get_number("duration").await
    }

    async fn get_number(&self, property: &str) -> anyhow::Result<Option<f64>> {
        let reply = self
            .request(json!({"command":["get_property", property]}))
            .await
            .with_context(|| format!("get_property {property}"))?;
        if reply.get("error").and_then(Value::as_str) != Some("success") {
            // "property unavailable" while idle.
            return Ok(None);
        }
        Ok(reply.get("data").and_then(Value::as_f64))
    }

    async fn request(&self, v: Value) -> anyhow::Result<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);

        if let Err(e) = self.send_tagged(v, id).await {
            self.lock_pending().remove(&id);
            return Err(e);
        }
        match tokio::time::timeout(REPLY_TIMEOUT, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => anyhow::bail!("mpv ipc closed"),
            Err(_) => {
                self.lock_pending().remove(&id);
                anyhow::bail!("mpv reply timed out")
            }
        }
    }

    async fn command(&self, v: Value) -> anyhow::Result<()> {
        // Tag requests so we can get structured errors back on the IPC stream.
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        self.send_tagged(v, id).await
    }

    async fn send_tagged(&self, mut v: Value, id: u64) -> anyhow::Result<()> {
        if let Value::Object(ref mut o) = v {
            o.insert("request_id".to_string(), Value::from(id));
        }
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        let mut w = self.writer.lock().await;
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, oneshot::Sender<Value>>> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn connect_with_retry(path: &Path) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e).with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(
    reader: tokio::io::ReadHalf<UnixStream>,
    event_tx: mpsc::Sender<Event>,
    pending: Pending,
) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<Value>(&line) else {
            continue;
        };

        // Command replies: {"request_id":..., "error":"...", "data":...}
        if let Some(rid) = v.get("request_id").and_then(Value::as_u64) {
            let waiter = pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .remove(&rid);
            if let Some(waiter) = waiter {
                let _ = waiter.send(v);
                continue;
            }
            if let Some(err) = v.get("error").and_then(Value::as_str)
                && err != "success"
            {
                let _ = event_tx
                    .send(Event::Player(PlayerEvent::Log(format!("mpv ipc error: {err}"))))
                    .await;
            }
            continue;
        }

        if let Some(pe) = map_mpv_event(&v) {
            let _ = event_tx.send(Event::Player(pe)).await;
        }
    }
    tracing::debug!("mpv event stream closed");
}

fn map_mpv_event(v: &Value) -> Option<PlayerEvent> {
    match v.get("event")?.as_str()? {
        "property-change" => match v.get("name")?.as_str()? {
            "pause" => {
                let paused = v.get("data")?.as_bool().unwrap_or(false);
                Some(if paused { PlayerEvent::Paused } else { PlayerEvent::Resumed })
            }
            _ => None,
        },
        "end-file" => {
            // Only a natural end or a load error moves the playlist; "stop" and
            // "redirect" come from our own commands.
            match v.get("reason").and_then(Value::as_str).unwrap_or("") {
                "eof" => Some(PlayerEvent::Ended),
                "error" => {
                    let err = v.get("file_error").or_else(|| v.get("error"));
                    let err = err.and_then(Value::as_str).unwrap_or("unknown");
                    Some(PlayerEvent::Failed(format!("mpv end-file error: {err}")))
                }
                _ => None,
            }
        }
        "log-message" => {
            let level = v.get("level")?.as_str().unwrap_or("info");
            let text = v.get("text")?.as_str().unwrap_or("").trim();
            if (level == "warn" || level == "error") && !text.is_empty() {
                Some(PlayerEvent::Log(format!("mpv {level}: {text}")))
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(raw: &str) -> Option<PlayerEvent> {
        map_mpv_event(&serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn end_file_reasons() {
        assert!(matches!(
            map(r#"{"event":"end-file","reason":"eof"}"#),
            Some(PlayerEvent::Ended)
        ));
        assert!(map(r#"{"event":"end-file","reason":"stop"}"#).is_none());
        assert!(map(r#"{"event":"end-file","reason":"redirect"}"#).is_none());
        match map(r#"{"event":"end-file","reason":"error","file_error":"loading failed"}"#) {
            Some(PlayerEvent::Failed(msg)) => assert!(msg.contains("loading failed")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn pause_property() {
        assert!(matches!(
            map(r#"{"event":"property-change","id":1,"name":"pause","data":true}"#),
            Some(PlayerEvent::Paused)
        ));
        assert!(matches!(
            map(r#"{"event":"property-change","id":1,"name":"pause","data":false}"#),
            Some(PlayerEvent::Resumed)
        ));
    }

    #[test]
    fn log_messages_only_warn_and_up() {
        assert!(matches!(
            map(r#"{"event":"log-message","level":"error","text":"boom\n"}"#),
            Some(PlayerEvent::Log(m)) if m == "mpv error: boom"
        ));
        assert!(map(r#"{"event":"log-message","level":"info","text":"hi"}"#).is_none());
        assert!(map(r#"{"event":"idle"}"#).is_none());
    }
}
