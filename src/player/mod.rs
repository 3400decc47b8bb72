pub mod mpv;

use std::future::Future;

/// The slice of an audio backend that playlist playback drives.
pub trait StreamPlayer: Send + Sync + 'static {
    fn load_url(&self, url: &str) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn stop(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Position and duration in seconds, zero when unknown.
    fn clock(&self) -> impl Future<Output = (f64, f64)> + Send;
}

impl StreamPlayer for mpv::MpvHandle {
    async fn load_url(&self, url: &str) -> anyhow::Result<()> {
        mpv::MpvHandle::load_url(self, url).await
    }

    async fn stop(&self) -> anyhow::Result<()> {
        mpv::MpvHandle::stop(self).await
    }

    async fn clock(&self) -> (f64, f64) {
        let position = self.elapsed_seconds().await.ok().flatten().unwrap_or(0.0);
        let duration = self.duration_seconds().await.ok().flatten().unwrap_or(0.0);
        (position, duration)
    }
}
