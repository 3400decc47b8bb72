//! yt-dlp front: search, stream resolution and title lookup.

pub mod models;
pub mod resolve;
pub mod search;

use crate::config::YtDlpConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;

pub use resolve::ResolveError;

#[derive(Debug)]
struct Inner {
    binary: String,
    format: String,
    search_results: usize,
    cookies: Option<PathBuf>,
    cookies_from_browser: Option<String>,
}

/// Cheap-to-clone handle carrying the yt-dlp invocation settings.
#[derive(Debug, Clone)]
pub struct YtDlp {
    inner: Arc<Inner>,
}

impl YtDlp {
    pub fn new(cfg: &YtDlpConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                binary: cfg.binary.clone(),
                format: cfg.format.clone(),
                search_results: cfg.search_results.max(1),
                cookies: cfg.cookies.clone(),
                cookies_from_browser: cfg.cookies_from_browser.clone(),
            }),
        }
    }

    pub fn search_results(&self) -> usize {
        self.inner.search_results
    }

    pub fn format(&self) -> &str {
        &self.inner.format
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.inner.binary);
        cmd.arg("--no-warnings");

        // Prefer browser cookies when configured (no manual export needed).
        if let Some(browser) = &self.inner.cookies_from_browser {
            cmd.arg("--cookies-from-browser").arg(browser);
        } else if let Some(cookies) = &self.inner.cookies {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd.stdin(std::process::Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }
}
