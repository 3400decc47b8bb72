use super::YtDlp;
use super::models::ResolvedStream;
use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

/// Why a page URL could not be turned into a playable stream.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// yt-dlp itself could not be run; no entry is to blame.
    #[error("could not run yt-dlp: {0}")]
    Launch(#[source] std::io::Error),
    #[error("yt-dlp failed: {0}")]
    Failed(String),
    #[error("unreadable yt-dlp output: {0}")]
    Malformed(String),
    #[error("yt-dlp returned no playable stream")]
    NoStream,
}

impl ResolveError {
    /// Whether the failure belongs to the entry being resolved.
    pub fn is_entry_fault(&self) -> bool {
        !matches!(self, ResolveError::Launch(_))
    }
}

#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    requested_formats: Vec<FormatInfo>,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    url: Option<String>,
}

impl YtDlp {
    /// Resolve a page URL to the best audio stream plus its title.
    pub async fn resolve(&self, page_url: &str) -> Result<ResolvedStream, ResolveError> {
        let out = self
            .command()
            .args(["-f", self.format(), "-j", "--no-playlist", "--"])
            .arg(page_url)
            .output()
            .await
            .map_err(ResolveError::Launch)?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ResolveError::Failed(stderr.trim().to_string()));
        }

        let stdout =
            String::from_utf8(out.stdout).map_err(|e| ResolveError::Malformed(e.to_string()))?;
        parse_resolve_json(&stdout, page_url)
    }

    /// Look up only the display title of a page.
    pub async fn resolve_title(&self, page_url: &str) -> anyhow::Result<String> {
        let out = self
            .command()
            .args(["--skip-download", "--no-playlist", "--print", "title", "--"])
            .arg(page_url)
            .output()
            .await
            .context("run yt-dlp")?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            anyhow::bail!("yt-dlp failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8(out.stdout).context("decode yt-dlp stdout")?;
        let title = stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && *l != "NA")
            .context("yt-dlp returned empty title")?;
        Ok(title.to_string())
    }
}

pub(crate) fn parse_resolve_json(raw: &str, page_url: &str) -> Result<ResolvedStream, ResolveError> {
    // `-j` prints one JSON object per video; a single URL yields one line.
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or(ResolveError::NoStream)?;
    let info: VideoInfo =
        serde_json::from_str(line).map_err(|e| ResolveError::Malformed(e.to_string()))?;

    let stream_url = info
        .url
        .filter(|u| !u.is_empty())
        .or_else(|| {
            info.requested_formats
                .into_iter()
                .find_map(|f| f.url.filter(|u| !u.is_empty()))
        })
        .ok_or(ResolveError::NoStream)?;
    let title = info
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| page_url.to_string());

    Ok(ResolvedStream { stream_url, title })
}
