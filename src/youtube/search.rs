use super::YtDlp;
use super::models::SearchResultEntry;
use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Vec<FlatEntry>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    webpage_url: Option<String>,
}

impl YtDlp {
    /// Run a `ytsearchN:` query and return the hits in platform order.
    pub async fn search(&self, query: &str) -> anyhow::Result<Vec<SearchResultEntry>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let term = format!("ytsearch{}:{}", self.search_results(), query);
        let out = self
            .command()
            .args(["--flat-playlist", "-J", "--"])
            .arg(&term)
            .output()
            .await
            .context("run yt-dlp search")?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            anyhow::bail!("yt-dlp search failed: {}", stderr.trim());
        }

        let stdout = String::from_utf8(out.stdout).context("decode yt-dlp stdout")?;
        parse_search_json(&stdout)
    }
}

pub(crate) fn parse_search_json(raw: &str) -> anyhow::Result<Vec<SearchResultEntry>> {
    let playlist: FlatPlaylist = serde_json::from_str(raw).context("parse yt-dlp search json")?;
    Ok(playlist.entries.into_iter().filter_map(into_entry).collect())
}

fn into_entry(e: FlatEntry) -> Option<SearchResultEntry> {
    let url = e
        .webpage_url
        .filter(|u| u.starts_with("http"))
        .or_else(|| e.url.filter(|u| u.starts_with("http")))
        .or_else(|| {
            e.id.as_deref()
                .filter(|id| !id.is_empty())
                .map(|id| format!("https://www.youtube.com/watch?v={id}"))
        })?;
    let title = e
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url.clone());
    Some(SearchResultEntry { title, url })
}
