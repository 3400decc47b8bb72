//! Ordered playlist, its playback state machine and the on-disk format.

pub mod controller;
pub mod file;

use crate::youtube::models::SearchResultEntry;

pub use controller::{Command, PlaybackPhase, PlaylistController};

/// A playlist item. Identity is the page URL; the title is display-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub url: String,
    pub title: Option<String>,
}

impl PlaylistEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }

    pub fn with_title(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: Some(title.into()),
        }
    }

    /// Title if known, the raw URL otherwise.
    pub fn display(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

impl From<SearchResultEntry> for PlaylistEntry {
    fn from(r: SearchResultEntry) -> Self {
        Self::with_title(r.url, r.title)
    }
}
