/// One row of a search: what the user sees and the page it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultEntry {
    pub title: String,
    pub url: String,
}

/// A page URL turned into something mpv can stream directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStream {
    pub stream_url: String,
    pub title: String,
}
