//! Plain-text playlist files: one URL per line, UTF-8, newline-terminated.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXTENSION: &str = "txt";

pub fn write_playlist<S: AsRef<str>>(path: &Path, urls: &[S]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create dir {}", parent.display()))?;
    }
    fs::write(path, render(urls)).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn read_playlist(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(parse(&raw))
}

pub fn render<S: AsRef<str>>(urls: &[S]) -> String {
    let mut out = String::new();
    for url in urls {
        out.push_str(url.as_ref());
        out.push('\n');
    }
    out
}

pub fn parse(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Turn what the user typed into a playlist path.
///
/// Bare names land in `dir`; a missing extension becomes `.txt`.
pub fn resolve_path(input: &str, dir: &Path) -> Option<PathBuf> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let expanded = match input.strip_prefix("~/") {
        Some(rest) => directories::BaseDirs::new()
            .map(|b| b.home_dir().join(rest))
            .unwrap_or_else(|| PathBuf::from(input)),
        None => PathBuf::from(input),
    };
    let mut path = if expanded.is_absolute() || input.contains(std::path::MAIN_SEPARATOR) {
        expanded
    } else {
        dir.join(expanded)
    };
    if path.extension().is_none() {
        path.set_extension(DEFAULT_EXTENSION);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mix.txt");
        let urls = vec![
            "https://www.youtube.com/watch?v=b".to_string(),
            "https://www.youtube.com/watch?v=a".to_string(),
            "https://www.youtube.com/watch?v=b".to_string(),
        ];

        write_playlist(&path, &urls).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));
        assert_eq!(raw.lines().count(), 3);

        assert_eq!(read_playlist(&path).unwrap(), urls);
    }

    #[test]
    fn empty_playlist_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        write_playlist::<String>(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
        assert!(read_playlist(&path).unwrap().is_empty());
    }

    #[test]
    fn parse_trims_and_skips_blank_lines() {
        let parsed = parse("  https://a  \r\n\n\thttps://b\n\n");
        assert_eq!(parsed, vec!["https://a", "https://b"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        let err = read_playlist(&path).unwrap_err();
        assert!(format!("{err:#}").contains("nope.txt"));
    }

    #[test]
    fn resolve_path_defaults_dir_and_extension() {
        let dir = Path::new("/tmp/lists");
        assert_eq!(resolve_path("road trip", dir), Some(dir.join("road trip.txt")));
        assert_eq!(resolve_path("mix.m3u", dir), Some(dir.join("mix.m3u")));
        assert_eq!(
            resolve_path("/abs/chill", dir),
            Some(PathBuf::from("/abs/chill.txt"))
        );
        assert_eq!(resolve_path("   ", dir), None);
    }
}
