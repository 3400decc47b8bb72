pub mod help;
pub mod now_playing;
pub mod playlist;
pub mod root;
pub mod search;
pub mod sidebar;

/// Cut `s` to at most `max_len` characters, ending in "..." when it had to cut.
pub(crate) fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let char_count = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{truncated}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_str;

    #[test]
    fn truncates_by_chars() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("ñññññ", 3), "ñññ");
        assert_eq!(truncate_str("abc", 0), "");
    }
}
