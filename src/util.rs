// src/util.rs — Shared utility functions

/// Keep at most `max_chars` characters of `s` (never splits a character).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

/// Truncate to `max_chars` characters, appending "..." when anything was cut.
pub fn ellipsize(s: &str, max_chars: usize) -> String {
    let cut = truncate_chars(s, max_chars);
    if cut.len() < s.len() {
        format!("{cut}...")
    } else {
        cut.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate_chars("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact() {
        assert_eq!(truncate_chars("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate_chars("hello world", 5), "hello");
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("café au lait", 4), "café");
    }

    #[test]
    fn test_truncate_zero_max() {
        assert_eq!(truncate_chars("hello", 0), "");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 30), "short");
        assert_eq!(ellipsize("abcdef", 3), "abc...");
        assert_eq!(ellipsize("", 3), "");
    }
}
