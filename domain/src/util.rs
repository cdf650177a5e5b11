//! Shared utility functions.

/// Truncate a string to at most `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Shorten a string for one-line display, appending `...` when cut.
pub fn ellipsize(s: &str, max_bytes: usize) -> String {
    let first_line = s.lines().next().unwrap_or_default();
    let multiline = first_line.len() < s.trim_end().len();
    if first_line.len() <= max_bytes && !multiline {
        return first_line.to_string();
    }
    format!("{}...", truncate_str(first_line, max_bytes.saturating_sub(3)))
}
