const MAX_ERROR_CHARS: usize = 2_000;

/// Byte offset where the `max_chars`-th char starts, if the text is longer.
fn cut_point(text: &str, max_chars: usize) -> Option<usize> {
    text.char_indices().nth(max_chars).map(|(i, _)| i)
}

/// Keep the first `max_chars` chars of `text`, marking how many were cut.
pub fn truncate_head(text: &str, max_chars: usize) -> String {
    match cut_point(text, max_chars) {
        None => text.to_string(),
        Some(end) => format!("{}\n... [truncated {} chars]", &text[..end], text[end..].chars().count()),
    }
}

pub fn truncate_error(error: &str) -> String {
    match cut_point(error, MAX_ERROR_CHARS) {
        None => error.to_string(),
        Some(end) => format!("{}...", &error[..end]),
    }
}
