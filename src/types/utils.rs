//! Small text helpers shared across the pipeline.

use std::fmt::Display;

use tracing::warn;

/// Keep the first `max_chars` characters of `content`.
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

/// Log an error as a warning and convert the result into an `Option`.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: {}", context, e);
            None
        }
    }
}
