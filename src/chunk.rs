//! Sliding-window text chunker.
//!
//! Collapses every whitespace run in the input to a single space, then cuts
//! the result into windows of `size` characters that overlap by `overlap`
//! characters. Lengths and offsets count Unicode scalar values, not bytes.
//!
//! The final window always runs to the end of the text, so it may be shorter
//! than `size`.

use crate::error::{Error, Result};

/// Collapse whitespace runs to single spaces and trim both ends.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` into overlapping windows.
///
/// Empty (or whitespace-only) text yields no chunks and never fails.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for non-empty text when
/// `overlap >= size`, since the window could never advance.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    let cleaned = normalize(text);
    if cleaned.is_empty() {
        return Ok(Vec::new());
    }
    if overlap >= size {
        return Err(Error::config(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, size
        )));
    }

    let chars: Vec<char> = cleaned.chars().collect();
    let length = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < length {
        let end = (start + size).min(length);
        chunks.push(chars[start..end].iter().collect());
        if end == length {
            break;
        }
        start = end - overlap;
    }

    Ok(chunks)
}
