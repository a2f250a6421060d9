//! Deterministic paragraph splitter used when no usable proposal exists.

use super::Chunk;
use crate::text::{Document, PARAGRAPH_SEPARATOR, char_len};

/// Greedily pack whole paragraphs into chunks of about `target_chars`.
///
/// Paragraphs are appended while the open chunk is still below the target;
/// once it has reached the target it is closed and the next paragraph opens
/// a new one. Paragraphs are never cut, so one longer than the target becomes
/// an oversized chunk of its own. Makes no provider calls.
pub fn simple_split(doc: &Document, target_chars: usize) -> Vec<Chunk> {
    let separator_chars = char_len(PARAGRAPH_SEPARATOR);
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_chars = 0;

    for paragraph in doc.paragraphs() {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if !current.is_empty() && current_chars >= target_chars {
            chunks.push(Chunk::new(current.join(PARAGRAPH_SEPARATOR)));
            current.clear();
            current_chars = 0;
        }

        if !current.is_empty() {
            current_chars += separator_chars;
        }
        current_chars += char_len(paragraph);
        current.push(paragraph);
    }

    if !current.is_empty() {
        chunks.push(Chunk::new(current.join(PARAGRAPH_SEPARATOR)));
    }

    chunks
}
