//! Whitespace and line-break normalization of extracted text.

use super::{Document, PARAGRAPH_SEPARATOR};

/// Normalize raw extracted text into a [`Document`].
///
/// - `\r\n` and lone `\r` become `\n`
/// - every line is trimmed
/// - consecutive non-blank lines form one paragraph, joined by a single space
/// - one or more blank lines between non-blank lines separate paragraphs
///
/// Never fails; whitespace-only input yields an empty document.
pub fn normalize(raw: &str) -> Document {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in unified.split('\n') {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    Document::from_canonical(paragraphs.join(PARAGRAPH_SEPARATOR))
}
