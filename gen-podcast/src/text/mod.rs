//! Canonical document text: normalization and paragraph access.

mod normalizer;

pub use normalizer::normalize;

/// Separator placed between paragraphs in canonical text.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Normalized document text: non-empty paragraphs joined by a blank line.
///
/// Only [`normalize`] produces one, so the paragraph invariant always holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    text: String,
}

impl Document {
    fn from_canonical(text: String) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters (not bytes); all size thresholds use this.
    pub fn char_count(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Paragraphs in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.text
            .split(PARAGRAPH_SEPARATOR)
            .filter(|p| !p.is_empty())
    }
}

/// Character count of a string slice.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
