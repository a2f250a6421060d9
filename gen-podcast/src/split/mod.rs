//! Content splitting: turns a long document into narration-sized chunks.
//!
//! The planner asks a text-generation provider for split proposals, parses
//! whatever comes back, reconciles marker proposals against the document, and
//! falls back to a paragraph splitter when the reply is unusable. Every
//! result is passed through the small-chunk merge before it is returned.

mod diagnostics;
mod fallback;
mod merge;
mod planner;
mod prompt;
mod reconcile;
mod response;

pub use diagnostics::LogDiagnostics;
pub use planner::ChunkPlanner;

use crate::text::{PARAGRAPH_SEPARATOR, char_len};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Narration speed assumed when converting characters to minutes.
pub const DEFAULT_CHARS_PER_MINUTE: usize = 300;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SplitError {
    #[error("Splitting produced no chunks from {chars} characters of input")]
    EmptyResult { chars: usize },
}

/// One contiguous narration unit of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Trimmed chunk text
    pub text: String,
    /// Short human label, if the proposal supplied one
    pub title: Option<String>,
}

impl Chunk {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
        }
    }

    pub fn titled(text: impl Into<String>, title: Option<String>) -> Self {
        Self {
            text: text.into(),
            title: title.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn char_count(&self) -> usize {
        char_len(&self.text)
    }

    /// Narration time in minutes at the given reading speed.
    pub fn estimated_minutes(&self, chars_per_minute: usize) -> f64 {
        self.char_count() as f64 / chars_per_minute.max(1) as f64
    }

    /// Append another chunk's text after a paragraph separator.
    ///
    /// Keeps this chunk's title, or adopts the other's when it has none.
    fn absorb(&mut self, other: Chunk) {
        if self.text.is_empty() {
            self.text = other.text;
        } else if !other.text.is_empty() {
            self.text.push_str(PARAGRAPH_SEPARATOR);
            self.text.push_str(&other.text);
        }
        if self.title.is_none() {
            self.title = other.title;
        }
    }
}

/// Category of a proposed split point. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerKind {
    ChapterStart,
    SectionBreak,
    TopicShift,
    #[default]
    Other,
}

impl MarkerKind {
    /// Map a free-text label from a model reply onto a kind.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("chapter") || label.contains('章') {
            Self::ChapterStart
        } else if label.contains("section") || label.contains('節') {
            Self::SectionBreak
        } else if label.contains("topic") || label.contains("話題") {
            Self::TopicShift
        } else {
            Self::Other
        }
    }
}

/// A short text fragment anchoring a proposed cut: the cut falls right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub text: String,
    pub kind: MarkerKind,
    pub title: Option<String>,
}

impl Marker {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: MarkerKind::Other,
            title: None,
        }
    }
}

/// Reply shape requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalFormat {
    /// Boundary markers pointing back into the document
    #[default]
    Markers,
    /// Full chunk texts with ids and titles
    Chunks,
}

/// Size knobs for planning. Defaults assume 300 characters per minute.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSettings {
    pub chars_per_minute: usize,
    /// Documents shorter than this many minutes are never split
    pub short_text_minutes: f64,
    /// Lower bound of the requested chunk band; also the merge threshold
    pub chunk_min_chars: usize,
    /// Upper bound of the requested chunk band
    pub chunk_max_chars: usize,
    pub proposal_format: ProposalFormat,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            chars_per_minute: DEFAULT_CHARS_PER_MINUTE,
            short_text_minutes: 2.0,
            chunk_min_chars: 600,
            chunk_max_chars: 1200,
            proposal_format: ProposalFormat::Markers,
        }
    }
}

impl SplitSettings {
    /// Documents below this character count bypass planning entirely.
    pub fn bypass_chars(&self) -> usize {
        (self.short_text_minutes * self.chars_per_minute as f64).round() as usize
    }

    /// Characters of narration for the given number of minutes, at least 1.
    pub fn target_chars(&self, target_minutes: f64) -> usize {
        ((target_minutes * self.chars_per_minute as f64).round() as usize).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let settings = SplitSettings::default();
        assert_eq!(settings.bypass_chars(), 600);
        assert_eq!(settings.target_chars(5.0), 1500);
        assert_eq!(settings.target_chars(0.0), 1);
    }

    #[test]
    fn test_estimated_minutes() {
        let chunk = Chunk::new("あ".repeat(450));
        assert!((chunk.estimated_minutes(300) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_absorb_keeps_first_title() {
        let mut first = Chunk::titled("one", Some("Intro".into()));
        first.absorb(Chunk::titled("two", Some("Body".into())));
        assert_eq!(first.text, "one\n\ntwo");
        assert_eq!(first.title.as_deref(), Some("Intro"));

        let mut untitled = Chunk::new("a");
        untitled.absorb(Chunk::titled("b", Some("B".into())));
        assert_eq!(untitled.title.as_deref(), Some("B"));
    }

    #[test]
    fn test_blank_title_dropped() {
        assert!(Chunk::titled("x", Some("  ".into())).title.is_none());
    }

    #[test]
    fn test_marker_kind_labels() {
        assert_eq!(MarkerKind::from_label("chapter-start"), MarkerKind::ChapterStart);
        assert_eq!(MarkerKind::from_label("Section break"), MarkerKind::SectionBreak);
        assert_eq!(MarkerKind::from_label("topic_shift"), MarkerKind::TopicShift);
        assert_eq!(MarkerKind::from_label("章の開始"), MarkerKind::ChapterStart);
        assert_eq!(MarkerKind::from_label("whatever"), MarkerKind::Other);
    }

    #[test]
    fn test_proposal_format_serde() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: ProposalFormat,
        }
        let w: Wrapper = toml::from_str("format = \"chunks\"").unwrap();
        assert_eq!(w.format, ProposalFormat::Chunks);
    }
}
