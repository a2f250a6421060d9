//! Mapping textual split markers back onto exact document offsets.

use super::diagnostics::{Diagnostics, SplitEvent};
use super::{Chunk, Marker};
use crate::text::{Document, char_len};

/// Byte range `[start, end)` of the document forming one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// Index of the marker that closed this span; `None` for the tail
    pub marker: Option<usize>,
}

impl Span {
    pub fn slice<'a>(&self, doc: &'a Document) -> &'a str {
        &doc.as_str()[self.start..self.end]
    }
}

/// Compute chunk spans for `markers`, in one forward pass.
///
/// Each marker is searched only at or after the end of the previous match,
/// and the cut falls right after the marker text. Markers that cannot be
/// found are reported and skipped. The returned spans are contiguous,
/// strictly increasing and cover the whole document; none trims to empty.
pub fn reconcile(doc: &Document, markers: &[Marker], diagnostics: &dyn Diagnostics) -> Vec<Span> {
    let text = doc.as_str();
    let mut spans: Vec<Span> = Vec::new();
    let mut start = 0;

    for (index, marker) in markers.iter().enumerate() {
        let needle = marker.text.trim();
        let found = if needle.is_empty() {
            None
        } else {
            text[start..].find(needle).map(|offset| start + offset)
        };

        let Some(position) = found else {
            diagnostics.record(SplitEvent::MarkerMissed {
                index,
                marker: needle.to_string(),
            });
            continue;
        };

        let end = position + needle.len();
        let span = Span {
            start,
            end,
            marker: Some(index),
        };
        diagnostics.record(SplitEvent::ChunkCut {
            index: spans.len(),
            chars: char_len(span.slice(doc).trim()),
            kind: marker.kind,
        });
        spans.push(span);
        start = end;
    }

    if !text[start..].trim().is_empty() {
        spans.push(Span {
            start,
            end: text.len(),
            marker: None,
        });
    } else if let Some(last) = spans.last_mut() {
        last.end = text.len();
    }

    spans
}

/// Turn reconciled spans into trimmed chunks, titled from their closing marker.
pub fn spans_to_chunks(doc: &Document, spans: &[Span], markers: &[Marker]) -> Vec<Chunk> {
    spans
        .iter()
        .map(|span| {
            let title = span
                .marker
                .and_then(|i| markers.get(i))
                .and_then(|m| m.title.clone());
            Chunk::titled(span.slice(doc).trim(), title)
        })
        .filter(|chunk| !chunk.text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::diagnostics::RecordingDiagnostics;
    use crate::text::normalize;
    use proptest::prelude::*;

    fn markers(texts: &[&str]) -> Vec<Marker> {
        texts.iter().map(|t| Marker::new(*t)).collect()
    }

    fn texts(doc: &Document, spans: &[Span]) -> Vec<String> {
        spans.iter().map(|s| s.slice(doc).trim().to_string()).collect()
    }

    fn assert_covers(doc: &Document, spans: &[Span]) {
        if doc.is_empty() {
            assert!(spans.is_empty());
            return;
        }
        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(doc.as_str().len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for span in spans {
            assert!(span.start < span.end);
            assert!(!span.slice(doc).trim().is_empty());
        }
        let rebuilt: String = spans.iter().map(|s| s.slice(doc)).collect();
        assert_eq!(rebuilt, doc.as_str());
    }

    #[test]
    fn test_single_marker_cut_after_marker() {
        let doc = normalize("ABCDEFGHIJ");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(&doc, &markers(&["CDE"]), &diagnostics);
        assert_eq!(texts(&doc, &spans), vec!["ABCDE", "FGHIJ"]);
        assert_covers(&doc, &spans);
    }

    #[test]
    fn test_missing_marker_skipped() {
        let doc = normalize("ABCDEFGHIJ");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(&doc, &markers(&["CDE", "XYZ", "GH"]), &diagnostics);
        assert_eq!(texts(&doc, &spans), vec!["ABCDE", "FGH", "IJ"]);
        assert_eq!(diagnostics.missed_markers(), vec![1]);
        assert_covers(&doc, &spans);
    }

    #[test]
    fn test_marker_before_cursor_not_rematched() {
        // "AB" only appears before the first cut, so the second marker misses
        let doc = normalize("ABCDEFGHIJ");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(&doc, &markers(&["EF", "AB"]), &diagnostics);
        assert_eq!(texts(&doc, &spans), vec!["ABCDEF", "GHIJ"]);
        assert_eq!(diagnostics.missed_markers(), vec![1]);
    }

    #[test]
    fn test_repeated_marker_text_advances() {
        let doc = normalize("one. two. one. three.");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(&doc, &markers(&["one.", "one."]), &diagnostics);
        assert_eq!(texts(&doc, &spans), vec!["one.", "two. one.", "three."]);
    }

    #[test]
    fn test_marker_at_end_absorbs_trailing_nothing() {
        let doc = normalize("First paragraph.\n\nSecond paragraph.");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(
            &doc,
            &markers(&["First paragraph.", "Second paragraph."]),
            &diagnostics,
        );
        assert_eq!(
            texts(&doc, &spans),
            vec!["First paragraph.", "Second paragraph."]
        );
        assert_covers(&doc, &spans);
    }

    #[test]
    fn test_blank_marker_is_a_miss() {
        let doc = normalize("Some text here.");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(&doc, &markers(&["   "]), &diagnostics);
        assert_eq!(spans.len(), 1);
        assert_eq!(diagnostics.missed_markers(), vec![0]);
    }

    #[test]
    fn test_marker_whitespace_trimmed() {
        let doc = normalize("Alpha beta. Gamma delta.");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(&doc, &markers(&["  Alpha beta.\n"]), &diagnostics);
        assert_eq!(texts(&doc, &spans), vec!["Alpha beta.", "Gamma delta."]);
    }

    #[test]
    fn test_no_markers_single_span() {
        let doc = normalize("Only one chunk.");
        let spans = reconcile(&doc, &[], &RecordingDiagnostics::default());
        assert_eq!(
            spans,
            vec![Span {
                start: 0,
                end: doc.as_str().len(),
                marker: None
            }]
        );
    }

    #[test]
    fn test_multibyte_text() {
        let doc = normalize("第一章 はじまり。物語が始まる。\n\n第二章 つづき。物語は続く。");
        let diagnostics = RecordingDiagnostics::default();
        let spans = reconcile(&doc, &markers(&["物語が始まる。"]), &diagnostics);
        assert_eq!(
            texts(&doc, &spans),
            vec!["第一章 はじまり。物語が始まる。", "第二章 つづき。物語は続く。"]
        );
        assert_covers(&doc, &spans);
    }

    #[test]
    fn test_spans_to_chunks_titles() {
        let doc = normalize("ABCDEFGHIJ");
        let mut proposal = markers(&["CDE"]);
        proposal[0].title = Some("Start".into());
        let spans = reconcile(&doc, &proposal, &RecordingDiagnostics::default());
        let chunks = spans_to_chunks(&doc, &spans, &proposal);
        assert_eq!(chunks[0], Chunk::titled("ABCDE", Some("Start".into())));
        assert_eq!(chunks[1], Chunk::new("FGHIJ"));
    }

    fn paragraph() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zあ-お]{1,8}", 1..6).prop_map(|words| words.join(" "))
    }

    proptest! {
        #[test]
        fn prop_reconcile_covers_document(
            paragraphs in prop::collection::vec(paragraph(), 1..8),
            picks in prop::collection::vec((any::<prop::sample::Index>(), 1usize..12), 0..8),
            junk in prop::collection::vec("[A-Z]{3,6}", 0..3),
        ) {
            let doc = normalize(&paragraphs.join("\n\n"));
            let chars: Vec<char> = doc.as_str().chars().collect();

            let mut proposal: Vec<Marker> = picks
                .iter()
                .map(|(index, len)| {
                    let start = index.index(chars.len());
                    let end = (start + len).min(chars.len());
                    Marker::new(chars[start..end].iter().collect::<String>())
                })
                .collect();
            proposal.extend(junk.iter().map(|j| Marker::new(j.as_str())));

            let spans = reconcile(&doc, &proposal, &RecordingDiagnostics::default());
            assert_covers(&doc, &spans);

            let chunks = spans_to_chunks(&doc, &spans, &proposal);
            prop_assert_eq!(chunks.len(), spans.len());
            prop_assert!(spans.len() <= proposal.len() + 1);
        }
    }
}
