//! Orchestration of one planning call: bypass, request, parse, reconcile or
//! fall back, then merge.

use super::diagnostics::{Diagnostics, FallbackReason, SplitEvent};
use super::fallback::simple_split;
use super::merge::merge_small_chunks;
use super::prompt::{PromptParams, SYSTEM_PROMPT, build_split_prompt};
use super::reconcile::{reconcile, spans_to_chunks};
use super::response::{Proposal, RichChunk, parse_proposal};
use super::{Chunk, Marker, SplitError, SplitSettings};
use crate::text::Document;
use llm_client::{LlmProvider, LlmRequest};

/// Plans chunk boundaries for documents.
///
/// Holds no state between calls; each `plan` depends only on its inputs.
pub struct ChunkPlanner<'a> {
    settings: SplitSettings,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> ChunkPlanner<'a> {
    pub fn new(settings: SplitSettings, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            settings,
            diagnostics,
        }
    }

    pub fn settings(&self) -> &SplitSettings {
        &self.settings
    }

    /// Split `doc` into chunks of roughly `target_minutes` of narration.
    ///
    /// Short documents are returned whole without contacting `provider`.
    /// Otherwise `provider` is called exactly once; any failure or unusable
    /// reply is absorbed by the paragraph splitter. Only an empty final result
    /// is an error.
    pub async fn plan(
        &self,
        doc: &Document,
        target_minutes: f64,
        provider: &dyn LlmProvider,
    ) -> Result<Vec<Chunk>, SplitError> {
        let chars = doc.char_count();
        let threshold = self.settings.bypass_chars();

        let chunks = if chars < threshold {
            self.diagnostics
                .record(SplitEvent::ShortTextBypass { chars, threshold });
            if doc.is_empty() {
                Vec::new()
            } else {
                vec![Chunk::new(doc.as_str())]
            }
        } else {
            self.plan_with_provider(doc, target_minutes, provider).await
        };

        self.finish(chunks, chars)
    }

    async fn plan_with_provider(
        &self,
        doc: &Document,
        target_minutes: f64,
        provider: &dyn LlmProvider,
    ) -> Vec<Chunk> {
        let chars = doc.char_count();
        let target_chars = self.settings.target_chars(target_minutes);
        let estimated_chunks = ((chars as f64 / target_chars as f64).round() as usize).max(1);

        self.diagnostics.record(SplitEvent::PlanStarted {
            chars,
            target_chars,
            estimated_chunks,
        });

        let prompt = build_split_prompt(
            doc,
            &PromptParams {
                settings: &self.settings,
                target_minutes,
                estimated_chunks,
            },
        );
        let request = LlmRequest::new(prompt).with_system_prompt(SYSTEM_PROMPT);

        let outcome = match provider.complete(request).await {
            Ok(response) => self.apply(doc, parse_proposal(&response.content)),
            Err(e) => Err(FallbackReason::CallFailed(e.to_string())),
        };

        match outcome {
            Ok(chunks) => chunks,
            Err(reason) => {
                self.diagnostics.record(SplitEvent::Fallback(reason));
                simple_split(doc, target_chars)
            }
        }
    }

    fn apply(&self, doc: &Document, proposal: Proposal) -> Result<Vec<Chunk>, FallbackReason> {
        match proposal {
            Proposal::Empty => Err(FallbackReason::Unparseable),
            Proposal::RichChunks { chunks, quality } => {
                self.diagnostics.record(SplitEvent::RichChunksReceived {
                    count: chunks.len(),
                    quality,
                });
                self.accept_rich(chunks)
            }
            Proposal::MarkerList(markers) => {
                self.diagnostics
                    .record(SplitEvent::MarkersReceived { count: markers.len() });
                self.accept_markers(doc, &markers)
            }
        }
    }

    /// Rich chunks must arrive in increasing id order; empty ones are dropped.
    fn accept_rich(&self, chunks: Vec<RichChunk>) -> Result<Vec<Chunk>, FallbackReason> {
        let mut previous_id: Option<u64> = None;
        let mut accepted = Vec::with_capacity(chunks.len());

        for rich in chunks {
            if let Some(id) = rich.id {
                if let Some(previous) = previous_id.filter(|previous| id <= *previous) {
                    return Err(FallbackReason::InvalidChunks(format!(
                        "id {} follows id {}",
                        id, previous
                    )));
                }
                previous_id = Some(id);
            }

            let text = rich.text.trim();
            if text.is_empty() {
                self.diagnostics
                    .record(SplitEvent::RichChunkDropped { id: rich.id });
                continue;
            }
            accepted.push(Chunk::titled(text, rich.title));
        }

        if accepted.is_empty() {
            return Err(FallbackReason::InvalidChunks(
                "every proposed chunk was empty".to_string(),
            ));
        }
        Ok(accepted)
    }

    fn accept_markers(
        &self,
        doc: &Document,
        markers: &[Marker],
    ) -> Result<Vec<Chunk>, FallbackReason> {
        let spans = reconcile(doc, markers, self.diagnostics);
        if spans.iter().all(|span| span.marker.is_none()) {
            return Err(FallbackReason::NoMarkersMatched);
        }
        Ok(spans_to_chunks(doc, &spans, markers))
    }

    fn finish(&self, chunks: Vec<Chunk>, chars: usize) -> Result<Vec<Chunk>, SplitError> {
        let before = chunks.len();
        let min_chars = self.settings.chunk_min_chars;
        let merged = merge_small_chunks(chunks, min_chars);

        if merged.len() != before {
            self.diagnostics.record(SplitEvent::Merged {
                before,
                after: merged.len(),
                min_chars,
            });
        }

        if merged.is_empty() {
            return Err(SplitError::EmptyResult { chars });
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::diagnostics::RecordingDiagnostics;
    use crate::split::ProposalFormat;
    use crate::text::normalize;
    use llm_client::{LlmError, MockProvider};
    use serde_json::json;

    /// `count` paragraphs of 30 numbered sentences (about 740 chars each).
    fn sample_doc(count: usize) -> Document {
        let paragraphs: Vec<String> = (1..=count)
            .map(|p| {
                (1..=30)
                    .map(|s| format!("Paragraph {} sentence {}.", p, s))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        normalize(&paragraphs.join("\n\n"))
    }

    fn squash(text: &str) -> String {
        text.split_whitespace().collect()
    }

    fn assert_covers(doc: &Document, chunks: &[Chunk]) {
        assert!(chunks.iter().all(|c| !c.text.trim().is_empty()));
        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(squash(&joined), squash(doc.as_str()));
    }

    fn fenced(value: serde_json::Value) -> String {
        format!("Here is the split:\n```json\n{}\n```", value)
    }

    #[tokio::test]
    async fn test_short_text_bypasses_provider() {
        let doc = normalize("A short note.\n\nOnly two paragraphs.");
        let provider = MockProvider::always_succeeds("unused");
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 5.0, &provider).await.unwrap();

        assert_eq!(chunks, vec![Chunk::new(doc.as_str())]);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_bypass_threshold_boundary() {
        let settings = SplitSettings::default();
        let below = normalize(&"x".repeat(settings.bypass_chars() - 1));
        let at = normalize(&"x".repeat(settings.bypass_chars()));
        let provider = MockProvider::always_succeeds("no json here");
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(settings, &diagnostics);

        planner.plan(&below, 5.0, &provider).await.unwrap();
        assert_eq!(provider.call_count(), 0);

        planner.plan(&at, 5.0, &provider).await.unwrap();
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_document_is_an_error() {
        let provider = MockProvider::always_succeeds("unused");
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let result = planner.plan(&normalize("  \n\n "), 5.0, &provider).await;
        assert_eq!(result, Err(SplitError::EmptyResult { chars: 0 }));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_marker_reply_reconciled() {
        let doc = sample_doc(3);
        let reply = fenced(json!({
            "chunks": [
                {"id": 1, "title": "Part one", "marker_text": "Paragraph 1 sentence 30."},
                {"id": 2, "title": "Part two", "marker_text": "Paragraph 2 sentence 30."}
            ]
        }));
        let provider = MockProvider::always_succeeds(&reply);
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 2.0, &provider).await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert!(provider.prompts()[0].contains(doc.as_str()));
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].title.as_deref(), Some("Part one"));
        assert_eq!(chunks[1].title.as_deref(), Some("Part two"));
        assert!(chunks[2].title.is_none());
        let paragraphs: Vec<&str> = doc.paragraphs().collect();
        for (chunk, paragraph) in chunks.iter().zip(paragraphs) {
            assert_eq!(chunk.text, paragraph);
        }
        assert!(diagnostics.fallbacks().is_empty());
    }

    #[tokio::test]
    async fn test_missing_marker_degrades_granularity_only() {
        let doc = sample_doc(3);
        let reply = fenced(json!({
            "splits": [
                {"marker_text": "Paragraph 1 sentence 30.", "split_type": "section break"},
                {"marker_text": "This sentence was invented by the model.", "split_type": "topic shift"}
            ]
        }));
        let provider = MockProvider::always_succeeds(&reply);
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 2.0, &provider).await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(diagnostics.missed_markers(), vec![1]);
        assert!(diagnostics.fallbacks().is_empty());
        assert_covers(&doc, &chunks);
    }

    #[tokio::test]
    async fn test_no_marker_matches_falls_back() {
        let doc = sample_doc(4);
        let reply = r#"{"splits": [{"marker_text": "nowhere to be found"}]}"#;
        let provider = MockProvider::always_succeeds(reply);
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 2.0, &provider).await.unwrap();

        assert_eq!(diagnostics.fallbacks(), vec![FallbackReason::NoMarkersMatched]);
        assert!(chunks.len() > 1);
        assert_covers(&doc, &chunks);
    }

    #[tokio::test]
    async fn test_garbage_reply_falls_back_to_paragraphs() {
        let doc = sample_doc(4);
        let provider =
            MockProvider::always_succeeds("I think this text is about numbered sentences.");
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 2.0, &provider).await.unwrap();

        assert_eq!(diagnostics.fallbacks(), vec![FallbackReason::Unparseable]);
        // 2 minutes = 600 chars target, each paragraph already exceeds it
        assert_eq!(chunks.len(), 4);
        assert_covers(&doc, &chunks);
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let doc = sample_doc(3);
        let provider = MockProvider::always_fails(LlmError::ApiError {
            message: "unauthorized".into(),
            status_code: Some(401),
        });
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 5.0, &provider).await.unwrap();

        assert_eq!(provider.call_count(), 1);
        assert!(matches!(
            diagnostics.fallbacks().as_slice(),
            [FallbackReason::CallFailed(_)]
        ));
        assert_covers(&doc, &chunks);
    }

    #[tokio::test]
    async fn test_rich_reply_used_directly() {
        let doc = sample_doc(2);
        let first = "A".repeat(700);
        let second = "B".repeat(800);
        let reply = fenced(json!({
            "chunks": [
                {"id": 1, "title": "Opening", "text": first},
                {"id": 2, "title": "Closing", "text": format!("  {}  ", second)}
            ],
            "summary_quality": "OK"
        }));
        let provider = MockProvider::always_succeeds(&reply);
        let diagnostics = RecordingDiagnostics::default();
        let settings = SplitSettings {
            proposal_format: ProposalFormat::Chunks,
            ..SplitSettings::default()
        };
        let planner = ChunkPlanner::new(settings, &diagnostics);

        let chunks = planner.plan(&doc, 5.0, &provider).await.unwrap();

        assert_eq!(
            chunks,
            vec![
                Chunk::titled(first, Some("Opening".into())),
                Chunk::titled(second, Some("Closing".into())),
            ]
        );
        assert!(provider.prompts()[0].contains("summary_quality"));
    }

    #[tokio::test]
    async fn test_rich_reply_out_of_order_rejected() {
        let doc = sample_doc(3);
        let reply = fenced(json!({
            "chunks": [
                {"id": 2, "title": "B", "text": "B".repeat(700)},
                {"id": 1, "title": "A", "text": "A".repeat(700)}
            ]
        }));
        let provider = MockProvider::always_succeeds(&reply);
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 2.0, &provider).await.unwrap();

        assert!(matches!(
            diagnostics.fallbacks().as_slice(),
            [FallbackReason::InvalidChunks(_)]
        ));
        assert_covers(&doc, &chunks);
    }

    #[tokio::test]
    async fn test_rich_reply_empty_entries_dropped() {
        let doc = sample_doc(2);
        let reply = fenced(json!({
            "chunks": [
                {"id": 1, "title": "A", "text": "A".repeat(700)},
                {"id": 2, "title": "Blank", "text": "   "},
                {"id": 3, "title": "C", "text": "C".repeat(700)}
            ]
        }));
        let provider = MockProvider::always_succeeds(&reply);
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 5.0, &provider).await.unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].title.as_deref(), Some("C"));
        assert!(
            diagnostics
                .events()
                .contains(&SplitEvent::RichChunkDropped { id: Some(2) })
        );
    }

    #[tokio::test]
    async fn test_small_proposed_chunks_merged() {
        let doc = sample_doc(3);
        let reply = fenced(json!({
            "splits": [
                {"marker_text": "Paragraph 1 sentence 2."},
                {"marker_text": "Paragraph 2 sentence 30."}
            ]
        }));
        let provider = MockProvider::always_succeeds(&reply);
        let diagnostics = RecordingDiagnostics::default();
        let planner = ChunkPlanner::new(SplitSettings::default(), &diagnostics);

        let chunks = planner.plan(&doc, 2.0, &provider).await.unwrap();

        // The 47-char opening chunk is folded into the rest of paragraph 1
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.char_count() >= 600));
        assert!(
            diagnostics
                .events()
                .iter()
                .any(|e| matches!(e, SplitEvent::Merged { before: 3, after: 2, .. }))
        );
        assert_covers(&doc, &chunks);
    }
}
