//! Instructions sent to the provider when asking for split proposals.

use super::{ProposalFormat, SplitSettings};
use crate::text::Document;

pub const SYSTEM_PROMPT: &str = "You are an editor preparing long documents for single-narrator podcast episodes. You answer with JSON only.";

/// Parameters the prompt embeds besides the document itself.
pub struct PromptParams<'a> {
    pub settings: &'a SplitSettings,
    pub target_minutes: f64,
    pub estimated_chunks: usize,
}

/// Build the full split request for `doc`.
pub fn build_split_prompt(doc: &Document, params: &PromptParams<'_>) -> String {
    let settings = params.settings;
    let format_rules = match settings.proposal_format {
        ProposalFormat::Markers => MARKER_FORMAT,
        ProposalFormat::Chunks => CHUNK_FORMAT,
    };

    format!(
        r#"Divide the document below into logically coherent sections for narration.

## Size
- Each section should be {min}-{max} characters long.
- A section should take about {minutes} minutes to read aloud (about {cpm} characters per minute).
- Aim for roughly {estimated} sections in total.

## Where to cut
- Prefer chapter and section boundaries, then clear topic shifts.
- Never cut inside a paragraph or a sentence.
- Every section must make sense on its own.
- Give every section a short title (at most 15 characters).

{format_rules}

## Document
{text}"#,
        min = settings.chunk_min_chars,
        max = settings.chunk_max_chars,
        minutes = format_minutes(params.target_minutes),
        cpm = settings.chars_per_minute,
        estimated = params.estimated_chunks,
        format_rules = format_rules,
        text = doc.as_str(),
    )
}

fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{:.1}", minutes)
    }
}

const MARKER_FORMAT: &str = r#"## Output format
Return a JSON object. For every section, copy its final sentence EXACTLY as it
appears in the document into "marker_text" (30-50 characters, no ellipses, no
paraphrasing). The cut is made right after that text. Do not include a marker
for the last section.
```json
{
  "chunks": [
    {"id": 1, "title": "Introduction", "marker_text": "exact last sentence of section 1", "split_type": "chapter start"},
    {"id": 2, "title": "Key ideas", "marker_text": "exact last sentence of section 2", "split_type": "topic shift"}
  ]
}
```"#;

const CHUNK_FORMAT: &str = r#"## Output format
Return a JSON object whose "chunks" array holds every section in order, each
with a sequential "id" (1, 2, 3, ...), a "title" and the section's full
"text". Finish with "summary_quality": "OK" or "NEEDS REVIEW".
```json
{
  "chunks": [
    {"id": 1, "title": "Introduction", "text": "full text of section 1"},
    {"id": 2, "title": "Key ideas", "text": "full text of section 2"}
  ],
  "summary_quality": "OK"
}
```"#;
