//! Extraction of a structured split proposal from free-form model output.

use super::{Marker, MarkerKind};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

/// A fenced block explicitly labeled as JSON; an unterminated fence runs to the end.
static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```json[ \t]*\r?\n?(.*?)(?:```|\z)").expect("JSON fence pattern is valid")
});

/// A pre-segmented chunk supplied directly by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RichChunk {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub text: String,
}

/// What a reply turned out to contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// Full chunk texts; no reconciliation needed
    RichChunks {
        chunks: Vec<RichChunk>,
        quality: Option<String>,
    },
    /// Boundary markers to be reconciled against the document
    MarkerList(Vec<Marker>),
    /// Nothing usable; the caller should fall back
    Empty,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "marker", alias = "end_marker")]
    marker_text: Option<String>,
    #[serde(default, alias = "split_type", alias = "type")]
    kind: Option<String>,
}

impl RawEntry {
    fn id(&self) -> Option<u64> {
        match self.id.as_ref()? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn into_marker(self) -> Option<Marker> {
        let text = self.marker_text?;
        Some(Marker {
            kind: self
                .kind
                .as_deref()
                .map(MarkerKind::from_label)
                .unwrap_or_default(),
            title: self.title,
            ..Marker::new(text)
        })
    }
}

/// Parse a raw model reply into a [`Proposal`].
///
/// Any failure to locate or decode a payload yields [`Proposal::Empty`];
/// that is the signal for fallback, not an error.
pub fn parse_proposal(reply: &str) -> Proposal {
    let Some(payload) = extract_payload(reply) else {
        return Proposal::Empty;
    };

    match serde_json::from_str::<Value>(payload) {
        Ok(root) => classify(root),
        Err(_) => Proposal::Empty,
    }
}

/// Locate the JSON text inside a reply: a ```json fence first, otherwise the
/// span from the first `{` to the last `}`.
fn extract_payload(reply: &str) -> Option<&str> {
    if let Some(fenced) = JSON_FENCE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
    {
        return Some(fenced);
    }

    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn entries(value: Option<&Value>) -> Vec<RawEntry> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| RawEntry::deserialize(item).ok())
        .collect()
}

fn classify(root: Value) -> Proposal {
    let (chunk_entries, split_entries, quality) = match &root {
        Value::Object(map) => (
            entries(map.get("chunks")),
            entries(map.get("splits").or_else(|| map.get("markers"))),
            map.get("summary_quality")
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        Value::Array(_) => (entries(Some(&root)), Vec::new(), None),
        _ => return Proposal::Empty,
    };

    if chunk_entries.iter().any(|e| e.text.is_some()) {
        let chunks = chunk_entries
            .into_iter()
            .map(|e| RichChunk {
                id: e.id(),
                title: e.title.clone(),
                text: e.text.unwrap_or_default(),
            })
            .collect();
        return Proposal::RichChunks { chunks, quality };
    }

    let markers: Vec<Marker> = chunk_entries
        .into_iter()
        .chain(split_entries)
        .filter_map(RawEntry::into_marker)
        .collect();

    if markers.is_empty() {
        Proposal::Empty
    } else {
        Proposal::MarkerList(markers)
    }
}
