//! Structured events reported by the splitting core.
//!
//! Components receive a `&dyn Diagnostics` instead of logging through a
//! global, so tests can capture exactly what happened during a plan.

use super::MarkerKind;
use std::fmt;

/// Why the planner abandoned the provider's proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Transport, auth or provider-side failure
    CallFailed(String),
    /// No usable structured proposal in the reply
    Unparseable,
    /// Markers were proposed but none occurs in the document
    NoMarkersMatched,
    /// Rich chunks failed validation
    InvalidChunks(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CallFailed(e) => write!(f, "provider call failed: {}", e),
            Self::Unparseable => write!(f, "reply contained no usable JSON proposal"),
            Self::NoMarkersMatched => write!(f, "no proposed marker occurs in the text"),
            Self::InvalidChunks(why) => write!(f, "proposed chunks rejected: {}", why),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SplitEvent {
    ShortTextBypass {
        chars: usize,
        threshold: usize,
    },
    PlanStarted {
        chars: usize,
        target_chars: usize,
        estimated_chunks: usize,
    },
    RichChunksReceived {
        count: usize,
        quality: Option<String>,
    },
    MarkersReceived {
        count: usize,
    },
    MarkerMissed {
        index: usize,
        marker: String,
    },
    ChunkCut {
        index: usize,
        chars: usize,
        kind: MarkerKind,
    },
    RichChunkDropped {
        id: Option<u64>,
    },
    Fallback(FallbackReason),
    Merged {
        before: usize,
        after: usize,
        min_chars: usize,
    },
}

/// Sink for split events.
pub trait Diagnostics: Send + Sync {
    fn record(&self, event: SplitEvent);
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn record(&self, event: SplitEvent) {
        match event {
            SplitEvent::ShortTextBypass { chars, threshold } => log::info!(
                "Text is short enough ({} < {} chars), no splitting needed",
                chars,
                threshold
            ),
            SplitEvent::PlanStarted {
                chars,
                target_chars,
                estimated_chunks,
            } => log::info!(
                "Splitting {} chars, target {} chars per chunk (~{} chunks)",
                chars,
                target_chars,
                estimated_chunks
            ),
            SplitEvent::RichChunksReceived { count, quality } => {
                let quality = quality.unwrap_or_else(|| "UNKNOWN".to_string());
                if quality.eq_ignore_ascii_case("ok") || quality == "UNKNOWN" {
                    log::info!("Model returned {} chunks (quality: {})", count, quality);
                } else {
                    log::warn!("Model returned {} chunks (quality: {})", count, quality);
                }
            }
            SplitEvent::MarkersReceived { count } => {
                log::info!("Model returned {} split markers", count)
            }
            SplitEvent::MarkerMissed { index, marker } => log::warn!(
                "Marker {} not found: '{}'",
                index + 1,
                marker.chars().take(50).collect::<String>()
            ),
            SplitEvent::ChunkCut { index, chars, kind } => {
                log::debug!("Cut chunk {} at {:?}: {} chars", index + 1, kind, chars)
            }
            SplitEvent::RichChunkDropped { id } => {
                log::warn!("Dropping empty chunk (id {:?}) from model reply", id)
            }
            SplitEvent::Fallback(reason) => {
                log::warn!("{}; falling back to paragraph splitting", reason)
            }
            SplitEvent::Merged {
                before,
                after,
                min_chars,
            } => log::info!(
                "Merged small chunks (min {} chars): {} -> {}",
                min_chars,
                before,
                after
            ),
        }
    }
}

/// Keeps every event in memory for assertions.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: std::sync::Mutex<Vec<SplitEvent>>,
}

#[cfg(test)]
impl RecordingDiagnostics {
    pub fn events(&self) -> Vec<SplitEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn fallbacks(&self) -> Vec<FallbackReason> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SplitEvent::Fallback(reason) => Some(reason),
                _ => None,
            })
            .collect()
    }

    pub fn missed_markers(&self) -> Vec<usize> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SplitEvent::MarkerMissed { index, .. } => Some(index),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: SplitEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
