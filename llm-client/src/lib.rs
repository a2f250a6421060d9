//! Text-generation client library for the gen-podcast workspace
//!
//! Provides a single provider contract with:
//! - Gemini `generateContent` (HTTP)
//! - A scriptable mock for tests
//! - A stand-in that fails every request when no provider can be built
//! - A bounded, fixed-delay retry wrapper usable around any provider

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod retry;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{MockProvider, ProviderKind, UnavailableProvider, get_provider};
pub use retry::{RetryPolicy, RetryingProvider};
