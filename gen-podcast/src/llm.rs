//! LLM client wrapper for gen-podcast
//!
//! Resolves the model for a pipeline phase and wraps the provider in the
//! retry policy from the podcast config.

use anyhow::{Context, Result};
use llm_client::{
    Config, LlmProvider, RetryPolicy, RetryingProvider, UnavailableProvider, get_provider,
};

/// A phase-specific provider with retries applied
pub struct LlmClient {
    provider: RetryingProvider,
    model: String,
}

impl LlmClient {
    /// Create the client for `phase` ("split" or "script").
    ///
    /// If preset_name is None, uses the phase default from the LLM config.
    /// `MODEL_SPLIT` / `MODEL_SCRIPT` override the preset's model.
    pub fn for_phase(phase: &str, preset_name: Option<&str>, policy: RetryPolicy) -> Result<Self> {
        let config = Config::load().context("Failed to load LLM configuration")?;

        let preset = config
            .resolve_for_phase(phase, preset_name)
            .context(format!("Cannot resolve a model preset for phase '{}'", phase))?;

        let provider_config = config.get_provider_config(&preset.provider);
        let provider = get_provider(&preset, provider_config).context(format!(
            "Failed to initialize provider '{}' for phase '{}'",
            preset.provider, phase
        ))?;

        log::debug!(
            "Using LLM provider for {}: {} (model: {})",
            phase,
            provider.name(),
            preset.model
        );

        Ok(Self::from_provider(provider, preset.model, policy))
    }

    pub fn from_provider(
        provider: Box<dyn LlmProvider>,
        model: impl Into<String>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            provider: RetryingProvider::new(provider, policy),
            model: model.into(),
        }
    }

    /// A client whose every request fails with `reason`
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::from_provider(
            Box::new(UnavailableProvider::new(reason)),
            "none",
            RetryPolicy::none(),
        )
    }

    /// Keep a failed setup fatal only when the run will actually need a model.
    pub fn require_or_unavailable(setup: Result<Self>, required: bool) -> Result<Self> {
        match setup {
            Ok(client) => Ok(client),
            Err(e) if !required => {
                log::debug!("No LLM provider ({:#}); continuing without one", e);
                Ok(Self::unavailable(format!("{:#}", e)))
            }
            Err(e) => Err(e),
        }
    }

    /// The retrying provider, for callers that build their own requests
    pub fn provider(&self) -> &dyn LlmProvider {
        &self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::{LlmError, LlmRequest, MockProvider};
    use std::time::Duration;

    #[tokio::test]
    async fn test_provider_returns_content() {
        let client = LlmClient::from_provider(
            Box::new(MockProvider::always_succeeds("hello")),
            "mock-model",
            RetryPolicy::none(),
        );
        let response = client.provider().complete(LlmRequest::new("hi")).await.unwrap();
        assert_eq!(response.content, "hello");
        assert_eq!(client.model(), "mock-model");
        assert_eq!(client.provider().name(), "mock");
    }

    #[tokio::test]
    async fn test_provider_retries_transient_errors() {
        let client = LlmClient::from_provider(
            Box::new(MockProvider::fails_then_succeeds(
                2,
                LlmError::ServerOverloaded {
                    message: "busy".into(),
                },
                "finally",
            )),
            "mock-model",
            RetryPolicy::new(3, Duration::ZERO),
        );
        let response = client.provider().complete(LlmRequest::new("hi")).await.unwrap();
        assert_eq!(response.content, "finally");
    }

    #[test]
    fn test_setup_failure_fatal_when_required() {
        let setup = Err(anyhow::anyhow!("API key not found for Gemini"));
        let err = LlmClient::require_or_unavailable(setup, true).err().unwrap();
        assert!(err.to_string().contains("API key not found"));
    }

    #[tokio::test]
    async fn test_short_text_splits_without_provider() {
        use crate::split::{ChunkPlanner, LogDiagnostics, SplitSettings};
        use crate::text::normalize;

        let setup = Err(anyhow::anyhow!("API key not found for Gemini"));
        let client = LlmClient::require_or_unavailable(setup, false).unwrap();
        assert_eq!(client.provider().name(), "unavailable");

        let doc = normalize("A forty character note for the show.");
        let planner = ChunkPlanner::new(SplitSettings::default(), &LogDiagnostics);
        let chunks = planner.plan(&doc, 5.0, client.provider()).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, doc.as_str());

        let err = client
            .provider()
            .complete(LlmRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ProviderUnavailable(ref r) if r.contains("API key")));
    }

    #[tokio::test]
    async fn test_provider_surfaces_exhausted_retries() {
        let client = LlmClient::from_provider(
            Box::new(MockProvider::always_fails(LlmError::ServerOverloaded {
                message: "busy".into(),
            })),
            "mock-model",
            RetryPolicy::new(2, Duration::ZERO),
        );
        let err = client.provider().complete(LlmRequest::new("hi")).await.unwrap_err();
        assert!(matches!(err, LlmError::ServerOverloaded { .. }));
    }
}
