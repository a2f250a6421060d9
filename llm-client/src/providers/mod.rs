//! Provider implementations

mod gemini;
pub mod mock;
mod unavailable;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use unavailable::UnavailableProvider;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "genai" | "google" => Ok(Self::Gemini),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Environment variable holding this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GENAI_API_KEY",
        }
    }

    /// Display name used in errors
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
        }
    }
}

/// Create a provider instance from a preset and optional config
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let kind = ProviderKind::parse(&preset.provider)?;
    let api_key = get_api_key(provider_config, kind)?;

    match kind {
        ProviderKind::Gemini => {
            let base_url = provider_config.and_then(|c| c.base_url.as_deref());
            Ok(Box::new(GeminiProvider::new(&preset.model, api_key, base_url)?))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(config: Option<&ProviderConfig>, kind: ProviderKind) -> Result<String> {
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }

    std::env::var(kind.env_var())
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| LlmError::MissingApiKey {
            provider: kind.display_name().to_string(),
            env_var: kind.env_var().to_string(),
        })
}
