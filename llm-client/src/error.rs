use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error(
        "API key not found for {provider}. Set {env_var} environment variable or add to config."
    )]
    MissingApiKey { provider: String, env_var: String },

    #[error("Provider not available: {0}")]
    ProviderUnavailable(String),

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server overloaded (HTTP 503): {message}")]
    ServerOverloaded { message: String },

    #[error("API error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Model returned no text{}", .reason.as_ref().map(|r| format!(" ({})", r)).unwrap_or_default())]
    EmptyResponse { reason: Option<String> },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid model preset: {0}")]
    InvalidPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl LlmError {
    /// Whether another attempt at the same request could succeed.
    ///
    /// Client-side 4xx responses other than 408/429 are treated as permanent.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. }
            | Self::ServerOverloaded { .. }
            | Self::EmptyResponse { .. }
            | Self::Io(_) => true,
            Self::ApiError { status_code, .. } => match status_code {
                None => true,
                Some(code) => *code >= 500 || *code == 408,
            },
            Self::MissingApiKey { .. }
            | Self::ProviderUnavailable(_)
            | Self::ConfigError(_)
            | Self::InvalidPreset(_)
            | Self::TomlParse(_)
            | Self::TomlSerialize(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
