//! Stand-in for a provider that could not be set up

use async_trait::async_trait;

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

/// Fails every request with the reason the real provider is missing.
///
/// Lets callers that may never reach a model (short inputs, dry runs) keep
/// going without credentials.
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl LlmProvider for UnavailableProvider {
    async fn complete(&self, _request: LlmRequest) -> Result<LlmResponse> {
        Err(LlmError::ProviderUnavailable(self.reason.clone()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn is_available(&self) -> Result<()> {
        Err(LlmError::ProviderUnavailable(self.reason.clone()))
    }
}
