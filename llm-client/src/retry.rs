//! Bounded retry with a fixed delay between attempts.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, LlmRequest, LlmResponse};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// How many times a request is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Fixed pause after each failed attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

/// Wraps a provider so every `complete` call retries transient failures.
pub struct RetryingProvider<P: ?Sized = dyn LlmProvider> {
    inner: Box<P>,
    policy: RetryPolicy,
}

impl<P: LlmProvider + ?Sized> RetryingProvider<P> {
    pub fn new(inner: Box<P>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: LlmProvider + ?Sized> LlmProvider for RetryingProvider<P> {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let attempts = self.policy.attempts();
        let mut last_error: Option<LlmError> = None;

        for attempt in 1..=attempts {
            match self.inner.complete(request.clone()).await {
                Ok(response) => {
                    if attempt > 1 {
                        log::info!(
                            "{} succeeded on attempt {}/{}",
                            self.inner.name(),
                            attempt,
                            attempts
                        );
                    }
                    return Ok(response);
                }
                Err(e) if !e.is_retryable() => {
                    log::error!("{} failed permanently: {}", self.inner.name(), e);
                    return Err(e);
                }
                Err(e) => {
                    log::warn!(
                        "{} attempt {}/{} failed: {}",
                        self.inner.name(),
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                    if attempt < attempts && !self.policy.delay.is_zero() {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| LlmError::EmptyResponse { reason: None }))
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn is_available(&self) -> Result<()> {
        self.inner.is_available()
    }
}
