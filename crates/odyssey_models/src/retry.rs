//! Bounded exponential backoff around text generation.

use async_trait::async_trait;
use odyssey_core::{GenerateRequest, GenerateResponse};
use odyssey_error::{OdysseyResult, RetryableError};
use odyssey_interface::TextGeneration;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::{Retry, RetryError};
use tracing::instrument;

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    5000
}

/// How often and how patiently a generation call is retried.
///
/// The delay before attempt `n + 1` is `min(initial_delay_ms * 2^(n-1), max_delay_ms)`.
/// No jitter is applied.
///
/// # Examples
///
/// ```
/// use odyssey_models::RetryPolicy;
/// use std::time::Duration;
///
/// let delays: Vec<_> = RetryPolicy::default().delays().collect();
/// assert_eq!(delays, vec![Duration::from_millis(1000), Duration::from_millis(2000)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Delays between consecutive attempts; one fewer than `max_attempts`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let initial = self.initial_delay_ms;
        let max = self.max_delay_ms;
        (0..self.max_attempts.saturating_sub(1)).map(move |n| {
            let factor = 1u64.checked_shl(n).unwrap_or(u64::MAX);
            Duration::from_millis(initial.saturating_mul(factor).min(max))
        })
    }
}

/// A [`TextGeneration`] wrapper that retries transient failures.
///
/// Permanent failures are returned on the first attempt; transient ones are
/// retried until `max_attempts` attempts have been made.
#[derive(Debug, Clone)]
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: TextGeneration> RetryingGenerator<G> {
    /// Wrap a generator with the given policy.
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The retry policy in force.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The wrapped generator.
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: TextGeneration> TextGeneration for RetryingGenerator<G> {
    #[instrument(
        skip(self, req),
        fields(provider = self.inner.provider_name(), max_attempts = self.policy.max_attempts)
    )]
    async fn generate(&self, req: &GenerateRequest) -> OdysseyResult<GenerateResponse> {
        let inner = &self.inner;
        let attempts = AtomicU32::new(0);
        let attempts = &attempts;

        Retry::spawn(self.policy.delays(), || async move {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            match inner.generate(req).await {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Generation succeeded after retry");
                    }
                    Ok(response)
                }
                Err(e) if e.is_retryable() => {
                    tracing::warn!(attempt, error = %e, "Generation failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Permanent generation error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await
    }

    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
