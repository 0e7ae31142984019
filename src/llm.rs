//! Text-generation collaborator contract
//!
//! The editing workflow around this crate drives an external LLM service to
//! draft card content. Only the interface lives here; transports implement
//! [`TextGenerator`] out of tree. Callers serialize requests strictly
//! one-at-a-time per generator instance.

use std::time::Duration;
use thiserror::Error;

/// Per-request generation options
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub system_instruction: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Failure modes a generator implementation reports
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("rate limited by the service")]
    RateLimited,

    #[error("request blocked: {0}")]
    Blocked(String),

    #[error("empty response from the service")]
    Empty,

    #[error("transport error: {0}")]
    Transport(String),
}

/// External text-generation service, consumed not implemented here
pub trait TextGenerator {
    fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, GenerationError>;
}

/// Retry behavior implementations are expected to honor
///
/// At most one in-flight request per generator instance; transient failures
/// retry up to `max_attempts` with linearly increasing delay; rate limiting
/// backs off up to `rate_limit_cap`.
#[derive(Debug, Clone, Copy)]
pub struct RetryContract {
    pub max_attempts: u32,
    pub backoff_step: Duration,
    pub rate_limit_cap: Duration,
    pub min_request_interval: Duration,
}

impl Default for RetryContract {
    fn default() -> Self {
        RetryContract {
            max_attempts: 5,
            backoff_step: Duration::from_secs(5),
            rate_limit_cap: Duration::from_secs(60),
            min_request_interval: Duration::from_secs(6),
        }
    }
}

impl RetryContract {
    /// Delay before the retry with the given 1-based attempt number
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt).min(Duration::from_secs(30))
    }

    /// Delay after a rate-limit response on the given 1-based attempt
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        self.min_request_interval
            .saturating_mul(attempt)
            .min(self.rate_limit_cap)
    }
}
