//! Retry with exponential backoff for text-generation HTTP calls.
//!
//! Retries on transient errors (429 rate limit, 408, 5xx server errors, network
//! failures). Does NOT retry on client errors (400, 401, 403, 404, 422).

use crate::llm::GenerationError;
use rand::Rng;
use reqwest::{Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tale_core::AiServiceConfig;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier for each subsequent delay.
    pub backoff_factor: f64,
    /// Random extra delay, uniformly drawn from `0..=max_jitter`.
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            max_jitter: Duration::from_millis(250),
        }
    }
}

impl RetryConfig {
    /// `AI_MAX_RETRIES` counts retries, so attempts are one more.
    pub fn from_config(config: &AiServiceConfig) -> Self {
        Self {
            max_attempts: config.max_retries.saturating_add(1),
            initial_delay: config.retry_delay,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), without jitter.
    pub fn backoff(&self, retry: u32) -> Duration {
        let exp = self.backoff_factor.powi(retry.saturating_sub(1) as i32);
        let secs = (self.initial_delay.as_secs_f64() * exp).min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs.max(0.0))
    }

    fn jitter(&self) -> Duration {
        let max = self.max_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Run `operation` until it yields a success status, a non-retryable status,
/// or `max_attempts` is used up.
pub async fn with_retry<F, Fut>(
    config: &RetryConfig,
    provider_name: &str,
    operation: F,
) -> Result<Response, GenerationError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let attempts = config.max_attempts.max(1);
    let mut last_error = String::from("unknown");

    for attempt in 1..=attempts {
        match operation().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    if attempt > 1 {
                        tracing::info!("{} succeeded on attempt {}", provider_name, attempt);
                    }
                    return Ok(response);
                }

                let error_text = response.text().await.unwrap_or_default();
                let excerpt: String = error_text.chars().take(300).collect();
                if !is_retryable_status(status) {
                    return Err(GenerationError::Rejected {
                        provider: provider_name.to_string(),
                        status: status.as_u16(),
                        body: excerpt,
                    });
                }

                tracing::warn!(
                    "{} returned {} on attempt {}/{}: {}",
                    provider_name,
                    status,
                    attempt,
                    attempts,
                    excerpt
                );
                last_error = format!("{}: {}", status, excerpt);
            }
            Err(e) => {
                tracing::warn!(
                    "{} network error on attempt {}/{}: {}",
                    provider_name,
                    attempt,
                    attempts,
                    e
                );
                last_error = e.to_string();
            }
        }

        if attempt < attempts {
            let sleep_time = config.backoff(attempt) + config.jitter();
            tracing::info!(
                "{} retrying in {:.1}s (attempt {}/{})",
                provider_name,
                sleep_time.as_secs_f64(),
                attempt + 1,
                attempts
            );
            tokio::time::sleep(sleep_time).await;
        }
    }

    Err(GenerationError::Exhausted {
        provider: provider_name.to_string(),
        attempts,
        last_error,
    })
}
