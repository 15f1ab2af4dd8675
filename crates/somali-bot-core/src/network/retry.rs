//! Backoff between attempts at an upstream call.
//!
//! Upstreams sometimes say how long to wait (`Retry-After`, a model's
//! `estimated_time`). A [`RetryDecision::RetryAfter`] hint replaces the
//! doubling backoff but never exceeds `max_delay`.

use crate::config::NetworkConfig;
use crate::error::BotError;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts including the first one. Never below 1.
    pub max_attempts: u32,
    /// Wait before the second attempt; doubles afterwards.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Scale each wait by a random factor in `[0.5, 1.5)`.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: NetworkConfig::MAX_RETRIES,
            base_delay: NetworkConfig::RETRY_BASE_DELAY,
            max_delay: NetworkConfig::RETRY_MAX_DELAY,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wait after the failed attempt number `failed` (0 = first attempt).
    pub fn backoff(&self, failed: u32) -> Duration {
        let doubled = self
            .base_delay
            .saturating_mul(1u32.checked_shl(failed.min(31)).unwrap_or(u32::MAX));
        let mut delay = doubled.min(self.max_delay);
        if self.jitter {
            delay = delay.mul_f64(rand::rng().random_range(0.5..1.5));
        }
        delay.min(self.max_delay)
    }

    /// Wait before the next attempt, or `None` when the caller should give up.
    pub fn next_delay(&self, failed: u32, decision: RetryDecision) -> Option<Duration> {
        if failed + 1 >= self.max_attempts.max(1) {
            return None;
        }
        match decision {
            RetryDecision::Stop => None,
            RetryDecision::Retry => Some(self.backoff(failed)),
            RetryDecision::RetryAfter(hint) => Some(hint.min(self.max_delay)),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Stop,
    /// Retry after the computed backoff.
    Retry,
    /// Retry after the delay the upstream asked for.
    RetryAfter(Duration),
}

impl RetryDecision {
    /// Default classification of bot errors.
    pub fn for_error(err: &BotError) -> Self {
        match err {
            BotError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Self::RetryAfter(Duration::from_secs(*secs)),
            BotError::ModelLoading {
                estimated_secs: Some(secs),
                ..
            } if secs.is_finite() && *secs > 0.0 => Self::RetryAfter(Duration::from_secs_f64(*secs)),
            e if e.is_retryable() => Self::Retry,
            _ => Self::Stop,
        }
    }
}

/// How a retried call went.
#[derive(Debug, Clone, Default)]
pub struct RetryStats {
    pub attempts: u32,
    /// Time spent sleeping between attempts.
    pub waited: Duration,
}

/// Run `operation` until it succeeds, `classify` says stop, or attempts run out.
pub async fn retry_async<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
    classify: impl Fn(&E) -> RetryDecision,
) -> (Result<T, E>, RetryStats)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut stats = RetryStats::default();

    loop {
        stats.attempts += 1;
        let err = match operation().await {
            Ok(value) => return (Ok(value), stats),
            Err(e) => e,
        };

        let decision = classify(&err);
        let Some(delay) = config.next_delay(stats.attempts - 1, decision) else {
            if decision == RetryDecision::Stop {
                debug!("Not retrying: {}", err);
            } else {
                warn!("Giving up after {} attempts: {}", stats.attempts, err);
            }
            return (Err(err), stats);
        };

        warn!(
            "Attempt {}/{} failed: {}. Retrying in {:?}",
            stats.attempts, config.max_attempts, err, delay
        );
        stats.waited += delay;
        tokio::time::sleep(delay).await;
    }
}
