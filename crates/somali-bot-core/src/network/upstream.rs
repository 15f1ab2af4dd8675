//! One remote API with its own HTTP client, retry policy and circuit breaker.

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats};
use super::client::HttpClient;
use super::retry::{retry_async, RetryConfig, RetryDecision};
use crate::error::{BotError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Resilient access to a single upstream service.
pub struct Upstream {
    http: HttpClient,
    breaker: CircuitBreaker,
    retry: RetryConfig,
}

impl Upstream {
    pub fn new(service: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(service, timeout)?,
            breaker: CircuitBreaker::new(service),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.breaker = CircuitBreaker::with_config(self.http.service().to_string(), config);
        self
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn breaker_stats(&self) -> CircuitBreakerStats {
        self.breaker.stats()
    }

    /// Run `operation` under the circuit breaker, retrying transient failures.
    ///
    /// Each attempt asks the breaker first; an open circuit fails fast with
    /// [`BotError::CircuitBreakerOpen`] and is never retried. Errors that are
    /// not upstream failures leave the breaker untouched.
    pub async fn call<'s, T, F, Fut>(&'s self, mut operation: F) -> Result<T>
    where
        F: FnMut(&'s HttpClient) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let this = self;
        let (result, stats) = retry_async(
            &self.retry,
            move || {
                let attempt = this
                    .breaker
                    .try_acquire()
                    .map(|permit| (permit, operation(&this.http)));
                async move {
                    let Some((permit, fut)) = attempt else {
                        return Err(BotError::CircuitBreakerOpen {
                            domain: this.breaker.domain().to_string(),
                        });
                    };
                    let outcome = fut.await;
                    match &outcome {
                        Ok(_) => permit.succeeded(),
                        Err(e) if e.is_upstream_failure() => permit.failed(),
                        Err(_) => drop(permit),
                    }
                    outcome
                }
            },
            |e: &BotError| match e {
                BotError::CircuitBreakerOpen { .. } => RetryDecision::Stop,
                other => RetryDecision::for_error(other),
            },
        )
        .await;

        if stats.attempts > 1 {
            debug!(
                "{} call finished after {} attempts (waited {:?})",
                self.http.service(),
                stats.attempts,
                stats.waited
            );
        }
        result
    }
}
