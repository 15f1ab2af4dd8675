//! HTTP client with rate limiting awareness.
//!
//! Wraps reqwest with:
//! - Rate limit tracking from response headers (OpenAI's
//!   `x-ratelimit-*-requests` and the generic `X-RateLimit-*` pair)
//! - Brief throttling when the remaining budget drops under 10%
//! - Mapping of non-success responses onto [`BotError`]

use crate::config::{AppConfig, NetworkConfig};
use crate::error::{BotError, Result};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

const REMAINING_HEADERS: [&str; 2] = ["x-ratelimit-remaining-requests", "x-ratelimit-remaining"];
const LIMIT_HEADERS: [&str; 2] = ["x-ratelimit-limit-requests", "x-ratelimit-limit"];

/// Longest error body we keep in an error message.
const MAX_ERROR_BODY: usize = 300;

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
}

impl RateLimitState {
    /// Throttle when below 10% of the limit.
    pub fn should_throttle(&self) -> bool {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => {
                let threshold = (limit as f64 * 0.1) as u64;
                remaining < threshold.max(1)
            }
            _ => false,
        }
    }
}

/// reqwest client bound to one upstream service.
pub struct HttpClient {
    client: Client,
    service: String,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicU64,
    timeout: Duration,
    throttle_delay: Duration,
}

impl HttpClient {
    /// Create a client for `service` with the given total request timeout.
    pub fn new(service: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(NetworkConfig::CONNECT_TIMEOUT)
            .user_agent(AppConfig::USER_AGENT)
            .build()
            .map_err(|e| BotError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                cause: None,
            })?;

        Ok(Self {
            client,
            service: service.into(),
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicU64::new(0),
            timeout,
            throttle_delay: NetworkConfig::THROTTLE_DELAY,
        })
    }

    /// Get a reference to the underlying reqwest client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn rate_limit_state(&self) -> RateLimitState {
        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        RateLimitState {
            remaining: (remaining >= 0).then_some(remaining as u64),
            limit: (limit > 0).then_some(limit),
        }
    }

    /// Send a prepared request and return the response if it succeeded.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.send_unchecked(request).await?;
        self.check_response_status(response).await
    }

    /// Send a prepared request without interpreting the status code.
    ///
    /// Callers that need the body of specific failures (a model still loading)
    /// inspect the response first and hand the rest to
    /// [`HttpClient::check_response_status`].
    pub async fn send_unchecked(&self, request: RequestBuilder) -> Result<Response> {
        self.maybe_throttle().await;

        let response = request.send().await.map_err(|e| self.map_error(e))?;

        self.update_rate_limits(response.headers());
        Ok(response)
    }

    /// Read a successful response body as JSON.
    ///
    /// The body is still covered by the client timeout, so a stalled upstream
    /// surfaces here as [`BotError::Timeout`].
    pub async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        response.json().await.map_err(|e| self.map_error(e))
    }

    fn map_error(&self, err: reqwest::Error) -> BotError {
        if err.is_timeout() {
            BotError::Timeout(self.timeout)
        } else if err.is_decode() {
            BotError::Json {
                message: format!("{} sent an unexpected body: {}", self.service, err),
                source: None,
            }
        } else {
            BotError::Network {
                message: format!("{} request failed: {}", self.service, err),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }

    async fn maybe_throttle(&self) {
        let state = self.rate_limit_state();
        if state.should_throttle() {
            warn!(
                "{} rate limit approaching (remaining: {:?}/{:?}), throttling for {:?}",
                self.service, state.remaining, state.limit, self.throttle_delay
            );
            tokio::time::sleep(self.throttle_delay).await;
        }
    }

    fn update_rate_limits(&self, headers: &HeaderMap) {
        if let Some(remaining) = first_header_number::<i64>(headers, &REMAINING_HEADERS) {
            self.rate_limit_remaining.store(remaining, Ordering::SeqCst);
        }
        if let Some(limit) = first_header_number::<u64>(headers, &LIMIT_HEADERS) {
            self.rate_limit_limit.store(limit, Ordering::SeqCst);
        }
    }

    /// Map a non-success response onto the matching error.
    pub async fn check_response_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(BotError::RateLimited {
                service: self.service.clone(),
                retry_after_secs,
            });
        }

        let body = response.text().await.unwrap_or_default();
        debug!("{} returned {}: {}", self.service, status, body);
        Err(BotError::Api {
            service: self.service.clone(),
            status: status.as_u16(),
            message: extract_error_message(&body),
        })
    }
}

fn first_header_number<T: std::str::FromStr>(headers: &HeaderMap, names: &[&str]) -> Option<T> {
    names.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<T>().ok())
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    // OpenAI: {"error": {"message": "..."}}
    Nested { error: NestedError },
    // Hugging Face: {"error": "..."}
    Flat { error: String },
}

#[derive(Deserialize)]
struct NestedError {
    message: String,
}

/// Pull a human-readable message out of an upstream error body.
pub(crate) fn extract_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody::Nested { error }) => error.message,
        Ok(ErrorBody::Flat { error }) => error,
        Err(_) => {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.chars().take(MAX_ERROR_BODY).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_throttle_threshold() {
        let state = RateLimitState {
            remaining: Some(5),
            limit: Some(100),
        };
        assert!(state.should_throttle());

        let state = RateLimitState {
            remaining: Some(50),
            limit: Some(100),
        };
        assert!(!state.should_throttle());

        assert!(!RateLimitState::default().should_throttle());
    }

    #[test]
    fn test_rate_limits_read_from_openai_headers() {
        let client = HttpClient::new("openai", Duration::from_secs(5)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-ratelimit-remaining-requests",
            HeaderValue::from_static("2"),
        );
        headers.insert("x-ratelimit-limit-requests", HeaderValue::from_static("500"));

        client.update_rate_limits(&headers);

        let state = client.rate_limit_state();
        assert_eq!(state.remaining, Some(2));
        assert_eq!(state.limit, Some(500));
        assert!(state.should_throttle());
    }

    #[test]
    fn test_extract_error_message_shapes() {
        assert_eq!(
            extract_error_message(r#"{"error":{"message":"Invalid key","type":"auth"}}"#),
            "Invalid key"
        );
        assert_eq!(
            extract_error_message(r#"{"error":"Model is overloaded"}"#),
            "Model is overloaded"
        );
        assert_eq!(extract_error_message("  upstream down "), "upstream down");
        assert_eq!(extract_error_message(""), "empty response body");
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_budget_delays_next_request() {
        let client = HttpClient::new("openai", Duration::from_secs(5)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("1"));
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("100"));
        client.update_rate_limits(&headers);

        let started = tokio::time::Instant::now();
        client.maybe_throttle().await;
        assert!(started.elapsed() >= NetworkConfig::THROTTLE_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_budget_is_not_throttled() {
        let client = HttpClient::new("openai", Duration::from_secs(5)).unwrap();
        let started = tokio::time::Instant::now();
        client.maybe_throttle().await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
