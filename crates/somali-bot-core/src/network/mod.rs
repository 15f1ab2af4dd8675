//! Network plumbing shared by the upstream API clients.
//!
//! - Retry logic with exponential backoff, jitter and upstream delay hints
//! - Circuit breaker per upstream
//! - HTTP client with rate limiting awareness
//! - [`Upstream`], which ties the three together

mod circuit_breaker;
mod client;
mod retry;
mod upstream;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState, Permit,
};
pub use client::{HttpClient, RateLimitState};
pub(crate) use client::extract_error_message;
pub use retry::{retry_async, RetryConfig, RetryDecision, RetryStats};
pub use upstream::Upstream;
