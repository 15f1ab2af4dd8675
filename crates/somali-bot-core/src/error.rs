//! Error types for the Somali bot core.
//!
//! Every failure a handler can hit while talking to Telegram's upstreams
//! (the chat model and the speech recognizer) is expressed here, so the
//! assistant can log the cause and decide on the user-facing reply.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the bot core.
#[derive(Debug, Error)]
pub enum BotError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited by {service}, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        service: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Circuit breaker open for {domain}")]
    CircuitBreakerOpen { domain: String },

    // Upstream API errors
    #[error("{service} API returned {status}: {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    #[error("Model {model} is loading, estimated {estimated_secs:?} seconds")]
    ModelLoading {
        model: String,
        estimated_secs: Option<f64>,
    },

    #[error("{service} returned an empty response")]
    EmptyResponse { service: String },

    // Audio errors
    #[error("Audio clip is empty")]
    EmptyAudio,

    #[error("Audio clip of {size} bytes exceeds the {limit} byte limit")]
    AudioTooLarge { size: u64, limit: u64 },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for bot operations.
pub type Result<T> = std::result::Result<T, BotError>;

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl BotError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        BotError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        BotError::Network {
            message: message.into(),
            cause: None,
        }
    }

    /// Check if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BotError::Network { .. }
            | BotError::Timeout(_)
            | BotError::RateLimited { .. }
            | BotError::ModelLoading { .. } => true,
            BotError::Api { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// Whether this failure should count against an upstream's circuit breaker.
    ///
    /// Client-side mistakes (bad audio, 4xx) say nothing about upstream health.
    pub fn is_upstream_failure(&self) -> bool {
        match self {
            BotError::Api { status, .. } => *status >= 500,
            BotError::EmptyAudio | BotError::AudioTooLarge { .. } | BotError::Config { .. } => {
                false
            }
            _ => self.is_retryable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BotError::Api {
            service: "openai".into(),
            status: 401,
            message: "Incorrect API key provided".into(),
        };
        assert_eq!(
            err.to_string(),
            "openai API returned 401: Incorrect API key provided"
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(BotError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(BotError::ModelLoading {
            model: "Mustafaa4a/ASR-Somali".into(),
            estimated_secs: Some(20.0)
        }
        .is_retryable());
        assert!(BotError::Api {
            service: "openai".into(),
            status: 502,
            message: "bad gateway".into()
        }
        .is_retryable());
        assert!(!BotError::Api {
            service: "openai".into(),
            status: 400,
            message: "bad request".into()
        }
        .is_retryable());
        assert!(!BotError::EmptyAudio.is_retryable());
    }

    #[test]
    fn test_upstream_failure_classification() {
        let err = BotError::RateLimited {
            service: "openai".into(),
            retry_after_secs: Some(3),
        };
        assert!(err.is_retryable());
        assert!(err.is_upstream_failure());
        assert!(!BotError::AudioTooLarge { size: 30, limit: 20 }.is_upstream_failure());
    }
}
