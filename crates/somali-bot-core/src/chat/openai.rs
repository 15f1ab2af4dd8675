//! HTTP client for OpenAI-compatible chat completion APIs.
//!
//! Sends `POST {api_base}/chat/completions` with bearer authentication and
//! returns the content of the first choice. Any server that speaks the same
//! wire format (Azure-style proxies, local gateways) works by changing
//! `api_base`.

use super::{ChatCompleter, ChatMessage};
use crate::config::{ChatConfig, ChatSettings};
use crate::error::{BotError, Result};
use crate::network::{CircuitBreakerStats, HttpClient, Upstream};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Body of `POST /chat/completions`.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Response from `POST /chat/completions`.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat client for an OpenAI-compatible endpoint.
pub struct OpenAiClient {
    upstream: Upstream,
    api_key: String,
    model: String,
    completions_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, settings: &ChatSettings) -> Result<Self> {
        let upstream = Upstream::new(ChatConfig::SERVICE_NAME, settings.timeout)?;
        Ok(Self::with_upstream(api_key, settings, upstream))
    }

    /// Build on a preconfigured upstream (custom retry or breaker policy).
    pub fn with_upstream(
        api_key: impl Into<String>,
        settings: &ChatSettings,
        upstream: Upstream,
    ) -> Self {
        Self {
            upstream,
            api_key: api_key.into(),
            model: settings.model.clone(),
            completions_url: format!(
                "{}/chat/completions",
                settings.api_base.trim_end_matches('/')
            ),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request_once(&self, http: &HttpClient, messages: &[ChatMessage]) -> Result<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages,
        };
        let request = http
            .inner()
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let response: CompletionResponse = http.json(http.send(request).await?).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| BotError::EmptyResponse {
                service: ChatConfig::SERVICE_NAME.to_string(),
            })
    }
}

#[async_trait]
impl ChatCompleter for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        debug!(
            "Requesting chat completion from {} ({} messages)",
            self.model,
            messages.len()
        );
        self.upstream
            .call(|http| self.request_once(http, messages))
            .await
    }

    fn health(&self) -> Option<CircuitBreakerStats> {
        Some(self.upstream.breaker_stats())
    }
}
