//! Chat completion: message types, the [`ChatCompleter`] seam and the
//! OpenAI-compatible client behind it.

mod openai;
pub mod prompts;

pub use openai::OpenAiClient;

use crate::error::Result;
use crate::network::CircuitBreakerStats;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message of a chat completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Something that can answer a conversation.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    /// Return the assistant's reply to `messages`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Circuit breaker view of the backing service, if it has one.
    fn health(&self) -> Option<CircuitBreakerStats> {
        None
    }
}
