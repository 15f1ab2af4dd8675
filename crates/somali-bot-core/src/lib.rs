//! Somali Bot Core - conversation logic and upstream clients for the Somali
//! voice assistant bot.
//!
//! The crate has no Telegram dependency. It provides:
//! - [`AccessList`] for the chat allow-list
//! - [`OpenAiClient`], a [`ChatCompleter`] for OpenAI-compatible APIs
//! - [`HfInferenceClient`], a [`Transcriber`] for the Hugging Face Inference API
//! - [`Assistant`], which turns incoming text and voice notes into replies
//!
//! # Example
//!
//! ```rust,ignore
//! use somali_bot_core::{AccessList, Assistant, AsrSettings, ChatSettings};
//! use somali_bot_core::{HfInferenceClient, OpenAiClient};
//!
//! #[tokio::main]
//! async fn main() -> somali_bot_core::Result<()> {
//!     let chat = OpenAiClient::new("sk-...", &ChatSettings::default())?;
//!     let asr = HfInferenceClient::new(&AsrSettings::default())?;
//!     let assistant = Assistant::new(AccessList::parse("12345"), chat, asr);
//!
//!     if let Some(reply) = assistant.handle_text(12345, "Help").await {
//!         println!("{}", reply.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod asr;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod network;

pub use access::AccessList;
pub use asr::{AudioClip, HfInferenceClient, ModelInfo, Transcriber, Transcript};
pub use assistant::{Assistant, HealthReport, Incoming, MenuChoice, Messages, Reply};
pub use chat::{ChatCompleter, ChatMessage, OpenAiClient, Role};
pub use config::{AsrSettings, AudioConfig, BotSettings, ChatSettings};
pub use error::{BotError, Result};

/// The assistant wired to the production upstreams.
pub type BotAssistant = Assistant<OpenAiClient, HfInferenceClient>;
