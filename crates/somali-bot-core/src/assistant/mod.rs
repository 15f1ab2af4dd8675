//! The bot's conversation logic, independent of the chat platform.
//!
//! [`Assistant`] decides what to answer; the binary only moves messages
//! between Telegram and these methods. Upstream failures are logged here and
//! turned into the fixed apology replies, so handlers never see an error.

mod menu;

pub use menu::{Incoming, MenuChoice, Messages, Reply};

use crate::access::AccessList;
use crate::asr::{AudioClip, Transcriber};
use crate::chat::{prompts, ChatCompleter};
use crate::error::Result;
use crate::network::CircuitBreakerStats;
use serde::Serialize;
use std::fmt::Display;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Upstream status exposed on the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub asr_model: String,
    pub authorized_chats: usize,
    pub chat: Option<CircuitBreakerStats>,
    pub asr: Option<CircuitBreakerStats>,
}

/// Platform-independent bot behaviour.
pub struct Assistant<C, T> {
    access: AccessList,
    chat: C,
    transcriber: T,
}

impl<C: ChatCompleter, T: Transcriber> Assistant<C, T> {
    pub fn new(access: AccessList, chat: C, transcriber: T) -> Self {
        Self {
            access,
            chat,
            transcriber,
        }
    }

    pub fn chat(&self) -> &C {
        &self.chat
    }

    pub fn transcriber(&self) -> &T {
        &self.transcriber
    }

    /// `Some(reply)` when the chat is not on the allow-list.
    pub fn access_denied(&self, chat_id: i64) -> Option<Reply> {
        if self.access.is_authorized(chat_id) {
            None
        } else {
            info!("Rejected message from unauthorised chat {}", chat_id);
            Some(Reply::text(Messages::UNAUTHORIZED))
        }
    }

    /// Answer `/start` with the menu keyboard.
    pub fn start(&self, chat_id: i64) -> Reply {
        self.access_denied(chat_id)
            .unwrap_or_else(|| Reply::with_menu(Messages::WELCOME))
    }

    /// Answer a text message. `None` means the message is ignored.
    pub async fn handle_text(&self, chat_id: i64, text: &str) -> Option<Reply> {
        let incoming = match Incoming::classify(text) {
            Incoming::OtherCommand | Incoming::Blank => {
                debug!("Ignoring command or blank text from chat {}", chat_id);
                return None;
            }
            Incoming::Start => return Some(self.start(chat_id)),
            other => other,
        };
        if let Some(denied) = self.access_denied(chat_id) {
            return Some(denied);
        }

        let reply = match incoming {
            Incoming::Menu(choice) => Reply::text(choice.prompt()),
            Incoming::Prompt(prompt) => match self.answer(&prompt).await {
                Ok(answer) => Reply::text(answer),
                Err(e) => {
                    warn!("Chat completion failed for chat {}: {}", chat_id, e);
                    Reply::text(Messages::TEXT_FAILED)
                }
            },
            Incoming::Start | Incoming::OtherCommand | Incoming::Blank => return None,
        };
        Some(reply)
    }

    /// Transcribe a Somali voice note and answer with its English translation.
    pub async fn handle_voice(&self, chat_id: i64, clip: AudioClip) -> Reply {
        if let Some(denied) = self.access_denied(chat_id) {
            return denied;
        }

        match self.translate_voice(clip).await {
            Ok(translation) => Reply::text(translation),
            Err(e) => self.voice_failed(chat_id, &e),
        }
    }

    /// Reply for a voice note that could not be processed, e.g. because the
    /// platform download failed before it reached the assistant.
    pub fn voice_failed(&self, chat_id: i64, err: &dyn Display) -> Reply {
        warn!("Voice message from chat {} failed: {}", chat_id, err);
        Reply::text(Messages::VOICE_FAILED)
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            asr_model: self.transcriber.model_id().to_string(),
            authorized_chats: self.access.len(),
            chat: self.chat.health(),
            asr: self.transcriber.health(),
        }
    }

    async fn answer(&self, prompt: &str) -> Result<String> {
        self.chat
            .complete(&prompts::assistant_conversation(prompt))
            .await
    }

    async fn translate_voice(&self, clip: AudioClip) -> Result<String> {
        let started = Instant::now();
        let size = clip.len();
        let transcript = self.transcriber.transcribe(clip).await?;
        debug!(
            "Transcribed {} bytes in {:?}: {:?}",
            size,
            started.elapsed(),
            transcript.text
        );

        let translation = self
            .chat
            .complete(&prompts::somali_translation(&transcript.text))
            .await?;
        info!(
            "Voice note translated in {:?} ({} chars of Somali)",
            started.elapsed(),
            transcript.text.chars().count()
        );
        Ok(translation)
    }
}
