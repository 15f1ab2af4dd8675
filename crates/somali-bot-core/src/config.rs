//! Centralized configuration for the Somali bot.
//!
//! Constant holders for network and audio limits, plus the runtime settings
//! the binary assembles from CLI flags and environment variables.

use crate::access::AccessList;
use crate::error::{BotError, Result};
use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "Somali Voice Bot";
    pub const USER_AGENT: &'static str = "somali-bot/0.1";
}

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const MAX_RETRIES: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);
    pub const RETRY_MAX_DELAY: Duration = Duration::from_secs(20);
    pub const CIRCUIT_BREAKER_FAILURE_THRESHOLD: u32 = 5;
    pub const CIRCUIT_BREAKER_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);
    pub const THROTTLE_DELAY: Duration = Duration::from_millis(500);
}

/// Chat completion defaults.
pub struct ChatConfig;

impl ChatConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";
    pub const SERVICE_NAME: &'static str = "openai";
}

/// Speech recognition defaults.
pub struct AsrConfig;

impl AsrConfig {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api-inference.huggingface.co/models";
    pub const DEFAULT_MODEL_ID: &'static str = "Mustafaa4a/ASR-Somali";
    pub const DEFAULT_HUB_BASE: &'static str = "https://huggingface.co";
    pub const EXPECTED_PIPELINE_TAG: &'static str = "automatic-speech-recognition";
    pub const SERVICE_NAME: &'static str = "huggingface";
    // Cold models can take a while to spin up behind the inference API.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
}

/// Audio limits.
pub struct AudioConfig;

impl AudioConfig {
    /// Telegram's `getFile` refuses anything larger than 20 MiB.
    pub const MAX_VOICE_BYTES: u64 = 20 * 1024 * 1024;
    pub const VOICE_MIME_TYPE: &'static str = "audio/ogg";
}

/// Chat completion settings.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub api_base: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_base: ChatConfig::DEFAULT_API_BASE.to_string(),
            model: ChatConfig::DEFAULT_MODEL.to_string(),
            timeout: NetworkConfig::REQUEST_TIMEOUT,
        }
    }
}

/// Speech recognition settings.
#[derive(Debug, Clone)]
pub struct AsrSettings {
    /// Base URL the model id is appended to.
    pub endpoint: String,
    pub model_id: String,
    /// Hub used for the model availability check.
    pub hub_base: String,
    /// Explicit token; falls back to the usual Hugging Face locations when unset.
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for AsrSettings {
    fn default() -> Self {
        Self {
            endpoint: AsrConfig::DEFAULT_ENDPOINT.to_string(),
            model_id: AsrConfig::DEFAULT_MODEL_ID.to_string(),
            hub_base: AsrConfig::DEFAULT_HUB_BASE.to_string(),
            token: None,
            timeout: AsrConfig::REQUEST_TIMEOUT,
        }
    }
}

/// Everything the bot needs to run.
#[derive(Clone)]
pub struct BotSettings {
    pub bot_token: String,
    pub openai_api_key: String,
    pub authorized_chat_ids: AccessList,
    pub chat: ChatSettings,
    pub asr: AsrSettings,
}

impl std::fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotSettings")
            .field("bot_token", &redact(&self.bot_token))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("authorized_chat_ids", &self.authorized_chat_ids)
            .field("chat", &self.chat)
            .field("asr_model", &self.asr.model_id)
            .field("asr_endpoint", &self.asr.endpoint)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl BotSettings {
    /// Check that the bot can start.
    ///
    /// All problems are reported together so a misconfigured container fails
    /// with one complete message.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.bot_token.trim().is_empty() {
            problems.push("BOT_TOKEN is not set".to_string());
        }
        if self.openai_api_key.trim().is_empty() {
            problems.push("OPENAI_API_KEY is not set".to_string());
        }
        if self.authorized_chat_ids.is_empty() {
            problems.push("AUTHORIZED_CHAT_ID contains no valid chat IDs".to_string());
        }
        if self.chat.model.trim().is_empty() {
            problems.push("chat model name is empty".to_string());
        }
        if self.asr.model_id.trim().is_empty() {
            problems.push("ASR model id is empty".to_string());
        }
        for (name, value) in [
            ("chat API base", &self.chat.api_base),
            ("ASR endpoint", &self.asr.endpoint),
            ("model hub", &self.asr.hub_base),
        ] {
            if let Err(e) = url::Url::parse(value) {
                problems.push(format!("{} {:?} is not a valid URL: {}", name, value, e));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(BotError::Config {
                message: problems.join("; "),
            })
        }
    }
}
