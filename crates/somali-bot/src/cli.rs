//! Command line and environment configuration.

use clap::{Parser, Subcommand};
use somali_bot_core::config::{AsrConfig, ChatConfig};
use somali_bot_core::{AccessList, AsrSettings, BotSettings, ChatSettings};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "somali-bot")]
#[command(about = "Telegram bot that answers questions and translates Somali voice notes")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Telegram bot token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true, default_value = "")]
    pub bot_token: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    pub openai_api_key: String,

    /// Comma-separated chat IDs allowed to use the bot
    #[arg(long, env = "AUTHORIZED_CHAT_ID", default_value = "")]
    pub authorized_chat_ids: String,

    /// Chat model used for answers and translations
    #[arg(long, env = "OPENAI_MODEL", default_value = ChatConfig::DEFAULT_MODEL)]
    pub openai_model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_API_BASE", default_value = ChatConfig::DEFAULT_API_BASE)]
    pub openai_api_base: String,

    /// Hugging Face model id of the Somali speech recognizer
    #[arg(long, env = "ASR_MODEL", default_value = AsrConfig::DEFAULT_MODEL_ID)]
    pub asr_model: String,

    /// Inference endpoint the model id is appended to
    #[arg(long, env = "ASR_ENDPOINT", default_value = AsrConfig::DEFAULT_ENDPOINT)]
    pub asr_endpoint: String,

    /// Hugging Face token (falls back to HF_TOKEN and the CLI cache)
    #[arg(long, env = "HUGGINGFACE_API_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Timeout in seconds for one speech recognition request
    #[arg(long, env = "ASR_TIMEOUT_SECS", default_value_t = AsrConfig::REQUEST_TIMEOUT.as_secs())]
    pub asr_timeout_secs: u64,

    /// Serve /health and /status on this port
    #[arg(long, env = "HEALTH_PORT")]
    pub health_port: Option<u16>,

    /// Host for the health server
    #[arg(long, env = "HEALTH_HOST", default_value = "0.0.0.0")]
    pub health_host: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the bot (default)
    Run,
    /// Validate settings and check the speech model on the Hub, then exit
    Check,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }

    pub fn settings(&self) -> BotSettings {
        BotSettings {
            bot_token: self.bot_token.trim().to_string(),
            openai_api_key: self.openai_api_key.trim().to_string(),
            authorized_chat_ids: AccessList::parse(&self.authorized_chat_ids),
            chat: ChatSettings {
                api_base: self.openai_api_base.clone(),
                model: self.openai_model.clone(),
                ..Default::default()
            },
            asr: AsrSettings {
                endpoint: self.asr_endpoint.clone(),
                model_id: self.asr_model.clone(),
                token: self.hf_token.clone(),
                timeout: Duration::from_secs(self.asr_timeout_secs),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["somali-bot"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_build_settings() {
        let args = parse(&[
            "--bot-token",
            " 123:abc ",
            "--openai-api-key",
            "sk-test",
            "--authorized-chat-ids",
            "1, 2,x",
            "--asr-model",
            "someone/asr",
        ]);
        let settings = args.settings();

        assert_eq!(settings.bot_token, "123:abc");
        assert_eq!(settings.authorized_chat_ids.len(), 2);
        assert_eq!(settings.asr.model_id, "someone/asr");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_check_subcommand() {
        let args = parse(&["--bot-token", "t", "check"]);
        assert_eq!(args.command(), Command::Check);
        assert_eq!(parse(&["--bot-token", "t"]).command(), Command::Run);
    }

    #[test]
    fn test_asr_timeout_flag() {
        let args = parse(&["--asr-timeout-secs", "15"]);
        assert_eq!(args.settings().asr.timeout, Duration::from_secs(15));
    }
}
