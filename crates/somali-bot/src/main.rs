//! Somali Bot - Telegram assistant that answers questions and translates
//! Somali voice notes into English.
//!
//! Text goes to an OpenAI-compatible chat model; voice notes are transcribed
//! by a Somali ASR model on the Hugging Face Inference API and then translated.

mod cli;
mod health;
mod telegram;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use somali_bot_core::{Assistant, BotAssistant, BotSettings, HfInferenceClient, OpenAiClient};
use std::sync::Arc;
use teloxide::Bot;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(args: &Args) {
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn build_assistant(settings: &BotSettings) -> Result<BotAssistant> {
    let chat = OpenAiClient::new(&settings.openai_api_key, &settings.chat)?;
    let asr = HfInferenceClient::new(&settings.asr)?;
    Ok(Assistant::new(
        settings.authorized_chat_ids.clone(),
        chat,
        asr,
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(&args);

    info!("Starting Somali Bot");

    let settings = args.settings();
    if let Err(e) = settings.validate() {
        error!("🚨 Missing env vars or no authorized chat IDs set: {}", e);
        std::process::exit(1);
    }
    info!(
        "Authorized chats: {}, chat model: {}, ASR model: {}",
        settings.authorized_chat_ids.len(),
        settings.chat.model,
        settings.asr.model_id
    );

    let assistant = Arc::new(build_assistant(&settings)?);

    match args.command() {
        Command::Check => {
            assistant.transcriber().check_model().await?;
            info!("Configuration OK");
            Ok(())
        }
        Command::Run => {
            if let Err(e) = assistant.transcriber().check_model().await {
                warn!("Could not verify ASR model {}: {}", settings.asr.model_id, e);
            }

            if let Some(port) = args.health_port {
                health::start_server(assistant.clone(), &args.health_host, port).await?;
            }

            let bot = Bot::new(&settings.bot_token);
            telegram::run(bot, assistant).await;

            info!("Shutdown signal received, exiting");
            Ok(())
        }
    }
}
