//! Telegram transport: routes updates to the assistant and sends replies.

use anyhow::Result;
use bytes::Bytes;
use somali_bot_core::asr::check_audio_size;
use somali_bot_core::config::AudioConfig;
use somali_bot_core::{AudioClip, BotAssistant, Reply};
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, Voice};
use tracing::{debug, info};

/// Poll Telegram until Ctrl-C.
pub async fn run(bot: Bot, assistant: Arc<BotAssistant>) {
    let handler = Update::filter_message()
        .branch(Message::filter_voice().endpoint(on_voice))
        .branch(Message::filter_text().endpoint(on_text));

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![assistant])
        .default_handler(|update| async move {
            debug!("Unhandled update {:?}", update.id);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_text(bot: Bot, msg: Message, text: String, assistant: Arc<BotAssistant>) -> Result<()> {
    let chat_id = msg.chat.id.0;
    if let Some(reply) = assistant.handle_text(chat_id, &text).await {
        send_reply(&bot, msg.chat.id, reply).await?;
    }
    Ok(())
}

async fn on_voice(
    bot: Bot,
    msg: Message,
    voice: Voice,
    assistant: Arc<BotAssistant>,
) -> Result<()> {
    let chat_id = msg.chat.id.0;
    if let Some(denied) = assistant.access_denied(chat_id) {
        send_reply(&bot, msg.chat.id, denied).await?;
        return Ok(());
    }

    let reply = match download_voice(&bot, &voice).await {
        Ok(clip) => assistant.handle_voice(chat_id, clip).await,
        Err(e) => assistant.voice_failed(chat_id, &e),
    };
    send_reply(&bot, msg.chat.id, reply).await
}

/// Fetch a voice note into memory.
async fn download_voice(bot: &Bot, voice: &Voice) -> Result<AudioClip> {
    check_audio_size(u64::from(voice.file.size))?;

    let file = bot.get_file(voice.file.id.clone()).await?;
    let mut buffer = Vec::with_capacity(voice.file.size as usize);
    bot.download_file(&file.path, &mut buffer).await?;
    debug!("Downloaded voice note {} ({} bytes)", file.path, buffer.len());

    let mime_type = voice
        .mime_type
        .as_ref()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| AudioConfig::VOICE_MIME_TYPE.to_string());
    Ok(AudioClip::new(Bytes::from(buffer), mime_type))
}

async fn send_reply(bot: &Bot, chat: ChatId, reply: Reply) -> Result<()> {
    let request = bot.send_message(chat, reply.text);
    match reply.keyboard {
        Some(rows) => request.reply_markup(keyboard(rows)).await?,
        None => request.await?,
    };
    Ok(())
}

fn keyboard(rows: Vec<Vec<String>>) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>()),
    )
    .resize_keyboard()
}
