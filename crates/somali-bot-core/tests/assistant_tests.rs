//! Behaviour tests for the assistant with in-memory upstreams.

use async_trait::async_trait;
use somali_bot_core::{
    AccessList, Assistant, AudioClip, BotError, ChatCompleter, ChatMessage, Messages, Result,
    Role, Transcriber, Transcript,
};
use std::sync::Mutex;

const ALLOWED: i64 = 1001;
const STRANGER: i64 = 2002;

/// Chat fake that echoes the last user message or fails on demand.
#[derive(Default)]
struct FakeChat {
    fail: bool,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

#[async_trait]
impl ChatCompleter for FakeChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.calls.lock().unwrap().push(messages.to_vec());
        if self.fail {
            return Err(BotError::Api {
                service: "openai".into(),
                status: 500,
                message: "boom".into(),
            });
        }
        let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        Ok(format!("answer to: {}", last))
    }
}

struct FakeAsr {
    result: std::result::Result<String, ()>,
    calls: Mutex<u32>,
}

impl FakeAsr {
    fn hearing(text: &str) -> Self {
        Self {
            result: Ok(text.to_string()),
            calls: Mutex::new(0),
        }
    }

    fn broken() -> Self {
        Self {
            result: Err(()),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl Transcriber for FakeAsr {
    async fn transcribe(&self, clip: AudioClip) -> Result<Transcript> {
        *self.calls.lock().unwrap() += 1;
        clip.validate()?;
        match &self.result {
            Ok(text) => Ok(Transcript { text: text.clone() }),
            Err(()) => Err(BotError::ModelLoading {
                model: "fake".into(),
                estimated_secs: None,
            }),
        }
    }

    fn model_id(&self) -> &str {
        "fake/asr"
    }
}

fn assistant(chat: FakeChat, asr: FakeAsr) -> Assistant<FakeChat, FakeAsr> {
    Assistant::new(AccessList::from_ids([ALLOWED]), chat, asr)
}

#[test]
fn test_start_shows_menu_to_allowed_chat() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));
    let reply = bot.start(ALLOWED);
    assert_eq!(reply.text, Messages::WELCOME);
    assert_eq!(reply.keyboard.unwrap()[0], vec!["Help", "Write", "Record"]);
}

#[test]
fn test_start_rejects_stranger() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));
    let reply = bot.start(STRANGER);
    assert_eq!(reply.text, Messages::UNAUTHORIZED);
    assert!(reply.keyboard.is_none());
}

#[tokio::test]
async fn test_menu_buttons_get_canned_prompts_without_calling_model() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));

    let help = bot.handle_text(ALLOWED, " HELP ").await.unwrap();
    assert_eq!(help.text, Messages::HELP_PROMPT);
    let write = bot.handle_text(ALLOWED, "write").await.unwrap();
    assert_eq!(write.text, Messages::WRITE_PROMPT);
    let record = bot.handle_text(ALLOWED, "Record").await.unwrap();
    assert_eq!(record.text, Messages::RECORD_PROMPT);

    assert!(bot.chat().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_free_text_goes_to_chat_model_trimmed() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));

    let reply = bot
        .handle_text(ALLOWED, "  Write a short poem about the sea  ")
        .await
        .unwrap();

    assert_eq!(reply.text, "answer to: Write a short poem about the sea");
    let calls = bot.chat().calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].role, Role::System);
    assert_eq!(calls[0][0].content, "You are a helpful assistant.");
}

#[tokio::test]
async fn test_chat_failure_becomes_apology() {
    let chat = FakeChat {
        fail: true,
        ..Default::default()
    };
    let bot = assistant(chat, FakeAsr::hearing(""));

    let reply = bot.handle_text(ALLOWED, "hello").await.unwrap();
    assert_eq!(reply.text, Messages::TEXT_FAILED);
}

#[tokio::test]
async fn test_stranger_text_is_rejected_before_model() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));

    let reply = bot.handle_text(STRANGER, "hello").await.unwrap();
    assert_eq!(reply.text, Messages::UNAUTHORIZED);
    assert!(bot.chat().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_start_command_matches_start_reply() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));

    let allowed = bot.handle_text(ALLOWED, "/start@somali_bot").await.unwrap();
    assert_eq!(allowed, bot.start(ALLOWED));
    assert!(allowed.keyboard.is_some());

    let stranger = bot.handle_text(STRANGER, "/start").await.unwrap();
    assert_eq!(stranger.text, Messages::UNAUTHORIZED);
    assert!(stranger.keyboard.is_none());
}

#[tokio::test]
async fn test_unknown_commands_are_ignored() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));
    assert!(bot.handle_text(ALLOWED, "/settings").await.is_none());
    assert!(bot.handle_text(STRANGER, "/help").await.is_none());
    let start = bot.handle_text(ALLOWED, "/start").await.unwrap();
    assert_eq!(start.text, Messages::WELCOME);
}

#[tokio::test]
async fn test_voice_is_transcribed_then_translated() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing("Subax wanaagsan"));

    let reply = bot
        .handle_voice(ALLOWED, AudioClip::voice_note(vec![0u8; 64]))
        .await;

    assert_eq!(
        reply.text,
        "answer to: Translate this Somali text into English:\n\nSubax wanaagsan"
    );
    let calls = bot.chat().calls.lock().unwrap();
    assert_eq!(calls[0][0].content, "You are a helpful translation assistant.");
}

#[tokio::test]
async fn test_voice_failure_becomes_apology() {
    let bot = assistant(FakeChat::default(), FakeAsr::broken());

    let reply = bot
        .handle_voice(ALLOWED, AudioClip::voice_note(vec![0u8; 64]))
        .await;

    assert_eq!(reply.text, Messages::VOICE_FAILED);
    assert!(bot.chat().calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_voice_note_is_an_error_reply() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing("x"));
    let reply = bot
        .handle_voice(ALLOWED, AudioClip::voice_note(Vec::new()))
        .await;
    assert_eq!(reply.text, Messages::VOICE_FAILED);
}

#[tokio::test]
async fn test_stranger_voice_is_not_transcribed() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing("x"));
    let reply = bot
        .handle_voice(STRANGER, AudioClip::voice_note(vec![1u8; 8]))
        .await;
    assert_eq!(reply.text, Messages::UNAUTHORIZED);
    assert_eq!(*bot.transcriber().calls.lock().unwrap(), 0);
}

#[test]
fn test_health_report_without_breakers() {
    let bot = assistant(FakeChat::default(), FakeAsr::hearing(""));
    let report = bot.health();
    assert_eq!(report.asr_model, "fake/asr");
    assert_eq!(report.authorized_chats, 1);
    assert!(report.chat.is_none());
}
