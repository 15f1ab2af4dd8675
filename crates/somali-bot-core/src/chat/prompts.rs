//! Conversations sent to the chat model.

use super::ChatMessage;

pub const ASSISTANT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const TRANSLATOR_SYSTEM_PROMPT: &str = "You are a helpful translation assistant.";

/// Free-form question from the user.
pub fn assistant_conversation(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(ASSISTANT_SYSTEM_PROMPT),
        ChatMessage::user(text),
    ]
}

/// Somali transcript to be rendered in English.
pub fn somali_translation(somali_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(TRANSLATOR_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Translate this Somali text into English:\n\n{}",
            somali_text
        )),
    ]
}
