//! Incoming text classification and reply shapes.

/// User-facing texts.
pub struct Messages;

impl Messages {
    pub const UNAUTHORIZED: &'static str = "❌ You are not authorised to use this bot.";
    pub const WELCOME: &'static str = "Hi! Please choose an option below:";
    pub const HELP_PROMPT: &'static str = "🆘 What do you need help with?";
    pub const WRITE_PROMPT: &'static str = "✍️ Please type what you'd like me to help you write.";
    pub const RECORD_PROMPT: &'static str = "🎙️ Please send a voice message.";
    pub const TEXT_FAILED: &'static str = "⚠️ Error while processing your message.";
    pub const VOICE_FAILED: &'static str =
        "⚠️ Error while transcribing or translating your voice message.";
}

/// Buttons on the reply keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Help,
    Write,
    Record,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 3] = [MenuChoice::Help, MenuChoice::Write, MenuChoice::Record];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Help => "Help",
            MenuChoice::Write => "Write",
            MenuChoice::Record => "Record",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            MenuChoice::Help => Messages::HELP_PROMPT,
            MenuChoice::Write => Messages::WRITE_PROMPT,
            MenuChoice::Record => Messages::RECORD_PROMPT,
        }
    }

    /// Match a button press; case and surrounding whitespace are ignored.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|choice| choice.label().eq_ignore_ascii_case(text))
    }
}

/// What a text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Start,
    /// A command the bot does not handle.
    OtherCommand,
    Menu(MenuChoice),
    Prompt(String),
    Blank,
}

impl Incoming {
    pub fn classify(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Incoming::Blank;
        }

        if let Some(command) = text.strip_prefix('/') {
            // "/start", "/start@my_bot" and "/start payload" are all /start.
            let name = command
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .split('@')
                .next()
                .unwrap_or_default();
            return if name.eq_ignore_ascii_case("start") {
                Incoming::Start
            } else {
                Incoming::OtherCommand
            };
        }

        match MenuChoice::parse(text) {
            Some(choice) => Incoming::Menu(choice),
            None => Incoming::Prompt(text.to_string()),
        }
    }
}

/// A message to send back to the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Rows of reply-keyboard button labels.
    pub keyboard: Option<Vec<Vec<String>>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_menu(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(vec![MenuChoice::ALL
                .iter()
                .map(|choice| choice.label().to_string())
                .collect()]),
        }
    }
}
