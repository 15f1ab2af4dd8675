//! Chat allow-list.

use std::collections::BTreeSet;
use tracing::warn;

/// Set of Telegram chat IDs allowed to talk to the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessList {
    chat_ids: BTreeSet<i64>,
}

impl AccessList {
    /// Parse a comma-separated list such as `"12345, 67890"`.
    ///
    /// Items that are not integers are skipped with a warning. Negative IDs
    /// are kept since group and channel chats use them.
    pub fn parse(raw: &str) -> Self {
        let mut chat_ids = BTreeSet::new();
        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            match item.parse::<i64>() {
                Ok(id) => {
                    chat_ids.insert(id);
                }
                Err(_) => warn!("Ignoring invalid chat ID in allow-list: {:?}", item),
            }
        }
        Self { chat_ids }
    }

    pub fn from_ids(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            chat_ids: ids.into_iter().collect(),
        }
    }

    pub fn is_authorized(&self, chat_id: i64) -> bool {
        self.chat_ids.contains(&chat_id)
    }

    pub fn is_empty(&self) -> bool {
        self.chat_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chat_ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.chat_ids.iter().copied()
    }
}
