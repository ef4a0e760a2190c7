//! Telegram delivery and update polling.

use crate::consts::limits;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{Update, UpdateKind};
use teloxide::RequestError;

/// A text message bound for one chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub chat_id: i64,
    pub text: String,
}

impl Outgoing {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

/// One pending update, reduced to what command processing reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingUpdate {
    pub update_id: i64,
    pub chat_id: Option<i64>,
    pub text: Option<String>,
}

impl From<Update> for IncomingUpdate {
    fn from(update: Update) -> Self {
        let message = match update.kind {
            UpdateKind::Message(m) | UpdateKind::EditedMessage(m) => Some(m),
            _ => None,
        };
        Self {
            update_id: i64::from(update.id),
            chat_id: message.as_ref().map(|m| m.chat.id.0),
            text: message.as_ref().and_then(|m| m.text()).map(str::to_string),
        }
    }
}

pub trait Notifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), RequestError>;
}

pub trait UpdateSource {
    /// Updates with id >= `offset`
    async fn fetch_updates(&self, offset: i64) -> Result<Vec<IncomingUpdate>, RequestError>;
}

pub struct Messenger {
    bot: Bot,
}

impl Messenger {
    pub fn new(token: &str) -> Result<Self, reqwest::Error> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(limits::TELEGRAM_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            bot: Bot::with_client(token, client),
        })
    }
}

impl UpdateSource for Messenger {
    async fn fetch_updates(&self, offset: i64) -> Result<Vec<IncomingUpdate>, RequestError> {
        let offset = i32::try_from(offset).unwrap_or(i32::MAX);
        let updates = self.bot.get_updates().offset(offset).await?;
        log::info!("Fetched {} pending updates", updates.len());
        Ok(updates.into_iter().map(IncomingUpdate::from).collect())
    }
}

impl Notifier for Messenger {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), RequestError> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }
}

/// Best-effort delivery; failures are logged and skipped. Returns how many
/// messages went out completely.
pub async fn deliver<N: Notifier>(notifier: &N, messages: &[Outgoing]) -> usize {
    let mut delivered = 0;
    'messages: for msg in messages {
        for chunk in split_message(&msg.text, limits::MAX_MESSAGE_LEN) {
            if let Err(e) = notifier.send(msg.chat_id, chunk).await {
                log::warn!("Couldn't send message to {}: {e}", msg.chat_id);
                continue 'messages;
            }
        }
        delivered += 1;
    }
    delivered
}

/// Split on line boundaries into chunks of at most `max_len` bytes
pub fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let mut end = start + max_len;
        if end >= text.len() {
            chunks.push(&text[start..]);
            break;
        }
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if let Some(last_newline) = text[start..end].rfind('\n') {
            let split_idx = start + last_newline + 1;
            if split_idx > start {
                end = split_idx;
            }
        }
        chunks.push(&text[start..end]);
        start = end;
    }
    chunks
}
