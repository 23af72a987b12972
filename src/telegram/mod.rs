//! Telegram Bot API plumbing: long polling and plain-text replies.

use crate::core::error::BotError;
use async_trait::async_trait;

mod client;
mod types;

pub use client::TelegramClient;
pub use types::{Update, User};

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError>;
}
