//! Conversation store
//!
//! Durable mapping from a Telegram user id to that user's chat history and
//! selected model. Both kinds of record share one collection and are told
//! apart by a `type` discriminator (`"chat"` or `"model"`).

use crate::core::error::BotError;
use crate::providers::{Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod mongo;
mod record;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// One message exchanged in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub owner_id: i64,
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(owner_id: i64, content: impl Into<String>) -> Self {
        Self {
            owner_id,
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(owner_id: i64, content: impl Into<String>) -> Self {
        Self {
            owner_id,
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

impl From<&ConversationTurn> for Message {
    fn from(turn: &ConversationTurn) -> Self {
        Message {
            role: turn.role,
            content: turn.content.clone(),
        }
    }
}

/// Access contract shared by every store backend.
///
/// `save_history` replaces the whole history for an owner. Backends other
/// than [`MemoryStore`] implement it as delete-then-insert, so two concurrent
/// saves for the same owner may interleave; callers must treat it as
/// best-effort.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Returns the owner's selected model, or [`BotError::ModelNotFound`].
    async fn get_model(&self, owner_id: i64) -> Result<String, BotError>;

    /// Upserts the single model preference record for the owner.
    async fn set_model(&self, owner_id: i64, model: &str) -> Result<(), BotError>;

    /// Loads the owner's history, oldest first. Empty when none is stored.
    async fn load_history(&self, owner_id: i64) -> Result<Vec<ConversationTurn>, BotError>;

    /// Replaces the owner's history with `turns`.
    async fn save_history(&self, owner_id: i64, turns: &[ConversationTurn])
    -> Result<(), BotError>;
}
