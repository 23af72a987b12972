use crate::core::error::BotError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod base_client;
pub mod openai;

pub use openai::OpenAIProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// A completion service: one request/response exchange per call.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Sends `messages` to `model` and returns the first choice's text.
    async fn get_response(&self, model: &str, messages: &[Message]) -> Result<String, BotError>;
}
