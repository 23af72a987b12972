use super::ChatSender;
use super::types::*;
use crate::core::error::BotError;
use crate::providers::base_client::HttpClient;
use crate::utils::text::{TELEGRAM_MESSAGE_LIMIT, split_message};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

pub const API_BASE_URL: &str = "https://api.telegram.org";

/// Added to the long-poll timeout so a healthy `getUpdates` always answers first.
const POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct TelegramClient {
    client: HttpClient,
}

impl TelegramClient {
    /// `poll_timeout_secs` is the `getUpdates` long-poll timeout; requests
    /// that outlive it by more than a small margin are abandoned.
    pub fn new(token: &str, poll_timeout_secs: u64) -> Result<Self, BotError> {
        let timeout = Duration::from_secs(poll_timeout_secs) + POLL_TIMEOUT_MARGIN;
        Self::with_endpoint(API_BASE_URL, token, timeout)
    }

    pub fn with_endpoint(
        base_url: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, BotError> {
        let endpoint = format!("{}/bot{}", base_url.trim_end_matches('/'), token);
        Ok(Self {
            client: HttpClient::new(endpoint, None, Some(timeout))?,
        })
    }

    async fn call<T, R>(&self, method: &str, payload: &T) -> Result<R, BotError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(method, payload)
            .await
            .map_err(|e| BotError::Telegram(format!("{}: {}", method, e)))?;
        let body = response
            .text()
            .await
            .map_err(|e| BotError::Telegram(format!("{}: {}", method, e.without_url())))?;
        let parsed: ApiResponse<R> = serde_json::from_str(&body)?;

        if !parsed.ok {
            return Err(BotError::Telegram(format!(
                "{}: {}",
                method,
                parsed.description.unwrap_or_else(|| "unknown error".to_string())
            )));
        }
        parsed
            .result
            .ok_or_else(|| BotError::Telegram(format!("{}: empty result", method)))
    }

    /// Returns the bot's own account.
    pub async fn get_me(&self) -> Result<User, BotError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Publishes the command menu shown by Telegram clients.
    pub async fn set_my_commands(&self, commands: &[(String, String)]) -> Result<(), BotError> {
        let request = SetMyCommandsRequest {
            commands: commands
                .iter()
                .map(|(command, description)| BotCommand {
                    command: command.clone(),
                    description: description.clone(),
                })
                .collect(),
        };
        let _: bool = self.call("setMyCommands", &request).await?;
        Ok(())
    }

    /// Long-polls for updates newer than `offset - 1`.
    pub async fn get_updates(&self, offset: i64, timeout: u64) -> Result<Vec<Update>, BotError> {
        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message"],
        };
        self.call("getUpdates", &request).await
    }
}

#[async_trait]
impl ChatSender for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        let chunks = split_message(text, TELEGRAM_MESSAGE_LIMIT);
        if chunks.is_empty() {
            warn!("Refusing to send an empty message to chat {}", chat_id);
            return Ok(());
        }

        for chunk in chunks {
            let request = SendMessageRequest {
                chat_id,
                text: &chunk,
            };
            let _: serde_json::Value = self.call("sendMessage", &request).await?;
        }
        Ok(())
    }
}
