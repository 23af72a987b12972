use super::{LLMProvider, Message};
use crate::core::error::BotError;
use crate::providers::base_client::HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
}

#[derive(Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    /// `null` for refusals and tool calls.
    #[serde(default)]
    content: Option<String>,
}

/// Extracts the first choice's text from a chat completion response body.
fn parse_response(body: &str) -> Result<String, BotError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| BotError::RequestFailed(format!("Invalid response body: {}", e)))?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or(BotError::NoChoice)
}

#[derive(Clone)]
pub struct OpenAIProvider {
    client: HttpClient,
}

impl OpenAIProvider {
    pub fn new(api_key: &str, timeout: Option<Duration>) -> Result<Self, BotError> {
        Self::with_endpoint(DEFAULT_BASE_URL.to_string(), api_key, timeout)
    }

    pub fn with_endpoint(
        endpoint: String,
        api_key: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, BotError> {
        Ok(Self {
            client: HttpClient::with_bearer(endpoint, api_key, timeout)?,
        })
    }
}

#[async_trait::async_trait]
impl LLMProvider for OpenAIProvider {
    async fn get_response(&self, model: &str, messages: &[Message]) -> Result<String, BotError> {
        let payload = ChatCompletionRequest {
            model,
            messages: messages
                .iter()
                .map(|m| ChatCompletionMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        debug!(
            "Requesting completion from {} with {} messages",
            model,
            messages.len()
        );
        let response = self.client.post("chat/completions", &payload).await?;
        let status = response.status();
        let response_body: String = response.text().await?;

        if !status.is_success() {
            return Err(BotError::RequestFailed(format!(
                "API returned {}: {}",
                status, response_body
            )));
        }

        parse_response(&response_body)
    }
}
