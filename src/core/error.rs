use std::io;
use thiserror::Error;

/// Unified error type for the bot
#[derive(Error, Debug)]
pub enum BotError {
    /// A required secret is absent from the environment
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// The document store could not be reached at startup
    #[error("Store connection failed: {0}")]
    StoreConnection(String),

    /// A single store operation failed
    #[error("Store query failed: {0}")]
    StoreQuery(String),

    /// No model preference is stored for the owner
    #[error("No model preference stored for user {0}")]
    ModelNotFound(i64),

    /// Transport or encoding failure talking to the completion service
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The completion response carried zero choices
    #[error("No choices in completion response")]
    NoChoice,

    /// A command was invoked with missing arguments
    #[error("Command usage error: {0}")]
    CommandUsage(String),

    /// Telegram Bot API errors
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BotError::RequestFailed(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            BotError::RequestFailed(format!("Connection failed: {}", err))
        } else if err.is_status() {
            BotError::RequestFailed(format!("API returned error status: {}", err))
        } else if err.is_decode() {
            BotError::RequestFailed(format!("Invalid response body: {}", err))
        } else {
            BotError::RequestFailed(format!("Request failed: {}", err))
        }
    }
}

impl From<mongodb::error::Error> for BotError {
    fn from(err: mongodb::error::Error) -> Self {
        BotError::StoreQuery(err.to_string())
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for BotError {
    fn from(err: serde_yml::Error) -> Self {
        BotError::Serialization(format!("YAML error: {}", err))
    }
}
