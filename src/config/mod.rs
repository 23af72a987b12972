use crate::core::error::BotError;
use crate::providers::openai::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MONGO_URI: &str = "MONGO_URI";

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_database() -> String {
    "tg_openai_bot".to_string()
}

fn default_collection() -> String {
    "chat_history".to_string()
}

fn default_poll_timeout() -> u64 {
    60
}

/// Non-secret settings read from the optional YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
    /// Upper bound on conversational replies in flight. Unbounded when unset.
    #[serde(default)]
    pub max_concurrent_replies: Option<usize>,
    /// Run each user's load/complete/save cycle one at a time.
    #[serde(default)]
    pub serialize_per_user: bool,
    /// Keep only the newest N turns. Unbounded when unset.
    #[serde(default)]
    pub max_history_turns: Option<usize>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            api_base_url: default_base_url(),
            database: default_database(),
            collection: default_collection(),
            poll_timeout_secs: default_poll_timeout(),
            max_concurrent_replies: None,
            serialize_per_user: false,
            max_history_turns: None,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tg-openai-bot")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    /// Reads settings from `path`. A missing file at the default location
    /// yields defaults; a missing file given explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Settings, BotError> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(BotError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }
        let settings = serde_yml::from_str::<Settings>(&contents)
            .map_err(|e| BotError::Config(format!("Parse {}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), BotError> {
        if self.default_model.trim().is_empty() {
            return Err(BotError::Config("default_model must not be empty".to_string()));
        }
        if self.max_concurrent_replies == Some(0) {
            return Err(BotError::Config(
                "max_concurrent_replies must be at least 1".to_string(),
            ));
        }
        if self.max_history_turns == Some(0) {
            return Err(BotError::Config(
                "max_history_turns must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Credentials taken from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub telegram_bot_token: String,
    pub openai_api_key: String,
    pub mongo_uri: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("telegram_bot_token", &"***")
            .field("openai_api_key", &"***")
            .field("mongo_uri", &self.mongo_uri.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Secrets {
    pub fn from_env(require_mongo: bool) -> Result<Secrets, BotError> {
        Self::from_lookup(|key| std::env::var(key).ok(), require_mongo)
    }

    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F, require_mongo: bool) -> Result<Secrets, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let telegram_bot_token = get(ENV_TELEGRAM_BOT_TOKEN);
        let openai_api_key = get(ENV_OPENAI_API_KEY);
        let mongo_uri = get(ENV_MONGO_URI);

        let mut missing = Vec::new();
        if telegram_bot_token.is_none() {
            missing.push(ENV_TELEGRAM_BOT_TOKEN);
        }
        if openai_api_key.is_none() {
            missing.push(ENV_OPENAI_API_KEY);
        }
        if require_mongo && mongo_uri.is_none() {
            missing.push(ENV_MONGO_URI);
        }

        match (telegram_bot_token, openai_api_key) {
            (Some(telegram_bot_token), Some(openai_api_key)) if missing.is_empty() => {
                Ok(Secrets {
                    telegram_bot_token,
                    openai_api_key,
                    mongo_uri,
                })
            }
            _ => Err(BotError::ConfigMissing(format!(
                "{} must be set",
                missing.join(", ")
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub secrets: Secrets,
}

impl Config {
    pub fn load(path: Option<&Path>, require_mongo: bool) -> Result<Config, BotError> {
        Ok(Config {
            settings: Settings::load(path)?,
            secrets: Secrets::from_env(require_mongo)?,
        })
    }
}
