use crate::commands::{BotContext, CommandDispatcher, create_command_registry};
use crate::config::Config;
use crate::core::error::BotError;
use crate::providers::OpenAIProvider;
use crate::store::{ConversationStore, MemoryStore, MongoStore};
use crate::telegram::TelegramClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

pub struct Application {
    pub config: Config,
    pub telegram: Arc<TelegramClient>,
    pub command_dispatcher: CommandDispatcher,
}

impl Application {
    /// Builds every collaborator. Any failure here is fatal.
    pub async fn new(config: Config, memory_store: bool) -> Result<Self, BotError> {
        let settings = &config.settings;

        let store: Arc<dyn ConversationStore> = if memory_store {
            warn!("Using in-memory store; history is lost on exit");
            Arc::new(MemoryStore::new())
        } else {
            let uri = config
                .secrets
                .mongo_uri
                .as_deref()
                .ok_or_else(|| BotError::ConfigMissing("MONGO_URI must be set".to_string()))?;
            Arc::new(MongoStore::connect(uri, &settings.database, &settings.collection).await?)
        };

        let provider = OpenAIProvider::with_endpoint(
            settings.api_base_url.clone(),
            &config.secrets.openai_api_key,
            settings.request_timeout(),
        )?;
        let telegram = Arc::new(TelegramClient::new(
            &config.secrets.telegram_bot_token,
            settings.poll_timeout_secs,
        )?);

        let mut ctx = BotContext::new(
            store,
            Arc::new(provider),
            telegram.clone(),
            &settings.default_model,
        );
        if let Some(limit) = settings.max_concurrent_replies {
            ctx = ctx.with_concurrency_limit(limit);
        }
        if settings.serialize_per_user {
            ctx = ctx.with_per_user_serialization();
        }
        if let Some(turns) = settings.max_history_turns {
            ctx = ctx.with_history_limit(turns);
        }

        Ok(Self {
            command_dispatcher: create_command_registry(ctx),
            telegram,
            config,
        })
    }

    pub async fn run(&self) -> Result<(), BotError> {
        let me = self.telegram.get_me().await?;
        info!(
            "Authorized on account {}",
            me.username.as_deref().unwrap_or("<unnamed>")
        );

        if let Err(e) = self
            .telegram
            .set_my_commands(&self.command_dispatcher.get_commands())
            .await
        {
            warn!("Failed to publish command menu: {}", e);
        }

        let timeout = self.config.settings.poll_timeout_secs;
        let mut offset = 0;

        loop {
            let updates = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    return Ok(());
                }
                updates = self.telegram.get_updates(offset, timeout) => updates,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    error!("Failed to get updates, retrying in 3 seconds: {}", e);
                    tokio::time::sleep(POLL_RETRY_DELAY).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let update_id = update.update_id;
                match update.into_incoming() {
                    Some(message) => {
                        // Conversational tasks run detached; the handle is only for tests.
                        let _ = self.command_dispatcher.dispatch(message).await;
                    }
                    None => debug!("Skipping update {} without text", update_id),
                }
            }
        }
    }
}
