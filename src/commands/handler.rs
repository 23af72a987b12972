use super::{BotContext, IncomingMessage};
use crate::core::error::BotError;
use async_trait::async_trait;

pub const MODEL_USAGE: &str = "Пожалуйста, укажите имя модели после команды /model";
pub const MODEL_SAVE_FAILED: &str = "Ошибка при сохранении модели";
pub const RESET_DONE: &str = "История диалога очищена";
pub const RESET_FAILED: &str = "Ошибка при очистке истории";
pub const COMMAND_FAILED: &str = "Не удалось выполнить команду";

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Returns the reply text. [`BotError::CommandUsage`] carries a reply too.
    async fn execute(
        &self,
        ctx: &BotContext,
        message: &IncomingMessage,
        args: &[&str],
    ) -> Result<String, BotError>;

    /// Reply sent when `execute` fails with anything but a usage error.
    fn failure_reply(&self) -> &'static str {
        COMMAND_FAILED
    }

    fn description(&self) -> &'static str;
}

pub struct StartCommand;
pub struct ModelCommand;
pub struct ResetCommand;

#[async_trait]
impl CommandHandler for StartCommand {
    async fn execute(
        &self,
        ctx: &BotContext,
        _message: &IncomingMessage,
        _args: &[&str],
    ) -> Result<String, BotError> {
        Ok(format!(
            "Привет! Отправь сообщение, и я отвечу с помощью OpenAI. Можно выбрать модель \
             командой /model <имя_модели> (например, gpt-3.5-turbo). По умолчанию \
             используется {}.",
            ctx.default_model
        ))
    }

    fn description(&self) -> &'static str {
        "Приветствие и справка"
    }
}

#[async_trait]
impl CommandHandler for ModelCommand {
    async fn execute(
        &self,
        ctx: &BotContext,
        message: &IncomingMessage,
        args: &[&str],
    ) -> Result<String, BotError> {
        let model = args
            .first()
            .ok_or_else(|| BotError::CommandUsage(MODEL_USAGE.to_string()))?;

        ctx.store.set_model(message.owner_id, model).await?;
        Ok(format!("Модель установлена на {}", model))
    }

    fn failure_reply(&self) -> &'static str {
        MODEL_SAVE_FAILED
    }

    fn description(&self) -> &'static str {
        "Выбрать модель: /model <имя_модели>"
    }
}

#[async_trait]
impl CommandHandler for ResetCommand {
    async fn execute(
        &self,
        ctx: &BotContext,
        message: &IncomingMessage,
        _args: &[&str],
    ) -> Result<String, BotError> {
        // Waits out an in-flight reply so its save cannot restore the old history.
        let _user_guard = ctx.lock_user(message.owner_id).await;
        ctx.store.save_history(message.owner_id, &[]).await?;
        Ok(RESET_DONE.to_string())
    }

    fn failure_reply(&self) -> &'static str {
        RESET_FAILED
    }

    fn description(&self) -> &'static str {
        "Очистить историю диалога"
    }
}
