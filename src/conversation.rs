//! The conversational unit of work: load history and model, ask the
//! completion service, store both turns, reply.
//!
//! Without per-user serialization two quick messages from one user race:
//! both load the same history and the later save discards the other's turns.

use crate::commands::{BotContext, IncomingMessage};
use crate::core::error::BotError;
use crate::providers::Message;
use crate::store::ConversationTurn;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

pub const COMPLETION_FAILED: &str = "Ошибка при обращении к OpenAI API";

/// Runs [`respond`] on its own task.
pub fn spawn(ctx: BotContext, message: IncomingMessage) -> JoinHandle<()> {
    tokio::spawn(async move { respond(&ctx, &message).await })
}

/// Handles one conversational message end to end. Never fails: every error
/// path ends in a short reply to the user.
pub async fn respond(ctx: &BotContext, message: &IncomingMessage) {
    let _user_guard = ctx.lock_user(message.owner_id).await;
    let _slot = ctx.acquire_slot().await;

    let reply = match converse(ctx, message).await {
        Ok(answer) => answer,
        Err(e) => {
            error!("Completion for user {} failed: {}", message.owner_id, e);
            COMPLETION_FAILED.to_string()
        }
    };
    ctx.reply(message.chat_id, &reply).await;
}

async fn converse(ctx: &BotContext, message: &IncomingMessage) -> Result<String, BotError> {
    let owner_id = message.owner_id;
    let model = model_for(ctx, owner_id).await;

    let mut history = match ctx.store.load_history(owner_id).await {
        Ok(history) => history,
        Err(e) => {
            warn!("Failed to load chat history for user {}: {}", owner_id, e);
            Vec::new()
        }
    };

    history.push(ConversationTurn::user(owner_id, message.text.as_str()));
    truncate_history(&mut history, ctx.max_history_turns);

    let messages: Vec<Message> = history.iter().map(Message::from).collect();
    let answer = ctx.provider.get_response(&model, &messages).await?;

    history.push(ConversationTurn::assistant(owner_id, answer.as_str()));
    truncate_history(&mut history, ctx.max_history_turns);

    if let Err(e) = ctx.store.save_history(owner_id, &history).await {
        error!("Failed to save chat history for user {}: {}", owner_id, e);
    }
    Ok(answer)
}

/// The user's stored model, or the default when none is stored or the store
/// cannot be read.
async fn model_for(ctx: &BotContext, owner_id: i64) -> String {
    match ctx.store.get_model(owner_id).await {
        Ok(model) if !model.trim().is_empty() => model,
        Ok(_) | Err(BotError::ModelNotFound(_)) => {
            debug!("User {} has no model preference", owner_id);
            ctx.default_model.clone()
        }
        Err(e) => {
            warn!("Failed to read model for user {}: {}", owner_id, e);
            ctx.default_model.clone()
        }
    }
}

/// Keeps only the newest `limit` turns.
fn truncate_history(history: &mut Vec<ConversationTurn>, limit: Option<usize>) {
    if let Some(limit) = limit {
        if history.len() > limit {
            let excess = history.len() - limit;
            history.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;
    use crate::store::{ConversationStore, MemoryStore};
    use crate::testing::{
        FailingStore, RecordingSender, ScriptedProvider, SlowProvider, context_with,
    };
    use std::sync::Arc;

    fn message(owner_id: i64, text: &str) -> IncomingMessage {
        IncomingMessage {
            owner_id,
            chat_id: owner_id + 1000,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_truncate_history_keeps_newest() {
        let mut history = vec![
            ConversationTurn::user(1, "a"),
            ConversationTurn::assistant(1, "b"),
            ConversationTurn::user(1, "c"),
        ];
        truncate_history(&mut history, Some(2));
        assert_eq!(
            history,
            vec![
                ConversationTurn::assistant(1, "b"),
                ConversationTurn::user(1, "c")
            ]
        );

        truncate_history(&mut history, None);
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_uses_default_model_without_preference() {
        let (ctx, store, provider, sender) = context_with(ScriptedProvider::answering("ok"));
        respond(&ctx, &message(1, "hello")).await;

        assert_eq!(provider.models(), vec!["gpt-3.5-turbo".to_string()]);
        assert_eq!(sender.sent(), vec![(1001, "ok".to_string())]);
        assert_eq!(store.load_history(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_uses_stored_model_preference() {
        let (ctx, store, provider, _sender) = context_with(ScriptedProvider::answering("ok"));
        store.set_model(1, "gpt-4").await.unwrap();
        respond(&ctx, &message(1, "hello")).await;

        assert_eq!(provider.models(), vec!["gpt-4".to_string()]);
    }

    #[tokio::test]
    async fn test_sends_full_history_to_provider() {
        let (ctx, store, provider, _sender) = context_with(ScriptedProvider::answering("third"));
        store
            .save_history(
                1,
                &[
                    ConversationTurn::user(1, "first"),
                    ConversationTurn::assistant(1, "second"),
                ],
            )
            .await
            .unwrap();

        respond(&ctx, &message(1, "again")).await;

        let sent = provider.last_messages();
        let contents: Vec<&str> = sent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "again"]);
        assert_eq!(sent[2].role, Role::User);
        assert_eq!(store.load_history(1).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_completion_failure_leaves_history_untouched() {
        let (ctx, store, _provider, sender) = context_with(ScriptedProvider::failing());
        respond(&ctx, &message(1, "hello")).await;

        assert_eq!(sender.sent(), vec![(1001, COMPLETION_FAILED.to_string())]);
        assert!(store.load_history(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_limit_applies_before_save() {
        let (ctx, store, _provider, _sender) = context_with(ScriptedProvider::answering("ok"));
        let ctx = ctx.with_history_limit(2);
        respond(&ctx, &message(1, "one")).await;
        respond(&ctx, &message(1, "two")).await;

        assert_eq!(
            store.load_history(1).await.unwrap(),
            vec![
                ConversationTurn::user(1, "two"),
                ConversationTurn::assistant(1, "ok")
            ]
        );
    }

    #[tokio::test]
    async fn test_store_failures_degrade_to_defaults() {
        let provider = Arc::new(ScriptedProvider::answering("still here"));
        let sender = Arc::new(RecordingSender::default());
        let ctx = BotContext::new(
            Arc::new(FailingStore),
            provider.clone(),
            sender.clone(),
            "gpt-3.5-turbo",
        );

        respond(&ctx, &message(1, "hello")).await;

        assert_eq!(provider.models(), vec!["gpt-3.5-turbo".to_string()]);
        assert_eq!(sender.sent(), vec![(1001, "still here".to_string())]);
    }

    #[tokio::test]
    async fn test_per_user_serialization_keeps_every_turn() {
        let (ctx, store, _provider, _sender) = context_with(ScriptedProvider::answering("ok"));
        let ctx = ctx.with_per_user_serialization().with_concurrency_limit(4);

        let handles: Vec<_> = (0..5)
            .map(|i| spawn(ctx.clone(), message(1, &format!("msg {}", i))))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.load_history(1).await.unwrap().len(), 10);
        assert_eq!(ctx.locked_user_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrency_limit_caps_replies_in_flight() {
        let provider = Arc::new(SlowProvider::default());
        let sender = Arc::new(RecordingSender::default());
        let ctx = BotContext::new(
            Arc::new(MemoryStore::new()),
            provider.clone(),
            sender.clone(),
            "gpt-3.5-turbo",
        )
        .with_concurrency_limit(2);

        let handles: Vec<_> = (0..6)
            .map(|owner| spawn(ctx.clone(), message(owner, "hello")))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(provider.peak(), 2);
        assert_eq!(sender.sent().len(), 6);
    }

    #[tokio::test]
    async fn test_empty_answer_is_saved_but_not_sent() {
        let (ctx, store, _provider, sender) = context_with(ScriptedProvider::answering(""));
        respond(&ctx, &message(1, "hello")).await;

        assert!(sender.sent().is_empty());
        assert_eq!(
            store.load_history(1).await.unwrap(),
            vec![
                ConversationTurn::user(1, "hello"),
                ConversationTurn::assistant(1, "")
            ]
        );
    }
}
