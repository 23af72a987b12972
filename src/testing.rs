//! Test doubles for the store, completion and chat seams.

use crate::commands::BotContext;
use crate::core::error::BotError;
use crate::providers::{LLMProvider, Message};
use crate::store::{ConversationStore, ConversationTurn, MemoryStore};
use crate::telegram::ChatSender;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// Completion service that answers every request with the same text, or fails.
pub struct ScriptedProvider {
    answer: Option<String>,
    calls: Mutex<Vec<(String, Vec<Message>)>>,
}

impl ScriptedProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn models(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    pub fn last_messages(&self) -> Vec<Message> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, messages)| messages.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn get_response(&self, model: &str, messages: &[Message]) -> Result<String, BotError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.to_string(), messages.to_vec()));
        // Give concurrent tasks a chance to interleave.
        tokio::task::yield_now().await;
        self.answer
            .clone()
            .ok_or_else(|| BotError::RequestFailed("connection refused".to_string()))
    }
}

/// Completion service that reports when a request starts and answers only
/// once released.
#[derive(Default)]
pub struct GatedProvider {
    pub started: Notify,
    pub release: Notify,
}

#[async_trait]
impl LLMProvider for GatedProvider {
    async fn get_response(&self, _model: &str, _messages: &[Message]) -> Result<String, BotError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok("late answer".to_string())
    }
}

/// Completion service that tracks how many requests overlap.
#[derive(Default)]
pub struct SlowProvider {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowProvider {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMProvider for SlowProvider {
    async fn get_response(&self, _model: &str, _messages: &[Message]) -> Result<String, BotError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("ok".to_string())
    }
}

#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSender for RecordingSender {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), BotError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }
}

/// Store whose every operation fails as if the database were down.
pub struct FailingStore;

#[async_trait]
impl ConversationStore for FailingStore {
    async fn get_model(&self, _owner_id: i64) -> Result<String, BotError> {
        Err(BotError::StoreQuery("server selection timeout".to_string()))
    }

    async fn set_model(&self, _owner_id: i64, _model: &str) -> Result<(), BotError> {
        Err(BotError::StoreQuery("server selection timeout".to_string()))
    }

    async fn load_history(&self, _owner_id: i64) -> Result<Vec<ConversationTurn>, BotError> {
        Err(BotError::StoreQuery("server selection timeout".to_string()))
    }

    async fn save_history(
        &self,
        _owner_id: i64,
        _turns: &[ConversationTurn],
    ) -> Result<(), BotError> {
        Err(BotError::StoreQuery("server selection timeout".to_string()))
    }
}

pub fn context_with(
    provider: ScriptedProvider,
) -> (
    BotContext,
    Arc<MemoryStore>,
    Arc<ScriptedProvider>,
    Arc<RecordingSender>,
) {
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(provider);
    let sender = Arc::new(RecordingSender::default());
    let ctx = BotContext::new(
        store.clone(),
        provider.clone(),
        sender.clone(),
        "gpt-3.5-turbo",
    );
    (ctx, store, provider, sender)
}
