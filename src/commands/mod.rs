pub mod dispatcher;
pub mod handler;
pub mod registry;

use crate::providers::LLMProvider;
use crate::store::ConversationStore;
use crate::telegram::ChatSender;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, OwnedSemaphorePermit, Semaphore};
use tracing::{error, warn};

pub use dispatcher::{CommandDispatcher, create_command_registry};

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub owner_id: i64,
    pub chat_id: i64,
    pub text: String,
}

type UserLocks = DashMap<i64, Arc<Mutex<()>>>;

/// Holds one user's lock. Dropping the last holder removes the user's entry,
/// so the lock map only keeps users with work in flight.
pub(crate) struct UserGuard {
    owner_id: i64,
    locks: Arc<UserLocks>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold a clone of the mutex, so the entry survives while anyone queues on it.
        self.locks
            .remove_if(&self.owner_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Everything a handler or a conversational task needs, passed explicitly.
#[derive(Clone)]
pub struct BotContext {
    pub store: Arc<dyn ConversationStore>,
    pub provider: Arc<dyn LLMProvider>,
    pub sender: Arc<dyn ChatSender>,
    pub default_model: String,
    pub max_history_turns: Option<usize>,
    limiter: Option<Arc<Semaphore>>,
    user_locks: Option<Arc<UserLocks>>,
}

impl BotContext {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn LLMProvider>,
        sender: Arc<dyn ChatSender>,
        default_model: &str,
    ) -> Self {
        Self {
            store,
            provider,
            sender,
            default_model: default_model.to_string(),
            max_history_turns: None,
            limiter: None,
            user_locks: None,
        }
    }

    /// Caps how many conversational replies run at once.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(limit)));
        self
    }

    /// Runs each user's conversational replies one at a time.
    pub fn with_per_user_serialization(mut self) -> Self {
        self.user_locks = Some(Arc::new(DashMap::new()));
        self
    }

    pub fn with_history_limit(mut self, turns: usize) -> Self {
        self.max_history_turns = Some(turns);
        self
    }

    /// Waits for the user's lock when per-user serialization is on.
    pub(crate) async fn lock_user(&self, owner_id: i64) -> Option<UserGuard> {
        let locks = self.user_locks.as_ref()?;
        let lock = locks.entry(owner_id).or_default().clone();
        let guard = lock.lock_owned().await;
        Some(UserGuard {
            owner_id,
            locks: locks.clone(),
            guard: Some(guard),
        })
    }

    #[cfg(test)]
    pub(crate) fn locked_user_count(&self) -> usize {
        self.user_locks.as_ref().map_or(0, |locks| locks.len())
    }

    pub(crate) async fn acquire_slot(&self) -> Option<OwnedSemaphorePermit> {
        let limiter = self.limiter.as_ref()?;
        limiter.clone().acquire_owned().await.ok()
    }

    /// Sends a reply, logging delivery failures. Empty text is never sent.
    pub async fn reply(&self, chat_id: i64, text: &str) {
        if text.is_empty() {
            warn!("Skipping empty reply to chat {}", chat_id);
            return;
        }
        if let Err(e) = self.sender.send_message(chat_id, text).await {
            error!("Failed to send message to chat {}: {}", chat_id, e);
        }
    }
}
