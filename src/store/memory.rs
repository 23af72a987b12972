use super::record::Record;
use super::{ConversationStore, ConversationTurn};
use crate::core::error::BotError;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-process store holding the same records the MongoDB backend writes.
///
/// History replacement happens under a single write lock, so readers never
/// observe a half-replaced history.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) async fn model_record_count(&self, owner_id: i64) -> usize {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| matches!(r, Record::Model { user_id, .. } if *user_id == owner_id))
            .count()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn get_model(&self, owner_id: i64) -> Result<String, BotError> {
        self.records
            .read()
            .await
            .iter()
            .find_map(|record| match record {
                Record::Model { user_id, model } if *user_id == owner_id => Some(model.clone()),
                _ => None,
            })
            .ok_or(BotError::ModelNotFound(owner_id))
    }

    async fn set_model(&self, owner_id: i64, model: &str) -> Result<(), BotError> {
        let mut records = self.records.write().await;
        let existing = records.iter_mut().find_map(|record| match record {
            Record::Model {
                user_id,
                model: stored,
            } if *user_id == owner_id => Some(stored),
            _ => None,
        });

        match existing {
            Some(current) => *current = model.to_string(),
            None => records.push(Record::Model {
                user_id: owner_id,
                model: model.to_string(),
            }),
        }
        Ok(())
    }

    async fn load_history(&self, owner_id: i64) -> Result<Vec<ConversationTurn>, BotError> {
        let records = self.records.read().await;
        let owned = records
            .iter()
            .filter(|r| r.owner() == owner_id)
            .cloned()
            .collect::<Vec<_>>();
        Ok(Record::into_turns(owned))
    }

    async fn save_history(
        &self,
        owner_id: i64,
        turns: &[ConversationTurn],
    ) -> Result<(), BotError> {
        let mut records = self.records.write().await;
        records.retain(|r| !(matches!(r, Record::Chat { .. }) && r.owner() == owner_id));
        records.extend(
            turns
                .iter()
                .enumerate()
                .map(|(seq, turn)| Record::chat(turn, owner_id, seq)),
        );
        Ok(())
    }
}
