use super::record::{KIND_CHAT, KIND_MODEL, Record};
use super::{ConversationStore, ConversationTurn};
use crate::core::error::BotError;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Collection, IndexModel};
use tracing::{debug, info, warn};

fn chat_filter(owner_id: i64) -> Document {
    doc! { "user_id": owner_id, "type": KIND_CHAT }
}

fn model_filter(owner_id: i64) -> Document {
    doc! { "user_id": owner_id, "type": KIND_MODEL }
}

/// Documents written without `seq` all read as 0; `_id` keeps them in insertion order.
fn history_sort() -> Document {
    doc! { "seq": 1, "_id": 1 }
}

/// MongoDB backend. Chat and model records live in one collection.
pub struct MongoStore {
    collection: Collection<Record>,
}

impl MongoStore {
    /// Connects, verifies the server answers a ping, and makes sure the
    /// history index exists.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, BotError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| BotError::StoreConnection(e.to_string()))?;
        let db = client.database(database);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BotError::StoreConnection(e.to_string()))?;
        info!("Connected to MongoDB database {}", database);

        let store = Self {
            collection: db.collection::<Record>(collection),
        };
        if let Err(e) = store.ensure_index().await {
            warn!("Failed to create history index: {}", e);
        }
        Ok(store)
    }

    async fn ensure_index(&self) -> Result<(), BotError> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "type": 1, "seq": 1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for MongoStore {
    async fn get_model(&self, owner_id: i64) -> Result<String, BotError> {
        match self.collection.find_one(model_filter(owner_id)).await? {
            Some(Record::Model { model, .. }) => Ok(model),
            _ => Err(BotError::ModelNotFound(owner_id)),
        }
    }

    async fn set_model(&self, owner_id: i64, model: &str) -> Result<(), BotError> {
        self.collection
            .update_one(model_filter(owner_id), doc! { "$set": { "model": model } })
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn load_history(&self, owner_id: i64) -> Result<Vec<ConversationTurn>, BotError> {
        let cursor = self
            .collection
            .find(chat_filter(owner_id))
            .sort(history_sort())
            .await?;
        let records: Vec<Record> = cursor.try_collect().await?;
        debug!("Loaded {} history records for user {}", records.len(), owner_id);
        Ok(Record::into_turns(records))
    }

    async fn save_history(
        &self,
        owner_id: i64,
        turns: &[ConversationTurn],
    ) -> Result<(), BotError> {
        // Not transactional: a reader between these two calls sees no history.
        self.collection.delete_many(chat_filter(owner_id)).await?;

        if turns.is_empty() {
            return Ok(());
        }

        let records: Vec<Record> = turns
            .iter()
            .enumerate()
            .map(|(seq, turn)| Record::chat(turn, owner_id, seq))
            .collect();
        self.collection.insert_many(records).await?;
        Ok(())
    }
}
