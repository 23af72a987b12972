use super::ConversationTurn;
use crate::providers::Role;
use serde::{Deserialize, Serialize};

pub(crate) const KIND_CHAT: &str = "chat";
pub(crate) const KIND_MODEL: &str = "model";

/// Stored document. The `type` field is the record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum Record {
    Chat {
        user_id: i64,
        role: Role,
        content: String,
        #[serde(default)]
        seq: i64,
    },
    Model {
        user_id: i64,
        model: String,
    },
}

impl Record {
    pub(crate) fn chat(turn: &ConversationTurn, owner_id: i64, seq: usize) -> Self {
        Record::Chat {
            user_id: owner_id,
            role: turn.role,
            content: turn.content.clone(),
            seq: seq as i64,
        }
    }

    pub(crate) fn owner(&self) -> i64 {
        match self {
            Record::Chat { user_id, .. } | Record::Model { user_id, .. } => *user_id,
        }
    }

    /// Converts chat records back into turns, ordered by `seq`.
    pub(crate) fn into_turns<I>(records: I) -> Vec<ConversationTurn>
    where
        I: IntoIterator<Item = Record>,
    {
        let mut chats: Vec<(i64, ConversationTurn)> = records
            .into_iter()
            .filter_map(|record| match record {
                Record::Chat {
                    user_id,
                    role,
                    content,
                    seq,
                } => Some((
                    seq,
                    ConversationTurn {
                        owner_id: user_id,
                        role,
                        content,
                    },
                )),
                Record::Model { .. } => None,
            })
            .collect();
        chats.sort_by_key(|(seq, _)| *seq);
        chats.into_iter().map(|(_, turn)| turn).collect()
    }
}
