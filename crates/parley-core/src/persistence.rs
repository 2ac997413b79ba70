//! Transcript persistence.
//!
//! Two entries per conversation id:
//!
//! ```text
//! <id>              → JSON array of messages
//! <id>-initialized  → true
//! ```
//!
//! The marker records that the transcript was seeded once, so an empty
//! message list on a later mount does not re-seed it.

use parley_types::Message;
use tracing::warn;

use crate::error::StorageError;
use crate::storage::SharedStore;

/// Suffix of the key holding the "initialized" marker.
pub const INITIALIZED_SUFFIX: &str = "-initialized";

/// Returns the marker key for `conversation_id`.
pub fn initialized_key(conversation_id: &str) -> String {
    format!("{conversation_id}{INITIALIZED_SUFFIX}")
}

/// Conversation-keyed view over a [`KeyValueStore`](crate::storage::KeyValueStore).
#[derive(Clone)]
pub struct PersistenceStore {
    store: SharedStore,
}

impl PersistenceStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Loads the persisted transcript.
    ///
    /// A missing entry and an unreadable or unparsable entry both load as
    /// empty; the latter is logged. Backend failures propagate.
    pub fn load(&self, conversation_id: &str) -> Result<Vec<Message>, StorageError> {
        let raw = match self.store.get(conversation_id) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(Vec::new()),
            Err(e @ StorageError::Malformed { .. }) => {
                return Ok(malformed(conversation_id, &e));
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_str::<Option<Vec<Message>>>(&raw) {
            Ok(messages) => Ok(messages.unwrap_or_default()),
            Err(e) => Ok(malformed(conversation_id, &e)),
        }
    }

    /// Overwrites the persisted transcript with `messages`.
    pub fn save(&self, conversation_id: &str, messages: &[Message]) -> Result<(), StorageError> {
        let json = serde_json::to_string(messages).map_err(|source| StorageError::Encode {
            key: conversation_id.to_string(),
            source,
        })?;
        self.store.set(conversation_id, &json)
    }

    /// Whether the transcript was seeded before.
    ///
    /// Anything other than a JSON `true` counts as not initialized.
    pub fn is_initialized(&self, conversation_id: &str) -> Result<bool, StorageError> {
        let raw = match self.store.get(&initialized_key(conversation_id)) {
            Ok(raw) => raw,
            Err(StorageError::Malformed { .. }) => None,
            Err(e) => return Err(e),
        };
        Ok(raw
            .and_then(|v| serde_json::from_str::<bool>(&v).ok())
            .unwrap_or(false))
    }

    pub fn mark_initialized(&self, conversation_id: &str) -> Result<(), StorageError> {
        self.store.set(&initialized_key(conversation_id), "true")
    }

    /// Removes both entries for `conversation_id`. Idempotent.
    pub fn clear(&self, conversation_id: &str) -> Result<(), StorageError> {
        self.store.remove(conversation_id)?;
        self.store.remove(&initialized_key(conversation_id))
    }
}

fn malformed(conversation_id: &str, error: &dyn std::fmt::Display) -> Vec<Message> {
    warn!(
        conversation_id,
        error = %error,
        "persisted transcript is malformed; starting empty"
    );
    Vec::new()
}
