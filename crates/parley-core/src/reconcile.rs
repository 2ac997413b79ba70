//! Transcript reconciler.
//!
//! All transcript mutations happen in [`update`]. The session calls
//! `update(state, event)` and executes the returned effects; the reducer
//! itself never touches storage or the host.
//!
//! Trust rules:
//!
//! - On mount, persisted history (once seeded) shadows the host's list.
//! - A host update whose last message is from the assistant is treated as
//!   exactly one appended reply. Earlier entries in that update are
//!   ignored, not diffed.
//! - Any other host update replaces the transcript wholesale.

use parley_types::{Content, Message};
use tracing::debug;

use crate::error::StorageError;
use crate::persistence::PersistenceStore;

/// In-memory transcript plus the typing flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptState {
    pub messages: Vec<Message>,
    /// Set from a local send until an assistant reply arrives.
    pub typing: bool,
    /// Largest local timestamp id seen, for monotonic ids.
    last_local_id: Option<i64>,
}

impl TranscriptState {
    pub fn new(messages: Vec<Message>) -> Self {
        let last_local_id = messages
            .iter()
            .filter(|m| m.is_user())
            .filter_map(|m| m.id.as_ref().and_then(|id| id.timestamp()))
            .max();
        Self {
            messages,
            typing: false,
            last_local_id,
        }
    }

    /// Next id for a local message: `now_ms`, bumped past the previous one.
    pub fn next_message_id(&self, now_ms: i64) -> i64 {
        self.last_local_id
            .map_or(now_ms, |last| now_ms.max(last.saturating_add(1)))
    }
}

/// Events that mutate the transcript.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// The host replaced its message list.
    ExternalUpdate(Vec<Message>),
    /// The user sent a draft whose content is already resolved.
    LocalSend { content: Content, now_ms: i64 },
    /// Clear-chat action.
    Clear,
    /// Drop the typing flag without a reply.
    ResetTyping,
}

/// Effects returned by the reducer for the session to execute, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEffect {
    /// Write the current transcript to storage (when persistence is on and
    /// the transcript is non-empty).
    Persist,
    /// Remove the persisted transcript and its marker.
    RemovePersisted,
    /// Tell the host a user message was created.
    EmitNewMessage(Message),
}

/// Outcome of one host update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    AppendedReply,
    Replaced,
}

/// Applies a host update to `current`.
///
/// Returns the new transcript, the new typing flag, and which rule fired.
pub fn apply_external_update(
    current: Vec<Message>,
    typing: bool,
    mut incoming: Vec<Message>,
) -> (Vec<Message>, bool, UpdateKind) {
    if incoming.last().is_some_and(Message::is_assistant)
        && let Some(reply) = incoming.pop()
    {
        let mut messages = current;
        messages.push(reply);
        return (messages, false, UpdateKind::AppendedReply);
    }

    (incoming, typing, UpdateKind::Replaced)
}

/// Builds the initial transcript on mount.
///
/// `store` is `None` when persistence is disabled, in which case the
/// transcript mirrors `initial`.
pub fn hydrate(
    store: Option<&PersistenceStore>,
    conversation_id: &str,
    initial: Vec<Message>,
) -> Result<Vec<Message>, StorageError> {
    let Some(store) = store else {
        return Ok(initial);
    };

    let persisted = store.load(conversation_id)?;
    if !persisted.is_empty() {
        debug!(conversation_id, count = persisted.len(), "hydrated from storage");
        return Ok(persisted);
    }

    if !store.is_initialized(conversation_id)? && !initial.is_empty() {
        store.save(conversation_id, &initial)?;
        store.mark_initialized(conversation_id)?;
        debug!(conversation_id, count = initial.len(), "seeded storage from initial messages");
        return Ok(initial);
    }

    Ok(Vec::new())
}

/// The reducer.
pub fn update(state: &mut TranscriptState, event: ChatEvent) -> Vec<ChatEffect> {
    match event {
        ChatEvent::ExternalUpdate(incoming) => {
            let current = std::mem::take(&mut state.messages);
            let (messages, typing, kind) = apply_external_update(current, state.typing, incoming);
            debug!(?kind, count = messages.len(), "applied external update");
            state.messages = messages;
            state.typing = typing;
            vec![ChatEffect::Persist]
        }
        ChatEvent::LocalSend { content, now_ms } => {
            let id = state.next_message_id(now_ms);
            let message = Message::user(id, content);
            state.last_local_id = Some(id);
            state.messages.push(message.clone());
            state.typing = true;
            vec![ChatEffect::Persist, ChatEffect::EmitNewMessage(message)]
        }
        ChatEvent::Clear => {
            state.messages.clear();
            vec![ChatEffect::RemovePersisted]
        }
        ChatEvent::ResetTyping => {
            state.typing = false;
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parley_types::{ContentItem, MessageId};

    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, SharedStore};

    fn user(id: i64, text: &str) -> Message {
        Message::user(id, Content::from(text))
    }

    fn store() -> (Arc<MemoryStore>, PersistenceStore) {
        let raw = Arc::new(MemoryStore::new());
        (Arc::clone(&raw), PersistenceStore::new(raw as SharedStore))
    }

    #[test]
    fn test_assistant_last_appends_only_that_message() {
        let current = vec![user(1, "a"), Message::assistant("b")];
        let incoming = vec![
            user(99, "ignored"),
            Message::assistant("also ignored"),
            Message::assistant("reply"),
        ];

        let (messages, typing, kind) = apply_external_update(current.clone(), true, incoming);

        let mut expected = current;
        expected.push(Message::assistant("reply"));
        assert_eq!(messages, expected);
        assert!(!typing);
        assert_eq!(kind, UpdateKind::AppendedReply);
    }

    #[test]
    fn test_user_last_replaces_transcript() {
        let current = vec![Message::assistant("old")];
        let incoming = vec![user(1, "x"), Message::assistant("y"), user(2, "z")];

        let (messages, typing, kind) = apply_external_update(current, true, incoming.clone());

        assert_eq!(messages, incoming);
        assert!(typing, "replace does not touch the typing flag");
        assert_eq!(kind, UpdateKind::Replaced);
    }

    #[test]
    fn test_empty_update_replaces_with_empty() {
        let (messages, typing, kind) =
            apply_external_update(vec![Message::assistant("old")], false, Vec::new());
        assert!(messages.is_empty());
        assert!(!typing);
        assert_eq!(kind, UpdateKind::Replaced);
    }

    #[test]
    fn test_malformed_last_message_replaces() {
        let broken = Message {
            id: None,
            role: None,
            content: Some(Content::from("?")),
            extra: parley_types::JsonMap::new(),
        };
        let (messages, _, kind) =
            apply_external_update(vec![Message::assistant("a")], false, vec![broken.clone()]);
        assert_eq!(messages, vec![broken]);
        assert_eq!(kind, UpdateKind::Replaced);
    }

    #[test]
    fn test_hydrate_without_persistence_mirrors_initial() {
        let initial = vec![Message::assistant("hello")];
        assert_eq!(hydrate(None, "c", initial.clone()).unwrap(), initial);
        assert!(hydrate(None, "c", Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_hydrate_seeds_storage_once() {
        let (raw, persistence) = store();
        let initial = vec![Message::assistant("Hello! How can I assist you today?")];

        let messages = hydrate(Some(&persistence), "c", initial.clone()).unwrap();
        assert_eq!(messages, initial);
        assert_eq!(
            raw.get("c").unwrap().unwrap(),
            serde_json::to_string(&initial).unwrap()
        );
        assert_eq!(raw.get("c-initialized").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_hydrate_prefers_persisted_history() {
        let (_, persistence) = store();
        let persisted = vec![user(5, "mine"), Message::assistant("reply")];
        persistence.save("c", &persisted).unwrap();

        let messages =
            hydrate(Some(&persistence), "c", vec![Message::assistant("stale prop")]).unwrap();
        assert_eq!(messages, persisted);
    }

    #[test]
    fn test_hydrate_does_not_reseed_after_initialization() {
        let (raw, persistence) = store();
        persistence.mark_initialized("c").unwrap();

        let messages = hydrate(Some(&persistence), "c", vec![Message::assistant("x")]).unwrap();
        assert!(messages.is_empty());
        assert_eq!(raw.get("c").unwrap(), None);
    }

    #[test]
    fn test_hydrate_with_malformed_storage_fails_closed() {
        let (raw, persistence) = store();
        raw.set("c", "[{").unwrap();
        raw.set("c-initialized", "true").unwrap();

        let messages = hydrate(Some(&persistence), "c", vec![Message::assistant("x")]).unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_local_send_appends_and_sets_typing() {
        let mut state = TranscriptState::default();
        let effects = update(
            &mut state,
            ChatEvent::LocalSend {
                content: Content::from("Hi"),
                now_ms: 1_000,
            },
        );

        let expected = user(1_000, "Hi");
        assert_eq!(state.messages, vec![expected.clone()]);
        assert!(state.typing);
        assert_eq!(
            effects,
            vec![ChatEffect::Persist, ChatEffect::EmitNewMessage(expected)]
        );
    }

    #[test]
    fn test_local_ids_are_strictly_increasing() {
        let mut state = TranscriptState::new(vec![user(5_000, "earlier")]);
        update(
            &mut state,
            ChatEvent::LocalSend {
                content: Content::from("a"),
                now_ms: 4_000,
            },
        );
        update(
            &mut state,
            ChatEvent::LocalSend {
                content: Content::from("b"),
                now_ms: 4_000,
            },
        );

        let ids: Vec<_> = state.messages.iter().map(|m| m.id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                Some(MessageId::Timestamp(5_000)),
                Some(MessageId::Timestamp(5_001)),
                Some(MessageId::Timestamp(5_002)),
            ]
        );
    }

    #[test]
    fn test_reply_after_send_clears_typing() {
        let mut state = TranscriptState::default();
        update(
            &mut state,
            ChatEvent::LocalSend {
                content: Content::from(vec![ContentItem::text("q")]),
                now_ms: 1,
            },
        );
        let sent = state.messages.clone();

        let mut echoed = sent.clone();
        echoed.push(Message::assistant("a"));
        let effects = update(&mut state, ChatEvent::ExternalUpdate(echoed.clone()));

        assert_eq!(state.messages, echoed);
        assert!(!state.typing);
        assert_eq!(effects, vec![ChatEffect::Persist]);
    }

    #[test]
    fn test_clear_and_reset_typing() {
        let mut state = TranscriptState::new(vec![user(1, "x")]);
        state.typing = true;

        assert_eq!(update(&mut state, ChatEvent::Clear), vec![ChatEffect::RemovePersisted]);
        assert!(state.messages.is_empty());

        assert!(update(&mut state, ChatEvent::ResetTyping).is_empty());
        assert!(!state.typing);
    }
}
