//! Chat session runtime.
//!
//! Owns the transcript for one conversation. Every mutation goes through
//! [`reconcile::update`]; the effects it returns are executed here in
//! order (storage first, then the outbound signal). When an effect fails
//! the state from before the event is restored.

use parley_types::Message;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::attachment::AttachmentResolver;
use crate::error::{SendError, StorageError};
use crate::persistence::PersistenceStore;
use crate::reconcile::{self, ChatEffect, ChatEvent, TranscriptState};
use crate::staging::{AcceptFilter, InputStagingArea};

/// The single-field update sent to the host on every local send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundUpdate {
    pub new_message: Message,
}

pub type OutboundSender = mpsc::UnboundedSender<OutboundUpdate>;

/// Everything a session needs besides its messages.
#[derive(Clone)]
pub struct SessionConfig {
    pub conversation_id: String,
    /// `None` disables persistence.
    pub persistence: Option<PersistenceStore>,
    pub accept: AcceptFilter,
    pub resolver: AttachmentResolver,
}

impl SessionConfig {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            persistence: None,
            accept: AcceptFilter::default(),
            resolver: AttachmentResolver::default(),
        }
    }

    #[must_use]
    pub fn with_persistence(mut self, persistence: PersistenceStore) -> Self {
        self.persistence = Some(persistence);
        self
    }

    #[must_use]
    pub fn with_accept(mut self, accept: AcceptFilter) -> Self {
        self.accept = accept;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: AttachmentResolver) -> Self {
        self.resolver = resolver;
        self
    }
}

pub struct ChatSession {
    conversation_id: String,
    persistence: Option<PersistenceStore>,
    resolver: AttachmentResolver,
    state: TranscriptState,
    staging: InputStagingArea,
    outbound: OutboundSender,
    teardown: CancellationToken,
}

impl ChatSession {
    /// Mounts a session, hydrating the transcript from storage or `initial`.
    pub fn mount(
        config: SessionConfig,
        initial: Vec<Message>,
        outbound: OutboundSender,
    ) -> Result<Self, StorageError> {
        let SessionConfig {
            conversation_id,
            persistence,
            accept,
            resolver,
        } = config;

        let messages = reconcile::hydrate(persistence.as_ref(), &conversation_id, initial)?;
        debug!(
            conversation_id = %conversation_id,
            count = messages.len(),
            persistence = persistence.is_some(),
            "session mounted"
        );

        Ok(Self {
            conversation_id,
            persistence,
            resolver,
            state: TranscriptState::new(messages),
            staging: InputStagingArea::new(accept),
            outbound,
            teardown: CancellationToken::new(),
        })
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn is_typing(&self) -> bool {
        self.state.typing
    }

    /// Restores a typing flag the host kept between mounts.
    pub fn restore_typing(&mut self, typing: bool) {
        self.state.typing = typing;
    }

    pub fn staging(&self) -> &InputStagingArea {
        &self.staging
    }

    pub fn staging_mut(&mut self) -> &mut InputStagingArea {
        &mut self.staging
    }

    /// Applies a host message list.
    pub fn receive(&mut self, incoming: Vec<Message>) -> Result<(), StorageError> {
        if self.is_torn_down() {
            return Ok(());
        }
        self.apply(ChatEvent::ExternalUpdate(incoming)).map(|_| ())
    }

    /// Sends the current draft.
    ///
    /// Returns `Ok(None)` when the draft is not sendable or the session was
    /// torn down while the attachment was being read. On error the draft
    /// and transcript are unchanged.
    pub async fn send(&mut self) -> Result<Option<Message>, SendError> {
        let Some(content) = self.staging.to_outbound_content(&self.resolver).await? else {
            return Ok(None);
        };

        if self.is_torn_down() {
            debug!(conversation_id = %self.conversation_id, "discarding send after teardown");
            return Ok(None);
        }

        let now_ms = chrono::Utc::now().timestamp_millis();
        let effects = self.apply(ChatEvent::LocalSend { content, now_ms })?;
        self.staging.clear();

        Ok(effects.into_iter().find_map(|effect| match effect {
            ChatEffect::EmitNewMessage(message) => Some(message),
            _ => None,
        }))
    }

    /// Empties the transcript and removes its persisted entries.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        if self.is_torn_down() {
            return Ok(());
        }
        self.apply(ChatEvent::Clear)?;
        info!(conversation_id = %self.conversation_id, "conversation cleared");
        Ok(())
    }

    pub fn reset_typing(&mut self) {
        if !self.is_torn_down() {
            // ResetTyping has no effects, so it cannot fail.
            reconcile::update(&mut self.state, ChatEvent::ResetTyping);
        }
    }

    /// Token cancelled on teardown; clones observe the same state.
    pub fn teardown_token(&self) -> CancellationToken {
        self.teardown.clone()
    }

    /// Stops the session. Later mutations are ignored and nothing more is
    /// persisted.
    pub fn teardown(&self) {
        self.teardown.cancel();
    }

    fn is_torn_down(&self) -> bool {
        self.teardown.is_cancelled()
    }

    fn apply(&mut self, event: ChatEvent) -> Result<Vec<ChatEffect>, StorageError> {
        let snapshot = self.state.clone();
        let effects = reconcile::update(&mut self.state, event);

        for effect in &effects {
            if let Err(e) = self.execute(effect) {
                self.state = snapshot;
                return Err(e);
            }
        }

        Ok(effects)
    }

    fn execute(&self, effect: &ChatEffect) -> Result<(), StorageError> {
        match effect {
            ChatEffect::Persist => {
                if let Some(persistence) = &self.persistence
                    && !self.state.messages.is_empty()
                {
                    persistence.save(&self.conversation_id, &self.state.messages)?;
                }
            }
            ChatEffect::RemovePersisted => {
                if let Some(persistence) = &self.persistence {
                    persistence.clear(&self.conversation_id)?;
                }
            }
            ChatEffect::EmitNewMessage(message) => {
                let update = OutboundUpdate {
                    new_message: message.clone(),
                };
                if self.outbound.send(update).is_err() {
                    debug!(conversation_id = %self.conversation_id, "host dropped outbound channel");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parley_types::{Content, MessageId, Role};

    use super::*;
    use crate::attachment::StagedFile;
    use crate::storage::{FileStore, KeyValueStore, MemoryStore, SharedStore};

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".into()))
        }
    }

    fn persisted(id: &str) -> (Arc<MemoryStore>, SessionConfig) {
        let raw = Arc::new(MemoryStore::new());
        let config = SessionConfig::new(id)
            .with_persistence(PersistenceStore::new(Arc::clone(&raw) as SharedStore));
        (raw, config)
    }

    #[tokio::test]
    async fn test_send_hi() {
        let (raw, config) = persisted("c");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(config, Vec::new(), tx).unwrap();

        session.staging_mut().set_text("Hi");
        let sent = session.send().await.unwrap().unwrap();

        assert_eq!(sent.role, Some(Role::User));
        assert_eq!(sent.content, Some(Content::from("Hi")));
        assert!(matches!(sent.id, Some(MessageId::Timestamp(_))));
        assert_eq!(session.messages(), std::slice::from_ref(&sent));
        assert!(session.is_typing());
        assert_eq!(session.staging().draft().text, "");

        let update = rx.try_recv().unwrap();
        assert_eq!(update.new_message, sent);
        let wire = serde_json::to_value(&update).unwrap();
        assert_eq!(wire["new_message"]["content"], "Hi");

        let stored: Vec<Message> = serde_json::from_str(&raw.get("c").unwrap().unwrap()).unwrap();
        assert_eq!(stored, vec![sent]);
    }

    #[tokio::test]
    async fn test_empty_send_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let initial = vec![Message::assistant("hello")];
        let mut session = ChatSession::mount(SessionConfig::new("c"), initial.clone(), tx).unwrap();

        session.staging_mut().set_text("   ");
        assert_eq!(session.send().await.unwrap(), None);

        assert_eq!(session.messages(), initial.as_slice());
        assert!(!session.is_typing());
        assert_eq!(session.staging().draft().text, "   ");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_attachment_read_failure_keeps_draft() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(SessionConfig::new("c"), Vec::new(), tx).unwrap();

        let missing = StagedFile::from_path(dir.path().join("missing.pdf"));
        session.staging_mut().set_text("see attached");
        session.staging_mut().set_attachment(Some(missing.clone())).unwrap();

        let err = session.send().await.unwrap_err();
        assert!(matches!(err, SendError::Attachment(_)));

        assert!(session.messages().is_empty());
        assert!(!session.is_typing());
        assert_eq!(session.staging().draft().text, "see attached");
        assert_eq!(session.staging().draft().attachment.as_ref(), Some(&missing));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_storage_failure_rolls_back_send() {
        let config = SessionConfig::new("c")
            .with_persistence(PersistenceStore::new(Arc::new(ReadOnlyStore) as SharedStore));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(config, Vec::new(), tx).unwrap();

        session.staging_mut().set_text("Hi");
        let err = session.send().await.unwrap_err();
        assert!(matches!(err, SendError::Storage(StorageError::Unavailable(_))));

        assert!(session.messages().is_empty());
        assert!(!session.is_typing());
        assert_eq!(session.staging().draft().text, "Hi");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_receive_reply_clears_typing_and_persists() {
        let (raw, config) = persisted("c");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(config, Vec::new(), tx).unwrap();

        session.staging_mut().set_text("question");
        let sent = session.send().await.unwrap().unwrap();

        session
            .receive(vec![sent.clone(), Message::assistant("answer")])
            .unwrap();

        assert!(!session.is_typing());
        assert_eq!(session.messages(), &[sent, Message::assistant("answer")]);
        let stored: Vec<Message> = serde_json::from_str(&raw.get("c").unwrap().unwrap()).unwrap();
        assert_eq!(stored.as_slice(), session.messages());
    }

    #[test]
    fn test_receive_empty_does_not_persist() {
        let (raw, config) = persisted("c");
        let (tx, _rx) = mpsc::unbounded_channel();
        let initial = vec![Message::assistant("hello")];
        let mut session = ChatSession::mount(config, initial.clone(), tx).unwrap();

        session.receive(Vec::new()).unwrap();

        assert!(session.messages().is_empty());
        let stored: Vec<Message> = serde_json::from_str(&raw.get("c").unwrap().unwrap()).unwrap();
        assert_eq!(stored, initial);
    }

    #[test]
    fn test_mount_hydration_property() {
        let (raw, config) = persisted("c");
        let (tx, _rx) = mpsc::unbounded_channel();
        let initial = vec![Message::assistant("Hello! How can I assist you today?")];

        let session = ChatSession::mount(config.clone(), initial.clone(), tx.clone()).unwrap();
        assert_eq!(session.messages(), initial.as_slice());
        assert_eq!(raw.get("c-initialized").unwrap().as_deref(), Some("true"));

        let remounted = ChatSession::mount(config, vec![Message::assistant("other")], tx).unwrap();
        assert_eq!(remounted.messages(), initial.as_slice());
    }

    #[test]
    fn test_clear_removes_both_entries_idempotently() {
        let (raw, config) = persisted("c");
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(config, vec![Message::assistant("x")], tx).unwrap();

        session.clear().unwrap();
        assert!(session.messages().is_empty());
        assert_eq!(raw.get("c").unwrap(), None);
        assert_eq!(raw.get("c-initialized").unwrap(), None);

        session.clear().unwrap();
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_discards_pending_send() {
        let (raw, config) = persisted("c");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(config, Vec::new(), tx).unwrap();

        session.staging_mut().set_text("late");
        session.teardown_token().cancel();

        assert_eq!(session.send().await.unwrap(), None);
        assert!(session.messages().is_empty());
        assert!(rx.try_recv().is_err());
        assert_eq!(raw.get("c").unwrap(), None);

        session.receive(vec![Message::assistant("ignored")]).unwrap();
        assert!(session.messages().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_teardown_during_attachment_read_discards_send() {
        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("slow.txt");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());

        let (raw, config) = persisted("c");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(config, Vec::new(), tx).unwrap();
        session.staging_mut().set_text("late");
        session
            .staging_mut()
            .set_attachment(Some(StagedFile::from_path(&fifo)))
            .unwrap();

        // The read cannot finish until the writer runs, which is after the
        // cancel.
        let token = session.teardown_token();
        let writer = async move {
            tokio::task::yield_now().await;
            token.cancel();
            tokio::task::spawn_blocking(move || std::fs::write(&fifo, b"data"))
                .await
                .unwrap()
                .unwrap();
        };

        let (sent, ()) = tokio::join!(session.send(), writer);

        assert_eq!(sent.unwrap(), None);
        assert!(session.messages().is_empty());
        assert!(!session.is_typing());
        assert!(rx.try_recv().is_err());
        assert_eq!(raw.get("c").unwrap(), None);
    }

    #[test]
    fn test_mount_with_non_utf8_persisted_value_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = FileStore::new(dir.path());
        std::fs::write(files.path_for("c"), [0xff, 0xfe, 0x00, b'[']).unwrap();

        let config = SessionConfig::new("c")
            .with_persistence(PersistenceStore::new(Arc::new(files) as SharedStore));
        let (tx, _rx) = mpsc::unbounded_channel();
        let session = ChatSession::mount(config, Vec::new(), tx).unwrap();
        assert!(session.messages().is_empty());
    }

    #[test]
    fn test_reset_typing() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = ChatSession::mount(SessionConfig::new("c"), Vec::new(), tx).unwrap();
        session.restore_typing(true);
        session.reset_typing();
        assert!(!session.is_typing());
    }
}
