//! Chat messages.
//!
//! Messages arrive from three places: the host, local storage, and the
//! local composer. Only the composer is trusted to produce well-formed
//! values, so every field is optional on the wire and the display layer
//! decides what to skip.

use serde::{Deserialize, Serialize};

use crate::content::{Content, JsonMap};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    /// Any role string other than `user`/`assistant`.
    #[serde(other)]
    Unknown,
}

/// Message identifier.
///
/// Local sends always use [`MessageId::Timestamp`] (milliseconds since the
/// Unix epoch). Host-supplied ids are kept as-is whatever their JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Timestamp(i64),
    Opaque(serde_json::Value),
}

impl MessageId {
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            MessageId::Timestamp(ts) => Some(*ts),
            MessageId::Opaque(_) => None,
        }
    }
}

/// One entry of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Host fields this crate does not interpret, kept for round trips.
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Message {
    /// Creates a locally authored user message.
    pub fn user(id: i64, content: Content) -> Self {
        Self {
            id: Some(MessageId::Timestamp(id)),
            role: Some(Role::User),
            content: Some(content),
            extra: JsonMap::new(),
        }
    }

    /// Creates an assistant message without an id, the way hosts send them.
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self {
            id: None,
            role: Some(Role::Assistant),
            content: Some(content.into()),
            extra: JsonMap::new(),
        }
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Some(Role::Assistant)
    }

    pub fn is_user(&self) -> bool {
        self.role == Some(Role::User)
    }

    /// Whether the message has enough shape to be shown.
    ///
    /// A missing role, missing content, or empty string content hides the
    /// message from display. The message itself stays in the transcript.
    pub fn is_displayable(&self) -> bool {
        self.role.is_some() && self.content.as_ref().is_some_and(|c| !c.is_empty_text())
    }
}
