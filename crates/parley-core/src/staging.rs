//! Input staging area: the draft the user is composing.

use parley_types::{Attachment, Content, ContentItem, JsonMap};
use serde::{Deserialize, Serialize};

use crate::attachment::{AttachmentResolver, StagedFile};
use crate::error::{AttachmentReadError, AttachmentRejected};

/// Not-yet-sent user input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub text: String,
    pub attachment: Option<StagedFile>,
}

impl Draft {
    /// A draft can be sent when it has non-blank text or an attachment.
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }
}

/// Accepted attachment types, in HTML `accept` syntax.
///
/// Entries are `*/*`, `type/*`, an exact MIME type, or a `.ext` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AcceptFilter {
    One(String),
    Many(Vec<String>),
}

impl Default for AcceptFilter {
    fn default() -> Self {
        AcceptFilter::One("*/*".to_string())
    }
}

impl AcceptFilter {
    fn entries(&self) -> impl Iterator<Item = &str> {
        let entries: Vec<&str> = match self {
            AcceptFilter::One(spec) => spec.split(',').collect(),
            AcceptFilter::Many(specs) => specs.iter().map(String::as_str).collect(),
        };
        entries.into_iter().map(str::trim).filter(|e| !e.is_empty())
    }

    /// Whether a file with this name and MIME type may be staged.
    ///
    /// An empty filter accepts everything.
    pub fn accepts(&self, file_name: &str, mime_type: &str) -> bool {
        let mime_type = mime_type.to_ascii_lowercase();
        let file_name = file_name.to_ascii_lowercase();
        let mut saw_entry = false;

        for entry in self.entries() {
            saw_entry = true;
            let entry = entry.to_ascii_lowercase();
            let matched = if entry == "*/*" || entry == "*" {
                true
            } else if entry.starts_with('.') {
                file_name.ends_with(&entry)
            } else if let Some(major) = entry.strip_suffix("/*") {
                mime_type
                    .split_once('/')
                    .is_some_and(|(file_major, _)| file_major == major)
            } else {
                mime_type == entry
            };
            if matched {
                return true;
            }
        }

        !saw_entry
    }
}

/// How a staged attachment is previewed next to the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentPreview {
    Image { file_name: String },
    Document { file_name: String },
    Unsupported { file_name: String },
}

const DOCUMENT_PREVIEW_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Holds the draft and turns it into outbound message content.
#[derive(Debug, Clone, Default)]
pub struct InputStagingArea {
    draft: Draft,
    accept: AcceptFilter,
}

impl InputStagingArea {
    pub fn new(accept: AcceptFilter) -> Self {
        Self {
            draft: Draft::default(),
            accept,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    /// Stages `file`, replacing any previous attachment; `None` removes it.
    ///
    /// A file outside the accept filter is refused and the current
    /// attachment is kept.
    pub fn set_attachment(&mut self, file: Option<StagedFile>) -> Result<(), AttachmentRejected> {
        if let Some(file) = &file {
            let mime_type = file.declared_mime_type();
            if !self.accept.accepts(&file.name, mime_type) {
                return Err(AttachmentRejected {
                    file_name: file.name.clone(),
                    mime_type: mime_type.to_string(),
                });
            }
        }
        self.draft.attachment = file;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.draft = Draft::default();
    }

    pub fn is_sendable(&self) -> bool {
        self.draft.is_sendable()
    }

    pub fn preview(&self) -> Option<AttachmentPreview> {
        let file = self.draft.attachment.as_ref()?;
        let mime_type = file.declared_mime_type();
        let file_name = file.name.clone();

        Some(if DOCUMENT_PREVIEW_TYPES.contains(&mime_type) {
            AttachmentPreview::Document { file_name }
        } else if mime_type.starts_with("image/") {
            AttachmentPreview::Image { file_name }
        } else {
            AttachmentPreview::Unsupported { file_name }
        })
    }

    /// Builds the content of the outbound message.
    ///
    /// Returns `Ok(None)` when there is nothing to send. Text is trimmed.
    /// With an attachment the content is `[text item, attachment item]`.
    pub async fn to_outbound_content(
        &self,
        resolver: &AttachmentResolver,
    ) -> Result<Option<Content>, AttachmentReadError> {
        if !self.is_sendable() {
            return Ok(None);
        }

        let text = self.draft.text.trim().to_string();
        let Some(file) = &self.draft.attachment else {
            return Ok(Some(Content::Text(text)));
        };

        let resolved = resolver.resolve(file).await?;
        let attachment = Attachment {
            file: resolved.data_uri,
            file_name: file.name.clone(),
            file_type: Some(resolved.mime_type),
            extra: JsonMap::new(),
        };

        Ok(Some(Content::from(vec![
            ContentItem::text(text),
            ContentItem::Attachment(attachment),
        ])))
    }
}
