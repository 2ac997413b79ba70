//! Display nodes produced by the content dispatcher.
//!
//! Nodes describe what to show, not how: a host turns them into HTML, a
//! terminal, or anything else.

use parley_types::JsonMap;
use serde::Serialize;
use serde_json::Value;

/// One rendered unit of message content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderNode {
    /// Stable key derived from the item's position in the content.
    pub key: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl RenderNode {
    pub fn new(key: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            key: key.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeKind {
    /// Markdown source, handed to a markdown renderer as-is.
    Text { markdown: String },
    Image(ImageNode),
    /// "View <file>" link for non-image attachments.
    Link { href: String, label: String },
    /// Inline error shown in place of content that cannot be displayed.
    Error { message: String },
    /// Preview card for documents and generic generated files.
    FileCard(FileCard),
    Table(TableNode),
    Graph(GraphNode),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageNode {
    pub src: String,
    pub alt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// CSS max-width.
    pub width: String,
    pub height: String,
    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    pub style: JsonMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileCard {
    pub href: String,
    pub file_name: String,
    /// Lowercased extension, or `file` for unknown types.
    pub extension: String,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `href` is a base64 PDF that can be previewed without a download.
    pub inline_pdf: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableNode {
    /// Space-joined into the table's `class` attribute.
    pub classes: Vec<String>,
    /// Wrapped in a horizontally scrollable container.
    pub responsive: bool,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "JsonMap::is_empty")]
    pub style: JsonMap,
}

impl TableNode {
    pub fn class_attr(&self) -> String {
        self.classes.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub div_id: Option<String>,
    pub data: Vec<Value>,
    pub layout: JsonMap,
    pub frames: Vec<Value>,
    /// Final plot config: `responsive` merged under the host's config.
    pub config: JsonMap,
    pub use_resize_handler: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<Value>,
    pub animate: bool,
    pub animation: JsonMap,
    pub style: JsonMap,
    pub class_name: String,
}
