//! Message content.
//!
//! Content is either plain text, a single structured item, or an ordered
//! list of items. Items carry a `type` tag; anything that does not decode
//! into a known item is kept as raw JSON so it survives a storage round
//! trip and can be skipped at display time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type JsonMap = serde_json::Map<String, Value>;

/// A table cell. Hosts send strings and numbers interchangeably.
pub type Cell = Value;

/// Renders a cell the way it would appear in a table.
pub fn cell_text(cell: &Cell) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The `content` field of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
    Part(ContentPart),
}

impl Content {
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Content::Text(text) if text.is_empty())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Vec<ContentItem>> for Content {
    fn from(items: Vec<ContentItem>) -> Self {
        Content::Parts(items.into_iter().map(ContentPart::Item).collect())
    }
}

impl From<ContentItem> for Content {
    fn from(item: ContentItem) -> Self {
        Content::Part(ContentPart::Item(item))
    }
}

/// One element of a content list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    /// A bare string element, rendered as text.
    Text(String),
    Item(ContentItem),
    /// Unknown tag, malformed item, or a non-object value.
    Unrecognized(Value),
}

/// A tagged content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    Attachment(Attachment),
    Asset(Asset),
    Table(Table),
    Graph(Graph),
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }
}

/// A file the user attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Data URI or URL.
    pub file: String,
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// A file produced by the assistant (image, document, or other).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    #[serde(default)]
    pub file_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonMap>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Asset {
    /// First non-empty of `file`, `fileUrl`, `fileData`.
    pub fn source(&self) -> Option<&str> {
        [&self.file, &self.file_url, &self.file_data]
            .into_iter()
            .filter_map(|s| s.as_deref())
            .find(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub header: Vec<Cell>,
    #[serde(default)]
    pub data: Vec<Vec<Cell>>,
    #[serde(default)]
    pub props: TableProps,
    #[serde(flatten)]
    pub extra: JsonMap,
}

/// Bootstrap-style table flags.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub striped: bool,
    pub bordered: bool,
    pub borderless: bool,
    pub hover: bool,
    pub responsive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<TableSize>,
    pub dark: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonMap>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSize {
    Sm,
    Md,
    Lg,
    /// Any other size string; contributes no class.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    /// Some hosts put the figure next to `props` instead of inside it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figure: Option<Figure>,
    #[serde(default)]
    pub props: GraphProps,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Graph {
    /// The figure from `props`, falling back to the item-level one.
    pub fn figure(&self) -> Option<&Figure> {
        self.props.figure.as_ref().or(self.figure.as_ref())
    }
}

/// Plotly-style figure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: JsonMap,
    pub frames: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub figure: Option<Figure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub config: JsonMap,
    pub style: JsonMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responsive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<Value>,
    pub animate: bool,
    pub animation_options: JsonMap,
    #[serde(flatten)]
    pub extra: JsonMap,
}
