//! Shared chat data model for Parley.
//!
//! Everything here is plain serde data: the JSON shapes exchanged with the
//! host and written to storage.

pub mod content;
pub mod message;

pub use content::{
    Asset, Attachment, Cell, Content, ContentItem, ContentPart, Figure, Graph, GraphProps,
    JsonMap, Table, TableProps, TableSize, cell_text,
};
pub use message::{Message, MessageId, Role};
