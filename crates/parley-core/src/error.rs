//! Error types for the chat engine.
//!
//! Malformed content is never an error here: unknown items and broken
//! messages are skipped by the renderer instead.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of the key-value storage backing persistence.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage read failed for key '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage write failed for key '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The stored bytes are not a text value.
    #[error("stored value for key '{key}' is not valid UTF-8: {source}")]
    Malformed {
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("storage remove failed for key '{key}': {source}")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode transcript for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure to turn a staged file into an embeddable representation.
#[derive(Debug, Error)]
pub enum AttachmentReadError {
    #[error("cannot read attachment {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("attachment '{file_name}' is too large ({size} bytes, max {max})")]
    TooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },
}

/// A file the accept filter refused to stage.
#[derive(Debug, Error)]
#[error("file '{file_name}' ({mime_type}) is not an accepted attachment type")]
pub struct AttachmentRejected {
    pub file_name: String,
    pub mime_type: String,
}

/// A download that could not be completed even by the open fallback.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("malformed data URI")]
    MalformedDataUri,

    #[error("failed to save '{file_name}': {source}")]
    Save {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open '{target}': {source}")]
    Open {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a local send. The draft and transcript are left untouched.
#[derive(Debug, Error)]
pub enum SendError {
    #[error(transparent)]
    Attachment(#[from] AttachmentReadError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
