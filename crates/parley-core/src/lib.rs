//! Core Parley library (transcript reconciliation, storage, attachments, config).

pub mod attachment;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod mime;
pub mod persistence;
pub mod reconcile;
pub mod session;
pub mod staging;
pub mod storage;

pub use error::{AttachmentReadError, AttachmentRejected, DownloadError, SendError, StorageError};
pub use session::{ChatSession, OutboundUpdate, SessionConfig};
