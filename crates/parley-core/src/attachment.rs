//! Attachment ingestion and classification.
//!
//! A staged file is turned into a self-contained `data:` URI before it is
//! embedded in a message, so persisted transcripts never point at files
//! that may disappear.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;

use crate::error::AttachmentReadError;
use crate::mime;

/// Max attachment size accepted by default.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

/// Where a staged file's bytes come from.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Bytes),
}

/// A file picked by the user but not yet sent.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFile {
    pub name: String,
    /// MIME type reported by whoever picked the file, if any.
    pub mime_type: Option<String>,
    pub source: FileSource,
}

impl StagedFile {
    /// Stages a file from disk; the MIME type is guessed from its extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime::mime_type_for_extension(&name).map(str::to_string);
        Self {
            name,
            mime_type,
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: Option<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type,
            source: FileSource::Bytes(bytes.into()),
        }
    }

    /// MIME type used for filtering and previews, before any bytes are read.
    pub fn declared_mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .or_else(|| mime::mime_type_for_extension(&self.name))
            .unwrap_or(mime::OCTET_STREAM)
    }
}

/// Display class of a file, derived from its name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    Document,
    Other,
}

/// Classifies a file by extension (case-insensitive).
pub fn classify(file_name: &str) -> FileKind {
    match mime::extension(file_name).as_deref() {
        Some("jpeg" | "jpg" | "png" | "gif") => FileKind::Image,
        Some("pdf" | "docx" | "doc" | "xlsx" | "xls" | "csv" | "txt") => FileKind::Document,
        _ => FileKind::Other,
    }
}

/// A staged file read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Type written into `data_uri`.
    pub mime_type: String,
    pub data_uri: String,
}

/// Converts staged files into `data:` URIs.
#[derive(Debug, Clone)]
pub struct AttachmentResolver {
    max_bytes: u64,
}

impl Default for AttachmentResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTACHMENT_BYTES)
    }
}

impl AttachmentResolver {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Reads `file` into `data:<mime>;base64,<payload>`.
    ///
    /// The declared type wins; otherwise it is detected from the name and
    /// then the bytes.
    pub async fn resolve(&self, file: &StagedFile) -> Result<ResolvedFile, AttachmentReadError> {
        let bytes = match &file.source {
            FileSource::Path(path) => self.read_path(&file.name, path).await?,
            FileSource::Bytes(bytes) => {
                self.check_size(&file.name, bytes.len() as u64)?;
                bytes.clone()
            }
        };

        let mime_type = match file.mime_type.as_deref() {
            Some(declared) if !declared.is_empty() => declared,
            _ => mime::detect_mime_type(&file.name, &bytes),
        };

        Ok(ResolvedFile {
            mime_type: mime_type.to_string(),
            data_uri: DataUri::encode(mime_type, &bytes),
        })
    }

    async fn read_path(&self, name: &str, path: &Path) -> Result<Bytes, AttachmentReadError> {
        let io_err = |source| AttachmentReadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
        self.check_size(name, metadata.len())?;

        let data = tokio::fs::read(path).await.map_err(io_err)?;
        Ok(Bytes::from(data))
    }

    fn check_size(&self, name: &str, size: u64) -> Result<(), AttachmentReadError> {
        if size > self.max_bytes {
            return Err(AttachmentReadError::TooLarge {
                file_name: name.to_string(),
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn is_data_uri(source: &str) -> bool {
        source.starts_with("data:")
    }

    pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
    }

    /// Parses `data:[<mime>][;params][;base64],<payload>`.
    ///
    /// Returns `None` for anything that is not a well-formed data URI.
    pub fn parse(source: &str) -> Option<Self> {
        let rest = source.strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;

        let (meta, is_base64) = match meta.strip_suffix(";base64") {
            Some(meta) => (meta, true),
            None => (meta, false),
        };
        let mime_type = meta.split(';').next().unwrap_or_default();
        let mime_type = if mime_type.is_empty() {
            "text/plain".to_string()
        } else {
            mime_type.to_string()
        };

        let bytes = if is_base64 {
            STANDARD.decode(payload.trim()).ok()?
        } else {
            payload.as_bytes().to_vec()
        };

        Some(Self { mime_type, bytes })
    }
}
