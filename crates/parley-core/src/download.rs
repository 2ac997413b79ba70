//! Save-as for attachments and assets.
//!
//! Three strategies, picked from the source alone:
//!
//! - `data:` URIs are decoded and saved in place. No network.
//! - URLs on hosts that require the browser's own session (listed in
//!   config) are opened in a new context right away. Opening must happen
//!   before the first await; a deferred open loses the user gesture and is
//!   blocked.
//! - Every other URL is fetched (streamed) and saved. Any failure along the
//!   way falls back to opening the URL.
//!
//! Fetching, opening and saving are injected so each path can be driven
//! deterministically.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::attachment::DataUri;
use crate::error::DownloadError;

/// Hosts that reject cross-origin fetches and need a direct open.
pub const DEFAULT_DIRECT_OPEN_HOSTS: &[&str] = &["storage.cloud.google.com"];

/// Fetches remote bytes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError>;
}

/// Opens a source in a new context (browser tab, system viewer).
pub trait Opener: Send + Sync {
    fn open(&self, target: &str) -> Result<(), DownloadError>;
}

/// Persists downloaded bytes under a file name.
pub trait SaveSink: Send + Sync {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError>;
}

/// How a source will be downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStrategy {
    Inline,
    DirectOpen,
    FetchThenSave,
}

/// What a download ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    Opened { fallback: bool },
}

/// Picks the strategy for `source`.
pub fn plan(source: &str, direct_open_hosts: &[String]) -> DownloadStrategy {
    if DataUri::is_data_uri(source) {
        return DownloadStrategy::Inline;
    }

    let host = url::Url::parse(source)
        .ok()
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
    if let Some(host) = host
        && direct_open_hosts.iter().any(|h| host_matches(&host, h))
    {
        return DownloadStrategy::DirectOpen;
    }

    DownloadStrategy::FetchThenSave
}

fn host_matches(host: &str, pattern: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    host == pattern
        || host
            .strip_suffix(pattern.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Runs downloads with injected capabilities.
pub struct Downloader {
    transport: Arc<dyn Transport>,
    opener: Arc<dyn Opener>,
    sink: Arc<dyn SaveSink>,
    direct_open_hosts: Vec<String>,
}

impl Downloader {
    pub fn new(
        transport: Arc<dyn Transport>,
        opener: Arc<dyn Opener>,
        sink: Arc<dyn SaveSink>,
        direct_open_hosts: Vec<String>,
    ) -> Self {
        Self {
            transport,
            opener,
            sink,
            direct_open_hosts,
        }
    }

    /// Downloads `source` as `file_name`.
    ///
    /// Only a failure of the final open step is returned as an error.
    pub async fn download(
        &self,
        source: &str,
        file_name: &str,
    ) -> Result<DownloadOutcome, DownloadError> {
        let strategy = plan(source, &self.direct_open_hosts);
        debug!(?strategy, file_name, "starting download");

        match strategy {
            DownloadStrategy::Inline => match self.save_inline(source, file_name) {
                Ok(path) => Ok(DownloadOutcome::Saved(path)),
                Err(e) => {
                    warn!(error = %e, file_name, "inline save failed; opening instead");
                    self.open_fallback(source)
                }
            },
            DownloadStrategy::DirectOpen => {
                self.opener.open(source)?;
                Ok(DownloadOutcome::Opened { fallback: false })
            }
            DownloadStrategy::FetchThenSave => match self.fetch_and_save(source, file_name).await {
                Ok(path) => Ok(DownloadOutcome::Saved(path)),
                Err(e) => {
                    warn!(error = %e, file_name, "fetch failed; opening in new context");
                    self.open_fallback(source)
                }
            },
        }
    }

    fn save_inline(&self, source: &str, file_name: &str) -> Result<PathBuf, DownloadError> {
        let data = DataUri::parse(source).ok_or(DownloadError::MalformedDataUri)?;
        self.sink.save(file_name, &data.bytes)
    }

    async fn fetch_and_save(&self, url: &str, file_name: &str) -> Result<PathBuf, DownloadError> {
        let bytes = self.transport.fetch(url).await?;
        self.sink.save(file_name, &bytes)
    }

    fn open_fallback(&self, source: &str) -> Result<DownloadOutcome, DownloadError> {
        self.opener.open(source)?;
        Ok(DownloadOutcome::Opened { fallback: true })
    }
}

/// reqwest-backed transport that streams the body.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<Bytes, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Transport(e.to_string()))?;
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

/// Opens targets with the system's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, target: &str) -> Result<(), DownloadError> {
        open::that(target).map_err(|source| DownloadError::Open {
            target: target.to_string(),
            source,
        })
    }
}

/// Saves into a directory, keeping only the final path component of the
/// requested name.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SaveSink for DirSink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        let save_err = |source| DownloadError::Save {
            file_name: file_name.to_string(),
            source,
        };

        let name = Path::new(file_name)
            .file_name()
            .map_or_else(|| "download".into(), |n| n.to_string_lossy().into_owned());

        fs::create_dir_all(&self.dir).map_err(save_err)?;
        let path = self.dir.join(name);
        fs::write(&path, bytes).map_err(save_err)?;
        Ok(path)
    }
}
