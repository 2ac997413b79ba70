//! Download command handler.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use parley_core::config::Config;
use parley_core::download::{DirSink, DownloadOutcome, Downloader, HttpTransport, SystemOpener};

pub async fn run(config: &Config, source: &str, name: &str, out: Option<PathBuf>) -> Result<()> {
    let dir = out.unwrap_or_else(|| config.download.effective_dir());

    let downloader = Downloader::new(
        Arc::new(HttpTransport::default()),
        Arc::new(SystemOpener),
        Arc::new(DirSink::new(dir)),
        config.download.direct_open_hosts.clone(),
    );

    let outcome = downloader
        .download(source, name)
        .await
        .with_context(|| format!("download '{name}'"))?;

    match outcome {
        DownloadOutcome::Saved(path) => println!("Saved {}", path.display()),
        DownloadOutcome::Opened { fallback: false } => println!("Opened {name} in browser"),
        DownloadOutcome::Opened { fallback: true } => {
            println!("Download failed; opened {name} in browser instead");
        }
    }
    Ok(())
}
