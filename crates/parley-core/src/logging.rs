//! File-based tracing setup.
//!
//! Logs go to `$PARLEY_HOME/logs/parley.log` so they never interleave with
//! command output. The filter comes from `PARLEY_LOG` (default `warn`).

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::paths;

pub const LOG_ENV: &str = "PARLEY_LOG";
pub const LOG_FILE_NAME: &str = "parley.log";

/// Installs the global subscriber writing under the default logs dir.
///
/// Keep the returned guard alive until exit; dropping it flushes and stops
/// the background writer.
pub fn init() -> Result<WorkerGuard> {
    init_in(&paths::logs_dir())
}

pub fn init_in(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}
