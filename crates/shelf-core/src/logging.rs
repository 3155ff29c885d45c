//! Tracing setup for the `shelf` binary and anything embedding the coordinator.
//!
//! Events go to `$XDG_STATE_HOME/shelf/shelf.log` when that is writable;
//! `init_logging_stderr` is the fallback. `RUST_LOG` overrides the filter.

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "shelf.log";

const DEFAULT_FILTER: &str = "info,shelf_core=debug,shelf=debug";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log file location. Creates the state directory if needed.
pub fn log_file_path() -> Result<PathBuf> {
    let dirs = xdg::BaseDirectories::with_prefix("shelf")?;
    dirs.place_state_file(LOG_FILE_NAME)
        .context("create log directory")
}

/// Appends plain-text events to the state log file and returns its path.
/// Fails if the file cannot be opened or a subscriber is already installed.
pub fn init_logging() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file: {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("install log subscriber: {}", e))?;

    tracing::debug!(path = %path.display(), "file logging ready");
    Ok(path)
}

/// Stderr-only logging. A no-op if a subscriber is already installed.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}
