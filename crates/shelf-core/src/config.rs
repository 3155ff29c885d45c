use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Default concurrency ceiling.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_concurrent must be at least 1")]
    ZeroConcurrency,
}

/// Global configuration loaded from `~/.config/shelf/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfConfig {
    /// Maximum number of downloads running at once.
    pub max_concurrent: usize,
    /// Where `shelf fetch` saves files when `--dest` is not given (None = current directory).
    pub download_dir: Option<PathBuf>,
    /// Optional TCP connect timeout in seconds. Does not bound the transfer itself.
    pub connect_timeout_secs: Option<u64>,
    /// Follow HTTP redirects (up to 10).
    pub follow_redirects: bool,
    /// Optional User-Agent header.
    pub user_agent: Option<String>,
}

impl Default for ShelfConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            download_dir: None,
            connect_timeout_secs: None,
            follow_redirects: true,
            user_agent: None,
        }
    }
}

impl ShelfConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("shelf")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ShelfConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ShelfConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: ShelfConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
