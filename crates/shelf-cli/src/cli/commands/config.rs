//! `shelf config` – print config location and values.

use anyhow::Result;
use shelf_core::config::{self, ShelfConfig};

pub fn run_config(cfg: &ShelfConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", toml::to_string_pretty(cfg)?);
    Ok(())
}
