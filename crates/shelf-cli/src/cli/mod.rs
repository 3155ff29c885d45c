//! CLI for the shelf download coordinator.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shelf_core::config;
use std::path::PathBuf;

use commands::{run_config, run_fetch};

/// Top-level CLI for shelf.
#[derive(Debug, Parser)]
#[command(name = "shelf")]
#[command(about = "shelf: download books into your library", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more URLs, at most N at a time, and wait for all of them.
    Fetch {
        /// Direct HTTP/HTTPS URLs to download.
        #[arg(required = true)]
        urls: Vec<String>,
        /// Directory to save into (default: `download_dir` from config, else the current directory).
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
        /// Run up to N downloads at once (default: `max_concurrent` from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,
    },

    /// Show the config file location and current values.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch { urls, dest, jobs } => {
                if let Some(jobs) = jobs {
                    cfg.max_concurrent = jobs;
                }
                let dest_dir = match dest.or_else(|| cfg.download_dir.clone()) {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                run_fetch(&cfg, &urls, &dest_dir).await?;
            }
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}
