//! CLI interface for embedview.
//!
//! With no subcommand the interactive screen opens. `check` runs the same
//! controller headlessly against one URL and prints the activity log.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Mutex, mpsc};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError};
use crate::embed::{EmbedController, Phase};
use crate::host::HttpHost;
use crate::{check, tui};

/// embedview — load a URL inline and watch what happens.
#[derive(Debug, Parser)]
#[command(name = "embedview", version)]
pub struct Cli {
    /// Write diagnostic tracing output to this file.
    /// Filter with `RUST_LOG` (default `info`).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Pre-fill this URL and submit it when the screen opens.
    #[arg(long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load one URL without a screen and print the activity log.
    ///
    /// Exits 0 when the target loaded, 1 when it was rejected,
    /// failed, or timed out.
    Check {
        /// The URL to load.
        url: String,

        /// Print the log as a JSON array instead of text lines.
        #[arg(long)]
        json: bool,
    },
}

/// Errors that end the process.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open log file {}: {source}", path.display())]
    LogFile { path: PathBuf, source: io::Error },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Cli {
    pub fn run(self) -> Result<ExitCode, CliError> {
        let headless = self.command.is_some();
        init_tracing(self.log_file.as_deref(), headless)?;

        let config = Config::load()?;
        tracing::debug!(?config, "configuration loaded");

        match self.command {
            None => {
                tui::run(&config, self.url)?;
                Ok(ExitCode::SUCCESS)
            }
            Some(Command::Check { url, json }) => cmd_check(&config, &url, json),
        }
    }
}

fn cmd_check(config: &Config, url: &str, json: bool) -> Result<ExitCode, CliError> {
    let (tx, rx) = mpsc::channel();
    let mut host = HttpHost::new(config, tx);
    let mut controller = EmbedController::new();

    let phase = check::run(&mut controller, &mut host, &rx, url);

    let entries = controller.log().entries();
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
    } else {
        for entry in entries {
            println!("{}", check::format_entry(entry));
        }
    }

    Ok(if phase == Phase::Ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Install the tracing subscriber.
///
/// The interactive screen owns the terminal, so without `--log-file` it
/// installs nothing. Headless runs fall back to stderr at `warn`.
fn init_tracing(log_file: Option<&Path>, headless: bool) -> Result<(), CliError> {
    match log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| CliError::LogFile {
                path: path.to_path_buf(),
                source,
            })?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("info"))
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if headless => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter("warn"))
                .with_writer(io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
