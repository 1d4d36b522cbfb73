//! embedview configuration.
//!
//! Loaded from `~/.embedview/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{key} must be greater than zero in {}", path.display())]
    Zero { path: PathBuf, key: &'static str },
}

/// embedview configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// User agent sent by the HTTP embedding host.
    pub user_agent: String,

    /// Maximum body bytes read for the preview panel.
    pub preview_bytes: u64,

    /// Transport timeout for a single fetch.
    /// Independent of the load watchdog, which is fixed.
    pub fetch_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: format!("embedview/{}", env!("CARGO_PKG_VERSION")),
            preview_bytes: 64 * 1024,
            fetch_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load config from `~/.embedview/config.toml`, or defaults when there is
    /// no home directory or no file.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from an explicit path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if config.preview_bytes == 0 {
            return Err(ConfigError::Zero {
                path: path.to_path_buf(),
                key: "preview-bytes",
            });
        }
        if config.fetch_timeout_secs == 0 {
            return Err(ConfigError::Zero {
                path: path.to_path_buf(),
                key: "fetch-timeout-secs",
            });
        }

        Ok(config)
    }

    /// The config file path: `~/.embedview/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".embedview").join("config.toml"))
    }
}
