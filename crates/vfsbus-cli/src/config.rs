//! Configuration for the `vfsbus` binary.
//!
//! Loaded from `$XDG_CONFIG_HOME/vfsbus/config.toml` when present, or from
//! the path given with `--config`. Command-line flags override file values.
//!
//! ```toml
//! role = "client"
//! log = "vfsbus=debug"
//! echo_published = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::Deserialize;
use vfsbus_kernel::Role;

/// Default tracing filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "vfsbus=info";

/// Settings for a replay run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Which dispatch rules to apply.
    pub role: Role,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log: String,
    /// Log every event as it's published on the bus.
    pub echo_published: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            role: Role::Server,
            log: DEFAULT_LOG_FILTER.to_string(),
            echo_published: false,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the XDG config file is used
    /// if present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = default_config_path();
                if path.is_file() {
                    Self::from_file(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config: {}", path.display()))
    }
}

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/vfsbus` or falls back to `~/.config/vfsbus`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("vfsbus")
}

/// Path of the default config file.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Fallback home directory when BaseDirs fails.
fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}
