//! Configuration management.
//!
//! Stores configuration in JSON format at `~/.portmem/config.json`.
//! Every key is optional; a missing file means defaults throughout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::ProtocolSelection;
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Indent width of the pretty-printed JSON output.
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Protocols whose sockets are enumerated.
    #[serde(default)]
    pub protocols: ProtocolSelection,

    /// Root of the procfs tree (Linux only).
    #[serde(default = "default_proc_root", rename = "procRoot")]
    pub proc_root: PathBuf,
}

fn default_indent() -> usize {
    4
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent: default_indent(),
            protocols: ProtocolSelection::default(),
            proc_root: default_proc_root(),
        }
    }
}

impl Config {
    /// Set one key by its file name (`indent`, `protocols` or `procRoot`).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "indent" => {
                self.indent = value.parse().map_err(|_| {
                    Error::Config(format!("indent must be a whole number, got '{}'", value))
                })?;
            }
            "protocols" => {
                self.protocols = value.parse().map_err(Error::Config)?;
            }
            "procRoot" => self.proc_root = PathBuf::from(value),
            other => return Err(Error::Config(format!("Unknown config key: {}", other))),
        }
        Ok(())
    }
}

/// Configuration store for reading and writing settings.
///
/// Handles reading and writing configuration to `~/.portmem/config.json`.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portmem/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        let config_path = home.join(".portmem").join("config.json");

        Ok(Self { config_path })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &std::path::Path {
        &self.config_path
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(config_dir) = self.config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir).await.map_err(|e| {
                    Error::Config(format!("Failed to create config directory: {}", e))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        // Write atomically by writing to temp file then renaming
        let temp_path = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to create temp config file: {}", e)))?;

        file.write_all(content.as_bytes())
            .await
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;

        file.sync_all()
            .await
            .map_err(|e| Error::Config(format!("Failed to sync config: {}", e)))?;

        fs::rename(&temp_path, &self.config_path)
            .await
            .map_err(|e| Error::Config(format!("Failed to rename config file: {}", e)))?;

        Ok(())
    }
}
