//! Configuration for the SQLite path store.
//!
//! Loads settings from TOML: database location, busy timeout and journal
//! mode. Every field has a default, so an empty file yields an in-memory
//! database.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Store configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),
}

/// SQLite journal mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    /// Write-ahead log
    #[default]
    Wal,

    /// Rollback journal, deleted after each transaction
    Delete,

    /// Journal kept in memory
    Memory,
}

impl JournalMode {
    /// Value passed to `PRAGMA journal_mode`
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalMode::Wal => "wal",
            JournalMode::Delete => "delete",
            JournalMode::Memory => "memory",
        }
    }
}

/// Configuration for [`crate::SqlitePathStore`]
///
/// # Examples
///
/// ```
/// use kinship_store::{JournalMode, StoreConfig};
///
/// let config = StoreConfig::from_toml_str(r#"
///     database_path = "relationships.db"
///     journal_mode = "delete"
/// "#).unwrap();
/// assert_eq!(config.database_path, "relationships.db");
/// assert_eq!(config.journal_mode, JournalMode::Delete);
/// assert_eq!(config.busy_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// How long a writer waits on a locked database (milliseconds)
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Journal mode applied on open
    #[serde(default)]
    pub journal_mode: JournalMode,
}

fn default_database_path() -> String {
    ":memory:".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: JournalMode::default(),
        }
    }
}

impl StoreConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(contents)?;

        if config.database_path.trim().is_empty() {
            return Err(ConfigError::MissingField("database_path".to_string()));
        }

        Ok(config)
    }

    /// Configuration for a database file at `path`
    pub fn at_path(path: impl Into<String>) -> Self {
        Self {
            database_path: path.into(),
            ..Self::default()
        }
    }

    /// Busy timeout as Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Whether this configuration targets an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.database_path == ":memory:"
    }
}
