//! Configuration for the conversation store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::history::core::errors::{StoreError, StoreResult};

/// Environment variable holding the database path.
pub const DB_PATH_ENV: &str = "CHAT_HISTORY_DB";
/// Environment variable holding the busy timeout in milliseconds.
pub const BUSY_TIMEOUT_ENV: &str = "CHAT_HISTORY_BUSY_TIMEOUT_MS";

/// Path used when nothing else is configured.
pub const DEFAULT_DB_PATH: &str = "chat_history.db";

/// Special path understood by `SQLite` as a private in-memory database.
const IN_MEMORY_PATH: &str = ":memory:";

/// Storage configuration for conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// How long a writer waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Use the write-ahead log for file-backed databases.
    pub wal: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout_ms: 5_000,
            wal: true,
        }
    }
}

impl StoreConfig {
    /// Configuration for a database at `path`, other settings default.
    #[must_use]
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            sqlite_path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Configuration for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sqlite_path: PathBuf::from(IN_MEMORY_PATH),
            wal: false,
            ..Self::default()
        }
    }

    /// Build from `CHAT_HISTORY_DB` and `CHAT_HISTORY_BUSY_TIMEOUT_MS`.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the timeout is not a number.
    pub fn from_env() -> StoreResult<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            config.sqlite_path = PathBuf::from(path);
        }
        if let Ok(raw) = std::env::var(BUSY_TIMEOUT_ENV) {
            config.busy_timeout_ms = raw.trim().parse().map_err(|_| {
                StoreError::InvalidConfig(format!("{BUSY_TIMEOUT_ENV} must be an integer"))
            })?;
        }
        Ok(config)
    }

    /// Whether the configured path is the in-memory sentinel.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.sqlite_path.as_os_str() == IN_MEMORY_PATH
    }

    /// Busy timeout as a `Duration`.
    #[must_use]
    pub const fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> StoreResult<()> {
        if self.sqlite_path.as_os_str().is_empty() {
            return Err(StoreError::InvalidConfig(
                "sqlite_path must not be empty".to_string(),
            ));
        }

        if self.busy_timeout_ms == 0 {
            return Err(StoreError::InvalidConfig(
                "busy_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.sqlite_path, PathBuf::from("chat_history.db"));
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert!(config.wal);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_in_memory_config() {
        let config = StoreConfig::in_memory();
        assert!(config.is_in_memory());
        assert!(!config.wal);
        assert!(!StoreConfig::default().is_in_memory());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StoreConfig::at("");
        assert!(matches!(
            config.validate(),
            Err(StoreError::InvalidConfig(_))
        ));

        config = StoreConfig::at("history.db");
        config.busy_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: StoreConfig = serde_json::from_str(r#"{"sqlite_path": "x.db"}"#).unwrap();
        assert_eq!(config.sqlite_path, PathBuf::from("x.db"));
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert!(config.wal);
    }
}
