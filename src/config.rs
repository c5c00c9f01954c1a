//! Runtime configuration.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Environment variable overriding [`ArenaConfig::database_path`].
pub const DATABASE_PATH_ENV: &str = "ARENA_DATABASE_PATH";
/// Environment variable overriding [`ArenaConfig::gateway_timeout_ms`].
pub const GATEWAY_TIMEOUT_ENV: &str = "ARENA_GATEWAY_TIMEOUT_MS";

/// Configuration for the arena services.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ArenaConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_database_path")]
    #[setters(into)]
    database_path: String,

    /// Upper bound for every store call, in milliseconds.
    #[serde(default = "default_gateway_timeout_ms")]
    gateway_timeout_ms: u64,

    /// Updates buffered per profile feed subscriber.
    #[serde(default = "default_feed_capacity")]
    feed_capacity: usize,
}

fn default_database_path() -> String {
    "tictactoe_arena.db".to_string()
}

fn default_gateway_timeout_ms() -> u64 {
    5000
}

fn default_feed_capacity() -> usize {
    64
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            gateway_timeout_ms: default_gateway_timeout_ms(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

impl ArenaConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at `path` if given (defaults otherwise), then applies
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file or an override is invalid.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        let config = config.with_env_overrides(|key| std::env::var(key).ok())?;
        info!(database = %config.database_path, timeout_ms = config.gateway_timeout_ms, "Config loaded");
        Ok(config)
    }

    /// Applies overrides read through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an override is not valid.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup(DATABASE_PATH_ENV) {
            debug!(%path, "Database path overridden from environment");
            self.database_path = path;
        }
        if let Some(raw) = lookup(GATEWAY_TIMEOUT_ENV) {
            self.gateway_timeout_ms = raw.trim().parse().map_err(|_| {
                ConfigError::new(format!("{} must be a number, got '{}'", GATEWAY_TIMEOUT_ENV, raw))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Timeout applied to every store call.
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::new("database_path must not be empty".to_string()));
        }
        if self.gateway_timeout_ms == 0 {
            return Err(ConfigError::new("gateway_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = ArenaConfig::from_toml("").unwrap();
        assert_eq!(config, ArenaConfig::default());
        assert_eq!(config.gateway_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_file_values() {
        let config = ArenaConfig::from_toml(
            "database_path = \"arena.db\"\ngateway_timeout_ms = 250\nfeed_capacity = 8\n",
        )
        .unwrap();
        assert_eq!(config.database_path(), "arena.db");
        assert_eq!(*config.gateway_timeout_ms(), 250);
        assert_eq!(*config.feed_capacity(), 8);
    }

    #[test]
    fn test_env_overrides() {
        let config = ArenaConfig::default()
            .with_env_overrides(|key| match key {
                DATABASE_PATH_ENV => Some("/tmp/other.db".to_string()),
                GATEWAY_TIMEOUT_ENV => Some("100".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.database_path(), "/tmp/other.db");
        assert_eq!(config.gateway_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(ArenaConfig::from_toml("gateway_timeout_ms = 0").is_err());
        assert!(
            ArenaConfig::default()
                .with_env_overrides(|key| (key == GATEWAY_TIMEOUT_ENV).then(|| "soon".to_string()))
                .is_err()
        );
    }

    #[test]
    fn test_setters() {
        let config = ArenaConfig::default()
            .with_database_path("x.db")
            .with_gateway_timeout_ms(10);
        assert_eq!(config.database_path(), "x.db");
        assert_eq!(*config.gateway_timeout_ms(), 10);
    }
}
