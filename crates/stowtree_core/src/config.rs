//! Runtime configuration from environment variables.
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - Present but invalid values are rejected, never silently replaced.

use crate::logging::default_log_level;
use crate::source::rest::DEFAULT_HTTP_TIMEOUT;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_BASE: &str = "STOWTREE_API_BASE";
pub const ENV_DB_PATH: &str = "STOWTREE_DB_PATH";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "STOWTREE_HTTP_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "STOWTREE_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "STOWTREE_LOG_DIR";

/// Database file used when `STOWTREE_DB_PATH` is unset.
pub const DEFAULT_DB_FILE_NAME: &str = "stowtree.sqlite3";

/// Errors from configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for {key}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by the CLI and FFI entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// REST base URL; `None` selects the local SQLite store.
    pub api_base: Option<String>,
    pub db_path: PathBuf,
    pub http_timeout: Duration,
    pub log_level: String,
    /// Absolute log directory; `None` keeps file logging off.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(base) = read(ENV_API_BASE) {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ConfigError::InvalidValue {
                    key: ENV_API_BASE,
                    value: base,
                });
            }
            config.api_base = Some(base);
        }
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(ENV_HTTP_TIMEOUT_SECS) {
            let secs = raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: ENV_HTTP_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = read(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_HTTP_TIMEOUT_SECS};
    use std::collections::HashMap;
    use std::time::Duration;

    fn config_from(pairs: &[(&str, &str)]) -> Result<CoreConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CoreConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn timeout_must_be_positive_integer() {
        let err = config_from(&[("STOWTREE_HTTP_TIMEOUT_SECS", "0")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_HTTP_TIMEOUT_SECS,
                value: "0".to_string()
            }
        );
        let config = config_from(&[("STOWTREE_HTTP_TIMEOUT_SECS", " 3 ")]).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn api_base_requires_http_scheme() {
        assert!(config_from(&[("STOWTREE_API_BASE", "localhost:3000")]).is_err());
        let config = config_from(&[("STOWTREE_API_BASE", "http://localhost:3000/api")]).unwrap();
        assert_eq!(config.api_base.as_deref(), Some("http://localhost:3000/api"));
    }
}
