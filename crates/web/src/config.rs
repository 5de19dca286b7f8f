//! Service configuration, read from the environment.

use std::net::SocketAddr;

use thiserror::Error;

pub const BIND_ADDR_VAR: &str = "AURORA_BIND_ADDR";
pub const MAX_UPLOAD_BYTES_VAR: &str = "AURORA_MAX_UPLOAD_BYTES";
pub const DATABASE_URL_VAR: &str = "AURORA_DATABASE_URL";

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
pub const LOG_LEVEL_VAR: &str = "AURORA_LOG_LEVEL";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub bind_addr: SocketAddr,
    /// Request body limit; larger uploads are rejected with `020010`.
    pub max_upload_bytes: usize,
    pub database_url: String,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_upload_bytes: 10 * 1024 * 1024,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl WebConfig {
    /// True when no database URL was configured and the private in-memory
    /// database is used.
    pub fn uses_default_database(&self) -> bool {
        self.database_url == DEFAULT_DATABASE_URL
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(BIND_ADDR_VAR) {
            config.bind_addr = raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: BIND_ADDR_VAR,
                value: raw.clone(),
                reason: e.to_string(),
            })?;
        }

        if let Some(raw) = lookup(MAX_UPLOAD_BYTES_VAR) {
            config.max_upload_bytes = match raw.parse::<usize>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        key: MAX_UPLOAD_BYTES_VAR,
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Ok(n) => n,
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        key: MAX_UPLOAD_BYTES_VAR,
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            };
        }

        if let Some(url) = lookup(DATABASE_URL_VAR) {
            config.database_url = url;
        }

        if let Some(level) = lookup(LOG_LEVEL_VAR) {
            config.log_level = level;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = WebConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WebConfig::default());
        assert_eq!(config.max_upload_bytes, 10_485_760);
        assert!(config.uses_default_database());
    }

    #[test]
    fn overrides_are_applied() {
        let config = WebConfig::from_lookup(lookup(&[
            (BIND_ADDR_VAR, "127.0.0.1:9000"),
            (MAX_UPLOAD_BYTES_VAR, "2048"),
            (DATABASE_URL_VAR, "sqlite://aurora.db"),
            (LOG_LEVEL_VAR, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(config.database_url, "sqlite://aurora.db");
        assert_eq!(config.log_level, "debug");
        assert!(!config.uses_default_database());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = WebConfig::from_lookup(lookup(&[(MAX_UPLOAD_BYTES_VAR, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: MAX_UPLOAD_BYTES_VAR, .. }));

        let err = WebConfig::from_lookup(lookup(&[(MAX_UPLOAD_BYTES_VAR, "0")])).unwrap_err();
        assert!(err.to_string().contains("greater than zero"));

        let err = WebConfig::from_lookup(lookup(&[(BIND_ADDR_VAR, "localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: BIND_ADDR_VAR, .. }));
    }
}
