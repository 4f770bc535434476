//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use doodle_notes_core::{ReadPolicy, UsernameMatch};
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where notes, users and login sessions are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local storage, lost on restart.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub log_level: Level,
    pub read_policy: ReadPolicy,
    pub username_match: UsernameMatch,
    pub session_ttl_days: i64,
    pub cors_origin: String,
    pub cookie_secure: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage ---
        let backend = lookup("STORAGE_BACKEND").unwrap_or_else(|| "postgres".to_string());
        let storage = match backend.trim().to_lowercase().as_str() {
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?,
            },
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        // --- Note access ---
        let read_policy = match lookup("NOTE_READ_POLICY") {
            Some(v) => v
                .parse::<ReadPolicy>()
                .map_err(|e| ConfigError::InvalidValue("NOTE_READ_POLICY".to_string(), e))?,
            None => ReadPolicy::Unrestricted,
        };
        let username_match = match lookup("USERNAME_MATCH") {
            Some(v) => v
                .parse::<UsernameMatch>()
                .map_err(|e| ConfigError::InvalidValue("USERNAME_MATCH".to_string(), e))?,
            None => UsernameMatch::Exact,
        };

        // --- Sessions and CORS ---
        let session_ttl_days = match lookup("SESSION_TTL_DAYS") {
            Some(v) => v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "SESSION_TTL_DAYS".to_string(),
                        format!("'{}' is not a positive number of days", v),
                    )
                })?,
            None => 30,
        };
        let cors_origin =
            lookup("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string());
        let cookie_secure = match lookup("COOKIE_SECURE") {
            Some(v) => v.trim().parse::<bool>().map_err(|_| {
                ConfigError::InvalidValue(
                    "COOKIE_SECURE".to_string(),
                    format!("'{}' is not true or false", v),
                )
            })?,
            None => true,
        };

        Ok(Self {
            bind_address,
            storage,
            log_level,
            read_policy,
            username_match,
            session_ttl_days,
            cors_origin,
            cookie_secure,
        })
    }

    /// A configuration for tests and local experiments: in-memory storage, defaults elsewhere.
    pub fn in_memory() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            storage: StorageBackend::Memory,
            log_level: Level::INFO,
            read_policy: ReadPolicy::Unrestricted,
            username_match: UsernameMatch::Exact,
            session_ttl_days: 30,
            cors_origin: "http://localhost:3000".to_string(),
            cookie_secure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn postgres_requires_database_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(var) if var == "DATABASE_URL"));
    }

    #[test]
    fn defaults_with_database_url() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/notes")]).unwrap();
        assert_eq!(config.bind_address.port(), 3000);
        assert_eq!(
            config.storage,
            StorageBackend::Postgres {
                database_url: "postgres://localhost/notes".to_string()
            }
        );
        assert_eq!(config.read_policy, ReadPolicy::Unrestricted);
        assert_eq!(config.username_match, UsernameMatch::Exact);
        assert_eq!(config.session_ttl_days, 30);
        assert!(config.cookie_secure);
    }

    #[test]
    fn memory_backend_with_owner_only_reads() {
        let config = load(&[
            ("STORAGE_BACKEND", "memory"),
            ("NOTE_READ_POLICY", "owner_only"),
            ("USERNAME_MATCH", "substring"),
            ("COOKIE_SECURE", "false"),
        ])
        .unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.read_policy, ReadPolicy::OwnerOnly);
        assert_eq!(config.username_match, UsernameMatch::Substring);
        assert!(!config.cookie_secure);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "mongo")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "STORAGE_BACKEND"
        ));
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "memory"), ("SESSION_TTL_DAYS", "0")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "SESSION_TTL_DAYS"
        ));
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "memory"), ("NOTE_READ_POLICY", "maybe")]),
            Err(ConfigError::InvalidValue(var, _)) if var == "NOTE_READ_POLICY"
        ));
    }
}
