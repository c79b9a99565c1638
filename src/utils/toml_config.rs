//! TOML-based configuration for the ledger server
//!
//! Settings for the HTTP listener, token issuance, the store backend, and
//! request validation are read from a TOML file (`ledger.toml`). Secrets
//! never live in the file itself: the file names the environment variable
//! that holds them.

use crate::auth::SYMMETRIC_KEY_LEN;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure loaded from ledger.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub validation: ValidationSection,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable name containing the 32-byte token key
    #[serde(default = "default_token_key_env")]
    pub token_symmetric_key_env: String,

    /// Lifetime of issued access tokens, in seconds
    #[serde(default = "default_access_token_duration")]
    pub access_token_duration_secs: i64,
}

fn default_token_key_env() -> String {
    "TOKEN_SYMMETRIC_KEY".to_string()
}

fn default_access_token_duration() -> i64 {
    900
}

/// Longest access token lifetime accepted in config: one year.
pub const MAX_ACCESS_TOKEN_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_symmetric_key_env: default_token_key_env(),
            access_token_duration_secs: default_access_token_duration(),
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `:memory:` for the in-process store, otherwise a SQLite file path
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    ":memory:".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

// ============= Validation Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSection {
    /// Currency codes accounts and transfers may use
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
}

fn default_currencies() -> Vec<String> {
    vec!["USD".to_string(), "EUR".to_string(), "CAD".to_string()]
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            currencies: default_currencies(),
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),
}

impl LedgerConfig {
    /// Load configuration from a TOML file and validate it.
    ///
    /// The server cannot run without a valid config, so callers are
    /// expected to treat any error here as fatal.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: LedgerConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration and the availability of the token key
    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.token_symmetric_key()?;
        if key.len() != SYMMETRIC_KEY_LEN {
            return Err(ConfigError::ValidationError(format!(
                "{} must be exactly {} bytes, got {}",
                self.auth.token_symmetric_key_env,
                SYMMETRIC_KEY_LEN,
                key.len()
            )));
        }

        let secs = self.auth.access_token_duration_secs;
        if !(1..=MAX_ACCESS_TOKEN_DURATION_SECS).contains(&secs) {
            return Err(ConfigError::ValidationError(format!(
                "auth.access_token_duration_secs must be between 1 and {}, got {}",
                MAX_ACCESS_TOKEN_DURATION_SECS, secs
            )));
        }

        if self.validation.currencies.is_empty() {
            return Err(ConfigError::ValidationError(
                "validation.currencies must list at least one currency".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must not be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// Get the token key bytes from the environment
    pub fn token_symmetric_key(&self) -> Result<Vec<u8>, ConfigError> {
        self.resolve_env(&self.auth.token_symmetric_key_env)
            .map(String::into_bytes)
            .ok_or_else(|| ConfigError::MissingEnvVar(self.auth.token_symmetric_key_env.clone()))
    }

    /// Access token lifetime, clamped to the range `validate` accepts.
    pub fn access_token_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(
            self.auth
                .access_token_duration_secs
                .clamp(1, MAX_ACCESS_TOKEN_DURATION_SECS),
        )
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
