//! Configuration loading and request validation.

pub mod toml_config;
pub mod validation;

pub use toml_config::{ConfigError, LedgerConfig};
pub use validation::ValidationConfig;
