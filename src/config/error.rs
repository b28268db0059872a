//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::agent::AgentDefinitionError;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("AI base URL must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Unknown log level: {0}")]
    InvalidLogLevel(String),
}

/// Errors that can occur while loading an agent definition file
#[derive(Debug, Error)]
pub enum DefinitionLoadError {
    #[error("Cannot read agent definition {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed agent definition {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid agent definition: {0}")]
    Invalid(#[from] AgentDefinitionError),
}
