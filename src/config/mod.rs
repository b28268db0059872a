//! Application configuration module
//!
//! Settings are read from environment variables through the `config` and
//! `dotenvy` crates. Variables use the `INTAKE_AGENT` prefix and `__`
//! between nested keys, e.g. `INTAKE_AGENT__AI__MODEL`.
//!
//! Server settings (bind address, config directory) come from the same
//! source, e.g. `INTAKE_AGENT__SERVER__PORT`.
//!
//! The agent definition itself (personality, fields, policies) lives in a
//! YAML file whose path is part of this configuration.
//!
//! # Example
//!
//! ```no_run
//! use intake_agent::config::{load_agent_definition, AppConfig};
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! let definition = load_agent_definition(&config.agent.definition_path)
//!     .expect("Invalid agent definition");
//! ```

mod agent_definition;
mod ai;
mod error;
mod logging;
mod server;

pub use agent_definition::{load_agent_definition, parse_agent_definition, AgentConfig};
pub use ai::AiConfig;
pub use error::{ConfigError, DefinitionLoadError, ValidationError};
pub use logging::LoggingConfig;
pub use server::ServerConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Agent definition location
    #[serde(default)]
    pub agent: AgentConfig,

    /// Text capability (OpenAI-compatible endpoint)
    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP API bind address and config directory
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `INTAKE_AGENT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("INTAKE_AGENT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.logging.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Environment variables are process-wide
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "INTAKE_AGENT__AGENT__DEFINITION_PATH",
        "INTAKE_AGENT__AI__API_KEY",
        "INTAKE_AGENT__AI__MODEL",
        "INTAKE_AGENT__AI__TIMEOUT_SECS",
        "INTAKE_AGENT__LOGGING__LEVEL",
        "INTAKE_AGENT__LOGGING__JSON",
        "INTAKE_AGENT__SERVER__PORT",
        "INTAKE_AGENT__SERVER__CONFIGS_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_defaults_from_empty_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let config = AppConfig::load().unwrap();

        assert_eq!(config.agent.definition_path, PathBuf::from("agent.yaml"));
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8000);
        assert!(config.ai.api_key.is_none());
    }

    #[test]
    fn test_load_reads_nested_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("INTAKE_AGENT__AGENT__DEFINITION_PATH", "/etc/intake/agent.yaml");
        env::set_var("INTAKE_AGENT__AI__API_KEY", "sk-test");
        env::set_var("INTAKE_AGENT__AI__MODEL", "gpt-4o");
        env::set_var("INTAKE_AGENT__AI__TIMEOUT_SECS", "60");
        env::set_var("INTAKE_AGENT__LOGGING__LEVEL", "debug");
        env::set_var("INTAKE_AGENT__LOGGING__JSON", "true");
        env::set_var("INTAKE_AGENT__SERVER__PORT", "9100");
        env::set_var("INTAKE_AGENT__SERVER__CONFIGS_DIR", "/etc/intake/configs");

        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.agent.definition_path,
            PathBuf::from("/etc/intake/agent.yaml")
        );
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.ai.timeout_secs, 60);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.configs_dir, PathBuf::from("/etc/intake/configs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_missing_key() {
        let config = AppConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("INTAKE_AGENT__AI__API_KEY"))
        );
    }
}
