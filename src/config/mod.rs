//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `LIPACHAT_AGENTS`
//! prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use lipachat_agents::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod database;
mod error;
mod knowledge;
mod messaging;
mod orchestration;
mod server;

pub use ai::{AiConfig, SentimentBackend};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use knowledge::KnowledgeConfig;
pub use messaging::MessagingConfig;
pub use orchestration::OrchestrationConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults; only the AI key is required to start.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration; empty URL keeps conversations in memory
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Language model access
    #[serde(default)]
    pub ai: AiConfig,

    /// LipaChat transport and webhook signing
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Knowledge store and retrieval limits
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Escalation thresholds, lifetimes and languages
    #[serde(default)]
    pub orchestration: OrchestrationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `LIPACHAT_AGENTS__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LIPACHAT_AGENTS__ORCHESTRATION__SUPPORTED_LANGUAGES=en,sw` -> list
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LIPACHAT_AGENTS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("orchestration.supported_languages")
                    .with_list_parse_key("orchestration.human_request_phrases"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.ai.validate()?;
        self.messaging.validate(self.is_production())?;
        self.knowledge.validate()?;
        self.orchestration.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "LIPACHAT_AGENTS__AI__ANTHROPIC_API_KEY",
        "LIPACHAT_AGENTS__SERVER__PORT",
        "LIPACHAT_AGENTS__SERVER__ENVIRONMENT",
        "LIPACHAT_AGENTS__ORCHESTRATION__SUPPORTED_LANGUAGES",
        "LIPACHAT_AGENTS__ORCHESTRATION__NEGATIVE_THRESHOLD",
        "LIPACHAT_AGENTS__AI__SENTIMENT_BACKEND",
    ];

    fn set_minimal_env() {
        env::set_var("LIPACHAT_AGENTS__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.ai.anthropic_api_key.as_deref(), Some("sk-ant-xxx"));
        assert!(!config.database.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_nested_and_list_values() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("LIPACHAT_AGENTS__SERVER__PORT", "3000");
        env::set_var("LIPACHAT_AGENTS__ORCHESTRATION__SUPPORTED_LANGUAGES", "en,sw,fr");
        env::set_var("LIPACHAT_AGENTS__ORCHESTRATION__NEGATIVE_THRESHOLD", "-0.5");
        env::set_var("LIPACHAT_AGENTS__AI__SENTIMENT_BACKEND", "model");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.orchestration.supported_languages, vec!["en", "sw", "fr"]);
        assert_eq!(config.orchestration.negative_threshold, -0.5);
        assert_eq!(config.ai.sentiment_backend, SentimentBackend::Model);
    }

    #[test]
    fn test_production_requires_messaging_secrets() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("LIPACHAT_AGENTS__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_missing_ai_key_fails_validation() {
        let config = AppConfig::default();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("ANTHROPIC_API_KEY"))
        );
    }
}
