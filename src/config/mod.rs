//! Application configuration module
//!
//! Configuration is layered, lowest precedence first: built-in defaults, an
//! optional YAML file, `.env`, then environment variables with the
//! `SUPPORT_ROUTER` prefix and `__` separating nested values.
//!
//! # Example
//!
//! ```no_run
//! use support_router::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod database;
mod error;
mod handlers;
mod server;
mod session;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use handlers::{CatalogConfig, HandlersConfig};
pub use server::{Environment, ServerConfig};
pub use session::{SessionConfig, DEFAULT_WELCOME};

use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the YAML configuration file.
pub const CONFIG_FILE_VAR: &str = "SUPPORT_ROUTER_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "config/support.yaml";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Declared handlers; built-ins when absent
    #[serde(default)]
    pub handlers: HandlersConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Durable conversation store; in-memory when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

impl AppConfig {
    /// Load configuration from the YAML file and environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the YAML file named by `SUPPORT_ROUTER_CONFIG` (default
    ///    `config/support.yaml`), if it exists
    /// 3. Overlays environment variables with the `SUPPORT_ROUTER` prefix,
    ///    using `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `SUPPORT_ROUTER__SERVER__PORT=8000` -> `server.port = 8000`
    /// - `SUPPORT_ROUTER__AI__OPENAI_API_KEY=...` -> `ai.openai_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or values cannot be
    /// deserialized into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_FILE_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(path)
    }

    /// Load with an explicit YAML file path (which may be absent).
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = config::Config::builder()
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::default()
                    .prefix("SUPPORT_ROUTER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any value is invalid, including an
    /// invalid handler declaration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.session.validate()?;
        self.handlers.registry()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("SUPPORT_ROUTER__AI__OPENAI_API_KEY", "sk-test");
    }

    fn clear_env() {
        env::remove_var("SUPPORT_ROUTER__AI__OPENAI_API_KEY");
        env::remove_var("SUPPORT_ROUTER__SERVER__PORT");
        env::remove_var("SUPPORT_ROUTER__SERVER__ENVIRONMENT");
        env::remove_var("SUPPORT_ROUTER__SESSION__HISTORY_WINDOW");
    }

    fn no_file() -> PathBuf {
        PathBuf::from("does/not/exist.yaml")
    }

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load_from(no_file());
        clear_env();

        let config = result.unwrap();
        assert!(config.ai.has_openai());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load_from(no_file());
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.session.history_window, 10);
        assert!(config.database.is_none());
        assert!(!config.handlers.is_declared());
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load_from(no_file()).unwrap();

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingRequired("OPENAI_API_KEY"))
        ));
    }

    #[test]
    fn test_yaml_file_is_read() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let file = yaml_file(
            "server:\n  port: 9100\nsession:\n  history_window: 3\nhandlers:\n  - id: orders\n    name: Orders\n    description: Order placement and status\n",
        );
        let result = AppConfig::load_from(file.path());
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.session.history_window, 3);
        let registry = config.handlers.registry().unwrap();
        assert_eq!(registry.enabled_handlers().len(), 1);
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("SUPPORT_ROUTER__SERVER__PORT", "3000");
        let file = yaml_file("server:\n  port: 9100\n");
        let result = AppConfig::load_from(file.path());
        clear_env();

        assert_eq!(result.unwrap().server.port, 3000);
    }

    #[test]
    fn test_invalid_handler_declaration_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let file = yaml_file("handlers:\n  - id: billing\n    name: Billing\n    description: Invoices\n");
        let result = AppConfig::load_from(file.path());
        clear_env();

        let config = result.unwrap();
        assert!(matches!(config.validate(), Err(ValidationError::Handlers(_))));
    }

    #[test]
    fn test_environment_from_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("SUPPORT_ROUTER__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load_from(no_file());
        clear_env();

        assert!(result.unwrap().server.is_production());
    }
}
