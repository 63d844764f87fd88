//! PostgreSQL settings for the durable conversation store.
//!
//! The whole `database` section is optional; without it the process keeps
//! conversations in memory.

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::ValidationError;

const MAX_POOL_SIZE: u32 = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` URL
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a free connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Seconds before an unused connection is closed
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Seconds before any connection is recycled
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,

    /// Apply `migrations/` before serving
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Connection pool shaped by this section.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("database.url"));
        }
        if !["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
        {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    1800
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(yaml: &str) -> DatabaseConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn omitted_fields_take_defaults() {
        let config = section("url: postgres://localhost/support");

        assert_eq!(config.min_connections, 1);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.max_lifetime_secs, 1800);
        assert!(!config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn url_must_be_postgres() {
        assert!(matches!(
            section("url: ''").validate(),
            Err(ValidationError::MissingRequired(_))
        ));
        assert!(matches!(
            section("url: mysql://localhost/support").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        ));
        assert!(section("url: postgresql://u:p@db:5432/support").validate().is_ok());
    }

    #[test]
    fn pool_bounds_are_checked() {
        let inverted = section("{url: 'postgres://db/s', min_connections: 10, max_connections: 5}");
        assert!(matches!(inverted.validate(), Err(ValidationError::InvalidPoolSize)));

        let huge = section("{url: 'postgres://db/s', max_connections: 150}");
        assert!(matches!(huge.validate(), Err(ValidationError::PoolSizeTooLarge)));
    }
}
