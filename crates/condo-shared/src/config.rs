//! Configuration management

use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::AppError;
use crate::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRY, DEFAULT_CACHE_SWEEP_INTERVAL_SECS, DEFAULT_CACHE_TTL_MS,
};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub access: AccessSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,
}

/// Where grants are persisted
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccessSettings {
    /// Decision cache freshness window in milliseconds
    pub cache_ttl_ms: u64,
    /// 0 disables the background sweep
    pub cache_sweep_interval_secs: u64,
    pub storage: StorageBackend,
    pub super_admin_email: Option<String>,
}

impl AccessSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.cache_sweep_interval_secs > 0)
            .then(|| Duration::from_secs(self.cache_sweep_interval_secs))
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config: AppConfig = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(AppError::InvalidConfig("jwt.secret must not be empty".into()));
        }
        if self.access.cache_ttl_ms == 0 {
            return Err(AppError::InvalidConfig("access.cache_ttl_ms must be positive".into()));
        }
        Ok(())
    }

    /// Builder pre-filled with every default; `jwt.secret` has none on purpose.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "condo-server")?
            .set_default("database.url", "postgres://localhost:5432/condo")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("access.cache_ttl_ms", DEFAULT_CACHE_TTL_MS)?
            .set_default(
                "access.cache_sweep_interval_secs",
                DEFAULT_CACHE_SWEEP_INTERVAL_SECS,
            )?
            .set_default("access.storage", "memory")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_access_settings() {
        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .set_override("jwt.secret", "test-secret")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.access.cache_ttl_ms, 300_000);
        assert_eq!(config.access.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.access.storage, StorageBackend::Memory);
        assert_eq!(config.access.sweep_interval(), Some(Duration::from_secs(60)));
        assert!(config.access.super_admin_email.is_none());
    }

    #[test]
    fn test_missing_jwt_secret_is_rejected() {
        let result: Result<AppConfig, _> = AppConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize();
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_secret_and_zero_ttl() {
        let build = |secret: &str, ttl: u64| -> AppConfig {
            AppConfig::defaults()
                .unwrap()
                .set_override("jwt.secret", secret)
                .unwrap()
                .set_override("access.cache_ttl_ms", ttl)
                .unwrap()
                .build()
                .unwrap()
                .try_deserialize()
                .unwrap()
        };

        assert!(build("test-secret", 1000).validate().is_ok());
        assert!(matches!(build("  ", 1000).validate(), Err(AppError::InvalidConfig(_))));
        assert!(matches!(build("test-secret", 0).validate(), Err(AppError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_sweep_interval_disables_sweep() {
        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .set_override("jwt.secret", "test-secret")
            .unwrap()
            .set_override("access.cache_sweep_interval_secs", 0)
            .unwrap()
            .set_override("access.storage", "postgres")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.access.sweep_interval(), None);
        assert_eq!(config.access.storage, StorageBackend::Postgres);
    }
}
