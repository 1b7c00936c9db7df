//! Typed configuration for database, cache and logging bootstrap.
//!
//! # Responsibility
//! - Parse TOML configuration with defaults for every omitted field.
//! - Apply `APIBASE_*` environment overrides on top of file values.
//!
//! # Invariants
//! - A validated config has a non-empty cache prefix and a non-zero Redis port.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "APIBASE_DB_PATH";
pub const ENV_CACHE_PREFIX: &str = "APIBASE_CACHE_PREFIX";
pub const ENV_CACHE_TTL_SECS: &str = "APIBASE_CACHE_TTL_SECS";
pub const ENV_REDIS_HOST: &str = "APIBASE_REDIS_HOST";
pub const ENV_REDIS_PORT: &str = "APIBASE_REDIS_PORT";
pub const ENV_LOG_LEVEL: &str = "APIBASE_LOG_LEVEL";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file. `None` opens an in-memory database.
    pub path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

/// Cache engine selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Namespace joined to every key as `<prefix>:<key>`.
    pub prefix: String,
    /// TTL applied when callers pass no (or a zero) TTL. `0` disables expiry.
    pub default_ttl_secs: u64,
    pub redis: RedisConfig,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Option<Duration> {
        (self.default_ttl_secs > 0).then(|| Duration::from_secs(self.default_ttl_secs))
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Memory,
            prefix: "apibase".to_string(),
            default_ttl_secs: 3_600,
            redis: RedisConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub database: i64,
}

impl RedisConfig {
    /// `host:port` address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connection_url(&self) -> String {
        match self.password.as_deref() {
            Some(password) if !password.is_empty() => format!(
                "redis://:{password}@{}/{}",
                self.addr(),
                self.database
            ),
            _ => format!("redis://{}/{}", self.addr(), self.database),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub dir: Option<PathBuf>,
}

impl CoreConfig {
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML file, then applies environment overrides.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&contents)?;
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (usually `std::env::var`).
    ///
    /// Taking the lookup as a function keeps tests independent of process env.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(prefix) = lookup(ENV_CACHE_PREFIX) {
            self.cache.prefix = prefix;
        }
        if let Some(ttl) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache.default_ttl_secs = ttl.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_CACHE_TTL_SECS} must be seconds, got `{ttl}`"))
            })?;
        }
        if let Some(host) = lookup(ENV_REDIS_HOST) {
            self.cache.redis.host = host;
        }
        if let Some(port) = lookup(ENV_REDIS_PORT) {
            self.cache.redis.port = port.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_REDIS_PORT} must be a port, got `{port}`"))
            })?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = Some(level);
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.cache.prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "cache.prefix cannot be empty".to_string(),
            ));
        }
        if self.cache.redis.port == 0 {
            return Err(ConfigError::Invalid(
                "cache.redis.port cannot be 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheBackend, ConfigError, CoreConfig, ENV_CACHE_PREFIX, ENV_REDIS_PORT};
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert_eq!(config.cache.default_ttl(), Some(Duration::from_secs(3_600)));
    }

    #[test]
    fn parses_nested_sections() {
        let config = CoreConfig::from_toml_str(
            r#"
            [database]
            path = "/tmp/app.db"

            [cache]
            backend = "redis"
            prefix = "shop"
            default_ttl_secs = 0

            [cache.redis]
            host = "cache.internal"
            password = "secret"
            database = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.default_ttl(), None);
        assert_eq!(config.cache.redis.addr(), "cache.internal:6379");
        assert_eq!(
            config.cache.redis.connection_url(),
            "redis://:secret@cache.internal:6379/2"
        );
        assert_eq!(config.database.busy_timeout_ms, 5_000);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [(ENV_CACHE_PREFIX, "tenant-a"), (ENV_REDIS_PORT, "6380")]
            .into_iter()
            .collect();
        let mut config = CoreConfig::default();
        config
            .apply_env_overrides(|name| env.get(name).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.cache.prefix, "tenant-a");
        assert_eq!(config.cache.redis.port, 6380);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let mut config = CoreConfig::default();
        let err = config
            .apply_env_overrides(|name| (name == ENV_REDIS_PORT).then(|| "not-a-port".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_prefix_fails_validation() {
        let err = CoreConfig::from_toml_str("[cache]\nprefix = \"\"").unwrap_err();
        assert!(err.to_string().contains("prefix"));
    }
}
