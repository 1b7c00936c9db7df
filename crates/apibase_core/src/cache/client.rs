//! Process-wide default cache client.
//!
//! # Invariants
//! - The default client is initialized at most once per process.
//! - Re-initialization with the same prefix returns the existing handle.

use super::{CacheError, CacheProvider, CacheResult, MemoryCacheProvider};
use crate::config::{CacheBackend, CacheConfig};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Shared handle passed explicitly to repositories.
pub type SharedCacheProvider = Arc<dyn CacheProvider>;

static DEFAULT_CLIENT: OnceCell<SharedCacheProvider> = OnceCell::new();

/// Builds a provider for `config` and verifies it is reachable.
///
/// # Errors
/// - Returns [`CacheError::Backend`] when the backend cannot be reached, or
///   when Redis is selected without the `redis` feature.
pub fn new_client(config: &CacheConfig) -> CacheResult<SharedCacheProvider> {
    let client: SharedCacheProvider = match config.backend {
        CacheBackend::Memory => Arc::new(MemoryCacheProvider::from_config(config)),
        CacheBackend::Redis => redis_client(config)?,
    };

    if let Err(err) = client.ping() {
        error!(
            "event=cache_connect module=cache status=error backend={:?} error={err}",
            config.backend
        );
        return Err(err);
    }
    Ok(client)
}

#[cfg(feature = "redis")]
fn redis_client(config: &CacheConfig) -> CacheResult<SharedCacheProvider> {
    Ok(Arc::new(super::RedisCacheProvider::from_config(config)?))
}

#[cfg(not(feature = "redis"))]
fn redis_client(_config: &CacheConfig) -> CacheResult<SharedCacheProvider> {
    Err(CacheError::Backend {
        operation: "connect",
        cause: "redis backend requires the `redis` feature".to_string(),
    })
}

/// Initializes the process-wide default client.
///
/// # Errors
/// - Returns [`CacheError::AlreadyInitialized`] when a client with another
///   prefix is already installed.
pub fn init_default_client(config: &CacheConfig) -> CacheResult<SharedCacheProvider> {
    if let Some(existing) = DEFAULT_CLIENT.get() {
        return reuse_existing(existing, config);
    }

    let installed = DEFAULT_CLIENT.get_or_try_init(|| -> CacheResult<SharedCacheProvider> {
        let client = new_client(config)?;
        info!(
            "event=cache_init module=cache status=ok backend={:?} prefix={}",
            config.backend,
            client.prefix()
        );
        Ok(client)
    })?;
    reuse_existing(installed, config)
}

fn reuse_existing(
    existing: &SharedCacheProvider,
    config: &CacheConfig,
) -> CacheResult<SharedCacheProvider> {
    if existing.prefix() != config.prefix {
        return Err(CacheError::AlreadyInitialized {
            prefix: existing.prefix().to_string(),
        });
    }
    Ok(Arc::clone(existing))
}

/// Returns the default client installed by [`init_default_client`].
pub fn default_client() -> CacheResult<SharedCacheProvider> {
    DEFAULT_CLIENT
        .get()
        .cloned()
        .ok_or(CacheError::NotInitialized)
}

#[cfg(test)]
mod tests {
    use super::{default_client, init_default_client, new_client};
    use crate::cache::CacheError;
    use crate::config::{CacheBackend, CacheConfig};
    use std::sync::Arc;

    #[test]
    fn memory_client_uses_configured_prefix() {
        let config = CacheConfig {
            prefix: "unit".to_string(),
            ..CacheConfig::default()
        };
        let client = new_client(&config).unwrap();
        assert_eq!(client.prefix(), "unit");
    }

    #[cfg(not(feature = "redis"))]
    #[test]
    fn redis_backend_requires_feature() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            ..CacheConfig::default()
        };
        let err = new_client(&config).err().unwrap();
        assert!(matches!(err, CacheError::Backend { .. }));
    }

    #[test]
    fn default_client_is_installed_once() {
        let config = CacheConfig {
            backend: CacheBackend::Memory,
            prefix: "process".to_string(),
            ..CacheConfig::default()
        };
        let first = init_default_client(&config).unwrap();
        let second = init_default_client(&config).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &default_client().unwrap()));

        let conflicting = CacheConfig {
            prefix: "other".to_string(),
            ..config
        };
        let err = init_default_client(&conflicting).err().unwrap();
        assert!(matches!(err, CacheError::AlreadyInitialized { .. }));
    }
}
