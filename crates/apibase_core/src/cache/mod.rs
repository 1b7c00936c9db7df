//! Key/value cache provider capability used for read-through repository caching.
//!
//! # Responsibility
//! - Define the scalar, hash and set operations repositories rely on.
//! - Namespace keys with a provider-level prefix (`<prefix>:<key>`).
//! - Let entities opt into hash-based caching via [`CacheableObject`].
//!
//! # Invariants
//! - A `None` or zero TTL means "provider default", never "no expiry".
//! - [`INFINITE_TTL`] is the only way to request an effectively unbounded TTL.

mod client;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use client::{default_client, init_default_client, new_client, SharedCacheProvider};
pub use memory::MemoryCacheProvider;
#[cfg(feature = "redis")]
pub use self::redis::RedisCacheProvider;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Legacy "never expires" sentinel. Must stay a huge positive duration.
pub const INFINITE_TTL: Duration = Duration::from_secs(99_999 * 60 * 60);

pub const KEY_SEPARATOR: char = ':';

/// Field-name to string mapping stored under one hash key.
pub type CacheMap = HashMap<String, String>;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    KeyNotFound {
        key: String,
    },
    WrongType {
        key: String,
        expected: &'static str,
    },
    Serialization(serde_json::Error),
    /// Cached object data could not be mapped back onto the object.
    InvalidObject(String),
    Backend {
        operation: &'static str,
        cause: String,
    },
    NotInitialized,
    AlreadyInitialized {
        prefix: String,
    },
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeyNotFound { key } => write!(f, "cache key not found: {key}"),
            Self::WrongType { key, expected } => {
                write!(f, "cache key `{key}` does not hold a {expected}")
            }
            Self::Serialization(err) => write!(f, "cache serialization failed: {err}"),
            Self::InvalidObject(message) => write!(f, "invalid cached object: {message}"),
            Self::Backend { operation, cause } => {
                write!(f, "cache operation `{operation}` failed: {cause}")
            }
            Self::NotInitialized => write!(f, "cache provider not initialized"),
            Self::AlreadyInitialized { prefix } => {
                write!(f, "cache provider already initialized with prefix `{prefix}`")
            }
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Value shapes accepted by [`CacheProvider::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheValue {
    Text(String),
    Map(CacheMap),
    Set(Vec<String>),
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<CacheMap> for CacheValue {
    fn from(value: CacheMap) -> Self {
        Self::Map(value)
    }
}

/// Joins `prefix` and `key`, leaving already-namespaced keys untouched.
pub fn namespaced_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        return key.to_string();
    }
    if key
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with(KEY_SEPARATOR))
    {
        return key.to_string();
    }
    format!("{prefix}{KEY_SEPARATOR}{key}")
}

/// Anything addressable by a cache key.
pub trait Cacheable {
    fn cache_key(&self) -> String;

    /// TTL for this object; `None` defers to the provider default.
    fn cache_ttl(&self) -> Option<Duration> {
        None
    }
}

/// Object stored as a field-name to string hash.
pub trait CacheableObject: Cacheable {
    fn get_cache_object(&self) -> CacheMap;
    fn set_cache_object(&mut self, data: CacheMap) -> CacheResult<()>;
}

/// Cache engine capability. Implementations own their concurrency safety.
pub trait CacheProvider: Send + Sync {
    fn exists(&self, key: &str) -> CacheResult<bool>;
    fn is_hash(&self, key: &str) -> CacheResult<bool>;

    fn get(&self, key: &str) -> CacheResult<String>;
    fn save(&self, key: &str, value: &CacheValue, ttl: Option<Duration>) -> CacheResult<()>;
    fn delete(&self, key: &str) -> CacheResult<()>;
    /// Remaining lifetime; `None` when the key never expires.
    fn ttl(&self, key: &str) -> CacheResult<Option<Duration>>;
    /// Returns `false` when the key does not exist.
    fn update_ttl(&self, key: &str, ttl: Option<Duration>) -> CacheResult<bool>;

    /// Returns an empty map for a missing key.
    fn get_map(&self, key: &str) -> CacheResult<CacheMap>;
    fn get_map_keys(&self, key: &str, fields: &[&str]) -> CacheResult<CacheMap>;
    fn get_map_value(&self, key: &str, field: &str) -> CacheResult<String>;
    fn map_key_exists(&self, key: &str, field: &str) -> CacheResult<bool>;
    fn set_map_value(&self, key: &str, field: &str, value: &str) -> CacheResult<bool>;
    fn save_map(&self, key: &str, map: &CacheMap, ttl: Option<Duration>) -> CacheResult<()>;

    /// Returns members sorted ascending; empty for a missing key.
    fn get_set(&self, key: &str) -> CacheResult<Vec<String>>;
    fn save_set(&self, key: &str, members: &[String], ttl: Option<Duration>) -> CacheResult<()>;
    /// Returns whether at least one member was added.
    fn add_set_members(&self, key: &str, members: &[&str]) -> CacheResult<bool>;
    /// Returns whether at least one member was removed.
    fn remove_set_members(&self, key: &str, members: &[&str]) -> CacheResult<bool>;
    fn in_set(&self, key: &str, member: &str) -> CacheResult<bool>;

    fn prefix(&self) -> &str;
    fn set_prefix(&mut self, prefix: &str);

    /// Verifies the backend is reachable.
    fn ping(&self) -> CacheResult<()>;
}

/// Convenience operations derived from [`CacheProvider`].
pub trait CacheProviderExt: CacheProvider {
    /// `exists` with errors read as "missing".
    fn must_exist(&self, key: &str) -> bool {
        self.exists(key).unwrap_or(false)
    }

    fn save_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.save(key, &CacheValue::Text(encoded), ttl)
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        let raw = self.get(key)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save_obj<O: CacheableObject + ?Sized>(&self, object: &O) -> CacheResult<()> {
        self.save_map(
            &object.cache_key(),
            &object.get_cache_object(),
            object.cache_ttl(),
        )
    }

    /// Fills `object` from its cached hash.
    fn load_obj<O: CacheableObject + ?Sized>(&self, object: &mut O) -> CacheResult<()> {
        let key = object.cache_key();
        if !self.must_exist(&key) {
            return Err(CacheError::KeyNotFound { key });
        }
        let data = self.get_map(&key)?;
        object.set_cache_object(data)
    }
}

impl<P: CacheProvider + ?Sized> CacheProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::{namespaced_key, INFINITE_TTL};
    use std::time::Duration;

    #[test]
    fn keys_are_prefixed_once() {
        assert_eq!(namespaced_key("app", "user:1"), "app:user:1");
        assert_eq!(namespaced_key("app", "app:user:1"), "app:user:1");
    }

    #[test]
    fn prefix_must_end_at_separator() {
        assert_eq!(
            namespaced_key("apibase", "apibase_users:1"),
            "apibase:apibase_users:1"
        );
        assert_eq!(namespaced_key("app", "app"), "app:app");
    }

    #[test]
    fn infinite_ttl_is_a_huge_positive_duration() {
        assert_eq!(INFINITE_TTL, Duration::from_secs(99_999 * 3_600));
    }
}
