//! Redis-backed cache provider.
//!
//! Uses the synchronous `redis` client; a connection is taken per operation.
//! Multi-step writes (replace a hash or set, then expire it) run as one
//! atomic pipeline.

use super::{namespaced_key, CacheError, CacheMap, CacheProvider, CacheResult, CacheValue};
use crate::config::CacheConfig;
use ::redis::{Client, Connection, FromRedisValue, Pipeline};
use std::time::Duration;

/// Key reply of `PTTL` for a missing key.
const PTTL_MISSING: i64 = -2;
/// Key reply of `PTTL` for a key without expiry.
const PTTL_PERSISTENT: i64 = -1;

pub struct RedisCacheProvider {
    client: Client,
    prefix: String,
    default_ttl: Option<Duration>,
}

impl RedisCacheProvider {
    /// Creates a provider for `connection_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid. Reachability is checked by
    /// [`CacheProvider::ping`].
    pub fn new(
        connection_url: &str,
        prefix: impl Into<String>,
        default_ttl: Option<Duration>,
    ) -> CacheResult<Self> {
        let client = Client::open(connection_url).map_err(|err| CacheError::Backend {
            operation: "redis_connect",
            cause: err.to_string(),
        })?;

        Ok(Self {
            client,
            prefix: prefix.into(),
            default_ttl,
        })
    }

    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        Self::new(
            &config.redis.connection_url(),
            config.prefix.clone(),
            config.default_ttl(),
        )
    }

    fn get_connection(&self) -> CacheResult<Connection> {
        self.client
            .get_connection()
            .map_err(|err| backend("redis_get_connection", err))
    }

    fn key(&self, key: &str) -> String {
        namespaced_key(&self.prefix, key)
    }

    fn ttl_millis(&self, ttl: Option<Duration>) -> Option<u64> {
        let ttl = match ttl {
            Some(ttl) if !ttl.is_zero() => Some(ttl),
            _ => self.default_ttl,
        }?;
        Some(u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1))
    }

    fn run<T: FromRedisValue>(
        &self,
        operation: &'static str,
        command: &mut ::redis::Cmd,
    ) -> CacheResult<T> {
        let mut conn = self.get_connection()?;
        command
            .query(&mut conn)
            .map_err(|err| backend(operation, err))
    }

    fn run_pipeline(&self, operation: &'static str, pipeline: &Pipeline) -> CacheResult<()> {
        let mut conn = self.get_connection()?;
        pipeline
            .query::<()>(&mut conn)
            .map_err(|err| backend(operation, err))
    }

    fn key_type(&self, key: &str) -> CacheResult<String> {
        self.run("redis_type", ::redis::cmd("TYPE").arg(self.key(key)))
    }

    /// Fails with [`CacheError::WrongType`] when `key` exists with another shape.
    fn expect_type(&self, key: &str, expected: &'static str) -> CacheResult<()> {
        let actual = self.key_type(key)?;
        if actual == "none" || actual == expected {
            return Ok(());
        }
        Err(CacheError::WrongType {
            key: key.to_string(),
            expected,
        })
    }

    /// Queues `DEL` and an optional `PEXPIRE` around `write`.
    fn replace_atomically(
        &self,
        operation: &'static str,
        key: &str,
        ttl: Option<Duration>,
        write: impl FnOnce(&mut Pipeline, &str),
    ) -> CacheResult<()> {
        let key = self.key(key);
        let mut pipeline = ::redis::pipe();
        pipeline.atomic().cmd("DEL").arg(&key).ignore();
        write(&mut pipeline, &key);
        if let Some(millis) = self.ttl_millis(ttl) {
            pipeline.cmd("PEXPIRE").arg(&key).arg(millis).ignore();
        }
        self.run_pipeline(operation, &pipeline)
    }
}

fn backend(operation: &'static str, err: ::redis::RedisError) -> CacheError {
    CacheError::Backend {
        operation,
        cause: err.to_string(),
    }
}

impl CacheProvider for RedisCacheProvider {
    fn exists(&self, key: &str) -> CacheResult<bool> {
        let count: i64 = self.run("redis_exists", ::redis::cmd("EXISTS").arg(self.key(key)))?;
        Ok(count > 0)
    }

    fn is_hash(&self, key: &str) -> CacheResult<bool> {
        Ok(self.key_type(key)? == "hash")
    }

    fn get(&self, key: &str) -> CacheResult<String> {
        self.expect_type(key, "string")?;
        let value: Option<String> = self.run("redis_get", ::redis::cmd("GET").arg(self.key(key)))?;
        value.ok_or_else(|| CacheError::KeyNotFound {
            key: key.to_string(),
        })
    }

    fn save(&self, key: &str, value: &CacheValue, ttl: Option<Duration>) -> CacheResult<()> {
        match value {
            CacheValue::Text(text) => {
                let mut command = ::redis::cmd("SET");
                command.arg(self.key(key)).arg(text);
                if let Some(millis) = self.ttl_millis(ttl) {
                    command.arg("PX").arg(millis);
                }
                self.run::<()>("redis_set", &mut command)
            }
            CacheValue::Map(map) => self.save_map(key, map, ttl),
            CacheValue::Set(members) => self.save_set(key, members, ttl),
        }
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.run::<()>("redis_del", ::redis::cmd("DEL").arg(self.key(key)))
    }

    fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        let millis: i64 = self.run("redis_pttl", ::redis::cmd("PTTL").arg(self.key(key)))?;
        match millis {
            PTTL_MISSING => Err(CacheError::KeyNotFound {
                key: key.to_string(),
            }),
            PTTL_PERSISTENT => Ok(None),
            millis => Ok(Some(Duration::from_millis(
                u64::try_from(millis).unwrap_or_default(),
            ))),
        }
    }

    fn update_ttl(&self, key: &str, ttl: Option<Duration>) -> CacheResult<bool> {
        match self.ttl_millis(ttl) {
            Some(millis) => {
                let updated: i64 = self.run(
                    "redis_pexpire",
                    ::redis::cmd("PEXPIRE").arg(self.key(key)).arg(millis),
                )?;
                Ok(updated == 1)
            }
            None => {
                if !self.exists(key)? {
                    return Ok(false);
                }
                self.run::<()>("redis_persist", ::redis::cmd("PERSIST").arg(self.key(key)))?;
                Ok(true)
            }
        }
    }

    fn get_map(&self, key: &str) -> CacheResult<CacheMap> {
        self.expect_type(key, "hash")?;
        self.run("redis_hgetall", ::redis::cmd("HGETALL").arg(self.key(key)))
    }

    fn get_map_keys(&self, key: &str, fields: &[&str]) -> CacheResult<CacheMap> {
        if fields.is_empty() {
            return Ok(CacheMap::new());
        }
        self.expect_type(key, "hash")?;
        let values: Vec<Option<String>> = self.run(
            "redis_hmget",
            ::redis::cmd("HMGET").arg(self.key(key)).arg(fields),
        )?;

        Ok(fields
            .iter()
            .zip(values)
            .filter_map(|(field, value)| value.map(|value| (field.to_string(), value)))
            .collect())
    }

    fn get_map_value(&self, key: &str, field: &str) -> CacheResult<String> {
        self.expect_type(key, "hash")?;
        let value: Option<String> = self.run(
            "redis_hget",
            ::redis::cmd("HGET").arg(self.key(key)).arg(field),
        )?;
        value.ok_or_else(|| CacheError::KeyNotFound {
            key: format!("{key}[{field}]"),
        })
    }

    fn map_key_exists(&self, key: &str, field: &str) -> CacheResult<bool> {
        self.expect_type(key, "hash")?;
        self.run(
            "redis_hexists",
            ::redis::cmd("HEXISTS").arg(self.key(key)).arg(field),
        )
    }

    fn set_map_value(&self, key: &str, field: &str, value: &str) -> CacheResult<bool> {
        self.expect_type(key, "hash")?;
        self.run::<()>(
            "redis_hset",
            ::redis::cmd("HSET").arg(self.key(key)).arg(field).arg(value),
        )?;
        Ok(true)
    }

    fn save_map(&self, key: &str, map: &CacheMap, ttl: Option<Duration>) -> CacheResult<()> {
        self.replace_atomically("redis_save_map", key, ttl, |pipeline, key| {
            if map.is_empty() {
                return;
            }
            let command = pipeline.cmd("HSET").arg(key);
            for (field, value) in map {
                command.arg(field).arg(value);
            }
            command.ignore();
        })
    }

    fn get_set(&self, key: &str) -> CacheResult<Vec<String>> {
        self.expect_type(key, "set")?;
        let mut members: Vec<String> =
            self.run("redis_smembers", ::redis::cmd("SMEMBERS").arg(self.key(key)))?;
        members.sort();
        Ok(members)
    }

    fn save_set(&self, key: &str, members: &[String], ttl: Option<Duration>) -> CacheResult<()> {
        self.replace_atomically("redis_save_set", key, ttl, |pipeline, key| {
            if !members.is_empty() {
                pipeline.cmd("SADD").arg(key).arg(members).ignore();
            }
        })
    }

    fn add_set_members(&self, key: &str, members: &[&str]) -> CacheResult<bool> {
        if members.is_empty() {
            return Ok(false);
        }
        let added: i64 = self.run(
            "redis_sadd",
            ::redis::cmd("SADD").arg(self.key(key)).arg(members),
        )?;
        Ok(added > 0)
    }

    fn remove_set_members(&self, key: &str, members: &[&str]) -> CacheResult<bool> {
        if members.is_empty() {
            return Ok(false);
        }
        let removed: i64 = self.run(
            "redis_srem",
            ::redis::cmd("SREM").arg(self.key(key)).arg(members),
        )?;
        Ok(removed > 0)
    }

    fn in_set(&self, key: &str, member: &str) -> CacheResult<bool> {
        self.run(
            "redis_sismember",
            ::redis::cmd("SISMEMBER").arg(self.key(key)).arg(member),
        )
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_string();
    }

    fn ping(&self) -> CacheResult<()> {
        let reply: String = self.run("redis_ping", &mut ::redis::cmd("PING"))?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Backend {
                operation: "redis_ping",
                cause: format!("unexpected reply `{reply}`"),
            })
        }
    }
}
