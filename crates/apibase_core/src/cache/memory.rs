//! In-process cache provider.
//!
//! # Responsibility
//! - Implement the full cache capability without an external engine.
//! - Serve tests and single-process deployments.
//!
//! # Invariants
//! - Expired entries are never observable; they are dropped on access.
//! - One mutex guards the whole keyspace, so every operation is atomic.

use super::{
    namespaced_key, CacheError, CacheMap, CacheProvider, CacheResult, CacheValue,
};
use crate::config::CacheConfig;
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Stored {
    Text(String),
    Map(CacheMap),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Stored,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Mutex-guarded in-memory keyspace with lazy expiry.
#[derive(Debug)]
pub struct MemoryCacheProvider {
    prefix: String,
    default_ttl: Option<Duration>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheProvider {
    pub fn new(prefix: impl Into<String>, default_ttl: Option<Duration>) -> Self {
        Self {
            prefix: prefix.into(),
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.prefix.clone(), config.default_ttl())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, key: &str) -> String {
        namespaced_key(&self.prefix, key)
    }

    fn deadline(&self, ttl: Option<Duration>) -> Option<Instant> {
        let ttl = match ttl {
            Some(ttl) if !ttl.is_zero() => Some(ttl),
            _ => self.default_ttl,
        }?;
        Instant::now().checked_add(ttl)
    }

    /// Runs `f` over the live entry for `key`, dropping it first when expired.
    fn with_entry<R>(&self, key: &str, f: impl FnOnce(Option<&mut Entry>) -> R) -> R {
        let key = self.key(key);
        let mut entries = self.entries.lock();
        drop_expired(&mut entries, &key);
        f(entries.get_mut(&key))
    }

    fn insert(&self, key: &str, value: Stored, ttl: Option<Duration>) {
        let entry = Entry {
            value,
            expires_at: self.deadline(ttl),
        };
        self.entries.lock().insert(self.key(key), entry);
    }

    fn with_map<R>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&CacheMap>) -> R,
    ) -> CacheResult<R> {
        self.with_entry(key, |entry| match entry {
            None => Ok(f(None)),
            Some(Entry {
                value: Stored::Map(map),
                ..
            }) => Ok(f(Some(&*map))),
            Some(_) => Err(wrong_type(key, "hash")),
        })
    }

    fn with_set<R>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&mut BTreeSet<String>>) -> R,
    ) -> CacheResult<R> {
        self.with_entry(key, |entry| match entry {
            None => Ok(f(None)),
            Some(Entry {
                value: Stored::Set(set),
                ..
            }) => Ok(f(Some(set))),
            Some(_) => Err(wrong_type(key, "set")),
        })
    }
}

fn drop_expired(entries: &mut HashMap<String, Entry>, key: &str) {
    if entries
        .get(key)
        .is_some_and(|entry| entry.is_expired(Instant::now()))
    {
        entries.remove(key);
    }
}

fn wrong_type(key: &str, expected: &'static str) -> CacheError {
    CacheError::WrongType {
        key: key.to_string(),
        expected,
    }
}

impl CacheProvider for MemoryCacheProvider {
    fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.with_entry(key, |entry| entry.is_some()))
    }

    fn is_hash(&self, key: &str) -> CacheResult<bool> {
        Ok(self.with_entry(key, |entry| {
            matches!(
                entry,
                Some(Entry {
                    value: Stored::Map(_),
                    ..
                })
            )
        }))
    }

    fn get(&self, key: &str) -> CacheResult<String> {
        self.with_entry(key, |entry| match entry {
            None => Err(CacheError::KeyNotFound {
                key: key.to_string(),
            }),
            Some(Entry {
                value: Stored::Text(text),
                ..
            }) => Ok(text.clone()),
            Some(_) => Err(wrong_type(key, "string")),
        })
    }

    fn save(&self, key: &str, value: &CacheValue, ttl: Option<Duration>) -> CacheResult<()> {
        match value {
            CacheValue::Text(text) => {
                self.insert(key, Stored::Text(text.clone()), ttl);
                Ok(())
            }
            CacheValue::Map(map) => self.save_map(key, map, ttl),
            CacheValue::Set(members) => self.save_set(key, members, ttl),
        }
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().remove(&self.key(key));
        Ok(())
    }

    fn ttl(&self, key: &str) -> CacheResult<Option<Duration>> {
        self.with_entry(key, |entry| match entry {
            None => Err(CacheError::KeyNotFound {
                key: key.to_string(),
            }),
            Some(entry) => Ok(entry
                .expires_at
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))),
        })
    }

    fn update_ttl(&self, key: &str, ttl: Option<Duration>) -> CacheResult<bool> {
        let deadline = self.deadline(ttl);
        Ok(self.with_entry(key, |entry| match entry {
            None => false,
            Some(entry) => {
                entry.expires_at = deadline;
                true
            }
        }))
    }

    fn get_map(&self, key: &str) -> CacheResult<CacheMap> {
        self.with_map(key, |map| map.cloned().unwrap_or_default())
    }

    fn get_map_keys(&self, key: &str, fields: &[&str]) -> CacheResult<CacheMap> {
        self.with_map(key, |map| {
            let Some(map) = map else {
                return CacheMap::new();
            };
            fields
                .iter()
                .filter_map(|field| {
                    map.get(*field)
                        .map(|value| (field.to_string(), value.clone()))
                })
                .collect()
        })
    }

    fn get_map_value(&self, key: &str, field: &str) -> CacheResult<String> {
        self.with_map(key, |map| map.and_then(|map| map.get(field).cloned()))?
            .ok_or_else(|| CacheError::KeyNotFound {
                key: format!("{key}[{field}]"),
            })
    }

    fn map_key_exists(&self, key: &str, field: &str) -> CacheResult<bool> {
        self.with_map(key, |map| map.is_some_and(|map| map.contains_key(field)))
    }

    fn set_map_value(&self, key: &str, field: &str, value: &str) -> CacheResult<bool> {
        let namespaced = self.key(key);
        let mut entries = self.entries.lock();
        drop_expired(&mut entries, &namespaced);

        let entry = entries.entry(namespaced).or_insert_with(|| Entry {
            value: Stored::Map(CacheMap::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Stored::Map(map) => {
                map.insert(field.to_string(), value.to_string());
                Ok(true)
            }
            _ => Err(wrong_type(key, "hash")),
        }
    }

    fn save_map(&self, key: &str, map: &CacheMap, ttl: Option<Duration>) -> CacheResult<()> {
        self.insert(key, Stored::Map(map.clone()), ttl);
        Ok(())
    }

    fn get_set(&self, key: &str) -> CacheResult<Vec<String>> {
        self.with_set(key, |set| {
            set.map(|set| set.iter().cloned().collect())
                .unwrap_or_default()
        })
    }

    fn save_set(&self, key: &str, members: &[String], ttl: Option<Duration>) -> CacheResult<()> {
        self.insert(key, Stored::Set(members.iter().cloned().collect()), ttl);
        Ok(())
    }

    fn add_set_members(&self, key: &str, members: &[&str]) -> CacheResult<bool> {
        let namespaced = self.key(key);
        let mut entries = self.entries.lock();
        drop_expired(&mut entries, &namespaced);

        let entry = entries.entry(namespaced).or_insert_with(|| Entry {
            value: Stored::Set(BTreeSet::new()),
            expires_at: None,
        });
        match &mut entry.value {
            Stored::Set(set) => Ok(members
                .iter()
                .fold(false, |added, member| set.insert(member.to_string()) || added)),
            _ => Err(wrong_type(key, "set")),
        }
    }

    fn remove_set_members(&self, key: &str, members: &[&str]) -> CacheResult<bool> {
        self.with_set(key, |set| {
            let Some(set) = set else {
                return false;
            };
            members
                .iter()
                .fold(false, |removed, member| set.remove(*member) || removed)
        })
    }

    fn in_set(&self, key: &str, member: &str) -> CacheResult<bool> {
        self.with_set(key, |set| set.is_some_and(|set| set.contains(member)))
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn set_prefix(&mut self, prefix: &str) {
        self.prefix = prefix.to_string();
    }

    fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}
