//! Read-through caching decorator for entity repositories.
//!
//! # Responsibility
//! - Serve `get_by_id` from the cache provider, populating it on miss.
//! - Invalidate cached objects after successful writes.
//!
//! # Invariants
//! - Cache read failures fall back to storage; the cache never hides rows.
//! - A failed invalidation is surfaced, since it would leave stale data.

use super::entity_repo::EntityRepository;
use super::error::RepoResult;
use crate::cache::{CacheError, CacheProviderExt, CacheableObject, SharedCacheProvider};
use crate::filter::{FilterArg, FilterValue};
use crate::model::entity::RepoEntity;
use crate::query::SelectQuery;
use log::{debug, warn};
use std::marker::PhantomData;

pub struct CachedRepository<T, R> {
    inner: R,
    cache: SharedCacheProvider,
    _entity: PhantomData<fn() -> T>,
}

impl<T, R> CachedRepository<T, R>
where
    T: RepoEntity + CacheableObject,
    R: EntityRepository<T>,
{
    pub fn new(inner: R, cache: SharedCacheProvider) -> Self {
        Self {
            inner,
            cache,
            _entity: PhantomData,
        }
    }

    /// Cache key of the entity with `id`.
    pub fn cache_key_for(id: i64) -> String {
        Self::keyed(id).cache_key()
    }

    /// Empty entity carrying only `id`, enough to address its cache entry.
    fn keyed(id: i64) -> T {
        let mut entity = T::default();
        entity.set_id(id);
        entity
    }

    fn populate(&self, entity: &T) {
        match self.cache.save_obj(entity) {
            Ok(()) => debug!(
                "event=cache_populate module=repo status=ok entity={} id={}",
                T::table_name(),
                entity.id()
            ),
            Err(err) => warn!(
                "event=cache_populate module=repo status=error entity={} id={} error={}",
                T::table_name(),
                entity.id(),
                err
            ),
        }
    }

    fn invalidate(&self, entity: &T) -> RepoResult<()> {
        self.cache.delete(&entity.cache_key())?;
        debug!(
            "event=cache_invalidate module=repo status=ok entity={} id={}",
            T::table_name(),
            entity.id()
        );
        Ok(())
    }
}

impl<T, R> EntityRepository<T> for CachedRepository<T, R>
where
    T: RepoEntity + CacheableObject,
    R: EntityRepository<T>,
{
    fn get_by_id(&self, id: i64) -> RepoResult<T> {
        let mut cached = Self::keyed(id);

        match self.cache.load_obj(&mut cached) {
            Ok(()) => {
                debug!(
                    "event=cache_lookup module=repo status=hit entity={} id={}",
                    T::table_name(),
                    id
                );
                return Ok(cached);
            }
            Err(CacheError::KeyNotFound { .. }) => debug!(
                "event=cache_lookup module=repo status=miss entity={} id={}",
                T::table_name(),
                id
            ),
            Err(err) => warn!(
                "event=cache_lookup module=repo status=error entity={} id={} error={}",
                T::table_name(),
                id,
                err
            ),
        }

        let entity = self.inner.get_by_id(id)?;
        self.populate(&entity);
        Ok(entity)
    }

    fn get_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<T>> {
        self.inner.get_by_ids(ids)
    }

    fn get_by_field(&self, field: &str, value: FilterValue) -> RepoResult<Vec<T>> {
        self.inner.get_by_field(field, value)
    }

    fn get_one(&self, args: Vec<FilterArg>) -> RepoResult<T> {
        self.inner.get_one(args)
    }

    fn get_results(&self, args: Vec<FilterArg>) -> RepoResult<Vec<T>> {
        self.inner.get_results(args)
    }

    fn apply_filters(&self, args: Vec<FilterArg>) -> RepoResult<SelectQuery> {
        self.inner.apply_filters(args)
    }

    fn count(&self, args: Vec<FilterArg>) -> RepoResult<i64> {
        self.inner.count(args)
    }

    fn create(&self, entity: T) -> RepoResult<T> {
        self.inner.create(entity)
    }

    fn update(&self, entity: &T) -> RepoResult<bool> {
        let changed = self.inner.update(entity)?;
        if changed {
            self.invalidate(entity)?;
        }
        Ok(changed)
    }

    fn delete(&self, entity: &T) -> RepoResult<bool> {
        let removed = self.inner.delete(entity)?;
        if removed {
            self.invalidate(entity)?;
        }
        Ok(removed)
    }
}
