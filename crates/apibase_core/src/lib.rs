//! Composable query filters and generic repositories over SQLite, with an
//! optional read-through cache.

pub mod cache;
pub mod config;
pub mod convert;
pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;

pub use cache::{CacheError, CacheProvider, CacheProviderExt, Cacheable, CacheableObject};
pub use config::{CoreConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use filter::{
    prepare_filters, FieldFilter, Filter, FilterArg, FilterError, FilterType, FilterValue, Pager,
    QueryFilter, RawFilter, WhereFilter,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::RepoEntity;
pub use query::SelectQuery;
pub use repo::{
    CachedRepository, EmptyRepository, EntityRepository, RepoError, RepoResult,
    SqliteEntityRepository,
};

/// Minimal health-check API for smoke probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
