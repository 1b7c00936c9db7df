//! Repository layer over composed filters.
//!
//! # Responsibility
//! - Define the entity repository contract consumed by services.
//! - Isolate SQLite statements and cache lookups from callers.
//!
//! # Invariants
//! - Repositories never mutate the filters they are given.
//! - Semantic errors (`NotFound`, `NotFilterable`) stay distinct from
//!   collaborator failures (`Query`, `Cache`).

pub mod cached_repo;
pub mod entity_repo;
mod error;

pub use cached_repo::CachedRepository;
pub use entity_repo::{build_query, EmptyRepository, EntityRepository, SqliteEntityRepository};
pub use error::{RepoError, RepoResult};
