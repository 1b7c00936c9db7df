//! Entity contracts shared by repositories and filters.
//!
//! # Invariants
//! - Entities are identified by a positive `i64` row id once persisted.

pub mod entity;
