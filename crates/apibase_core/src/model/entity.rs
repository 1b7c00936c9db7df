//! Entity capability contract consumed by repositories.
//!
//! # Responsibility
//! - Expose identity, storage name and per-field filterability.
//! - Map an entity to and from one SQLite row.
//!
//! # Invariants
//! - `id == 0` means "not yet persisted"; repositories assign the row id on
//!   create.
//! - `columns()` and `column_values()` stay aligned index by index and never
//!   include the id column.

use crate::filter::FilterValue;
use rusqlite::Row;

/// Primary key column shared by every repository-managed table.
pub const ID_COLUMN: &str = "id";

/// Capability set every repository-managed entity implements.
pub trait RepoEntity: Sized + Default {
    /// Unique row identity.
    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Storage (table) name.
    fn table_name() -> &'static str;

    /// Whether untrusted input may filter on `field`.
    fn is_filterable(field: &str) -> bool;

    /// Persisted columns other than [`ID_COLUMN`].
    fn columns() -> &'static [&'static str];

    /// Column values in `columns()` order.
    fn column_values(&self) -> Vec<FilterValue>;

    /// Builds the entity from a row selected with [`ID_COLUMN`] + `columns()`.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}
