//! Composable query-filter algebra.
//!
//! # Responsibility
//! - Model condition fragments (text + bound values) as immutable values.
//! - Compose loosely-typed argument lists into validated fragment sequences.
//!
//! # Invariants
//! - Every fragment emitted by [`prepare_filters`] satisfies
//!   `placeholder_count(condition) == values.len()`.
//! - Filters never mutate a query in place; `apply_to` returns a new query.

mod bind;
mod compose;
mod error;
mod field;
mod fragment;
mod pager;
mod raw;
mod value;

pub use bind::{bind_field_filter, is_valid_identifier};
pub use compose::{prepare_filters, FilterArg};
pub use error::{FilterError, FilterResult};
pub use field::{FieldFilter, FilterType};
pub use fragment::{placeholder_count, WhereFilter, PLACEHOLDER};
pub use pager::Pager;
pub use raw::RawFilter;
pub use value::FilterValue;

use crate::query::SelectQuery;

/// Capability set shared by every filter variant.
pub trait Filter {
    /// SQL boolean expression (or pagination clause). Empty means no-op.
    fn condition(&self) -> String;
    /// Bound values in placeholder order.
    fn values(&self) -> Vec<FilterValue>;
    /// Applies this filter to `query`, returning the extended query.
    fn apply_to(&self, query: SelectQuery) -> SelectQuery;
}

/// Closed set of filter variants produced by the composer.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Field(FieldFilter),
    Raw(RawFilter),
    Pager(Pager),
    Where(WhereFilter),
}

impl QueryFilter {
    /// Returns whether this filter renders nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Field(filter) => filter.is_noop(),
            Self::Pager(pager) => pager.is_noop(),
            Self::Raw(raw) => raw.condition().trim().is_empty(),
            Self::Where(_) => false,
        }
    }
}

impl Filter for QueryFilter {
    fn condition(&self) -> String {
        match self {
            Self::Field(filter) => filter.condition(),
            Self::Raw(raw) => raw.condition().to_string(),
            Self::Pager(pager) => pager.condition(),
            Self::Where(fragment) => fragment.condition().to_string(),
        }
    }

    fn values(&self) -> Vec<FilterValue> {
        match self {
            Self::Field(filter) => filter.values(),
            Self::Raw(_) | Self::Pager(_) => Vec::new(),
            Self::Where(fragment) => fragment.values().to_vec(),
        }
    }

    fn apply_to(&self, query: SelectQuery) -> SelectQuery {
        if self.is_noop() {
            return query;
        }
        match self {
            Self::Pager(pager) => query.paginate(u64::from(pager.limit), pager.offset()),
            other => query.and_where(other.condition(), other.values()),
        }
    }
}

/// Applies `filters`, in order, to `query`.
pub fn apply_all(query: SelectQuery, filters: &[QueryFilter]) -> SelectQuery {
    filters
        .iter()
        .fold(query, |query, filter| filter.apply_to(query))
}

impl From<FieldFilter> for QueryFilter {
    fn from(value: FieldFilter) -> Self {
        Self::Field(value)
    }
}

impl From<RawFilter> for QueryFilter {
    fn from(value: RawFilter) -> Self {
        Self::Raw(value)
    }
}

impl From<Pager> for QueryFilter {
    fn from(value: Pager) -> Self {
        Self::Pager(value)
    }
}

impl From<WhereFilter> for QueryFilter {
    fn from(value: WhereFilter) -> Self {
        Self::Where(value)
    }
}
