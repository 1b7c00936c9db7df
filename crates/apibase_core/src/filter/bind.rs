//! Filterability-checked construction of field filters from untrusted input.
//!
//! # Responsibility
//! - Gate raw field names through the entity's filterability predicate.
//! - Keep non-identifier text out of rendered conditions.
//!
//! # Invariants
//! - A rejected field yields `RepoError::NotFilterable`, never a query error.

use super::field::{FieldFilter, FilterType};
use super::value::FilterValue;
use crate::model::entity::RepoEntity;
use crate::repo::{RepoError, RepoResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Returns whether `field` is a plain SQL identifier.
pub fn is_valid_identifier(field: &str) -> bool {
    IDENTIFIER_RE.is_match(field)
}

/// Builds a [`FieldFilter`] for entity `T` from request-supplied parts.
///
/// Unknown operators degrade to equality (see [`FilterType::parse_lenient`]).
///
/// # Errors
/// - `NotFilterable` when `field` is not an identifier or `T` does not allow
///   filtering on it.
pub fn bind_field_filter<T: RepoEntity>(
    field: &str,
    operator: &str,
    value: impl Into<FilterValue>,
) -> RepoResult<FieldFilter> {
    let field = field.trim();
    if !is_valid_identifier(field) || !T::is_filterable(field) {
        debug!(
            "event=filter_bind module=filter status=rejected entity={} field={:?}",
            T::table_name(),
            field
        );
        return Err(RepoError::NotFilterable {
            field: field.to_string(),
        });
    }

    Ok(FieldFilter::new(
        field,
        FilterType::parse_lenient(operator),
        value,
    ))
}

#[cfg(test)]
mod tests {
    use super::is_valid_identifier;

    #[test]
    fn identifiers_reject_sql_text() {
        assert!(is_valid_identifier("created_at"));
        assert!(is_valid_identifier("_hidden1"));
        assert!(!is_valid_identifier("1st"));
        assert!(!is_valid_identifier("name; DROP TABLE users"));
        assert!(!is_valid_identifier(""));
    }
}
