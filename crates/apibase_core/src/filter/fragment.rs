//! Condition fragments: SQL boolean text plus ordered bound values.
//!
//! # Responsibility
//! - Count positional placeholders in condition text.
//! - Enforce placeholder/value arity whenever a value list changes.
//!
//! # Invariants
//! - While a fragment is being built: `placeholders >= values`.
//! - Once finalized: `placeholders == values`.

use super::error::{FilterError, FilterResult};
use super::value::FilterValue;

/// Positional placeholder token recognized in condition text.
pub const PLACEHOLDER: char = '?';

/// Counts `?` placeholders in `condition`, left to right.
pub fn placeholder_count(condition: &str) -> usize {
    condition.matches(PLACEHOLDER).count()
}

/// Verifies that one more value still fits into `condition`.
pub(crate) fn check_capacity(condition: &str, current_values: usize) -> FilterResult<()> {
    let expected = placeholder_count(condition);
    let attempted = current_values + 1;
    if expected < attempted {
        return Err(FilterError::ArityOverflow {
            condition: condition.to_string(),
            expected,
            attempted,
        });
    }
    Ok(())
}

/// Verifies the exact placeholder/value match of a finalized fragment.
pub(crate) fn check_arity(condition: &str, actual: usize) -> FilterResult<()> {
    let expected = placeholder_count(condition);
    if expected > actual {
        return Err(FilterError::ArityDeficit {
            condition: condition.to_string(),
            expected,
            actual,
        });
    }
    if expected < actual {
        return Err(FilterError::ArityOverflow {
            condition: condition.to_string(),
            expected,
            attempted: actual,
        });
    }
    Ok(())
}

/// Free-form condition built from caller-supplied text and values.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereFilter {
    condition: String,
    values: Vec<FilterValue>,
}

impl WhereFilter {
    /// Builds a finalized fragment.
    ///
    /// # Errors
    /// - `EmptyCondition` when `condition` is blank.
    /// - `ArityOverflow`/`ArityDeficit` when the value count does not match
    ///   the placeholder count.
    pub fn new(condition: impl Into<String>, values: Vec<FilterValue>) -> FilterResult<Self> {
        let mut fragment = Self::open(condition)?;
        for value in values {
            fragment.push_value(value)?;
        }
        fragment.finalize()
    }

    /// Opens a fragment with no values yet. Used by the composer.
    pub(crate) fn open(condition: impl Into<String>) -> FilterResult<Self> {
        let condition = condition.into();
        if condition.trim().is_empty() {
            return Err(FilterError::EmptyCondition);
        }
        Ok(Self {
            condition,
            values: Vec::new(),
        })
    }

    /// Attaches the next bound value, failing fast on overflow.
    pub(crate) fn push_value(&mut self, value: FilterValue) -> FilterResult<()> {
        check_capacity(&self.condition, self.values.len())?;
        self.values.push(value);
        Ok(())
    }

    pub(crate) fn finalize(self) -> FilterResult<Self> {
        check_arity(&self.condition, self.values.len())?;
        Ok(self)
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }

    pub fn values(&self) -> &[FilterValue] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::{placeholder_count, WhereFilter};
    use crate::filter::{FilterError, FilterValue};

    #[test]
    fn placeholder_count_scans_every_token() {
        assert_eq!(placeholder_count("active = 1"), 0);
        assert_eq!(placeholder_count("a = ? or b IN (?)"), 2);
    }

    #[test]
    fn new_accepts_matching_arity() {
        let fragment = WhereFilter::new("active = ?", vec![FilterValue::from(1)]).unwrap();
        assert_eq!(fragment.condition(), "active = ?");
        assert_eq!(fragment.values(), &[FilterValue::Integer(1)]);
    }

    #[test]
    fn new_rejects_blank_condition() {
        let err = WhereFilter::new("  ", Vec::new()).unwrap_err();
        assert_eq!(err, FilterError::EmptyCondition);
    }

    #[test]
    fn new_rejects_overflow_at_the_offending_value() {
        let err = WhereFilter::new("a = ?", vec![1.into(), 2.into(), 3.into()]).unwrap_err();
        assert_eq!(
            err,
            FilterError::ArityOverflow {
                condition: "a = ?".to_string(),
                expected: 1,
                attempted: 2,
            }
        );
    }

    #[test]
    fn new_rejects_deficit() {
        let err = WhereFilter::new("a = ? and b = ?", vec![1.into()]).unwrap_err();
        assert_eq!(err.to_string(), "InvalidArgsNum: 'a = ? and b = ?': expected 2 got 1");
    }
}
