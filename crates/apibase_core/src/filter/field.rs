//! Field-comparison filters over a closed operator set.
//!
//! # Responsibility
//! - Render `<field> <operator> ?` style conditions with the right arity.
//! - Coerce the compared value into canonical text before binding.
//!
//! # Invariants
//! - An absent/empty value renders an empty condition and no values, so the
//!   composer drops the filter as a no-op.
//! - `IN`/`NOT IN` bind one collection placeholder; `BETWEEN` binds two.
//! - Unknown operator strings degrade to equality with a warning.

use super::error::{FilterError, FilterResult};
use super::fragment::check_capacity;
use super::value::FilterValue;
use log::warn;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Comparison operator of a [`FieldFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterType {
    #[default]
    Equal,
    NotEqual,
    GreaterEqual,
    Greater,
    LessEqual,
    Less,
    Like,
    In,
    NotIn,
    Between,
    NotNull,
}

const ALL_FILTER_TYPES: &[FilterType] = &[
    FilterType::Equal,
    FilterType::NotEqual,
    FilterType::GreaterEqual,
    FilterType::Greater,
    FilterType::LessEqual,
    FilterType::Less,
    FilterType::Like,
    FilterType::In,
    FilterType::NotIn,
    FilterType::Between,
    FilterType::NotNull,
];

impl FilterType {
    /// SQL operator text.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterEqual => ">=",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::Less => "<",
            Self::Like => "LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::NotNull => "IS NOT NULL",
        }
    }

    /// Short mnemonic code accepted from request payloads.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Equal => "eq",
            Self::NotEqual => "ne",
            Self::GreaterEqual => "ge",
            Self::Greater => "gt",
            Self::LessEqual => "le",
            Self::Less => "lt",
            Self::Like => "like",
            Self::In => "in",
            Self::NotIn => "nin",
            Self::Between => "between",
            Self::NotNull => "notnull",
        }
    }

    /// Parses an operator, degrading unknown input to [`FilterType::Equal`].
    ///
    /// The fallback keeps loosely-validated callers working; it is always
    /// paired with a warning line.
    pub fn parse_lenient(value: &str) -> Self {
        match value.parse::<FilterType>() {
            Ok(filter_type) => filter_type,
            Err(_) => {
                warn!(
                    "event=filter_operator_fallback module=filter status=degraded operator={:?} fallback={}",
                    value,
                    FilterType::Equal.as_sql()
                );
                FilterType::Equal
            }
        }
    }
}

impl FromStr for FilterType {
    type Err = FilterError;

    /// Accepts both symbolic SQL operators and mnemonic codes, case-insensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_uppercase();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");
        ALL_FILTER_TYPES
            .iter()
            .copied()
            .find(|candidate| {
                candidate.as_sql() == normalized
                    || candidate.mnemonic().eq_ignore_ascii_case(&normalized)
            })
            .or(match normalized.as_str() {
                "==" => Some(Self::Equal),
                "<>" => Some(Self::NotEqual),
                _ => None,
            })
            .ok_or_else(|| FilterError::UnknownOperator(value.to_string()))
    }
}

impl Display for FilterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `<field> <operator> <value>` comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub filter_type: FilterType,
    pub value: FilterValue,
    extra_values: Vec<FilterValue>,
}

impl FieldFilter {
    pub fn new(
        field: impl Into<String>,
        filter_type: FilterType,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            filter_type,
            value: value.into(),
            extra_values: Vec::new(),
        }
    }

    /// Builds a filter from an operator string, degrading unknown operators.
    pub fn parse(field: impl Into<String>, operator: &str, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterType::parse_lenient(operator), value)
    }

    pub fn equals(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterType::Equal, value)
    }

    pub fn is_in(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterType::In, value)
    }

    pub fn between(
        field: impl Into<String>,
        low: impl Into<FilterValue>,
        high: impl Into<FilterValue>,
    ) -> Self {
        Self::new(
            field,
            FilterType::Between,
            FilterValue::List(vec![low.into(), high.into()]),
        )
    }

    /// Returns whether this filter carries no usable value.
    pub fn is_noop(&self) -> bool {
        self.value.is_empty()
    }

    pub fn condition(&self) -> String {
        if self.is_noop() {
            return String::new();
        }

        match self.filter_type {
            FilterType::In | FilterType::NotIn => {
                format!("{} {} (?)", self.field, self.filter_type)
            }
            FilterType::Between => format!("{} BETWEEN ? AND ?", self.field),
            FilterType::NotNull => format!("{} IS NOT NULL", self.field),
            other => format!("{} {} ?", self.field, other),
        }
    }

    /// Bound values in placeholder order, coerced to canonical text.
    pub fn values(&self) -> Vec<FilterValue> {
        if self.is_noop() {
            return Vec::new();
        }

        let mut values = match (self.filter_type, &self.value) {
            (FilterType::NotNull, _) => Vec::new(),
            (FilterType::In | FilterType::NotIn, value) => {
                vec![match value {
                    FilterValue::List(_) => value.coerce_to_text(),
                    scalar => FilterValue::List(vec![scalar.coerce_to_text()]),
                }]
            }
            (FilterType::Between, FilterValue::List(bounds)) => {
                bounds.iter().map(FilterValue::coerce_to_text).collect()
            }
            (_, value) => vec![value.coerce_to_text()],
        };
        values.extend(self.extra_values.iter().map(FilterValue::coerce_to_text));
        values
    }

    /// Attaches a trailing bound value (e.g. the upper bound of `BETWEEN`).
    pub(crate) fn push_value(&mut self, value: FilterValue) -> FilterResult<()> {
        check_capacity(&self.condition(), self.values().len())?;
        self.extra_values.push(value);
        Ok(())
    }
}
