//! Variadic filter-argument composer.
//!
//! # Responsibility
//! - Classify each argument as a filter, a condition string or a bound value.
//! - Group them, left to right, into validated filter fragments.
//!
//! # Invariants
//! - At most one fragment is open at any time; a filter or condition string
//!   closes it before opening the next one.
//! - Bound values only ever attach to the open fragment, after a capacity
//!   check, so an overflow fails at the offending argument. Raw fragments
//!   never take values.
//! - Closed fragments satisfy exact arity (raw fragments excepted) and no-op
//!   fragments are dropped.

use super::error::{FilterError, FilterResult};
use super::field::FieldFilter;
use super::fragment::{check_arity, check_capacity, WhereFilter};
use super::pager::Pager;
use super::raw::RawFilter;
use super::value::FilterValue;
use super::{Filter, QueryFilter};

/// One element of a loosely-typed filter argument list.
///
/// String literals convert to [`FilterArg::Condition`]; bind text values with
/// [`FilterValue::text`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    Filter(QueryFilter),
    Condition(String),
    Value(FilterValue),
}

/// Builds a `Vec<FilterArg>` from mixed arguments.
///
/// ```
/// use apibase_core::filter::{FieldFilter, FilterValue};
/// use apibase_core::filter_args;
///
/// let args = filter_args!["status = ?", FilterValue::text("active"), FieldFilter::equals("id", 7)];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! filter_args {
    () => {
        ::std::vec::Vec::<$crate::filter::FilterArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::filter::FilterArg::from($arg)),+]
    };
}

enum ComposerState {
    Idle,
    Open(QueryFilter),
}

impl ComposerState {
    fn open(filter: QueryFilter) -> Self {
        Self::Open(filter)
    }

    fn attach(self, value: FilterValue) -> FilterResult<Self> {
        let filter = match self {
            Self::Idle => {
                return Err(FilterError::UnsupportedArgument(format!(
                    "bound value {value} has no open condition"
                )));
            }
            Self::Open(filter) => filter,
        };

        let filter = match filter {
            QueryFilter::Where(mut fragment) => {
                fragment.push_value(value)?;
                QueryFilter::Where(fragment)
            }
            QueryFilter::Field(mut field) => {
                field.push_value(value)?;
                QueryFilter::Field(field)
            }
            QueryFilter::Raw(raw) => {
                return Err(FilterError::UnsupportedArgument(format!(
                    "bound value {value} cannot attach to raw fragment '{}'",
                    raw.condition()
                )));
            }
            QueryFilter::Pager(pager) => {
                check_capacity(&pager.condition(), 0)?;
                QueryFilter::Pager(pager)
            }
        };
        Ok(Self::Open(filter))
    }

    fn close_into(self, prepared: &mut Vec<QueryFilter>) -> FilterResult<()> {
        let filter = match self {
            Self::Idle => return Ok(()),
            Self::Open(filter) => filter,
        };

        if !matches!(filter, QueryFilter::Raw(_)) {
            check_arity(&filter.condition(), filter.values().len())?;
        }
        if !filter.is_noop() {
            prepared.push(filter);
        }
        Ok(())
    }
}

/// Turns a mixed argument list into an ordered sequence of filters.
///
/// # Errors
/// - `EmptyCondition` for a blank condition string.
/// - `ArityOverflow` when a value exceeds the open condition's placeholders.
/// - `ArityDeficit` when a closed condition lacks values.
/// - `UnsupportedArgument` when a value precedes any condition or follows a
///   raw fragment.
pub fn prepare_filters<I>(args: I) -> FilterResult<Vec<QueryFilter>>
where
    I: IntoIterator<Item = FilterArg>,
{
    let mut prepared = Vec::new();
    let mut state = ComposerState::Idle;

    for arg in args {
        state = match arg {
            FilterArg::Filter(filter) => {
                state.close_into(&mut prepared)?;
                ComposerState::open(filter)
            }
            FilterArg::Condition(text) => {
                state.close_into(&mut prepared)?;
                ComposerState::open(QueryFilter::Where(WhereFilter::open(text)?))
            }
            FilterArg::Value(value) => state.attach(value)?,
        };
    }
    state.close_into(&mut prepared)?;

    Ok(prepared)
}

impl From<&str> for FilterArg {
    fn from(value: &str) -> Self {
        Self::Condition(value.to_string())
    }
}

impl From<String> for FilterArg {
    fn from(value: String) -> Self {
        Self::Condition(value)
    }
}

impl From<FilterValue> for FilterArg {
    fn from(value: FilterValue) -> Self {
        Self::Value(value)
    }
}

impl From<QueryFilter> for FilterArg {
    fn from(value: QueryFilter) -> Self {
        Self::Filter(value)
    }
}

macro_rules! impl_filter_arg_from {
    ($variant:ident => $($ty:ty),*) => {
        $(
            impl From<$ty> for FilterArg {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_filter_arg_from!(Filter => FieldFilter, RawFilter, Pager, WhereFilter);
impl_filter_arg_from!(Value => i32, i64, u32, f64, bool, Vec<u8>);

#[cfg(test)]
mod tests {
    use super::{prepare_filters, FilterArg};
    use crate::filter::{
        FieldFilter, Filter, FilterError, FilterType, FilterValue, Pager, QueryFilter, RawFilter,
    };

    #[test]
    fn single_condition_with_value() {
        let filters = prepare_filters(filter_args!["active = ?", 1]).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].condition(), "active = ?");
        assert_eq!(filters[0].values(), vec![FilterValue::Integer(1)]);
    }

    #[test]
    fn value_without_placeholder_overflows() {
        let err = prepare_filters(filter_args!["active = 2", 1]).unwrap_err();
        assert_eq!(
            err,
            FilterError::ArityOverflow {
                condition: "active = 2".to_string(),
                expected: 0,
                attempted: 1,
            }
        );
    }

    #[test]
    fn missing_value_is_a_deficit() {
        let err = prepare_filters(filter_args!["active = ? or value = ?", 1]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "InvalidArgsNum: 'active = ? or value = ?': expected 2 got 1"
        );
    }

    #[test]
    fn deficit_is_reported_for_every_closed_fragment() {
        let err = prepare_filters(filter_args![
            "a = ? or b = ? or c = ?",
            1,
            FieldFilter::equals("id", 3)
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            FilterError::ArityDeficit {
                expected: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn raw_filter_rejects_bound_values() {
        let err = prepare_filters(filter_args![RawFilter::new("a = ? or b = ?"), 1, 2]).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedArgument(_)));

        let err = prepare_filters(filter_args![RawFilter::new("deleted_at IS NULL"), 1]).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedArgument(_)));
    }

    #[test]
    fn raw_filter_without_placeholders_passes_through() {
        let filters = prepare_filters(filter_args![RawFilter::new("deleted_at IS NULL")]).unwrap();
        assert_eq!(
            filters,
            vec![QueryFilter::Raw(RawFilter::new("deleted_at IS NULL"))]
        );
    }

    #[test]
    fn string_fragment_closes_before_field_filter() {
        let filters = prepare_filters(filter_args![
            "status = ?",
            FilterValue::text("active"),
            FieldFilter::new("age", FilterType::Greater, 21),
        ])
        .unwrap();

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].condition(), "status = ?");
        assert_eq!(filters[0].values(), vec![FilterValue::text("active")]);
        assert_eq!(filters[1].condition(), "age > ?");
        assert_eq!(filters[1].values(), vec![FilterValue::text("21")]);
    }

    #[test]
    fn field_filter_absorbs_upper_between_bound() {
        let filters = prepare_filters(filter_args![
            FieldFilter::new("price", FilterType::Between, 10),
            20
        ])
        .unwrap();
        assert_eq!(filters[0].condition(), "price BETWEEN ? AND ?");
        assert_eq!(
            filters[0].values(),
            vec![FilterValue::text("10"), FilterValue::text("20")]
        );
    }

    #[test]
    fn noop_filters_are_dropped_and_order_is_preserved() {
        let filters = prepare_filters(filter_args![
            "a = ?",
            1,
            FieldFilter::equals("name", FilterValue::Null),
            Pager::new(0, 0),
            "b = ?",
            2,
            Pager::new(1, 5),
        ])
        .unwrap();
        let conditions: Vec<_> = filters.iter().map(Filter::condition).collect();
        assert_eq!(conditions, vec!["a = ?", "b = ?", "LIMIT 5 OFFSET 5"]);
    }

    #[test]
    fn leading_value_is_unsupported() {
        let err = prepare_filters(vec![FilterArg::from(5)]).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedArgument(_)));
    }

    #[test]
    fn value_after_pager_overflows() {
        let err = prepare_filters(filter_args![Pager::new(1, 10), 3]).unwrap_err();
        assert!(matches!(
            err,
            FilterError::ArityOverflow {
                expected: 0,
                attempted: 1,
                ..
            }
        ));
    }

    #[test]
    fn empty_condition_string_is_rejected() {
        let err = prepare_filters(filter_args![""]).unwrap_err();
        assert_eq!(err, FilterError::EmptyCondition);
    }

    #[test]
    fn empty_argument_list_yields_no_filters() {
        assert!(prepare_filters(filter_args![]).unwrap().is_empty());
    }
}
