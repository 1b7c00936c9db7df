//! Bound parameter values carried by filter fragments.
//!
//! # Responsibility
//! - Represent loosely-typed caller values in one closed shape.
//! - Normalize every value to its canonical text form before binding.
//!
//! # Invariants
//! - Canonical text of `Null` (and of an empty list) is the empty string,
//!   which filters treat as "no value".

use std::fmt::{Display, Formatter};

/// One bound parameter for a condition placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    /// Collection bound to a single `(?)` placeholder of `IN`/`NOT IN`.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Builds a text value.
    ///
    /// String literals passed to the composer open a new condition; wrap them
    /// with this constructor to bind them as values instead.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Builds a list value from anything convertible into values.
    pub fn list<T: Into<FilterValue>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns the canonical text form used for binding and caching.
    ///
    /// - integers/reals use their shortest decimal form
    /// - booleans map to `1`/`0`, matching SQL storage of flags
    /// - bytes are decoded as lossy UTF-8
    /// - lists are comma-joined canonical items
    pub fn to_canonical_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => value.to_string(),
            Self::Bool(value) => bool_to_text(*value).to_string(),
            Self::Text(value) => value.clone(),
            Self::Bytes(value) => String::from_utf8_lossy(value).into_owned(),
            Self::List(items) => items
                .iter()
                .map(FilterValue::to_canonical_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Returns whether the canonical text is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(value) => value.is_empty(),
            Self::Bytes(value) => value.is_empty(),
            Self::List(items) => items.iter().all(FilterValue::is_empty),
            Self::Integer(_) | Self::Real(_) | Self::Bool(_) => false,
        }
    }

    /// Coerces this value into text, keeping list structure intact.
    pub(crate) fn coerce_to_text(&self) -> FilterValue {
        match self {
            Self::List(items) => Self::List(
                items
                    .iter()
                    .filter(|item| !item.is_empty())
                    .map(FilterValue::coerce_to_text)
                    .collect(),
            ),
            other => Self::Text(other.to_canonical_string()),
        }
    }
}

fn bool_to_text(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

impl Display for FilterValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Text(value) => write!(f, "'{value}'"),
            Self::List(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            other => write!(f, "{}", other.to_canonical_string()),
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    Self::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for FilterValue {
    fn from(value: f32) -> Self {
        Self::Real(f64::from(value))
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for FilterValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
