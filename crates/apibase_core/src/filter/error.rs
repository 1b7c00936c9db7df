//! Construction-time failures of filter fragments.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FilterResult<T> = Result<T, FilterError>;

/// Error raised while building or composing filters, before any I/O.
///
/// Every variant signals a programming error in the calling code, not a
/// data condition; callers should abort the query rather than retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// Condition text is empty or whitespace only.
    EmptyCondition,
    /// A value was attached to a condition that has no free placeholder left.
    ArityOverflow {
        condition: String,
        expected: usize,
        attempted: usize,
    },
    /// A finalized condition has fewer values than placeholders.
    ArityDeficit {
        condition: String,
        expected: usize,
        actual: usize,
    },
    /// A bound value appeared with no open condition to attach to.
    UnsupportedArgument(String),
    /// Operator string is not part of the closed operator set (strict parse only).
    UnknownOperator(String),
}

impl Display for FilterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCondition => write!(f, "empty where filter"),
            Self::ArityOverflow {
                condition,
                expected,
                attempted,
            } => write!(
                f,
                "InvalidArgsNum: '{condition}': expected {expected} got {attempted}"
            ),
            Self::ArityDeficit {
                condition,
                expected,
                actual,
            } => write!(
                f,
                "InvalidArgsNum: '{condition}': expected {expected} got {actual}"
            ),
            Self::UnsupportedArgument(details) => {
                write!(f, "unsupported filter argument: {details}")
            }
            Self::UnknownOperator(value) => write!(f, "unsupported condition type: {value}"),
        }
    }
}

impl Error for FilterError {}
