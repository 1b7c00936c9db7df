//! Trusted pass-through SQL fragments.

/// Pre-validated condition text with no bound values.
///
/// Raw fragments are unchecked and never take bound values: text containing
/// placeholders yields an arity mismatch downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFilter(String);

impl RawFilter {
    pub fn new(condition: impl Into<String>) -> Self {
        Self(condition.into())
    }

    pub fn condition(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawFilter {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
