//! Conversions between typed values and the flat strings stored in cache hashes.
//!
//! Parsers are lenient: malformed input yields the type's zero value, which
//! is what `CacheableObject::set_cache_object` implementations want when a
//! cached field predates a schema change.

use crate::cache::Cacheable;
use crate::filter::FilterValue;
use std::fmt::Display;

/// Renders any displayable value for storage in a cache hash field.
pub fn to_cache_value(value: &dyn Display) -> String {
    value.to_string()
}

/// Renders a filter value for storage in a cache hash field.
pub fn filter_value_to_cache(value: &FilterValue) -> String {
    value.to_canonical_string()
}

/// Nested cacheable objects are stored by reference, as their cache key.
pub fn cacheable_ref(object: &dyn Cacheable) -> String {
    object.cache_key()
}

pub fn str_to_i32(value: &str) -> i32 {
    value.trim().parse().unwrap_or_default()
}

pub fn str_to_i64(value: &str) -> i64 {
    value.trim().parse().unwrap_or_default()
}

pub fn str_to_u64(value: &str) -> u64 {
    value.trim().parse().unwrap_or_default()
}

pub fn str_to_f64(value: &str) -> f64 {
    value.trim().parse().unwrap_or_default()
}

/// Accepts `1/t/true` and `0/f/false` in any case; anything else is `false`.
pub fn str_to_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "t" | "true"
    )
}
