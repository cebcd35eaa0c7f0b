//! Shared serde helper functions used across multiple modules.

/// Serde default function that returns `true`.
///
/// Used for boolean fields that should default to enabled/active.
pub fn default_true() -> bool {
    true
}

/// Serde `skip_serializing_if` predicate for `true` booleans.
pub fn is_true(value: &bool) -> bool {
    *value
}
