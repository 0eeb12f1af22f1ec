//! Core function types for comparator chains.

use serde_json::Value;
use std::sync::Arc;

/// Comparator deciding whether an actual event value satisfies one expected literal.
///
/// # Arguments
/// * `actual` - A single candidate value taken from the event
/// * `expected` - One literal from the field matcher's value list
///
/// # Example
/// ```rust,ignore
/// let exact: ComparatorFn = Arc::new(|actual, expected| canonical_string(actual) == expected);
/// ```
pub type ComparatorFn = Arc<dyn Fn(&Value, &str) -> bool + Send + Sync>;

/// Modifier constructor: wraps the comparator built so far and returns a new one.
///
/// Terminal modifiers (such as `contains`) may ignore the inner comparator;
/// decorating modifiers (such as `base64`) transform the expected value and
/// delegate to it.
pub type ModifierFn = Arc<dyn Fn(ComparatorFn) -> ComparatorFn + Send + Sync>;
