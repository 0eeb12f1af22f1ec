//! Base comparator and the canonical string form of event values.

use crate::matcher::types::ComparatorFn;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// Canonical string form used by every string comparison.
///
/// - **Strings**: returned as-is (without quotes)
/// - **Integers**: decimal representation
/// - **Floats**: whole finite values print without a fraction (`1.0` -> `1`),
///   everything else uses the shortest round-trip representation
/// - **Booleans**: `true` / `false`
/// - **Null**: `null`
/// - **Arrays/Objects**: compact JSON
pub fn canonical_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::Null => Cow::Borrowed("null"),
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => {
                Cow::Owned(format!("{f:.0}"))
            }
            _ => Cow::Owned(n.to_string()),
        },
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Create the exact-equality comparator every chain starts from.
///
/// # Example
/// ```rust,ignore
/// let exact = create_exact_match();
/// assert!(exact(&json!(4624), "4624"));
/// ```
pub fn create_exact_match() -> ComparatorFn {
    Arc::new(|actual: &Value, expected: &str| canonical_string(actual) == expected)
}
