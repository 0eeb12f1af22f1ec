//! Flattening of resolved field values into comparison candidates.

use serde_json::Value;
use std::borrow::Cow;

/// Expand a resolved value into its candidates.
///
/// Arrays yield their elements in order; any other value yields itself.
/// Only one level is flattened: nested arrays stay as single candidates.
pub fn expand(value: Cow<'_, Value>) -> Vec<Cow<'_, Value>> {
    let mut out = Vec::new();
    expand_into(value, &mut out);
    out
}

/// Append the candidates of `value` to `out`, preserving order.
pub fn expand_into<'a>(value: Cow<'a, Value>, out: &mut Vec<Cow<'a, Value>>) {
    match value {
        Cow::Borrowed(Value::Array(items)) => out.extend(items.iter().map(Cow::Borrowed)),
        Cow::Owned(Value::Array(items)) => out.extend(items.into_iter().map(Cow::Owned)),
        other => out.push(other),
    }
}
