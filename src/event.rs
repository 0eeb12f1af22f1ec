//! Borrowed event view used during evaluation.
//!
//! Events arrive either as flat string-to-string records or as arbitrary JSON
//! documents. Both are exposed through the same lookup interface, with values
//! surfaced as [`serde_json::Value`].

use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;

/// A reference to an event under evaluation.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    /// Flat record whose values are all strings.
    Strings(&'a HashMap<String, String>),
    /// JSON document, normally an object. Lookups on any other shape find nothing.
    Json(&'a Value),
}

impl<'a> Event<'a> {
    /// Direct top-level lookup of a field.
    pub fn get(&self, field: &str) -> Option<Cow<'a, Value>> {
        match *self {
            Event::Strings(map) => map
                .get(field)
                .map(|s| Cow::Owned(Value::String(s.clone()))),
            Event::Json(value) => value.get(field).map(Cow::Borrowed),
        }
    }

    /// Raw text of a top-level field when it holds a string.
    ///
    /// Used to decode nested JSON that was left serialized inside a field.
    pub fn text(&self, field: &str) -> Option<&'a str> {
        match *self {
            Event::Strings(map) => map.get(field).map(String::as_str),
            Event::Json(value) => value.get(field).and_then(Value::as_str),
        }
    }

    /// The whole event as a JSON document.
    ///
    /// Borrowed for JSON events; string records are converted on demand.
    pub fn as_json(&self) -> Cow<'a, Value> {
        match *self {
            Event::Strings(map) => Cow::Owned(Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect::<Map<String, Value>>(),
            )),
            Event::Json(value) => Cow::Borrowed(value),
        }
    }
}

impl<'a> From<&'a HashMap<String, String>> for Event<'a> {
    fn from(map: &'a HashMap<String, String>) -> Self {
        Event::Strings(map)
    }
}

impl<'a> From<&'a Value> for Event<'a> {
    fn from(value: &'a Value) -> Self {
        Event::Json(value)
    }
}
