//! Field resolution: from a rule field name to the event values it denotes.
//!
//! A rule field is either looked up directly on the event or, when the
//! [`FieldMappingTable`] has an entry for it, through each mapped target in
//! turn. Targets are plain top-level field names or JSONPath expressions.
//!
//! ## JSON-string recovery
//!
//! Events often carry nested documents that were never decoded, e.g.
//! `{"payload": "{\"x\":1}"}`. A JSONPath such as `$.payload.x` then fails
//! because it reaches a string where an object was expected. In that case the
//! resolver decodes the top-level field named by the path and retries the
//! path against the decoded value. Anything that still fails resolves to
//! "absent".
//!
//! An absent value contributes no comparison candidate, so it never matches,
//! not even an expected `"null"`. A JSON `null` that is present is a
//! candidate like any other value.

pub mod jsonpath;
pub mod mapping;

pub use jsonpath::{JsonPath, PathError};
pub use mapping::{is_json_path, FieldMappingTable};

use crate::error::{Result, SigmaError};
use crate::event::Event;
use crate::matcher::values::expand_into;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::debug;

/// A compiled mapping target.
#[derive(Debug, Clone)]
enum Target {
    Field(String),
    Path(JsonPath),
}

/// Resolves rule field names to raw event values.
///
/// JSONPath targets are parsed once, when the resolver is built.
#[derive(Debug, Clone)]
pub struct FieldResolver {
    targets: HashMap<String, Vec<Target>>,
    jsonpath_recovery: bool,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self {
            targets: HashMap::new(),
            jsonpath_recovery: true,
        }
    }
}

impl FieldResolver {
    /// Build a resolver for a mapping table.
    ///
    /// # Errors
    /// Returns [`SigmaError::InvalidJsonPath`] when a JSONPath target does not parse.
    pub fn new(mappings: &FieldMappingTable) -> Result<Self> {
        let mut targets = HashMap::with_capacity(mappings.len());
        for (field, raw_targets) in mappings.mappings() {
            if raw_targets.is_empty() {
                continue;
            }
            let compiled = raw_targets
                .iter()
                .map(|target| {
                    if is_json_path(target) {
                        JsonPath::parse(target).map(Target::Path)
                    } else {
                        Ok(Target::Field(target.clone()))
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            targets.insert(field.clone(), compiled);
        }

        Ok(Self {
            targets,
            jsonpath_recovery: true,
        })
    }

    /// Enable or disable decoding of JSON left serialized inside string fields.
    pub fn with_jsonpath_recovery(mut self, enabled: bool) -> Self {
        self.jsonpath_recovery = enabled;
        self
    }

    pub fn has_mapping(&self, field: &str) -> bool {
        self.targets.contains_key(field)
    }

    /// Raw values for a rule field, one per location, before flattening.
    ///
    /// Unmapped fields yield exactly one entry: the direct lookup, or `None`
    /// when the event lacks the field.
    pub fn resolve<'e>(
        &self,
        field: &str,
        event: &Event<'e>,
    ) -> Result<Vec<Option<Cow<'e, Value>>>> {
        let Some(targets) = self.targets.get(field) else {
            return Ok(vec![event.get(field)]);
        };

        targets
            .iter()
            .map(|target| match target {
                Target::Field(name) => Ok(event.get(name)),
                Target::Path(path) => self.extract_json_path(path, event),
            })
            .collect()
    }

    /// Comparison candidates for a rule field.
    ///
    /// Every present location's value is flattened and the results are pooled
    /// into a single ordered list. Absent locations contribute nothing.
    pub fn candidates<'e>(&self, field: &str, event: &Event<'e>) -> Result<Vec<Cow<'e, Value>>> {
        let mut pooled = Vec::new();
        for raw in self.resolve(field, event)?.into_iter().flatten() {
            expand_into(raw, &mut pooled);
        }
        Ok(pooled)
    }

    fn extract_json_path<'e>(
        &self,
        path: &JsonPath,
        event: &Event<'e>,
    ) -> Result<Option<Cow<'e, Value>>> {
        let err = match select_on_event(path, event) {
            Ok(value) => return Ok(Some(Cow::Owned(value))),
            Err(err) => err,
        };
        if !self.jsonpath_recovery || !err.is_unsupported_value_type() {
            return Ok(None);
        }

        let field = path.root_field().ok_or_else(|| {
            SigmaError::InvalidJsonPath(format!(
                "{path}: cannot determine the top-level field to decode"
            ))
        })?;

        let Some(text) = event.text(field) else {
            debug!(path = %path, field, "Top-level field is not a string, skipping recovery");
            return Ok(None);
        };

        let decoded: Value = match serde_json::from_str(text) {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(path = %path, field, error = %e, "Field does not hold JSON");
                return Ok(None);
            }
        };

        match path.select_from_root_field(&decoded) {
            Ok(value) => {
                debug!(path = %path, field, "Resolved JSONPath after decoding nested JSON");
                Ok(Some(Cow::Owned(value)))
            }
            Err(e) => {
                debug!(path = %path, field, error = %e, "JSONPath still fails after decoding");
                Ok(None)
            }
        }
    }
}

/// Run a path against an event. String records only materialize the field
/// the path starts from.
fn select_on_event(path: &JsonPath, event: &Event<'_>) -> std::result::Result<Value, PathError> {
    match (event, path.root_field()) {
        (Event::Strings(_), Some(field)) => match event.get(field) {
            Some(member) => path.select_from_root_field(&member),
            None => Err(PathError::UnknownKey(field.to_string())),
        },
        _ => path.select(&event.as_json()),
    }
}
