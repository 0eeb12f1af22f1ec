//! Field mapping table: rule field names to real event locations.
//!
//! This module provides the [`FieldMappingTable`] struct. Each rule field may
//! map to several targets; a target is either a plain top-level field name or
//! a JSONPath expression (recognized by a `$.` or `$[` prefix).

use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Returns true when a mapping target is a JSONPath expression.
///
/// # Examples
///
/// ```rust
/// use sigma_search_eval::fields::is_json_path;
///
/// assert!(is_json_path("$.process.name"));
/// assert!(is_json_path("$[\"process\"]"));
/// assert!(!is_json_path("process.name"));
/// assert!(!is_json_path("$process"));
/// ```
pub fn is_json_path(target: &str) -> bool {
    target.starts_with("$.") || target.starts_with("$[")
}

/// One YAML mapping entry: a single target or a list of targets.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MappingTargets {
    One(String),
    Many(Vec<String>),
}

impl From<MappingTargets> for Vec<String> {
    fn from(targets: MappingTargets) -> Self {
        match targets {
            MappingTargets::One(target) => vec![target],
            MappingTargets::Many(targets) => targets,
        }
    }
}

/// Mapping from rule field name to an ordered list of event locations.
///
/// Fields without an entry (or with an empty target list) are looked up
/// under their own name.
///
/// # Examples
///
/// ```rust
/// use sigma_search_eval::fields::FieldMappingTable;
///
/// let mut mapping = FieldMappingTable::new();
/// mapping.add_mapping("Image", "process.executable");
/// mapping.add_mapping("Image", "$.process.path");
///
/// assert_eq!(mapping.targets("Image").map(|t| t.len()), Some(2));
/// assert!(mapping.targets("CommandLine").is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct FieldMappingTable {
    #[serde(deserialize_with = "deserialize_targets")]
    field_map: HashMap<String, Vec<String>>,
}

impl FieldMappingTable {
    /// Create an empty mapping table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a mapping table from a YAML document.
    ///
    /// Each key is a rule field; each value is a target or a list of targets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sigma_search_eval::fields::FieldMappingTable;
    ///
    /// let mapping = FieldMappingTable::from_yaml_str(
    ///     "Image: process.executable\nCommandLine: [process.command_line, $.cmd]\n",
    /// )
    /// .unwrap();
    /// assert_eq!(mapping.targets("Image"), Some(&["process.executable".to_string()][..]));
    /// assert_eq!(mapping.targets("CommandLine").map(|t| t.len()), Some(2));
    /// ```
    pub fn from_yaml_str(yaml: &str) -> crate::Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Append a target to a rule field's mapping.
    pub fn add_mapping(&mut self, source_field: &str, target: &str) {
        self.field_map
            .entry(source_field.to_string())
            .or_default()
            .push(target.to_string());
    }

    /// Replace every target of a rule field.
    pub fn set_targets(&mut self, source_field: &str, targets: Vec<String>) {
        self.field_map.insert(source_field.to_string(), targets);
    }

    /// Merge mappings, replacing existing entries for the same fields.
    pub fn load_mappings(&mut self, mappings: HashMap<String, Vec<String>>) {
        self.field_map.extend(mappings);
    }

    /// Targets of a rule field, or `None` when the field is used directly.
    pub fn targets(&self, field_name: &str) -> Option<&[String]> {
        self.field_map
            .get(field_name)
            .map(Vec::as_slice)
            .filter(|targets| !targets.is_empty())
    }

    pub fn has_mapping(&self, field_name: &str) -> bool {
        self.targets(field_name).is_some()
    }

    pub fn mappings(&self) -> &HashMap<String, Vec<String>> {
        &self.field_map
    }

    pub fn len(&self) -> usize {
        self.field_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_map.is_empty()
    }
}

fn deserialize_targets<'de, D>(deserializer: D) -> Result<HashMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, MappingTargets>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}
