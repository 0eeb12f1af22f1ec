//! Data model for already-parsed SIGMA detections.
//!
//! These structures are produced by the rule-parsing collaborator and are
//! only ever read by the evaluator. They derive serde so a parsed rule can be
//! handed over as JSON or YAML.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Modifier token that switches a field matcher from "any value" to "all values".
pub const ALL_MODIFIER: &str = "all";

/// Boolean condition tree over the named searches of a detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchExpr {
    And(Vec<SearchExpr>),
    Or(Vec<SearchExpr>),
    Not(Box<SearchExpr>),
    SearchIdentifier(String),
    OneOfThem,
    AllOfThem,
    OneOfPattern(String),
    AllOfPattern(String),
}

impl SearchExpr {
    pub fn identifier(name: impl Into<String>) -> Self {
        SearchExpr::SearchIdentifier(name.into())
    }

    pub fn not(expr: SearchExpr) -> Self {
        SearchExpr::Not(Box::new(expr))
    }

    pub fn one_of(pattern: impl Into<String>) -> Self {
        SearchExpr::OneOfPattern(pattern.into())
    }

    pub fn all_of(pattern: impl Into<String>) -> Self {
        SearchExpr::AllOfPattern(pattern.into())
    }

    /// Visit this node and every descendant, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SearchExpr)) {
        visit(self);
        match self {
            SearchExpr::And(children) | SearchExpr::Or(children) => {
                for child in children {
                    child.walk(visit);
                }
            }
            SearchExpr::Not(child) => child.walk(visit),
            _ => {}
        }
    }
}

/// A single `field|modifier|...: [values]` entry of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMatcher {
    pub field: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
    pub values: Vec<String>,
}

impl FieldMatcher {
    pub fn new(field: &str, modifiers: &[&str], values: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            modifiers: modifiers.iter().map(|m| m.to_string()).collect(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    /// Split the trailing `all` quantifier from the value-transforming modifiers.
    ///
    /// Returns the modifiers that build the comparator and whether every
    /// expected value has to match.
    pub fn split_quantifier(&self) -> (&[String], bool) {
        match self.modifiers.split_last() {
            Some((last, rest)) if last == ALL_MODIFIER => (rest, true),
            _ => (&self.modifiers, false),
        }
    }
}

/// A named search. Field matchers are implicitly AND-ed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Search {
    FieldMatchers(Vec<FieldMatcher>),
    /// Free-text keyword search. Not supported by the evaluator.
    Keywords(Vec<String>),
}

impl Search {
    pub fn fields(matchers: Vec<FieldMatcher>) -> Self {
        Search::FieldMatchers(matchers)
    }
}

/// One top-level condition of a detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub search: SearchExpr,
}

impl From<SearchExpr> for Condition {
    fn from(search: SearchExpr) -> Self {
        Self { search }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(default)]
    pub searches: BTreeMap<String, Search>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Detection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, name: &str, search: Search) -> Self {
        self.searches.insert(name.to_string(), search);
        self
    }

    pub fn with_condition(mut self, condition: SearchExpr) -> Self {
        self.conditions.push(condition.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub detection: Detection,
}

impl Rule {
    pub fn new(id: &str, detection: Detection) -> Self {
        Self {
            id: id.to_string(),
            title: String::new(),
            detection,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }
}
