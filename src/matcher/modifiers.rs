//! Modifier registry for SIGMA field matchers.
//!
//! Maps modifier names (`contains`, `startswith`, `endswith`, `base64`) to
//! constructors that wrap the comparator built so far. The default registry
//! is built once per process and never mutated afterwards.

use crate::matcher::defaults::canonical_string;
use crate::matcher::types::{ComparatorFn, ModifierFn};
use base64::{engine::general_purpose, Engine as _};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Immutable name -> modifier table consulted when comparators are built.
#[derive(Clone, Default)]
pub struct ModifierRegistry {
    modifiers: HashMap<String, ModifierFn>,
}

impl ModifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in modifiers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_defaults(&mut registry.modifiers);
        registry
    }

    /// Register a modifier, replacing any existing one with the same name.
    ///
    /// # Example
    /// ```rust,ignore
    /// registry.register("lowercase", |inner| {
    ///     Arc::new(move |actual, expected| inner(actual, &expected.to_lowercase()))
    /// });
    /// ```
    pub fn register<F>(&mut self, name: &str, modifier: F) -> &mut Self
    where
        F: Fn(ComparatorFn) -> ComparatorFn + Send + Sync + 'static,
    {
        self.modifiers.insert(name.to_string(), Arc::new(modifier));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ModifierFn> {
        self.modifiers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modifiers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl std::fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.modifiers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModifierRegistry")
            .field("modifiers", &names)
            .finish()
    }
}

static DEFAULT_REGISTRY: OnceLock<Arc<ModifierRegistry>> = OnceLock::new();

/// Get the process-wide registry of built-in modifiers.
pub fn default_registry() -> Arc<ModifierRegistry> {
    DEFAULT_REGISTRY
        .get_or_init(|| Arc::new(ModifierRegistry::with_defaults()))
        .clone()
}

/// Register the built-in modifiers with the provided table.
pub fn register_defaults(modifier_registry: &mut HashMap<String, ModifierFn>) {
    modifier_registry.insert("contains".to_string(), create_contains());
    modifier_registry.insert("startswith".to_string(), create_startswith());
    modifier_registry.insert("endswith".to_string(), create_endswith());
    modifier_registry.insert("base64".to_string(), create_base64());
}

// The substring family is terminal: the comparator built so far is discarded.

fn create_contains() -> ModifierFn {
    Arc::new(|_inner: ComparatorFn| -> ComparatorFn {
        Arc::new(|actual: &Value, expected: &str| canonical_string(actual).contains(expected))
    })
}

fn create_startswith() -> ModifierFn {
    Arc::new(|_inner: ComparatorFn| -> ComparatorFn {
        Arc::new(|actual: &Value, expected: &str| {
            canonical_string(actual).starts_with(expected)
        })
    })
}

fn create_endswith() -> ModifierFn {
    Arc::new(|_inner: ComparatorFn| -> ComparatorFn {
        Arc::new(|actual: &Value, expected: &str| canonical_string(actual).ends_with(expected))
    })
}

fn create_base64() -> ModifierFn {
    Arc::new(|inner: ComparatorFn| -> ComparatorFn {
        Arc::new(move |actual: &Value, expected: &str| {
            inner(actual, &general_purpose::STANDARD.encode(expected))
        })
    })
}
