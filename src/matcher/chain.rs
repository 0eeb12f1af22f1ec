//! Comparator chain construction.
//!
//! A chain starts from exact equality and folds the written modifiers
//! left-to-right, each one wrapping the comparator built so far. The `all`
//! quantifier never reaches this point; callers strip it first.

use crate::error::{Result, SigmaError};
use crate::matcher::defaults::create_exact_match;
use crate::matcher::modifiers::ModifierRegistry;
use crate::matcher::types::ComparatorFn;

/// Build the comparator for an ordered modifier list.
///
/// # Errors
/// Returns [`SigmaError::UnknownModifier`] for the first name missing from
/// the registry.
///
/// # Example
/// ```rust,ignore
/// let registry = ModifierRegistry::with_defaults();
/// let cmp = build_comparator(&registry, &["contains".into(), "base64".into()])?;
/// assert!(cmp(&json!("xx c2VjcmV0 xx"), "secret"));
/// ```
pub fn build_comparator(registry: &ModifierRegistry, modifiers: &[String]) -> Result<ComparatorFn> {
    let mut comparator = create_exact_match();
    for name in modifiers {
        let modifier = registry
            .get(name)
            .ok_or_else(|| SigmaError::UnknownModifier(name.clone()))?;
        comparator = modifier(comparator);
    }
    Ok(comparator)
}

/// Check that every modifier name is known without building the chain.
pub fn validate_modifiers(registry: &ModifierRegistry, modifiers: &[String]) -> Result<()> {
    match modifiers.iter().find(|name| !registry.contains(name)) {
        Some(unknown) => Err(SigmaError::UnknownModifier(unknown.clone())),
        None => Ok(()),
    }
}
