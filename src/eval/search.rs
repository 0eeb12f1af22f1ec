//! Named-search evaluation: a list of field matchers, implicitly AND-ed.

use super::RuleEvaluator;
use crate::error::{Result, SigmaError};
use crate::event::Event;
use crate::ir::{FieldMatcher, Search};
use crate::matcher::{build_comparator, ComparatorFn, ModifierRegistry};
use std::fmt;
use tracing::trace;

/// A field matcher's comparator chain, built once per rule.
#[derive(Clone)]
pub(super) struct CompiledMatcher {
    comparator: ComparatorFn,
    all_values_must_match: bool,
}

impl fmt::Debug for CompiledMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMatcher")
            .field("all_values_must_match", &self.all_values_must_match)
            .finish_non_exhaustive()
    }
}

/// Build the comparator of every field matcher in a search.
///
/// # Errors
/// - [`SigmaError::UnsupportedKeywordSearch`] for keyword searches
/// - [`SigmaError::UnknownModifier`] for an unregistered modifier, wherever
///   it appears in the search
pub(super) fn compile_search(
    registry: &ModifierRegistry,
    name: &str,
    search: &Search,
) -> Result<Vec<CompiledMatcher>> {
    let matchers = match search {
        Search::FieldMatchers(matchers) => matchers,
        Search::Keywords(_) => return Err(SigmaError::UnsupportedKeywordSearch(name.to_string())),
    };

    let mut compiled = Vec::with_capacity(matchers.len());
    for matcher in matchers {
        let (modifiers, all_values_must_match) = matcher.split_quantifier();
        compiled.push(CompiledMatcher {
            comparator: build_comparator(registry, modifiers)?,
            all_values_must_match,
        });
    }
    Ok(compiled)
}

impl RuleEvaluator {
    /// Decide whether an event satisfies one named search.
    ///
    /// Every field matcher has to match. Within a matcher, any expected value
    /// matching any candidate suffices, unless the matcher ends with the `all`
    /// modifier, in which case every expected value has to match some
    /// candidate. A matcher without expected values matches only under `all`.
    ///
    /// Searches of the evaluator's own rule were compiled at build time;
    /// others are compiled here, in full, before any matcher runs.
    ///
    /// # Errors
    /// - [`SigmaError::UnsupportedKeywordSearch`] for keyword searches
    /// - [`SigmaError::UnknownModifier`] for an unregistered modifier
    /// - [`SigmaError::InvalidJsonPath`] when JSON-string recovery cannot
    ///   tell which top-level field to decode
    pub fn evaluate_search(&self, name: &str, search: &Search, event: &Event<'_>) -> Result<bool> {
        let compiled = compile_search(&self.modifiers, name, search)?;
        self.evaluate_compiled(name, search, &compiled, event)
    }

    /// Evaluate a search of the rule through its build-time comparators.
    pub(super) fn evaluate_rule_search(
        &self,
        name: &str,
        search: &Search,
        event: &Event<'_>,
    ) -> Result<bool> {
        match self.compiled.get(name) {
            Some(compiled) => self.evaluate_compiled(name, search, compiled, event),
            None => self.evaluate_search(name, search, event),
        }
    }

    fn evaluate_compiled(
        &self,
        name: &str,
        search: &Search,
        compiled: &[CompiledMatcher],
        event: &Event<'_>,
    ) -> Result<bool> {
        let matchers = match search {
            Search::FieldMatchers(matchers) => matchers,
            Search::Keywords(_) => {
                return Err(SigmaError::UnsupportedKeywordSearch(name.to_string()))
            }
        };

        for (matcher, compiled) in matchers.iter().zip(compiled) {
            if !self.matcher_matches(matcher, compiled, event)? {
                trace!(search = name, field = %matcher.field, "Field matcher did not match");
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn matcher_matches(
        &self,
        matcher: &FieldMatcher,
        compiled: &CompiledMatcher,
        event: &Event<'_>,
    ) -> Result<bool> {
        let candidates = self.resolver.candidates(&matcher.field, event)?;
        let comparator = &compiled.comparator;
        let value_matches = |expected: &String| {
            candidates
                .iter()
                .any(|actual| comparator(actual.as_ref(), expected))
        };

        Ok(if compiled.all_values_must_match {
            matcher.values.iter().all(value_matches)
        } else {
            matcher.values.iter().any(value_matches)
        })
    }
}
