//! Rule evaluation against a single event.
//!
//! [`RuleEvaluator`] binds a parsed [`Rule`] to a field resolver, a modifier
//! registry and the rule's compiled search-name patterns. It is immutable
//! once built and can be shared across threads.
//!
//! - [`RuleEvaluator::evaluate_expression`] walks a condition tree
//! - [`RuleEvaluator::evaluate_search`] decides one named search
//! - [`RuleEvaluator::matches`] evaluates every condition of the rule
//!
//! # Examples
//!
//! ```rust
//! use sigma_search_eval::ir::{Detection, FieldMatcher, Rule, Search, SearchExpr};
//! use sigma_search_eval::{Event, EvaluatorConfig, RuleEvaluator};
//!
//! let detection = Detection::new()
//!     .with_search(
//!         "selection",
//!         Search::fields(vec![FieldMatcher::new("Image", &["endswith"], &["\\cmd.exe"])]),
//!     )
//!     .with_condition(SearchExpr::identifier("selection"));
//! let evaluator = RuleEvaluator::new(Rule::new("r1", detection), EvaluatorConfig::default())?;
//!
//! let event = serde_json::json!({"Image": "C:\\Windows\\System32\\cmd.exe"});
//! assert!(evaluator.matches(&Event::from(&event))?.matched);
//! # Ok::<(), sigma_search_eval::SigmaError>(())
//! ```

mod expression;
pub mod pattern;
mod search;

pub use pattern::{PatternSet, SearchPattern};

use search::{compile_search, CompiledMatcher};

use crate::config::EvaluatorConfig;
use crate::error::{Result, SigmaError};
use crate::event::Event;
use crate::fields::FieldResolver;
use crate::ir::{Rule, Search, SearchExpr};
use crate::matcher::{default_registry, validate_modifiers, ComparatorFn, ModifierRegistry};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Outcome of evaluating a rule against one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// True when any condition matched.
    pub matched: bool,
    /// Result of each condition, in rule order.
    pub condition_results: Vec<bool>,
}

/// Evaluates one rule's detection logic against events.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    rule: Rule,
    resolver: FieldResolver,
    modifiers: Arc<ModifierRegistry>,
    patterns: PatternSet,
    compiled: HashMap<String, Vec<CompiledMatcher>>,
    config: EvaluatorConfig,
}

impl RuleEvaluator {
    /// Build an evaluator with the built-in modifiers.
    ///
    /// # Errors
    /// Fails on any rule-definition error: a malformed JSONPath mapping
    /// target or search-name pattern, an unknown modifier, a keyword search,
    /// or a condition naming a search that does not exist.
    pub fn new(rule: Rule, config: EvaluatorConfig) -> Result<Self> {
        Self::builder(rule).config(config).build()
    }

    pub fn builder(rule: Rule) -> RuleEvaluatorBuilder {
        RuleEvaluatorBuilder::new(rule)
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    /// Evaluate every condition of the rule against an event.
    ///
    /// All conditions are evaluated; `matched` is true when any of them is.
    pub fn matches(&self, event: &Event<'_>) -> Result<MatchResult> {
        let condition_results = self
            .rule
            .detection
            .conditions
            .iter()
            .map(|condition| self.evaluate_expression(&condition.search, event))
            .collect::<Result<Vec<_>>>()?;

        Ok(MatchResult {
            matched: condition_results.iter().any(|&matched| matched),
            condition_results,
        })
    }

    /// Evaluate a batch of events, in parallel when the batch is large enough.
    ///
    /// Results are returned in event order. Errors are reported per event.
    pub fn matches_batch(&self, events: &[Event<'_>]) -> Vec<Result<MatchResult>> {
        let parallel = self.config.parallel_for(events.len());
        debug!(
            rule = %self.rule.id,
            events = events.len(),
            parallel,
            "Evaluating event batch"
        );

        if parallel {
            events.par_iter().map(|event| self.matches(event)).collect()
        } else {
            events.iter().map(|event| self.matches(event)).collect()
        }
    }

    /// Check the rule for definition errors without an event.
    ///
    /// Reports unknown modifiers, keyword searches, and condition references
    /// to searches that do not exist. [`RuleEvaluatorBuilder::build`] runs
    /// this check, so a built evaluator never turns these into "no match".
    pub fn validate(&self) -> Result<()> {
        for (name, search) in &self.rule.detection.searches {
            match search {
                Search::Keywords(_) => {
                    return Err(SigmaError::UnsupportedKeywordSearch(name.clone()))
                }
                Search::FieldMatchers(matchers) => {
                    for matcher in matchers {
                        validate_modifiers(&self.modifiers, matcher.split_quantifier().0)?;
                    }
                }
            }
        }

        for condition in &self.rule.detection.conditions {
            let mut unknown = None;
            condition.search.walk(&mut |node| {
                if let SearchExpr::SearchIdentifier(name) = node {
                    if unknown.is_none() && !self.rule.detection.searches.contains_key(name) {
                        unknown = Some(name.clone());
                    }
                }
            });
            if let Some(name) = unknown {
                return Err(SigmaError::UnknownSearchIdentifier(name));
            }
        }
        Ok(())
    }
}

/// Builder for [`RuleEvaluator`] with custom configuration and modifiers.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use sigma_search_eval::ir::{Detection, Rule};
/// use sigma_search_eval::RuleEvaluator;
///
/// let evaluator = RuleEvaluator::builder(Rule::new("r1", Detection::new()))
///     .modifier("lowercase", |inner| {
///         Arc::new(move |actual: &serde_json::Value, expected: &str| {
///             inner(actual, &expected.to_lowercase())
///         })
///     })
///     .build()?;
/// assert!(evaluator.modifiers().contains("lowercase"));
/// assert!(evaluator.modifiers().contains("contains"));
/// # Ok::<(), sigma_search_eval::SigmaError>(())
/// ```
pub struct RuleEvaluatorBuilder {
    rule: Rule,
    config: EvaluatorConfig,
    modifiers: Option<ModifierRegistry>,
}

impl RuleEvaluatorBuilder {
    pub fn new(rule: Rule) -> Self {
        Self {
            rule,
            config: EvaluatorConfig::default(),
            modifiers: None,
        }
    }

    pub fn config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an additional modifier next to the built-in ones.
    pub fn modifier<F>(mut self, name: &str, modifier: F) -> Self
    where
        F: Fn(ComparatorFn) -> ComparatorFn + Send + Sync + 'static,
    {
        self.modifiers
            .get_or_insert_with(ModifierRegistry::with_defaults)
            .register(name, modifier);
        self
    }

    pub fn build(self) -> Result<RuleEvaluator> {
        let resolver = FieldResolver::new(&self.config.field_mappings)?
            .with_jsonpath_recovery(self.config.jsonpath_recovery);
        let patterns = PatternSet::from_conditions(&self.rule.detection.conditions)?;
        let modifiers = match self.modifiers {
            Some(registry) => Arc::new(registry),
            None => default_registry(),
        };
        let searches = &self.rule.detection.searches;
        let mut compiled = HashMap::with_capacity(searches.len());
        for (name, search) in searches {
            compiled.insert(name.clone(), compile_search(&modifiers, name, search)?);
        }

        let evaluator = RuleEvaluator {
            rule: self.rule,
            resolver,
            modifiers,
            patterns,
            compiled,
            config: self.config,
        };
        evaluator.validate()?;

        debug!(
            rule = %evaluator.rule.id,
            searches = evaluator.compiled.len(),
            conditions = evaluator.rule.detection.conditions.len(),
            patterns = evaluator.patterns.len(),
            "Built rule evaluator"
        );
        Ok(evaluator)
    }
}
