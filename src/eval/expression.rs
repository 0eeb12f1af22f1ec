//! Condition-tree evaluation.

use super::RuleEvaluator;
use crate::error::{Result, SigmaError};
use crate::event::Event;
use crate::ir::SearchExpr;
use tracing::trace;

impl RuleEvaluator {
    /// Evaluate a condition tree against an event.
    ///
    /// `And` and `Or` short-circuit left to right, so an error in a child that
    /// is never reached is not reported. Quantified forms (`1 of`, `all of`)
    /// range over the rule's searches in name order; `all of` an empty
    /// selection is true and `1 of` an empty selection is false.
    pub fn evaluate_expression(&self, expr: &SearchExpr, event: &Event<'_>) -> Result<bool> {
        match expr {
            SearchExpr::And(children) => {
                for child in children {
                    if !self.evaluate_expression(child, event)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            SearchExpr::Or(children) => {
                for child in children {
                    if self.evaluate_expression(child, event)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            SearchExpr::Not(child) => Ok(!self.evaluate_expression(child, event)?),
            SearchExpr::SearchIdentifier(name) => self.evaluate_identifier(name, event),
            SearchExpr::OneOfThem => self.any_search(|_| true, event),
            SearchExpr::AllOfThem => self.all_searches(|_| true, event),
            SearchExpr::OneOfPattern(glob) => {
                let pattern = self.patterns.get(glob)?;
                self.any_search(|name| pattern.matches(name), event)
            }
            SearchExpr::AllOfPattern(glob) => {
                let pattern = self.patterns.get(glob)?;
                self.all_searches(|name| pattern.matches(name), event)
            }
        }
    }

    fn evaluate_identifier(&self, name: &str, event: &Event<'_>) -> Result<bool> {
        let search = self
            .rule
            .detection
            .searches
            .get(name)
            .ok_or_else(|| SigmaError::UnknownSearchIdentifier(name.to_string()))?;
        let matched = self.evaluate_rule_search(name, search, event)?;
        trace!(rule = %self.rule.id, search = name, matched, "Evaluated search");
        Ok(matched)
    }

    fn any_search(&self, selected: impl Fn(&str) -> bool, event: &Event<'_>) -> Result<bool> {
        for (name, search) in &self.rule.detection.searches {
            if selected(name.as_str()) && self.evaluate_rule_search(name, search, event)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn all_searches(&self, selected: impl Fn(&str) -> bool, event: &Event<'_>) -> Result<bool> {
        for (name, search) in &self.rule.detection.searches {
            if selected(name.as_str()) && !self.evaluate_rule_search(name, search, event)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
