//! # SIGMA Search Evaluator
//!
//! Evaluates the detection logic of already-parsed [SIGMA rules](https://github.com/SigmaHQ/sigma)
//! against individual events.
//!
//! A rule's detection is a table of named searches plus one or more
//! condition trees combining them. Each search is a list of field matchers
//! (`Image|endswith: '\cmd.exe'`). Evaluating a rule answers, per condition,
//! whether the event satisfies it.
//!
//! ## Quick Start
//!
//! ```rust
//! use sigma_search_eval::ir::{Detection, FieldMatcher, Rule, Search, SearchExpr};
//! use sigma_search_eval::{Event, EvaluatorConfig, RuleEvaluator};
//!
//! let detection = Detection::new()
//!     .with_search(
//!         "selection",
//!         Search::fields(vec![
//!             FieldMatcher::new("EventID", &[], &["4624"]),
//!             FieldMatcher::new("LogonType", &[], &["2", "10"]),
//!         ]),
//!     )
//!     .with_condition(SearchExpr::identifier("selection"));
//!
//! let evaluator = RuleEvaluator::new(Rule::new("logon", detection), EvaluatorConfig::default())?;
//!
//! let event = serde_json::json!({"EventID": 4624, "LogonType": 10});
//! let result = evaluator.matches(&Event::from(&event))?;
//! assert!(result.matched);
//! # Ok::<(), sigma_search_eval::SigmaError>(())
//! ```
//!
//! ### Field Mapping
//!
//! Rule field names can be mapped onto the event schema, including JSONPath
//! targets into nested documents. Nested JSON that was left serialized inside
//! a string field is decoded on demand.
//!
//! ```rust
//! use sigma_search_eval::fields::FieldMappingTable;
//! use sigma_search_eval::ir::{Detection, FieldMatcher, Rule, Search, SearchExpr};
//! use sigma_search_eval::{Event, EvaluatorConfig, RuleEvaluator};
//!
//! let mut mappings = FieldMappingTable::new();
//! mappings.add_mapping("CommandLine", "$.payload.cmd");
//!
//! let detection = Detection::new()
//!     .with_search(
//!         "selection",
//!         Search::fields(vec![FieldMatcher::new("CommandLine", &["contains"], &["-enc"])]),
//!     )
//!     .with_condition(SearchExpr::identifier("selection"));
//! let config = EvaluatorConfig::new().with_field_mappings(mappings);
//! let evaluator = RuleEvaluator::new(Rule::new("encoded", detection), config)?;
//!
//! let event = serde_json::json!({"payload": "{\"cmd\": \"powershell -enc SQBFAFgA\"}"});
//! assert!(evaluator.matches(&Event::from(&event))?.matched);
//! # Ok::<(), sigma_search_eval::SigmaError>(())
//! ```

pub mod config;
pub mod error;
pub mod eval;
pub mod event;
pub mod fields;
pub mod ir;
pub mod matcher;

pub use config::{EvaluatorConfig, ParallelConfig};
pub use error::{Result, SigmaError};
pub use eval::{MatchResult, RuleEvaluator, RuleEvaluatorBuilder};
pub use event::Event;
pub use fields::{FieldMappingTable, FieldResolver};
pub use ir::{Condition, Detection, FieldMatcher, Rule, Search, SearchExpr};
pub use matcher::{ComparatorFn, ModifierFn, ModifierRegistry};
