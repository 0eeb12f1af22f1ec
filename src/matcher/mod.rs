//! Comparator chains and value collection for SIGMA field matchers.
//!
//! ## Core Components
//!
//! - [`ModifierRegistry`] - Immutable name -> modifier table
//! - [`build_comparator`] - Folds a modifier list over exact equality
//! - [`canonical_string`] - String form every comparison works on
//! - [`expand`] - Flattens resolved values into comparison candidates
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sigma_search_eval::matcher::{build_comparator, default_registry};
//!
//! let cmp = build_comparator(&default_registry(), &["endswith".to_string()])?;
//! assert!(cmp(&serde_json::json!("C:\\Windows\\cmd.exe"), "\\cmd.exe"));
//! ```

pub mod chain;
pub mod defaults;
pub mod modifiers;
pub mod types;
pub mod values;

pub use chain::{build_comparator, validate_modifiers};
pub use defaults::{canonical_string, create_exact_match};
pub use modifiers::{default_registry, register_defaults, ModifierRegistry};
pub use types::{ComparatorFn, ModifierFn};
pub use values::{expand, expand_into};
