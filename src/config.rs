//! Evaluator configuration.
//!
//! Configuration can be built in code with the `with_*` methods or loaded
//! from YAML:
//!
//! ```yaml
//! fieldmappings:
//!   Image: process.executable
//!   CommandLine:
//!     - process.command_line
//!     - $.payload.cmd
//! jsonpath_recovery: true
//! parallel:
//!   enabled: true
//!   min_batch_size: 64
//! ```
//!
//! Every key is optional.

use crate::error::{Result, SigmaError};
use crate::fields::FieldMappingTable;
use serde::Deserialize;
use std::path::Path;

/// Batch parallelism settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParallelConfig {
    /// Evaluate large batches on the rayon thread pool.
    pub enabled: bool,
    /// Smallest batch that is evaluated in parallel.
    pub min_batch_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_batch_size: 64,
        }
    }
}

/// Configuration for a [`RuleEvaluator`](crate::RuleEvaluator).
///
/// # Examples
///
/// ```rust
/// use sigma_search_eval::EvaluatorConfig;
///
/// let config = EvaluatorConfig::new()
///     .with_jsonpath_recovery(false)
///     .with_min_batch_size_for_parallelism(16);
/// assert!(!config.jsonpath_recovery);
/// assert_eq!(config.parallel.min_batch_size, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvaluatorConfig {
    #[serde(rename = "fieldmappings")]
    pub field_mappings: FieldMappingTable,
    /// Decode JSON left serialized inside string fields when a JSONPath needs it.
    pub jsonpath_recovery: bool,
    pub parallel: ParallelConfig,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            field_mappings: FieldMappingTable::new(),
            jsonpath_recovery: true,
            parallel: ParallelConfig::default(),
        }
    }
}

impl EvaluatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-threaded evaluation, for tests and debugging.
    pub fn sequential() -> Self {
        Self::default().with_parallel_processing(false)
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty document deserializes as null, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallel.min_batch_size == 0 {
            return Err(SigmaError::ConfigError(
                "parallel.min_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_field_mappings(mut self, mappings: FieldMappingTable) -> Self {
        self.field_mappings = mappings;
        self
    }

    pub fn with_jsonpath_recovery(mut self, enable: bool) -> Self {
        self.jsonpath_recovery = enable;
        self
    }

    pub fn with_parallel_processing(mut self, enable: bool) -> Self {
        self.parallel.enabled = enable;
        self
    }

    /// Set the minimum batch size for parallel evaluation (at least 1).
    pub fn with_min_batch_size_for_parallelism(mut self, min_size: usize) -> Self {
        self.parallel.min_batch_size = min_size.max(1);
        self
    }

    /// Whether a batch of `len` events should be evaluated in parallel.
    pub fn parallel_for(&self, len: usize) -> bool {
        self.parallel.enabled && len >= self.parallel.min_batch_size
    }
}
