//! Error types for the SIGMA search evaluator.
//!
//! Only two kinds of failure exist. Rule-definition errors mean the rule
//! itself is invalid and evaluation of that rule must abort. Setup errors
//! come from loading configuration. Conditions caused by event data
//! (missing fields, unexpected shapes, failed JSONPath traversal) are never
//! errors; they resolve to "no match".

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SigmaError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SigmaError {
    // Rule-definition errors
    #[error("Unknown search identifier: {0}")]
    UnknownSearchIdentifier(String),
    #[error("Keyword searches are unsupported: {0}")]
    UnsupportedKeywordSearch(String),
    #[error("Unknown modifier: {0}")]
    UnknownModifier(String),
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),
    #[error("Invalid JSONPath expression: {0}")]
    InvalidJsonPath(String),

    // Setup errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("YAML parsing error: {0}")]
    YamlError(String),
}

impl SigmaError {
    /// Returns true when the error means the rule definition itself is invalid.
    pub fn is_rule_definition_error(&self) -> bool {
        matches!(
            self,
            SigmaError::UnknownSearchIdentifier(_)
                | SigmaError::UnsupportedKeywordSearch(_)
                | SigmaError::UnknownModifier(_)
                | SigmaError::InvalidPattern(_)
                | SigmaError::InvalidJsonPath(_)
        )
    }
}

impl From<std::io::Error> for SigmaError {
    fn from(err: std::io::Error) -> Self {
        SigmaError::IoError(err.to_string())
    }
}

impl From<serde_yaml::Error> for SigmaError {
    fn from(err: serde_yaml::Error) -> Self {
        SigmaError::YamlError(err.to_string())
    }
}
