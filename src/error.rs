use thiserror::Error;

use crate::config::ConfigError;
use crate::explain::Explanation;
use crate::matcher::ConformanceMode;

/// Main library error type that encompasses all possible failure modes
#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("Contract violation in {operation}: {details}")]
    ContractViolation {
        operation: &'static str,
        details: String,
    },

    #[error("Defaults for '{name}' do not conform to their schema: {explanation}")]
    InvalidDefaults {
        name: String,
        explanation: Explanation,
    },

    #[error("Value does not conform ({mode}): {explanation}")]
    ValidationFailed {
        mode: ConformanceMode,
        explanation: Explanation,
    },

    #[error("Invalid predicate pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

impl ShapeError {
    /// The explanation carried by a conformance failure, if any
    pub fn explanation(&self) -> Option<&Explanation> {
        match self {
            ShapeError::InvalidDefaults { explanation, .. }
            | ShapeError::ValidationFailed { explanation, .. } => Some(explanation),
            _ => None,
        }
    }
}

impl From<ConfigError> for ShapeError {
    fn from(err: ConfigError) -> Self {
        ShapeError::Config(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for ShapeError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ShapeError::Concurrency {
            details: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ShapeError>;
