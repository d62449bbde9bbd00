//! Validate-and-pass-through
//!
//! [`Validator`] wraps the matcher and explainer behind a single switch.
//! When validation is enabled, a value is explained against a schema and
//! returned unchanged only if it conforms under the configured mode. When
//! disabled (at startup through configuration, or at build time with the
//! `elide-validation` feature), the value is returned without evaluating a
//! single predicate.
//!
//! Batch validation spreads independent explanations across a rayon thread
//! pool; schemas and values are only ever read, so no coordination is needed.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::config::{ConfigManager, ValidationConfig};
use crate::error::{Result, ShapeError};
use crate::explain::{Explanation, explain};
use crate::matcher::ConformanceMode;
use crate::schema::Schema;

/// Status of a single value's validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationStatus {
    /// Value conforms under the configured mode
    Valid,
    /// Value does not conform
    Invalid { invalid_count: usize, extra_count: usize },
    /// Validation is disabled; nothing was evaluated
    Skipped,
}

impl ValidationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationStatus::Invalid { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ValidationStatus::Skipped)
    }
}

/// Result of validating one value in a batch
#[derive(Debug, Clone, Serialize)]
pub struct ItemValidationResult {
    /// Position of the value in the batch
    pub index: usize,
    pub status: ValidationStatus,
    /// Present for every evaluated value, conforming or not
    pub explanation: Option<Explanation>,
    pub duration: Duration,
}

/// Aggregated results of validating a batch of values
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResults {
    pub mode: ConformanceMode,
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub skipped: usize,
    pub duration: Duration,
    /// Per-value results, in input order
    pub items: Vec<ItemValidationResult>,
}

impl ValidationResults {
    fn from_items(mode: ConformanceMode, items: Vec<ItemValidationResult>, duration: Duration) -> Self {
        let count = |f: fn(&ValidationStatus) -> bool| items.iter().filter(|item| f(&item.status)).count();
        let (valid, invalid, skipped) = (
            count(ValidationStatus::is_valid),
            count(ValidationStatus::is_invalid),
            count(ValidationStatus::is_skipped),
        );
        Self {
            mode,
            total: items.len(),
            valid,
            invalid,
            skipped,
            duration,
            items,
        }
    }

    pub fn has_invalid(&self) -> bool {
        self.invalid > 0
    }

    /// Percentage of evaluated values that conformed
    pub fn success_rate(&self) -> f64 {
        let evaluated = self.total - self.skipped;
        if evaluated == 0 {
            0.0
        } else {
            (self.valid as f64 / evaluated as f64) * 100.0
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemValidationResult> {
        self.items.iter().filter(|item| item.status.is_invalid())
    }
}

/// Schema validation that can be switched off
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// A validator that never evaluates anything
    pub fn disabled() -> Self {
        Self::new(ValidationConfig {
            enabled: false,
            ..ValidationConfig::default()
        })
    }

    pub fn with_mode(mut self, mode: ConformanceMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Return `value` if it conforms to `schema`.
    ///
    /// # Errors
    ///
    /// `ShapeError::ValidationFailed` carrying the full explanation when the
    /// value does not conform under the configured mode. Never fails when
    /// the validator is disabled.
    pub fn validate<'v>(&self, schema: &Schema, value: &'v Value) -> Result<&'v Value> {
        if !self.config.enabled {
            tracing::trace!("validation disabled; passing value through");
            return Ok(value);
        }

        let explanation = explain(schema, value);
        if self.accepts(&explanation) {
            Ok(value)
        } else {
            tracing::debug!(mode = %self.config.mode, %explanation, "value failed validation");
            Err(ShapeError::ValidationFailed {
                mode: self.config.mode,
                explanation,
            })
        }
    }

    /// Owned variant of [`Validator::validate`]
    pub fn validate_owned(&self, schema: &Schema, value: Value) -> Result<Value> {
        self.validate(schema, &value)?;
        Ok(value)
    }

    /// Validate every value in `values` on a dedicated thread pool.
    ///
    /// Failing values do not stop the batch; they are reported in the
    /// returned results.
    ///
    /// # Errors
    ///
    /// `ShapeError::Concurrency` if the thread pool cannot be built.
    pub fn validate_all(&self, schema: &Schema, values: &[Value]) -> Result<ValidationResults> {
        let start = Instant::now();

        if !self.config.enabled {
            let items = (0..values.len())
                .map(|index| ItemValidationResult {
                    index,
                    status: ValidationStatus::Skipped,
                    explanation: None,
                    duration: Duration::ZERO,
                })
                .collect();
            return Ok(ValidationResults::from_items(self.config.mode, items, start.elapsed()));
        }

        let threads = ConfigManager::get_thread_count(&self.config);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;

        let items: Vec<ItemValidationResult> = pool.install(|| {
            values
                .par_iter()
                .enumerate()
                .map(|(index, value)| self.validate_item(schema, index, value))
                .collect()
        });

        let results = ValidationResults::from_items(self.config.mode, items, start.elapsed());
        tracing::debug!(
            total = results.total,
            valid = results.valid,
            invalid = results.invalid,
            threads,
            "batch validation complete"
        );
        Ok(results)
    }

    fn validate_item(&self, schema: &Schema, index: usize, value: &Value) -> ItemValidationResult {
        let start = Instant::now();
        let explanation = explain(schema, value);
        let status = if self.accepts(&explanation) {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid {
                invalid_count: explanation.invalid_paths().len(),
                extra_count: explanation.extra_paths().len(),
            }
        };

        ItemValidationResult {
            index,
            status,
            explanation: Some(explanation),
            duration: start.elapsed(),
        }
    }

    fn accepts(&self, explanation: &Explanation) -> bool {
        match self.config.mode {
            ConformanceMode::Permissive => explanation.conforms(),
            ConformanceMode::Exact => explanation.conforms_exactly(),
        }
    }
}
