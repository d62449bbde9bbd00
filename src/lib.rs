//! # validate-shape Library
//!
//! Structural validation of JSON-like values against schemas of predicates.
//!
//! A [`Schema`] maps keys to rules; a rule is either a named [`Predicate`]
//! over the (possibly absent) value at that key, or another schema to apply
//! to it. On top of that this crate provides:
//!
//! - a short-circuiting matcher, in permissive and exact-keys modes
//! - an explainer that reports every failing key and every unexpected key
//! - a builder that derives a schema and its defaults from one source and
//!   checks the defaults against the schema
//! - a [`Validator`] that can be switched off entirely through configuration
//!   or the `elide-validation` feature

pub mod config;
pub mod defaults;
pub mod error;
pub mod error_reporter;
pub mod explain;
pub mod matcher;
pub mod output;
pub mod predicates;
pub mod schema;
pub mod validator;

pub use config::{Config, ConfigError, ConfigManager, OutputConfig, OutputFormatConfig, ValidationConfig};
pub use defaults::{DefaultsSource, SchemaWithDefaults, build_with_defaults};
pub use error::{Result, ShapeError};
pub use error_reporter::ErrorReporter;
pub use explain::{
    Entry, Explanation, Observed, explain, explained_conforms_exact, explained_conforms_permissive,
    explanation_schema, is_valid_explanation,
};
pub use matcher::{ConformanceMode, conforms, conforms_exact, conforms_permissive, conforms_with_mode};
pub use output::{Output, VerbosityLevel};
pub use schema::{Predicate, Rule, Schema, is_truthy};
pub use validator::{ItemValidationResult, ValidationResults, ValidationStatus, Validator};
