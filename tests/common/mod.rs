#![allow(dead_code)]

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::fs;
use validate_shape::predicates::{is_number, is_positive_number, is_string, one_of};
use validate_shape::{ConformanceMode, Predicate, Schema, ValidationConfig, Validator, schema};

/// Schema for a pet with a nested toy
pub fn pet_schema() -> Schema {
    schema! {
        "name" => is_string(),
        "toy" => schema! {
            "age" => is_positive_number(),
            "color" => one_of(["red", "blue"]),
        },
    }
}

pub fn valid_pet() -> Value {
    json!({"name": "rex", "toy": {"age": 2, "color": "red"}})
}

/// A numeric check that errors instead of returning `false` on non-numbers
pub fn erroring_number_check() -> Predicate {
    Predicate::fallible("erroring_number_check", |value| {
        value
            .and_then(Value::as_f64)
            .map(|n| n >= 0.0)
            .ok_or_else(|| anyhow::anyhow!("not a number"))
    })
}

/// Same answers as [`erroring_number_check`] but returns `false` directly
pub fn plain_number_check() -> Predicate {
    Predicate::new("plain_number_check", |value| {
        value.and_then(Value::as_f64).is_some_and(|n| n >= 0.0)
    })
}

/// A numeric check that panics on non-numbers
pub fn panicking_number_check() -> Predicate {
    Predicate::new("panicking_number_check", |value| {
        let n = value.and_then(Value::as_f64).unwrap();
        n >= 0.0
    })
}

pub fn schema_with_number_check(check: Predicate) -> Schema {
    schema! {
        "n" => check,
        "inner" => schema! { "m" => is_number() },
    }
}

/// A validator that evaluates regardless of the `elide-validation` feature
pub fn evaluating_validator(mode: ConformanceMode) -> Validator {
    Validator::new(ValidationConfig {
        enabled: true,
        mode,
        threads: Some(2),
    })
}

/// Write a config file into `dir` and return its path
pub async fn write_config(dir: &Path, name: &str, content: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content).await?;
    Ok(path)
}
