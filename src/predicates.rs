//! Built-in predicates and combinators for schema leaves.
//!
//! Every constructor returns a [`Predicate`]. Predicates that inspect a value
//! of the wrong type either return `false` directly or fail with an error,
//! which the evaluation boundary turns into `false`.

use anyhow::{Context, anyhow};
use regex::Regex;
use serde_json::Value;

use crate::error::Result;
use crate::schema::Predicate;

/// Accepts anything, including an absent key
pub fn any() -> Predicate {
    Predicate::new("any", |_| true)
}

/// Accepts any value as long as the key is present
pub fn present() -> Predicate {
    Predicate::new("present", |value| value.is_some())
}

/// Accepts an explicit `null`
pub fn is_null() -> Predicate {
    Predicate::new("is_null", |value| matches!(value, Some(Value::Null)))
}

pub fn is_bool() -> Predicate {
    Predicate::new("is_bool", |value| matches!(value, Some(Value::Bool(_))))
}

pub fn is_number() -> Predicate {
    Predicate::new("is_number", |value| matches!(value, Some(Value::Number(_))))
}

/// Accepts numbers representable as `i64` or `u64`
pub fn is_integer() -> Predicate {
    Predicate::new("is_integer", |value| match value {
        Some(Value::Number(n)) => n.is_i64() || n.is_u64(),
        _ => false,
    })
}

pub fn is_string() -> Predicate {
    Predicate::new("is_string", |value| matches!(value, Some(Value::String(_))))
}

pub fn is_array() -> Predicate {
    Predicate::new("is_array", |value| matches!(value, Some(Value::Array(_))))
}

pub fn is_object() -> Predicate {
    Predicate::new("is_object", |value| matches!(value, Some(Value::Object(_))))
}

/// Strictly greater than zero. Fails (and so does not match) on non-numbers.
pub fn is_positive_number() -> Predicate {
    Predicate::fallible("is_positive_number", |value| {
        Ok(as_number(value)? > 0.0)
    })
}

/// Inclusive numeric range
pub fn in_range(min: f64, max: f64) -> Predicate {
    Predicate::fallible(format!("in_range({min}, {max})"), move |value| {
        let n = as_number(value)?;
        Ok(min <= n && n <= max)
    })
}

/// Accepts values equal to one of `allowed`
pub fn one_of<I, V>(allowed: I) -> Predicate
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    let name = format!("one_of({})", Value::Array(allowed.clone()));
    Predicate::new(name, move |value| {
        value.is_some_and(|v| allowed.iter().any(|candidate| candidate == v))
    })
}

/// Accepts strings matching `pattern` (unanchored, as [`Regex::is_match`]).
///
/// # Errors
///
/// Returns `ShapeError::Pattern` if `pattern` does not compile.
pub fn matches(pattern: &str) -> Result<Predicate> {
    let regex = Regex::new(pattern)?;
    Ok(Predicate::fallible(
        format!("matches({pattern})"),
        move |value| {
            let text = value
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("expected a string"))?;
            Ok(regex.is_match(text))
        },
    ))
}

/// Accepts arrays whose every element satisfies `element`
pub fn array_of(element: Predicate) -> Predicate {
    let name = format!("array_of({})", element.name());
    Predicate::new(name, move |value| match value {
        Some(Value::Array(items)) => items.iter().all(|item| element.test(Some(item))),
        _ => false,
    })
}

/// Accepts an absent key or `null`, otherwise defers to `inner`
pub fn optional(inner: Predicate) -> Predicate {
    let name = format!("optional({})", inner.name());
    Predicate::new(name, move |value| match value {
        None | Some(Value::Null) => true,
        Some(_) => inner.test(value),
    })
}

pub fn not(inner: Predicate) -> Predicate {
    let name = format!("not({})", inner.name());
    Predicate::new(name, move |value| !inner.test(value))
}

/// Conjunction; an empty list accepts everything
pub fn all_of(predicates: Vec<Predicate>) -> Predicate {
    let name = format!("all_of({})", join_names(&predicates));
    Predicate::new(name, move |value| predicates.iter().all(|p| p.test(value)))
}

/// Disjunction; an empty list accepts nothing
pub fn any_of(predicates: Vec<Predicate>) -> Predicate {
    let name = format!("any_of({})", join_names(&predicates));
    Predicate::new(name, move |value| predicates.iter().any(|p| p.test(value)))
}

fn as_number(value: Option<&Value>) -> anyhow::Result<f64> {
    let value = value.context("value is absent")?;
    value
        .as_f64()
        .ok_or_else(|| anyhow!("expected a number, found {value}"))
}

fn join_names(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(Predicate::name)
        .collect::<Vec<_>>()
        .join(", ")
}
