//! Explanations: a structured diff between a schema and a candidate.
//!
//! Unlike the matcher, the explainer never short-circuits. It reports every
//! failing predicate (`invalid`) and every key the schema does not name
//! (`extra`), nesting entries by key to mirror the schema's own nesting.
//!
//! Ordering:
//! - `invalid` follows schema key order.
//! - `extra` lists the current level's unexpected keys in candidate order,
//!   followed by extras found in nested schemas (in schema key order).

use std::fmt;

use serde::ser::{Serialize, SerializeTuple, Serializer};
use serde_json::Value;

use crate::error::{Result, ShapeError};
use crate::matcher::conforms_exact;
use crate::predicates::is_array;
use crate::schema::{Rule, Schema};

/// What was observed at a reported key
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Observed {
    /// Key missing, or the enclosing candidate was not a mapping.
    /// Serializes as `null`.
    Absent,
    Value(Value),
    /// Entries reported by a nested schema
    Nested(Vec<Entry>),
}

impl Observed {
    fn from_lookup(value: Option<&Value>) -> Self {
        value.map_or(Observed::Absent, |v| Observed::Value(v.clone()))
    }
}

/// One reported `(key, observed)` pair
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub observed: Observed,
}

impl Entry {
    pub fn absent(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            observed: Observed::Absent,
        }
    }

    pub fn value(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            observed: Observed::Value(value),
        }
    }

    pub fn nested(key: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            key: key.into(),
            observed: Observed::Nested(entries),
        }
    }

    fn flatten_into<'a>(
        &'a self,
        prefix: &mut Vec<&'a str>,
        out: &mut Vec<(Vec<String>, Option<&'a Value>)>,
    ) {
        prefix.push(&self.key);
        match &self.observed {
            Observed::Nested(entries) => {
                for entry in entries {
                    entry.flatten_into(prefix, out);
                }
            }
            Observed::Value(value) => {
                out.push((prefix.iter().map(|s| s.to_string()).collect(), Some(value)));
            }
            Observed::Absent => {
                out.push((prefix.iter().map(|s| s.to_string()).collect(), None));
            }
        }
        prefix.pop();
    }
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.key)?;
        pair.serialize_element(&self.observed)?;
        pair.end()
    }
}

/// A flattened entry: the key path from the root and the observed leaf
pub type PathEntry<'a> = (Vec<String>, Option<&'a Value>);

/// Result of [`explain`]. Both lists are always present and may be empty.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
pub struct Explanation {
    pub invalid: Vec<Entry>,
    pub extra: Vec<Entry>,
}

impl Explanation {
    /// Permissive conformance: no invalid entries
    pub fn conforms(&self) -> bool {
        self.invalid.is_empty()
    }

    /// Exact conformance: no invalid and no extra entries
    pub fn conforms_exactly(&self) -> bool {
        self.invalid.is_empty() && self.extra.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.conforms_exactly()
    }

    /// Invalid entries flattened to key paths, depth first
    pub fn invalid_paths(&self) -> Vec<PathEntry<'_>> {
        flatten(&self.invalid)
    }

    /// Extra entries flattened to key paths, depth first
    pub fn extra_paths(&self) -> Vec<PathEntry<'_>> {
        flatten(&self.extra)
    }

    /// The two-field JSON form checked by [`is_valid_explanation`]
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "invalid": self.invalid,
            "extra": self.extra,
        })
    }
}

fn flatten(entries: &[Entry]) -> Vec<PathEntry<'_>> {
    let mut out = Vec::new();
    let mut prefix = Vec::new();
    for entry in entries {
        entry.flatten_into(&mut prefix, &mut out);
    }
    out
}

pub(crate) fn render_observed(value: Option<&Value>) -> String {
    value.map_or_else(|| "<absent>".to_string(), Value::to_string)
}

fn render_paths(paths: &[PathEntry<'_>]) -> String {
    paths
        .iter()
        .map(|(path, value)| format!("{}: {}", path.join("."), render_observed(*value)))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid [{}], extra [{}]",
            render_paths(&self.invalid_paths()),
            render_paths(&self.extra_paths())
        )
    }
}

/// Explain how `value` deviates from `schema`.
///
/// A candidate that is not a JSON object reports every schema key as invalid
/// with an absent observation and reports no extras.
pub fn explain(schema: &Schema, value: &Value) -> Explanation {
    explain_at(schema, Some(value))
}

fn explain_at(schema: &Schema, value: Option<&Value>) -> Explanation {
    let Some(Value::Object(map)) = value else {
        return Explanation {
            invalid: schema.keys().map(Entry::absent).collect(),
            extra: Vec::new(),
        };
    };

    let mut invalid = Vec::new();
    let mut nested_extra = Vec::new();

    for (key, rule) in schema.iter() {
        let observed = map.get(key);
        match rule {
            Rule::Nested(inner) => {
                let sub = explain_at(inner, observed);
                if !sub.invalid.is_empty() {
                    invalid.push(Entry::nested(key, sub.invalid));
                }
                if !sub.extra.is_empty() {
                    nested_extra.push(Entry::nested(key, sub.extra));
                }
            }
            Rule::Predicate(predicate) => {
                if !predicate.test(observed) {
                    invalid.push(Entry {
                        key: key.to_string(),
                        observed: Observed::from_lookup(observed),
                    });
                }
            }
        }
    }

    let mut extra: Vec<Entry> = map
        .iter()
        .filter(|(key, _)| !schema.contains_key(key))
        .map(|(key, value)| Entry::value(key.as_str(), value.clone()))
        .collect();
    extra.extend(nested_extra);

    Explanation { invalid, extra }
}

/// Schema every explanation's JSON form conforms to exactly
pub fn explanation_schema() -> Schema {
    Schema::new()
        .with_rule("invalid", is_array())
        .with_rule("extra", is_array())
}

/// Shape check on an explanation's JSON form: an object holding exactly
/// `invalid` and `extra`, both arrays.
pub fn is_valid_explanation(explanation: &Value) -> bool {
    explanation.is_object() && conforms_exact(&explanation_schema(), explanation)
}

/// Permissive conformance read off an already computed explanation.
///
/// # Errors
///
/// `ShapeError::ContractViolation` if `explanation` is not a valid
/// explanation.
pub fn explained_conforms_permissive(explanation: &Value) -> Result<bool> {
    let (invalid, _) = explanation_lists(explanation, "explained_conforms_permissive")?;
    Ok(invalid.is_empty())
}

/// Exact conformance read off an already computed explanation.
///
/// # Errors
///
/// `ShapeError::ContractViolation` if `explanation` is not a valid
/// explanation.
pub fn explained_conforms_exact(explanation: &Value) -> Result<bool> {
    let (invalid, extra) = explanation_lists(explanation, "explained_conforms_exact")?;
    Ok(invalid.is_empty() && extra.is_empty())
}

fn explanation_lists<'a>(
    explanation: &'a Value,
    operation: &'static str,
) -> Result<(&'a Vec<Value>, &'a Vec<Value>)> {
    let lists = is_valid_explanation(explanation)
        .then(|| {
            let invalid = explanation.get("invalid").and_then(Value::as_array)?;
            let extra = explanation.get("extra").and_then(Value::as_array)?;
            Some((invalid, extra))
        })
        .flatten();

    lists.ok_or_else(|| ShapeError::ContractViolation {
        operation,
        details: format!(
            "expected an object with exactly `invalid` and `extra` arrays, found {}",
            explanation
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicates::{is_number, is_positive_number, is_string, optional};
    use crate::schema;
    use crate::schema::Predicate;
    use serde_json::json;

    #[test]
    fn test_non_object_candidate() {
        let schema = schema! { "a" => is_number() };
        assert_eq!(
            explain(&schema, &json!(5)),
            Explanation {
                invalid: vec![Entry::absent("a")],
                extra: vec![],
            }
        );
    }

    #[test]
    fn test_nested_mismatch() {
        let schema = schema! { "toy" => schema! { "age" => is_positive_number() } };
        let explanation = explain(&schema, &json!({"toy": {"age": -1}}));
        assert_eq!(
            explanation,
            Explanation {
                invalid: vec![Entry::nested("toy", vec![Entry::value("age", json!(-1))])],
                extra: vec![],
            }
        );
    }

    #[test]
    fn test_extra_key_detection() {
        let schema = schema! { "a" => is_string() };
        let explanation = explain(&schema, &json!({"a": "x", "b": 1}));
        assert_eq!(
            explanation,
            Explanation {
                invalid: vec![],
                extra: vec![Entry::value("b", json!(1))],
            }
        );
    }

    #[test]
    fn test_missing_key_reported_absent() {
        let schema = schema! { "a" => is_string(), "b" => optional(is_number()) };
        let explanation = explain(&schema, &json!({}));
        assert_eq!(explanation.invalid, vec![Entry::absent("a")]);
        assert!(explanation.extra.is_empty());
    }

    #[test]
    fn test_collects_every_failure_in_schema_order() {
        let schema = schema! {
            "z" => is_number(),
            "a" => is_number(),
            "m" => is_string(),
        };
        let explanation = explain(&schema, &json!({"a": "x", "m": 1, "z": "y"}));
        let keys: Vec<_> = explanation.invalid.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_root_extras_precede_nested_extras() {
        let schema = schema! {
            "toy" => schema! { "age" => is_number() },
            "name" => is_string(),
        };
        let value = json!({
            "toy": {"age": 1, "color": "red"},
            "zzz": true,
            "name": "rex",
            "aaa": false,
        });
        let explanation = explain(&schema, &value);
        assert_eq!(
            explanation.extra,
            vec![
                Entry::value("zzz", json!(true)),
                Entry::value("aaa", json!(false)),
                Entry::nested("toy", vec![Entry::value("color", json!("red"))]),
            ]
        );
    }

    #[test]
    fn test_nested_non_object_is_mismatch() {
        let schema = schema! { "toy" => schema! { "age" => is_number(), "name" => is_string() } };
        let explanation = explain(&schema, &json!({"toy": "ball"}));
        assert_eq!(
            explanation.invalid,
            vec![Entry::nested(
                "toy",
                vec![Entry::absent("age"), Entry::absent("name")]
            )]
        );
        assert!(explanation.extra.is_empty());
    }

    #[test]
    fn test_raising_predicate_reported_invalid() {
        let schema = schema! {
            "n" => Predicate::fallible("checked", |v| {
                let n = v.and_then(Value::as_i64).ok_or_else(|| anyhow::anyhow!("not an int"))?;
                Ok(n > 0)
            }),
        };
        let explanation = explain(&schema, &json!({"n": "one"}));
        assert_eq!(explanation.invalid, vec![Entry::value("n", json!("one"))]);
    }

    #[test]
    fn test_explanation_json_form() {
        let schema = schema! {
            "toy" => schema! { "age" => is_positive_number() },
            "name" => is_string(),
        };
        let explanation = explain(&schema, &json!({"toy": {"age": -1}, "x": 2}));
        assert_eq!(
            explanation.to_value(),
            json!({
                "invalid": [["toy", [["age", -1]]], ["name", null]],
                "extra": [["x", 2]],
            })
        );
        assert!(is_valid_explanation(&explanation.to_value()));
    }

    #[test]
    fn test_is_valid_explanation_shape() {
        assert!(is_valid_explanation(&json!({"invalid": [], "extra": []})));
        assert!(!is_valid_explanation(&json!({"invalid": []})));
        assert!(!is_valid_explanation(&json!({"invalid": [], "extra": {}})));
        assert!(!is_valid_explanation(
            &json!({"invalid": [], "extra": [], "other": []})
        ));
        assert!(!is_valid_explanation(&json!([[], []])));
    }

    #[test]
    fn test_explained_conformance() {
        let ok = json!({"invalid": [], "extra": []});
        let extra_only = json!({"invalid": [], "extra": [["b", 1]]});
        let invalid = json!({"invalid": [["a", null]], "extra": []});

        assert!(explained_conforms_permissive(&ok).unwrap());
        assert!(explained_conforms_exact(&ok).unwrap());
        assert!(explained_conforms_permissive(&extra_only).unwrap());
        assert!(!explained_conforms_exact(&extra_only).unwrap());
        assert!(!explained_conforms_permissive(&invalid).unwrap());
    }

    #[test]
    fn test_explained_conformance_rejects_malformed() {
        let malformed = json!({"invalid": "none"});
        match explained_conforms_permissive(&malformed) {
            Err(ShapeError::ContractViolation { operation, .. }) => {
                assert_eq!(operation, "explained_conforms_permissive")
            }
            other => panic!("Expected ContractViolation, got {:?}", other),
        }
        assert!(explained_conforms_exact(&json!(null)).is_err());
    }

    #[test]
    fn test_display_uses_dotted_paths() {
        let schema = schema! {
            "toy" => schema! { "age" => is_positive_number() },
            "name" => is_string(),
        };
        let explanation = explain(&schema, &json!({"toy": {"age": -1}, "b": true}));
        assert_eq!(
            explanation.to_string(),
            "invalid [toy.age: -1, name: <absent>], extra [b: true]"
        );
    }

    #[test]
    fn test_explain_is_idempotent() {
        let schema = schema! { "toy" => schema! { "age" => is_number() }, "n" => is_string() };
        let value = json!({"toy": {"age": "old", "x": 1}, "y": 2});
        assert_eq!(explain(&schema, &value), explain(&schema, &value));
    }
}
