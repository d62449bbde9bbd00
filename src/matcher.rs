//! Boolean conformance checks.
//!
//! The matcher walks schema and candidate together and stops at the first
//! failing entry. Use [`crate::explain`] when every failure is needed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::{Rule, Schema};

/// Which conformance check to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConformanceMode {
    /// Every schema entry holds; unrelated candidate keys are allowed
    #[default]
    Permissive,
    /// Permissive, and every candidate key (at every level) is a schema key
    Exact,
}

impl ConformanceMode {
    pub fn exact_keys(self) -> bool {
        matches!(self, ConformanceMode::Exact)
    }
}

impl fmt::Display for ConformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConformanceMode::Permissive => write!(f, "permissive"),
            ConformanceMode::Exact => write!(f, "exact"),
        }
    }
}

impl FromStr for ConformanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "permissive" => Ok(ConformanceMode::Permissive),
            "exact" => Ok(ConformanceMode::Exact),
            other => Err(format!("unknown conformance mode: {}", other)),
        }
    }
}

/// Check `value` against `schema`.
///
/// With `exact_keys`, a mapping carrying a key the schema does not name is
/// rejected at that level. This is a subset check: a schema key missing from
/// the candidate is fine as long as its predicate accepts an absent value.
///
/// A candidate that is not a JSON object fails every key of the schema, so
/// it conforms only to the empty schema.
pub fn conforms(schema: &Schema, value: &Value, exact_keys: bool) -> bool {
    conforms_at(schema, Some(value), exact_keys)
}

/// [`conforms`] with extra keys allowed
pub fn conforms_permissive(schema: &Schema, value: &Value) -> bool {
    conforms(schema, value, false)
}

/// [`conforms`] with extra keys rejected
pub fn conforms_exact(schema: &Schema, value: &Value) -> bool {
    conforms(schema, value, true)
}

pub fn conforms_with_mode(schema: &Schema, value: &Value, mode: ConformanceMode) -> bool {
    conforms(schema, value, mode.exact_keys())
}

pub(crate) fn conforms_at(schema: &Schema, value: Option<&Value>, exact_keys: bool) -> bool {
    let Some(Value::Object(map)) = value else {
        return schema.is_empty();
    };

    if exact_keys && map.keys().any(|key| !schema.contains_key(key)) {
        return false;
    }

    schema.iter().all(|(key, rule)| match rule {
        Rule::Nested(inner) => conforms_at(inner, map.get(key), exact_keys),
        Rule::Predicate(predicate) => predicate.test(map.get(key)),
    })
}
