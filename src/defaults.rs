//! Schemas with defaults.
//!
//! A defaults source pairs every rule with a default value. Building it
//! splits the pairs into a plain [`Schema`] and a defaults mapping, then
//! checks that the defaults exactly conform to the schema. A source whose
//! defaults fail their own rules cannot be built.
//!
//! Only one level is split: a nested schema rule is kept as is, and its
//! default is whatever mapping was supplied next to it.

use serde_json::{Map, Value};

use crate::error::{Result, ShapeError};
use crate::explain::explain;
use crate::schema::{Rule, Schema};

/// Ordered `key => (rule, default)` pairs
#[derive(Debug, Clone, Default)]
pub struct DefaultsSource {
    entries: Vec<(String, Rule, Value)>,
}

impl DefaultsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a repeated key replaces the earlier pair in place
    pub fn entry(
        mut self,
        key: impl Into<String>,
        rule: impl Into<Rule>,
        default: impl Into<Value>,
    ) -> Self {
        self.insert(key, rule, default);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, rule: impl Into<Rule>, default: impl Into<Value>) {
        let key = key.into();
        let (rule, default) = (rule.into(), default.into());
        match self.entries.iter_mut().find(|(existing, _, _)| *existing == key) {
            Some(slot) => *slot = (key, rule, default),
            None => self.entries.push((key, rule, default)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, R, V> FromIterator<(K, (R, V))> for DefaultsSource
where
    K: Into<String>,
    R: Into<Rule>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, (R, V))>>(iter: I) -> Self {
        let mut source = DefaultsSource::new();
        for (key, (rule, default)) in iter {
            source.insert(key, rule, default);
        }
        source
    }
}

/// A schema together with defaults known to conform to it exactly
#[derive(Debug, Clone)]
pub struct SchemaWithDefaults {
    name: String,
    schema: Schema,
    defaults: Map<String, Value>,
}

impl SchemaWithDefaults {
    /// Split `source` and self-check the result.
    ///
    /// # Errors
    ///
    /// - `ShapeError::ContractViolation` if `name` is empty.
    /// - `ShapeError::InvalidDefaults` naming `name` if the defaults do not
    ///   exactly conform to the derived schema.
    pub fn build(name: impl Into<String>, source: DefaultsSource) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShapeError::ContractViolation {
                operation: "build_with_defaults",
                details: "a defaults source must be named".to_string(),
            });
        }

        let mut schema = Schema::new();
        let mut defaults = Map::new();
        for (key, rule, default) in source.entries {
            schema.insert(key.clone(), rule);
            defaults.insert(key, default);
        }

        let explanation = explain(&schema, &Value::Object(defaults.clone()));
        if !explanation.conforms_exactly() {
            tracing::warn!(defaults = %name, %explanation, "defaults fail their own schema");
            return Err(ShapeError::InvalidDefaults { name, explanation });
        }

        Ok(Self {
            name,
            schema,
            defaults,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    pub fn into_parts(self) -> (Schema, Map<String, Value>) {
        (self.schema, self.defaults)
    }
}

/// Split a defaults source into `(schema, defaults)`, failing if the
/// defaults do not exactly conform to the schema.
///
/// Nested defaults sources are not supported. To default a sub-mapping,
/// build it first and pass its schema as the rule and its defaults mapping
/// as the default:
///
/// ```
/// use serde_json::Value;
/// use validate_shape::predicates::{is_number, is_string};
/// use validate_shape::{DefaultsSource, build_with_defaults};
///
/// let (toy_schema, toy_defaults) =
///     build_with_defaults("toy", DefaultsSource::new().entry("age", is_number(), 0))?;
/// let (pet_schema, pet_defaults) = build_with_defaults(
///     "pet",
///     DefaultsSource::new()
///         .entry("name", is_string(), "rex")
///         .entry("toy", toy_schema, Value::Object(toy_defaults)),
/// )?;
/// assert!(pet_schema.get("toy").is_some_and(|rule| rule.is_nested()));
/// assert_eq!(pet_defaults["toy"]["age"], 0);
/// # Ok::<(), validate_shape::ShapeError>(())
/// ```
pub fn build_with_defaults(
    name: impl Into<String>,
    source: DefaultsSource,
) -> Result<(Schema, Map<String, Value>)> {
    SchemaWithDefaults::build(name, source).map(SchemaWithDefaults::into_parts)
}
