//! Schema Model
//!
//! A schema (a "pack") maps keys to rules. A rule is either a leaf
//! [`Predicate`] applied to the value found at that key, or a nested
//! [`Schema`] applied to the mapping found there.
//!
//! Schemas are ordered: iteration follows insertion order, and that order is
//! the order in which explanations report invalid entries.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

type PredicateFn = dyn Fn(Option<&Value>) -> anyhow::Result<bool> + Send + Sync;

/// Unary test over the value found at a schema key.
///
/// The argument is `None` when the key is absent from the candidate.
/// Evaluation never propagates a failure: an `Err` returned by a fallible
/// predicate, or a panic raised inside one, counts as a non-match.
#[derive(Clone)]
pub struct Predicate {
    name: Arc<str>,
    test: Arc<PredicateFn>,
}

impl Predicate {
    /// Build a predicate from an infallible boolean test.
    ///
    /// A panic inside `f` is caught and counts as a non-match, but the
    /// process panic hook still runs first, so each one prints a panic
    /// message (and a backtrace when `RUST_BACKTRACE` is set) to stderr.
    /// Under `panic = "abort"` nothing is caught and the process exits.
    /// Tests that can fail on wrong-shaped input should use
    /// [`Predicate::fallible`] and return an `Err` instead.
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        Self::fallible(name, move |value| Ok(f(value)))
    }

    /// Build a predicate whose evaluation may fail; failures count as `false`
    /// and are only logged through `tracing`.
    ///
    /// ```
    /// use serde_json::{Value, json};
    /// use validate_shape::Predicate;
    ///
    /// let non_negative = Predicate::fallible("non_negative", |value| {
    ///     let n = value
    ///         .and_then(Value::as_f64)
    ///         .ok_or_else(|| anyhow::anyhow!("expected a number"))?;
    ///     Ok(n >= 0.0)
    /// });
    /// assert!(non_negative.test(Some(&json!(3))));
    /// assert!(!non_negative.test(Some(&json!("three"))));
    /// assert!(!non_negative.test(None));
    /// ```
    pub fn fallible<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            test: Arc::new(f),
        }
    }

    /// Build a predicate from a function returning an arbitrary value,
    /// coerced with [`is_truthy`]
    pub fn truthy<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    {
        Self::new(name, move |value| is_truthy(Some(&f(value))))
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate against a (possibly absent) value.
    ///
    /// Panics are caught with `catch_unwind`, which requires the unwinding
    /// panic strategy; see [`Predicate::new`] for the stderr output they
    /// still produce.
    pub fn test(&self, value: Option<&Value>) -> bool {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.test)(value))) {
            Ok(Ok(matched)) => matched,
            Ok(Err(err)) => {
                tracing::debug!(predicate = %self.name, error = %err, "predicate failed; treating as non-match");
                false
            }
            Err(_) => {
                tracing::debug!(predicate = %self.name, "predicate panicked; treating as non-match");
                false
            }
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate({})", self.name)
    }
}

/// Truthiness of an observed value: absent, `null` and `false` are falsy
pub fn is_truthy(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null) | Some(Value::Bool(false)))
}

/// What a schema expects at one key
#[derive(Debug, Clone)]
pub enum Rule {
    /// Leaf test on the value at the key
    Predicate(Predicate),
    /// Nested schema applied to the mapping at the key
    Nested(Schema),
}

impl Rule {
    pub fn is_nested(&self) -> bool {
        matches!(self, Rule::Nested(_))
    }

    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            Rule::Nested(schema) => Some(schema),
            Rule::Predicate(_) => None,
        }
    }
}

impl From<Predicate> for Rule {
    fn from(predicate: Predicate) -> Self {
        Rule::Predicate(predicate)
    }
}

impl From<Schema> for Rule {
    fn from(schema: Schema) -> Self {
        Rule::Nested(schema)
    }
}

/// Ordered mapping from key to [`Rule`]
#[derive(Clone, Default)]
pub struct Schema {
    rules: IndexMap<String, Rule>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with_rule(mut self, key: impl Into<String>, rule: impl Into<Rule>) -> Self {
        self.insert(key, rule);
        self
    }

    /// Insert or replace the rule for `key`, keeping its original position
    /// when replacing
    pub fn insert(&mut self, key: impl Into<String>, rule: impl Into<Rule>) -> Option<Rule> {
        self.rules.insert(key.into(), rule.into())
    }

    pub fn get(&self, key: &str) -> Option<&Rule> {
        self.rules.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rule)> {
        self.rules.iter().map(|(key, rule)| (key.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Deepest nesting level; a flat schema has depth 1, an empty one 0
    pub fn depth(&self) -> usize {
        self.rules
            .values()
            .map(|rule| match rule {
                Rule::Nested(inner) => 1 + inner.depth(),
                Rule::Predicate(_) => 1,
            })
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.rules.iter()).finish()
    }
}

impl<K, R> FromIterator<(K, R)> for Schema
where
    K: Into<String>,
    R: Into<Rule>,
{
    fn from_iter<I: IntoIterator<Item = (K, R)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (key, rule) in iter {
            schema.insert(key, rule);
        }
        schema
    }
}

/// Build a [`Schema`] from `key => rule` pairs, where a rule is anything
/// convertible into [`Rule`] (a predicate or another schema).
///
/// ```
/// use validate_shape::{predicates, schema};
///
/// let toy = schema! {
///     "name" => predicates::is_string(),
///     "dimensions" => schema! {
///         "width" => predicates::is_positive_number(),
///     },
/// };
/// assert_eq!(toy.len(), 2);
/// ```
#[macro_export]
macro_rules! schema {
    () => { $crate::Schema::new() };
    ($($key:expr => $rule:expr),+ $(,)?) => {
        $crate::Schema::new()$(.with_rule($key, $rule))+
    };
}
