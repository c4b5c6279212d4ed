//! Metadata filter evaluation
//!
//! A filter is a JSON object matched against document metadata with
//! containment semantics: every key in the filter must be present in the
//! metadata with an equal value. Nested objects recurse, arrays match when
//! each filter element is contained in some metadata element, and dotted
//! keys (`"source.kind"`) address nested paths.

use crate::error::HybridError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a filter key absent from a document's metadata means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// The document fails the filter
    #[default]
    Exclude,
    /// The condition is skipped
    Ignore,
}

#[derive(Debug, Clone)]
struct Condition {
    key: String,
    path: Vec<String>,
    expected: Value,
}

/// Compiled, immutable metadata predicate
#[derive(Debug, Clone)]
pub struct MetadataFilter {
    conditions: Vec<Condition>,
    policy: MissingKeyPolicy,
}

impl MetadataFilter {
    /// A filter every document passes
    pub fn match_all() -> Self {
        Self {
            conditions: Vec::new(),
            policy: MissingKeyPolicy::Exclude,
        }
    }

    /// Compile a raw filter.
    ///
    /// `None`, `null` and `{}` match everything. Any other non-object shape,
    /// or an empty key anywhere in the filter, is rejected.
    pub fn compile(filter: Option<&Value>, policy: MissingKeyPolicy) -> Result<Self, HybridError> {
        let object = match filter {
            None | Some(Value::Null) => return Ok(Self { conditions: Vec::new(), policy }),
            Some(Value::Object(object)) => object,
            Some(other) => {
                return Err(HybridError::invalid_parameter(
                    "filter",
                    format!("expected a JSON object, got {}", json_type(other)),
                ))
            }
        };

        let mut conditions = Vec::with_capacity(object.len());
        for (key, expected) in object {
            let path: Vec<String> = key.split('.').map(str::to_string).collect();
            if path.iter().any(String::is_empty) {
                return Err(HybridError::invalid_parameter(
                    "filter",
                    format!("malformed key '{}'", key),
                ));
            }
            check_keys(expected)?;
            conditions.push(Condition {
                key: key.clone(),
                path,
                expected: expected.clone(),
            });
        }

        Ok(Self { conditions, policy })
    }

    pub fn is_match_all(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the predicate against one document's metadata
    pub fn matches(&self, metadata: &Value) -> bool {
        self.conditions.iter().all(|condition| {
            match lookup(metadata, condition) {
                Some(actual) => contains(actual, &condition.expected, self.policy),
                None => self.policy == MissingKeyPolicy::Ignore,
            }
        })
    }
}

fn check_keys(value: &Value) -> Result<(), HybridError> {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if key.is_empty() {
                    return Err(HybridError::invalid_parameter("filter", "empty nested key"));
                }
                check_keys(nested)?;
            }
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(check_keys),
        _ => Ok(()),
    }
}

/// Literal key first, dotted path second
fn lookup<'a>(metadata: &'a Value, condition: &Condition) -> Option<&'a Value> {
    let object = metadata.as_object()?;
    if let Some(value) = object.get(&condition.key) {
        return Some(value);
    }
    if condition.path.len() < 2 {
        return None;
    }
    condition
        .path
        .iter()
        .try_fold(metadata, |current, segment| current.as_object()?.get(segment))
}

fn contains(actual: &Value, expected: &Value, policy: MissingKeyPolicy) -> bool {
    match expected {
        Value::Object(expected) => match actual {
            Value::Object(actual) => object_contains(actual, expected, policy),
            _ => false,
        },
        Value::Array(expected) => match actual {
            Value::Array(actual) => expected
                .iter()
                .all(|e| actual.iter().any(|a| contains(a, e, policy))),
            _ => false,
        },
        scalar => match actual {
            Value::Array(actual) => actual.iter().any(|a| scalar_eq(a, scalar)),
            _ => scalar_eq(actual, scalar),
        },
    }
}

fn object_contains(
    actual: &Map<String, Value>,
    expected: &Map<String, Value>,
    policy: MissingKeyPolicy,
) -> bool {
    expected.iter().all(|(key, value)| match actual.get(key) {
        Some(found) => contains(found, value, policy),
        None => policy == MissingKeyPolicy::Ignore,
    })
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
