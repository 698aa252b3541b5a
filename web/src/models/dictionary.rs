use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bundle root must be a JSON object")]
    NotAnObject,

    #[error("value at '{path}' must be a string or an object")]
    InvalidValue { path: String },
}

/// A schema difference between a bundle and the default-locale baseline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("'{path}' does not exist in the default bundle")]
    UnknownKey { path: String },

    #[error("'{path}' is a {found} but the default bundle has a {expected}")]
    KindMismatch { path: String, expected: &'static str, found: &'static str },
}

/// Translation bundle for one locale: a nested object with string leaves.
///
/// An empty dictionary stands for "not loaded yet"; lookups on it simply miss.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dictionary(Map<String, Value>);

impl Dictionary {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a bundle, rejecting anything but nested objects and strings.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DictionaryError> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(map) => {
                check_values(&map, "")?;
                Ok(Self(map))
            },
            _ => Err(DictionaryError::NotAnObject),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a dotted key such as `sidebar.logout`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).and_then(Value::as_str)
    }

    pub fn section(&self, key: &str) -> Option<&Map<String, Value>> {
        self.lookup(key).and_then(Value::as_object)
    }

    /// Number of string leaves.
    pub fn leaf_count(&self) -> usize {
        count_leaves(&self.0)
    }

    /// Check that every key path in `self` exists in `baseline` with the same shape.
    pub fn check_subset_of(&self, baseline: &Dictionary) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();
        compare(&self.0, &baseline.0, "", &mut violations);
        violations
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() { key.to_string() } else { format!("{}.{}", prefix, key) }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "section",
        _ => "string",
    }
}

fn check_values(map: &Map<String, Value>, prefix: &str) -> Result<(), DictionaryError> {
    for (key, value) in map {
        match value {
            Value::String(_) => {},
            Value::Object(nested) => check_values(nested, &join(prefix, key))?,
            _ => return Err(DictionaryError::InvalidValue { path: join(prefix, key) }),
        }
    }
    Ok(())
}

fn count_leaves(map: &Map<String, Value>) -> usize {
    map.values()
        .map(|value| match value {
            Value::Object(nested) => count_leaves(nested),
            _ => 1,
        })
        .sum()
}

fn compare(
    candidate: &Map<String, Value>,
    baseline: &Map<String, Value>,
    prefix: &str,
    out: &mut Vec<SchemaViolation>,
) {
    for (key, value) in candidate {
        let path = join(prefix, key);
        match (value, baseline.get(key)) {
            (_, None) => out.push(SchemaViolation::UnknownKey { path }),
            (Value::Object(nested), Some(Value::Object(base))) => compare(nested, base, &path, out),
            (found, Some(expected)) if kind(found) != kind(expected) => {
                out.push(SchemaViolation::KindMismatch {
                    path,
                    expected: kind(expected),
                    found: kind(found),
                })
            },
            _ => {},
        }
    }
}
