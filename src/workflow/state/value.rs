// SPDX-License-Identifier: MIT

//! Evaluation-time values

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A typed answer value.
///
/// Comparisons are only meaningful within the same tag family; the evaluator
/// maps every cross-family comparison to a fixed boolean rather than casting.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Str(String),
    /// Multi-select answers
    StrSet(BTreeSet<String>),
    /// Unset. Serialized as `null`.
    #[default]
    Absent,
}

impl Value {
    /// Build a `StrSet` from any iterator of strings
    pub fn set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::StrSet(items.into_iter().map(Into::into).collect())
    }

    /// Convert a JSON answer into a Value.
    ///
    /// Returns `None` for shapes with no Value counterpart (objects, mixed
    /// arrays, non-finite numbers).
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Null => Some(Value::Absent),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(Value::Number),
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<BTreeSet<_>>>()
                .map(Value::StrSet),
            serde_json::Value::Object(_) => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the tag, for log messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::StrSet(_) => "string set",
            Value::Absent => "absent",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<BTreeSet<String>> for Value {
    fn from(set: BTreeSet<String>) -> Self {
        Value::StrSet(set)
    }
}
