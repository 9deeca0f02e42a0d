// SPDX-License-Identifier: MIT

//! Answer context that conditions are evaluated against

use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::collections::HashMap;

use super::value::Value;

/// Key holding the accumulated RISK weight during a diagnosis pass
pub const RISK_COUNT: &str = "riskCount";
/// Key holding the accumulated SIGN weight during a diagnosis pass
pub const SIGN_COUNT: &str = "signCount";

static ABSENT: Value = Value::Absent;

/// Mapping from variable name to typed value.
///
/// Keys are case-sensitive. Reading a missing key yields `Value::Absent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value; missing keys read as `Absent`
    pub fn get(&self, key: &str) -> &Value {
        self.values.get(key).unwrap_or(&ABSENT)
    }

    /// Set a value. Setting `Absent` removes the key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        match value.into() {
            Value::Absent => {
                self.values.remove(&key);
            }
            value => {
                self.values.insert(key, value);
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Private copy for running a diagnosis pass off the interactive thread
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Drop the diagnosis counters
    pub(crate) fn clear_counters(&mut self) {
        self.values.remove(RISK_COUNT);
        self.values.remove(SIGN_COUNT);
    }

    /// Build a context from a JSON answer object.
    ///
    /// `null` answers are omitted; values with no `Value` counterpart are
    /// skipped with a warning.
    pub fn from_json(answers: &Map<String, serde_json::Value>) -> Self {
        let mut ctx = Context::new();
        for (key, json) in answers {
            match Value::from_json(json) {
                Some(value) => ctx.set(key.clone(), value),
                None => log::warn!("Skipping answer '{}': unsupported value {}", key, json),
            }
        }
        ctx
    }

    /// Convert context to a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.values).unwrap_or(serde_json::Value::Null)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.set(k, v);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_key_reads_absent() {
        let ctx = Context::new();
        assert_eq!(ctx.get("anything"), &Value::Absent);
        assert!(!ctx.contains("anything"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let mut ctx = Context::new();
        ctx.set("Fever", true);
        assert_eq!(ctx.get("Fever"), &Value::Bool(true));
        assert!(ctx.get("fever").is_absent());
    }

    #[test]
    fn test_setting_absent_removes_key() {
        let mut ctx = Context::new();
        ctx.set("age", 4.0);
        ctx.set("age", Value::Absent);
        assert!(!ctx.contains("age"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_from_json_answers() {
        let answers = json!({
            "age": 3,
            "fever": true,
            "name": "Ama",
            "signs": ["cough", "wheeze"],
            "skipped": null,
            "nested": {"a": 1}
        });
        let ctx = Context::from_json(answers.as_object().unwrap());

        assert_eq!(ctx.len(), 4);
        assert_eq!(ctx.get("age"), &Value::Number(3.0));
        assert_eq!(ctx.get("signs"), &Value::set(["cough", "wheeze"]));
        assert!(!ctx.contains("skipped"));
        assert!(!ctx.contains("nested"));
    }

    #[test]
    fn test_clear_counters_leaves_answers() {
        let mut ctx: Context = [("age", Value::Number(2.0))].into_iter().collect();
        ctx.set(RISK_COUNT, 3.0);
        ctx.set(SIGN_COUNT, 1.0);

        ctx.clear_counters();

        assert!(!ctx.contains(RISK_COUNT));
        assert!(!ctx.contains(SIGN_COUNT));
        assert_eq!(ctx.get("age"), &Value::Number(2.0));
    }

    #[test]
    fn test_to_json() {
        let mut ctx = Context::new();
        ctx.set("a", 1.0);
        ctx.set("b", "hello");

        let json = ctx.to_json();
        assert_eq!(json["a"], 1.0);
        assert_eq!(json["b"], "hello");
    }
}
