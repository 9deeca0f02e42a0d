// SPDX-License-Identifier: MIT

//! Protocol loader - YAML/JSON file loading, answer loading and linting

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use super::condition::{parse, GRAMMAR_VERSION};
use super::diagnosis::MAX_MANAGEMENT_SLOTS;
use super::state::{Context, RISK_COUNT, SIGN_COUNT};
use super::types::ProtocolDefinition;
use crate::error::TriageError;

static PROTOCOL_SCHEMA: Lazy<serde_json::Value> = Lazy::new(|| {
    serde_json::to_value(schemars::schema_for!(ProtocolDefinition))
        .unwrap_or(serde_json::Value::Null)
});

/// A problem found while linting a protocol
#[derive(Debug, Clone, PartialEq)]
pub struct LintIssue {
    /// e.g. `screen 'vitals'` or `rule 'Malaria', symptom 'fever'`
    pub location: String,
    pub message: String,
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Loads protocol definitions and answer files
pub struct ProtocolLoader;

impl ProtocolLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a protocol, choosing YAML or JSON by file extension
    pub fn load_protocol<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<ProtocolDefinition, TriageError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let def = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content)?,
            Some("json") => Self::parse_json(&content)?,
            _ => return Err(TriageError::UnsupportedFormat(path.display().to_string())),
        };
        log::info!(
            "Loaded protocol '{}': {} screens, {} rules",
            def.name,
            def.screens.len(),
            def.rules.len()
        );
        Ok(def)
    }

    /// Parse a protocol definition from a YAML string
    pub fn parse_yaml(content: &str) -> Result<ProtocolDefinition, TriageError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a protocol definition from a JSON string
    pub fn parse_json(content: &str) -> Result<ProtocolDefinition, TriageError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load collected answers from a JSON or YAML object
    pub fn load_answers<P: AsRef<Path>>(&self, path: P) -> Result<Context, TriageError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let json: serde_json::Value = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        Self::parse_answers(&json)
    }

    /// Build a context from a JSON answer object
    pub fn parse_answers(json: &serde_json::Value) -> Result<Context, TriageError> {
        json.as_object()
            .map(Context::from_json)
            .ok_or_else(|| TriageError::InvalidAnswers("expected a JSON object".to_string()))
    }

    /// Check every condition and expression in `def` without evaluating.
    pub fn validate(def: &ProtocolDefinition) -> Vec<LintIssue> {
        let mut issues = Vec::new();
        let mut issue = |location: String, message: String| {
            issues.push(LintIssue { location, message })
        };

        if def.grammar_version > GRAMMAR_VERSION {
            issue(
                format!("protocol '{}'", def.name),
                format!(
                    "authored for grammar version {}, this build supports {}",
                    def.grammar_version, GRAMMAR_VERSION
                ),
            );
        }

        let mut seen = HashSet::new();
        for screen in &def.screens {
            let location = format!("screen '{}'", screen.id);
            if !seen.insert(screen.id.as_str()) {
                issue(location.clone(), "duplicate screen id".to_string());
            }
            if let Some(message) = check_condition(screen.condition.as_deref(), false) {
                issue(location.clone(), message);
            }
            for field in &screen.fields {
                if let Some(message) = check_condition(field.condition.as_deref(), false) {
                    issue(format!("{}, field '{}'", location, field.id), message);
                }
            }
        }

        for rule in &def.rules {
            let location = format!("rule '{}'", rule.name);
            if let Some(message) = check_condition(Some(&rule.expression), true) {
                issue(location.clone(), message);
            }
            if rule.managements.len() > MAX_MANAGEMENT_SLOTS {
                issue(
                    location.clone(),
                    format!(
                        "{} management entries, only the first {} are used",
                        rule.managements.len(),
                        MAX_MANAGEMENT_SLOTS
                    ),
                );
            }
            for symptom in &rule.symptoms {
                let location = format!("{}, symptom '{}'", location, symptom.name);
                if let Some(message) = check_condition(Some(&symptom.expression), false) {
                    issue(location.clone(), message);
                }
                if symptom.weight().is_none() {
                    issue(location, "weight is not a number".to_string());
                }
            }
        }

        issues
    }

    /// JSON Schema for protocol files
    pub fn schema() -> &'static serde_json::Value {
        &PROTOCOL_SCHEMA
    }
}

impl Default for ProtocolLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Parse error or misplaced counter read in one condition. The diagnosis
/// counters are only set while a rule's main expression is evaluated.
fn check_condition(condition: Option<&str>, counters_set: bool) -> Option<String> {
    let source = condition.filter(|s| !s.trim().is_empty())?;
    let expr = match parse(source) {
        Ok(expr) => expr,
        Err(e) => return Some(e.to_string()),
    };
    if counters_set {
        return None;
    }
    expr.variables()
        .into_iter()
        .find(|name| *name == RISK_COUNT || *name == SIGN_COUNT)
        .map(|name| format!("reads '{}', which is only set for rule expressions", name))
}
