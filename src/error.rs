// SPDX-License-Identifier: MIT

//! Typed error handling for triage-rs
//!
//! Condition syntax errors, navigation errors and diagnosis errors each get
//! their own type; `TriageError` wraps them for callers that load protocols
//! from disk.

use thiserror::Error;

/// Top-level error type for triage-rs
#[derive(Debug, Error)]
pub enum TriageError {
    /// Malformed condition text
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// Screen navigation errors
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    /// Diagnosis pass aborted
    #[error("Diagnosis error: {0}")]
    Diagnosis(#[from] DiagnosisError),

    /// Configuration errors (missing env vars, missing protocol path)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported protocol file format
    #[error("Unsupported protocol format: {0}")]
    UnsupportedFormat(String),

    /// Answer file is not a key/value object
    #[error("Invalid answers: {0}")]
    InvalidAnswers(String),

    /// Background diagnosis task did not complete
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl TriageError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// A condition string that could not be tokenized or parsed.
///
/// Carries the full offending source text; there is no partial result.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Could not parse condition '{source_text}': {message} (at offset {position})")]
pub struct SyntaxError {
    pub source_text: String,
    pub message: String,
    pub position: usize,
}

impl SyntaxError {
    pub fn new(source_text: impl Into<String>, message: impl Into<String>, position: usize) -> Self {
        Self {
            source_text: source_text.into(),
            message: message.into(),
            position,
        }
    }
}

/// Script navigation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavigationError {
    /// Two screens share an id
    #[error("Duplicate screen id: {0}")]
    DuplicateScreen(String),

    /// `update_screen` was given an id that is not in the script
    #[error("Unknown screen id: {0}")]
    UnknownScreen(String),
}

/// Diagnosis errors. Any of these aborts the whole pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosisError {
    /// The rule's main expression failed to parse
    #[error("Rule '{rule}': {source}")]
    Rule {
        rule: String,
        #[source]
        source: SyntaxError,
    },

    /// One of the rule's symptom expressions failed to parse
    #[error("Rule '{rule}', symptom '{symptom}': {source}")]
    Symptom {
        rule: String,
        symptom: String,
        #[source]
        source: SyntaxError,
    },

    /// Symptom weight is not a number
    #[error("Rule '{rule}', symptom '{symptom}': invalid weight '{weight}'")]
    InvalidWeight {
        rule: String,
        symptom: String,
        weight: String,
    },
}

impl DiagnosisError {
    /// Name of the rule that caused the pass to abort
    pub fn rule(&self) -> &str {
        match self {
            DiagnosisError::Rule { rule, .. }
            | DiagnosisError::Symptom { rule, .. }
            | DiagnosisError::InvalidWeight { rule, .. } => rule,
        }
    }
}
