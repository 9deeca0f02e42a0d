// SPDX-License-Identifier: MIT

//! Diagnosis rule records and the result of a diagnosis pass

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Management slots read per rule
pub const MAX_MANAGEMENT_SLOTS: usize = 3;

/// Which counter a matching symptom adds to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymptomKind {
    /// Adds to `riskCount`
    Risk,
    /// Adds to `signCount`
    Sign,
}

/// Symptom weight as authored: a number or numeric text
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum SymptomWeight {
    Number(f64),
    Text(String),
}

impl SymptomWeight {
    /// Numeric weight; blank text counts as 1.0
    pub fn value(&self) -> Option<f64> {
        match self {
            SymptomWeight::Number(n) => Some(*n).filter(|n| n.is_finite()),
            SymptomWeight::Text(text) if text.trim().is_empty() => Some(1.0),
            SymptomWeight::Text(text) => text.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }
}

impl std::fmt::Display for SymptomWeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymptomWeight::Number(n) => write!(f, "{}", n),
            SymptomWeight::Text(text) => write!(f, "{}", text),
        }
    }
}

/// A weighted sub-expression contributing to a rule's score
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Symptom {
    pub name: String,
    pub kind: SymptomKind,
    /// Empty means the symptom is skipped
    #[serde(default)]
    pub expression: String,
    /// Missing means 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<SymptomWeight>,
}

impl Symptom {
    pub fn new(name: impl Into<String>, kind: SymptomKind, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            expression: expression.into(),
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(SymptomWeight::Number(weight));
        self
    }

    /// Resolved weight, or `None` if the authored text is not a number
    pub fn weight(&self) -> Option<f64> {
        match &self.weight {
            None => Some(1.0),
            Some(weight) => weight.value(),
        }
    }
}

/// A piece of clinical guidance attached to a rule
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Management {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Management {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }
}

/// A named diagnosis with its scoring symptoms and management advice
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct DiagnosisRule {
    pub name: String,
    /// Main expression; may reference `riskCount` and `signCount`
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    /// Up to three slots, read in order
    #[serde(default)]
    pub managements: Vec<Management>,
}

impl DiagnosisRule {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            symptoms: Vec::new(),
            managements: Vec::new(),
        }
    }

    pub fn with_symptom(mut self, symptom: Symptom) -> Self {
        self.symptoms.push(symptom);
        self
    }

    pub fn with_management(mut self, management: Management) -> Self {
        self.managements.push(management);
        self
    }
}

/// Matched diagnoses in rule order, and their management entries in rule
/// order then slot order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub diagnoses: Vec<String>,
    pub managements: Vec<Management>,
}

impl DiagnosisResult {
    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }
}
