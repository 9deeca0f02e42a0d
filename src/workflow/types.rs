// SPDX-License-Identifier: MIT

//! YAML/JSON schema types for authored protocols
//!
//! A protocol bundles the ordered screen script with the diagnosis rules
//! that run once collection is finished.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::condition::GRAMMAR_VERSION;
use super::diagnosis::DiagnosisRule;
use super::script::Screen;

/// Top-level protocol definition
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct ProtocolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Condition grammar the protocol was authored against
    #[serde(default = "default_grammar_version")]
    pub grammar_version: u32,
    /// Screens in display order
    #[serde(default)]
    pub screens: Vec<Screen>,
    /// Diagnosis rules in evaluation order
    #[serde(default)]
    pub rules: Vec<DiagnosisRule>,
}

fn default_grammar_version() -> u32 {
    GRAMMAR_VERSION
}
