// SPDX-License-Identifier: MIT

//! Screen and field records supplied by the authoring system

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type ScreenId = String;

/// One data-collection screen
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Screen {
    /// Unique identifier within the script
    pub id: ScreenId,
    #[serde(default)]
    pub title: String,
    /// Visibility condition; empty or missing means always shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl Screen {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            condition: None,
            fields: Vec::new(),
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

/// One input on a screen
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct Field {
    pub id: String,
    #[serde(default)]
    pub label: String,
    /// Enabled condition; empty or missing means always shown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Field {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// Where a failing condition was authored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionSite {
    Screen(ScreenId),
    Field { screen: ScreenId, field: String },
}

impl fmt::Display for ConditionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionSite::Screen(id) => write!(f, "screen '{}'", id),
            ConditionSite::Field { screen, field } => {
                write!(f, "field '{}' on screen '{}'", field, screen)
            }
        }
    }
}
