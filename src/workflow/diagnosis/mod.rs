// SPDX-License-Identifier: MIT

//! Diagnosis rules and the weighted rule-matching pass

mod engine;
mod types;

pub use engine::{diagnose, diagnose_in_background, diagnose_snapshot, DiagnosisEngine};
pub use types::{
    DiagnosisResult, DiagnosisRule, Management, Symptom, SymptomKind, SymptomWeight,
    MAX_MANAGEMENT_SLOTS,
};
