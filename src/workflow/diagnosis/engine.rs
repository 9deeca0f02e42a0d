// SPDX-License-Identifier: MIT

//! Weighted rule matching
//!
//! For each rule, matching symptoms add their weights to `riskCount` or
//! `signCount`; the counters are written into the context so the rule's main
//! expression can read them, and removed again before the next rule.

use super::types::{DiagnosisResult, DiagnosisRule, SymptomKind, MAX_MANAGEMENT_SLOTS};
use crate::error::{DiagnosisError, TriageError};
use crate::workflow::condition::ConditionCache;
use crate::workflow::state::{Context, RISK_COUNT, SIGN_COUNT};

/// Runs diagnosis passes. Holds nothing but parsed expressions.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisEngine {
    cache: ConditionCache,
}

impl DiagnosisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `rules` in order against `ctx`.
    ///
    /// Returns `Ok(None)` when there are no rules or no answers. Any parse
    /// error aborts the pass; `riskCount`/`signCount` are absent from `ctx`
    /// afterwards either way.
    pub fn diagnose(
        &mut self,
        rules: &[DiagnosisRule],
        ctx: &mut Context,
    ) -> Result<Option<DiagnosisResult>, DiagnosisError> {
        if rules.is_empty() || ctx.is_empty() {
            log::debug!("Nothing to diagnose");
            return Ok(None);
        }

        let mut result = DiagnosisResult::default();
        for rule in rules {
            ctx.clear_counters();
            let outcome = self.apply_rule(rule, ctx, &mut result);
            ctx.clear_counters();

            if let Err(e) = outcome {
                log::error!("Diagnosis aborted: {}", e);
                return Err(e);
            }
        }

        log::info!(
            "Diagnosis complete: {} of {} rules matched",
            result.diagnoses.len(),
            rules.len()
        );
        Ok(Some(result))
    }

    fn apply_rule(
        &mut self,
        rule: &DiagnosisRule,
        ctx: &mut Context,
        result: &mut DiagnosisResult,
    ) -> Result<(), DiagnosisError> {
        if !rule.symptoms.is_empty() {
            // Counters are written only after every symptom is scored, so
            // symptom expressions never see them.
            let (risk, sign) = self.score_symptoms(rule, ctx)?;
            ctx.set(RISK_COUNT, risk);
            ctx.set(SIGN_COUNT, sign);
            log::debug!("Rule '{}': riskCount={} signCount={}", rule.name, risk, sign);
        }

        if rule.expression.trim().is_empty() {
            return Ok(());
        }

        let matched = self
            .cache
            .check(&rule.expression, ctx)
            .map_err(|source| DiagnosisError::Rule {
                rule: rule.name.clone(),
                source,
            })?;

        if matched {
            log::info!("Rule '{}' matched", rule.name);
            result.diagnoses.push(rule.name.clone());
            result.managements.extend(
                rule.managements
                    .iter()
                    .take(MAX_MANAGEMENT_SLOTS)
                    .filter(|m| !m.text.trim().is_empty())
                    .cloned(),
            );
        }
        Ok(())
    }

    fn score_symptoms(
        &mut self,
        rule: &DiagnosisRule,
        ctx: &Context,
    ) -> Result<(f64, f64), DiagnosisError> {
        let mut risk = 0.0;
        let mut sign = 0.0;

        for symptom in &rule.symptoms {
            if symptom.expression.trim().is_empty() {
                continue;
            }

            let weight = symptom
                .weight()
                .ok_or_else(|| DiagnosisError::InvalidWeight {
                    rule: rule.name.clone(),
                    symptom: symptom.name.clone(),
                    weight: symptom
                        .weight
                        .as_ref()
                        .map(|w| w.to_string())
                        .unwrap_or_default(),
                })?;

            let present = self
                .cache
                .check(&symptom.expression, ctx)
                .map_err(|source| DiagnosisError::Symptom {
                    rule: rule.name.clone(),
                    symptom: symptom.name.clone(),
                    source,
                })?;

            if present {
                match symptom.kind {
                    SymptomKind::Risk => risk += weight,
                    SymptomKind::Sign => sign += weight,
                }
            }
        }

        Ok((risk, sign))
    }
}

/// Run a diagnosis pass with a fresh engine
pub fn diagnose(
    rules: &[DiagnosisRule],
    ctx: &mut Context,
) -> Result<Option<DiagnosisResult>, DiagnosisError> {
    DiagnosisEngine::new().diagnose(rules, ctx)
}

/// Run a diagnosis pass against a private copy of `ctx`
pub fn diagnose_snapshot(
    rules: &[DiagnosisRule],
    ctx: &Context,
) -> Result<Option<DiagnosisResult>, DiagnosisError> {
    let mut snapshot = ctx.snapshot();
    diagnose(rules, &mut snapshot)
}

/// Run a diagnosis pass on the blocking thread pool, leaving the calling
/// task free for navigation
pub async fn diagnose_in_background(
    rules: Vec<DiagnosisRule>,
    ctx: Context,
) -> Result<Option<DiagnosisResult>, TriageError> {
    let result = tokio::task::spawn_blocking(move || diagnose_snapshot(&rules, &ctx)).await??;
    Ok(result)
}
