// SPDX-License-Identifier: MIT

//! Parsed-condition cache keyed by source text

use std::collections::HashMap;

use super::ast::Expression;
use super::evaluator::evaluate;
use super::parser::parse;
use crate::error::SyntaxError;
use crate::workflow::state::Context;

/// Memoizes `parse` per source string. Failed parses are not cached.
#[derive(Debug, Clone, Default)]
pub struct ConditionCache {
    entries: HashMap<String, Expression>,
}

impl ConditionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source`, reusing an earlier parse of the same text
    pub fn get_or_parse(&mut self, source: &str) -> Result<&Expression, SyntaxError> {
        if !self.entries.contains_key(source) {
            let expr = parse(source)?;
            self.entries.insert(source.to_string(), expr);
        }
        Ok(&self.entries[source])
    }

    /// Evaluate `source` against `ctx`; blank sources are true
    pub fn check(&mut self, source: &str, ctx: &Context) -> Result<bool, SyntaxError> {
        if source.trim().is_empty() {
            return Ok(true);
        }
        let expr = self.get_or_parse(source)?;
        Ok(evaluate(expr, ctx))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
