// SPDX-License-Identifier: MIT

//! Condition evaluation for screens, fields and diagnosis rules
//!
//! This module provides parsing and evaluation of authored conditions.
//! Conditions are simple expressions like:
//! - `$fever = true`
//! - `$age >= 2 && $age < 60`
//! - `$signs = 'cough' || $riskCount >= 2`

mod ast;
mod cache;
mod evaluator;
mod parser;

pub use ast::{CompareOp, Expression, Literal, LogicOp, Operand};
pub use cache::ConditionCache;
pub use evaluator::{evaluate, evaluate_source};
pub use parser::{parse, GRAMMAR_VERSION};
