// SPDX-License-Identifier: MIT

//! Condition expression evaluator
//!
//! The literal's tag picks the comparison rules. Operator/tag combinations
//! with no defined meaning evaluate to `false` rather than failing.

use super::ast::{CompareOp, Expression, Literal, LogicOp, Operand};
use super::parser::parse;
use crate::error::SyntaxError;
use crate::workflow::state::{Context, Value};

/// Evaluate a condition expression against the answer context.
///
/// Both sides of a combination are always evaluated.
pub fn evaluate(expr: &Expression, ctx: &Context) -> bool {
    match expr {
        Expression::Compare { left, op, right } => evaluate_compare(left, *op, right, ctx),
        Expression::Combine { left, op, right } => {
            let l = evaluate(left, ctx);
            let r = evaluate(right, ctx);
            match op {
                LogicOp::And => l & r,
                LogicOp::Or => l | r,
            }
        }
    }
}

/// Parse and evaluate a condition string.
///
/// An empty or blank source is always true and is never parsed.
pub fn evaluate_source(source: &str, ctx: &Context) -> Result<bool, SyntaxError> {
    if source.trim().is_empty() {
        return Ok(true);
    }
    let expr = parse(source)?;
    Ok(evaluate(&expr, ctx))
}

fn evaluate_compare(left: &str, op: CompareOp, right: &Operand, ctx: &Context) -> bool {
    let value = ctx.get(left);
    let result = match right {
        Operand::Literal(literal) => compare_literal(value, op, literal),
        Operand::Variable(name) => match operand_literal(ctx.get(name)) {
            Some(literal) => compare_literal(value, op, &literal),
            None => false,
        },
    };
    log::debug!(
        "{} ({}) {} {} -> {}",
        left,
        value.kind(),
        op,
        right,
        result
    );
    result
}

/// Read a right-hand variable as a literal. Sets have no literal form.
fn operand_literal(value: &Value) -> Option<Literal> {
    match value {
        Value::Bool(b) => Some(Literal::Boolean(*b)),
        Value::Number(n) => Some(Literal::Number(*n)),
        Value::Str(s) => Some(Literal::String(s.clone())),
        Value::Absent => Some(Literal::Null),
        Value::StrSet(_) => None,
    }
}

fn compare_literal(value: &Value, op: CompareOp, literal: &Literal) -> bool {
    match literal {
        Literal::Boolean(expected) => compare_bool(value, op, *expected),
        Literal::Number(expected) => compare_number(value, op, *expected),
        Literal::String(expected) => compare_string(value, op, expected),
        Literal::Null => compare_null(value, op),
    }
}

fn compare_bool(value: &Value, op: CompareOp, expected: bool) -> bool {
    // anything that is not a Bool reads as false
    let actual = value.as_bool().unwrap_or(false);
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::NotEq => actual != expected,
        _ => false,
    }
}

fn compare_number(value: &Value, op: CompareOp, expected: f64) -> bool {
    let Some(actual) = value.as_f64() else {
        return false;
    };
    match op {
        CompareOp::Eq => actual == expected,
        CompareOp::NotEq => actual != expected,
        CompareOp::Lt => actual < expected,
        CompareOp::Lte => actual <= expected,
        CompareOp::Gt => actual > expected,
        CompareOp::Gte => actual >= expected,
    }
}

fn compare_string(value: &Value, op: CompareOp, expected: &str) -> bool {
    let equal = match value {
        Value::StrSet(members) => members.contains(expected),
        other => other.as_str() == Some(expected),
    };
    match op {
        CompareOp::Eq => equal,
        CompareOp::NotEq => !equal,
        _ => false,
    }
}

fn compare_null(value: &Value, op: CompareOp) -> bool {
    match op {
        CompareOp::Eq => value.is_absent(),
        CompareOp::NotEq => !value.is_absent(),
        _ => false,
    }
}
