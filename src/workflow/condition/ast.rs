// SPDX-License-Identifier: MIT

//! Abstract Syntax Tree for condition expressions
//!
//! `Display` prints the canonical form, which parses back to an equal tree.
//! Combinations chain left to right, so only a right-hand combination is
//! parenthesised.

use std::fmt;

/// A condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Assertion: variable op operand
    Compare {
        left: String,
        op: CompareOp,
        right: Operand,
    },
    /// Two expressions joined by AND or OR
    Combine {
        left: Box<Expression>,
        op: LogicOp,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn compare(left: impl Into<String>, op: CompareOp, right: impl Into<Operand>) -> Self {
        Expression::Compare {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    pub fn combine(left: Expression, op: LogicOp, right: Expression) -> Self {
        Expression::Combine {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Every variable name the expression reads, in source order
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Compare { left, right, .. } => {
                out.push(left);
                if let Operand::Variable(name) = right {
                    out.push(name);
                }
            }
            Expression::Combine { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// = or ==
    Eq,
    /// != or <>
    NotEq,
    /// <
    Lt,
    /// <=
    Lte,
    /// >
    Gt,
    /// >=
    Gte,
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Right-hand side of an assertion
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(Literal),
    /// Resolved against the context at evaluation time
    Variable(String),
}

/// Literal values in expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    /// `nil` / `null`
    Null,
}

impl From<Literal> for Operand {
    fn from(literal: Literal) -> Self {
        Operand::Literal(literal)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::NotEq => write!(f, "!="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
        }
    }
}

impl fmt::Display for LogicOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicOp::And => write!(f, "&&"),
            LogicOp::Or => write!(f, "||"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => {
                write!(f, "\"")?;
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        write!(f, "\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                write!(f, "\"")
            }
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => write!(f, "nil"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(literal) => write!(f, "{}", literal),
            Operand::Variable(name) => write!(f, "${}", name),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Compare { left, op, right } => write!(f, "${} {} {}", left, op, right),
            Expression::Combine { left, op, right } => match right.as_ref() {
                Expression::Combine { .. } => write!(f, "{} {} ({})", left, op, right),
                Expression::Compare { .. } => write!(f, "{} {} {}", left, op, right),
            },
        }
    }
}
