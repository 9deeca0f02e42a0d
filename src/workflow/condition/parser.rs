// SPDX-License-Identifier: MIT

//! Condition expression parser
//!
//! Parses expressions like:
//! - `$fever = true`
//! - `$age >= 2 && $age < 60`
//! - `$signs = "cough" || ($temp > 37.5 and $danger != nil)`
//!
//! AND and OR have equal precedence and chain left to right as written;
//! parentheses group.

use super::ast::{CompareOp, Expression, Literal, LogicOp, Operand};
use crate::error::SyntaxError;

/// Version of the accepted token spellings
pub const GRAMMAR_VERSION: u32 = 1;

const MAX_DEPTH: usize = 64;

/// Assertions allowed in one condition. Bounds the depth of the tree that
/// `evaluate`, `Display` and `Drop` recurse over.
const MAX_CLAUSES: usize = 512;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Cmp(CompareOp),
    Logic(LogicOp),
    LParen,
    RParen,
}

/// Parse a condition expression string into an AST
pub fn parse(input: &str) -> Result<Expression, SyntaxError> {
    let source = input.trim();
    if source.is_empty() {
        return Err(SyntaxError::new(input, "empty condition", 0));
    }

    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
        clauses: 0,
    };
    let expr = parser.expression()?;
    if let Some((token, offset)) = parser.tokens.get(parser.pos) {
        return Err(parser.error(format!("unexpected {}", describe(token)), *offset));
    }
    Ok(expr)
}

fn tokenize(source: &str) -> Result<Vec<(Token, usize)>, SyntaxError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let peek = chars.get(i + 1).map(|(_, c)| *c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '(' => {
                tokens.push((Token::LParen, offset));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, offset));
                i += 1;
            }
            '&' | '|' => {
                if peek != Some(c) {
                    return Err(SyntaxError::new(source, format!("expected '{}{}'", c, c), offset));
                }
                let op = if c == '&' { LogicOp::And } else { LogicOp::Or };
                tokens.push((Token::Logic(op), offset));
                i += 2;
            }
            '=' => {
                let width = if peek == Some('=') { 2 } else { 1 };
                tokens.push((Token::Cmp(CompareOp::Eq), offset));
                i += width;
            }
            '!' => {
                if peek != Some('=') {
                    return Err(SyntaxError::new(source, "expected '!='", offset));
                }
                tokens.push((Token::Cmp(CompareOp::NotEq), offset));
                i += 2;
            }
            '<' => {
                let (op, width) = match peek {
                    Some('=') => (CompareOp::Lte, 2),
                    Some('>') => (CompareOp::NotEq, 2),
                    _ => (CompareOp::Lt, 1),
                };
                tokens.push((Token::Cmp(op), offset));
                i += width;
            }
            '>' => {
                let (op, width) = match peek {
                    Some('=') => (CompareOp::Gte, 2),
                    _ => (CompareOp::Gt, 1),
                };
                tokens.push((Token::Cmp(op), offset));
                i += width;
            }
            '\'' | '"' => {
                let (text, next) = lex_string(source, &chars, i)?;
                tokens.push((Token::Str(text), offset));
                i = next;
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '+' || c == '.')
                    && peek.is_some_and(|p| p.is_ascii_digit() || p == '.')) =>
            {
                let (n, next) = lex_number(source, &chars, i)?;
                tokens.push((Token::Number(n), offset));
                i = next;
            }
            c if is_ident_start(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i].1) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().map(|(_, c)| c).collect();
                if word == "$" {
                    return Err(SyntaxError::new(source, "empty identifier", offset));
                }
                tokens.push((keyword_or_ident(word), offset));
            }
            other => {
                return Err(SyntaxError::new(
                    source,
                    format!("unexpected character '{}'", other),
                    offset,
                ))
            }
        }
    }

    Ok(tokens)
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.'
}

fn keyword_or_ident(word: String) -> Token {
    // `$`-marked words are always identifiers
    if let Some(name) = word.strip_prefix('$') {
        return Token::Ident(name.to_string());
    }
    match word.to_ascii_lowercase().as_str() {
        "true" => Token::Bool(true),
        "false" => Token::Bool(false),
        "nil" | "null" => Token::Null,
        "and" => Token::Logic(LogicOp::And),
        "or" => Token::Logic(LogicOp::Or),
        _ => Token::Ident(word),
    }
}

fn lex_string(
    source: &str,
    chars: &[(usize, char)],
    start: usize,
) -> Result<(String, usize), SyntaxError> {
    let quote = chars[start].1;
    let mut text = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i].1;
        if c == '\\' {
            match chars.get(i + 1) {
                Some((_, escaped)) => text.push(*escaped),
                None => break,
            }
            i += 2;
        } else if c == quote {
            return Ok((text, i + 1));
        } else {
            text.push(c);
            i += 1;
        }
    }

    Err(SyntaxError::new(
        source,
        "unterminated string literal",
        chars[start].0,
    ))
}

fn lex_number(
    source: &str,
    chars: &[(usize, char)],
    start: usize,
) -> Result<(f64, usize), SyntaxError> {
    let mut i = start;
    if matches!(chars[i].1, '-' | '+') {
        i += 1;
    }
    while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
        i += 1;
    }
    if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
        let mut j = i + 1;
        if j < chars.len() && matches!(chars[j].1, '-' | '+') {
            j += 1;
        }
        if j < chars.len() && chars[j].1.is_ascii_digit() {
            while j < chars.len() && chars[j].1.is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }

    let offset = chars[start].0;
    let end = chars.get(i).map(|(o, _)| *o).unwrap_or(source.len());
    let text = &source[offset..end];
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok((n, i)),
        _ => Err(SyntaxError::new(
            source,
            format!("invalid number '{}'", text),
            offset,
        )),
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("identifier '{}'", name),
        Token::Number(n) => format!("number {}", n),
        Token::Str(s) => format!("string \"{}\"", s),
        Token::Bool(b) => format!("'{}'", b),
        Token::Null => "'nil'".to_string(),
        Token::Cmp(op) => format!("'{}'", op),
        Token::Logic(op) => format!("'{}'", op),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
    clauses: usize,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>, offset: usize) -> SyntaxError {
        SyntaxError::new(self.source, message, offset)
    }

    fn end_offset(&self) -> usize {
        self.source.len()
    }

    fn next(&mut self, expected: &str) -> Result<(Token, usize), SyntaxError> {
        match self.tokens.get(self.pos) {
            Some(entry) => {
                self.pos += 1;
                Ok(entry.clone())
            }
            None => Err(self.error(
                format!("expected {}, found end of input", expected),
                self.end_offset(),
            )),
        }
    }

    /// expression := term (LOGICOP term)*
    fn expression(&mut self) -> Result<Expression, SyntaxError> {
        let mut expr = self.term()?;
        while let Some((Token::Logic(op), _)) = self.tokens.get(self.pos) {
            let op = *op;
            self.pos += 1;
            let right = self.term()?;
            expr = Expression::combine(expr, op, right);
        }
        Ok(expr)
    }

    /// term := '(' expression ')' | assertion
    fn term(&mut self) -> Result<Expression, SyntaxError> {
        if let Some((Token::LParen, offset)) = self.tokens.get(self.pos) {
            let offset = *offset;
            if self.depth >= MAX_DEPTH {
                return Err(self.error("nesting too deep", offset));
            }
            self.pos += 1;
            self.depth += 1;
            let expr = self.expression()?;
            self.depth -= 1;
            return match self.next("')'")? {
                (Token::RParen, _) => Ok(expr),
                (token, offset) => {
                    Err(self.error(format!("expected ')', found {}", describe(&token)), offset))
                }
            };
        }
        self.assertion()
    }

    /// assertion := IDENTIFIER COMPARATOR (LITERAL | IDENTIFIER)
    fn assertion(&mut self) -> Result<Expression, SyntaxError> {
        if self.clauses >= MAX_CLAUSES {
            let offset = self
                .tokens
                .get(self.pos)
                .map(|(_, offset)| *offset)
                .unwrap_or(self.end_offset());
            return Err(self.error(
                format!("too many clauses (limit {})", MAX_CLAUSES),
                offset,
            ));
        }
        self.clauses += 1;

        let left = match self.next("an identifier")? {
            (Token::Ident(name), _) => name,
            (token, offset) => {
                return Err(self.error(
                    format!("expected an identifier, found {}", describe(&token)),
                    offset,
                ))
            }
        };

        let op = match self.next("a comparison operator")? {
            (Token::Cmp(op), _) => op,
            (token, offset) => {
                return Err(self.error(
                    format!("expected a comparison operator, found {}", describe(&token)),
                    offset,
                ))
            }
        };

        let right = match self.next("a literal")? {
            (Token::Bool(b), _) => Operand::Literal(Literal::Boolean(b)),
            (Token::Number(n), _) => Operand::Literal(Literal::Number(n)),
            (Token::Str(s), _) => Operand::Literal(Literal::String(s)),
            (Token::Null, _) => Operand::Literal(Literal::Null),
            (Token::Ident(name), _) => Operand::Variable(name),
            (token, offset) => {
                return Err(self.error(
                    format!("expected a literal, found {}", describe(&token)),
                    offset,
                ))
            }
        };

        Ok(Expression::Compare { left, op, right })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(left: &str, op: CompareOp, right: Literal) -> Expression {
        Expression::compare(left, op, right)
    }

    #[test]
    fn test_parse_simple_equality() {
        let expr = parse("$intent = 'search'").unwrap();
        assert_eq!(
            expr,
            cmp("intent", CompareOp::Eq, Literal::String("search".to_string()))
        );
    }

    #[test]
    fn test_dollar_prefix_is_optional() {
        assert_eq!(parse("$age > 5").unwrap(), parse("age > 5").unwrap());
    }

    #[test]
    fn test_parse_all_comparators() {
        let cases = [
            ("$a = 1", CompareOp::Eq),
            ("$a == 1", CompareOp::Eq),
            ("$a != 1", CompareOp::NotEq),
            ("$a <> 1", CompareOp::NotEq),
            ("$a < 1", CompareOp::Lt),
            ("$a <= 1", CompareOp::Lte),
            ("$a > 1", CompareOp::Gt),
            ("$a >= 1", CompareOp::Gte),
        ];
        for (source, op) in cases {
            assert_eq!(
                parse(source).unwrap(),
                cmp("a", op, Literal::Number(1.0)),
                "{}",
                source
            );
        }
    }

    #[test]
    fn test_parse_numeric_literals() {
        assert_eq!(
            parse("$temp >= 37.5").unwrap(),
            cmp("temp", CompareOp::Gte, Literal::Number(37.5))
        );
        assert_eq!(
            parse("$delta > -2").unwrap(),
            cmp("delta", CompareOp::Gt, Literal::Number(-2.0))
        );
        assert_eq!(
            parse("$count < 1e3").unwrap(),
            cmp("count", CompareOp::Lt, Literal::Number(1000.0))
        );
    }

    #[test]
    fn test_parse_boolean_and_null_literals() {
        assert_eq!(
            parse("$is_draft = FALSE").unwrap(),
            cmp("is_draft", CompareOp::Eq, Literal::Boolean(false))
        );
        assert_eq!(
            parse("$error = null").unwrap(),
            cmp("error", CompareOp::Eq, Literal::Null)
        );
        assert_eq!(
            parse("$error != nil").unwrap(),
            cmp("error", CompareOp::NotEq, Literal::Null)
        );
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(
            parse(r#"$name = "say \"hi\"""#).unwrap(),
            cmp("name", CompareOp::Eq, Literal::String("say \"hi\"".to_string()))
        );
        assert_eq!(
            parse("$name = 'it\\'s'").unwrap(),
            cmp("name", CompareOp::Eq, Literal::String("it's".to_string()))
        );
    }

    #[test]
    fn test_parse_variable_operand() {
        assert_eq!(
            parse("$weight < $limit").unwrap(),
            Expression::compare("weight", CompareOp::Lt, Operand::Variable("limit".to_string()))
        );
    }

    #[test]
    fn test_parse_symbolic_and_keyword_connectives() {
        let symbolic = parse("$a = 1 && $b = 2").unwrap();
        let keyword = parse("$a = 1 and $b = 2").unwrap();
        let upper = parse("$a = 1 AND $b = 2").unwrap();
        assert_eq!(symbolic, keyword);
        assert_eq!(symbolic, upper);

        match parse("$a = 1 || $b = 2").unwrap() {
            Expression::Combine { op, .. } => assert_eq!(op, LogicOp::Or),
            _ => panic!("Expected Combine expression"),
        }
    }

    #[test]
    fn test_connectives_group_left_to_right() {
        let expr = parse("$a = 1 || $b = 2 && $c = 3").unwrap();
        let expected = Expression::combine(
            Expression::combine(
                cmp("a", CompareOp::Eq, Literal::Number(1.0)),
                LogicOp::Or,
                cmp("b", CompareOp::Eq, Literal::Number(2.0)),
            ),
            LogicOp::And,
            cmp("c", CompareOp::Eq, Literal::Number(3.0)),
        );
        assert_eq!(expr, expected);
    }

    #[test]
    fn test_parentheses_group() {
        let expr = parse("$a = 1 || ($b = 2 && $c = 3)").unwrap();
        match expr {
            Expression::Combine { op, right, .. } => {
                assert_eq!(op, LogicOp::Or);
                assert!(matches!(*right, Expression::Combine { op: LogicOp::And, .. }));
            }
            _ => panic!("Expected Combine expression"),
        }
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        assert_eq!(
            parse("  $age>5&&$fever=true  ").unwrap(),
            parse("$age > 5 && $fever = true").unwrap()
        );
    }

    #[test]
    fn test_canonical_form_parses_back() {
        let sources = [
            "$a = 1 || $b = 'x' && $c != nil",
            "($signs = \"chest \\\"indrawing\\\"\") or $rate >= 50.5",
            "$x <= $y",
        ];
        for source in sources {
            let expr = parse(source).unwrap();
            assert_eq!(parse(&expr.to_string()).unwrap(), expr, "{}", source);
        }
    }

    #[test]
    fn test_keywords_are_not_identifiers() {
        assert!(parse("and = 1").is_err());
        // a `$` marker makes them ordinary names
        assert_eq!(
            parse("$and = 1").unwrap(),
            cmp("and", CompareOp::Eq, Literal::Number(1.0))
        );
    }

    #[test]
    fn test_parse_errors_carry_source() {
        let err = parse("$age >").unwrap_err();
        assert_eq!(err.source_text, "$age >");
        assert!(err.message.contains("end of input"));

        let err = parse("this is not valid").unwrap_err();
        assert_eq!(err.source_text, "this is not valid");
    }

    #[test]
    fn test_parse_invalid() {
        let invalid = [
            "",
            "   ",
            "true",
            "$a = 1 &&",
            "$a = 1 & $b = 2",
            "$a ! 1",
            "$a = 'open",
            "($a = 1",
            "$a = 1)",
            "$a = 1 $b = 2",
            "5 = $a",
            "$a = 1.2.3",
            "$a = #",
        ];
        for source in invalid {
            assert!(parse(source).is_err(), "{:?} should not parse", source);
        }
    }

    #[test]
    fn test_long_chain_is_an_error_not_a_crash() {
        let source = vec!["$a = 1"; 20_000].join(" && ");
        let err = parse(&source).unwrap_err();
        assert!(err.message.contains("too many clauses"));
        assert_eq!(err.source_text, source);

        let at_limit = vec!["$a = 1"; MAX_CLAUSES].join(" || ");
        assert!(parse(&at_limit).is_ok());
        let over = vec!["$a = 1"; MAX_CLAUSES + 1].join(" || ");
        assert!(parse(&over).is_err());
    }

    #[test]
    fn test_clause_limit_counts_inside_parentheses() {
        let group = format!("({})", vec!["$a = 1"; 300].join(" and "));
        let source = format!("{} or {}", group, group);
        assert!(parse(&source).is_err());
    }

    #[test]
    fn test_long_chain_canonical_form_parses_back() {
        let source = vec!["$a = 1"; MAX_DEPTH + 6].join(" && ");
        let expr = parse(&source).unwrap();
        assert_eq!(parse(&expr.to_string()).unwrap(), expr);

        let mixed = (0..200)
            .map(|i| format!("$v{} = {}", i, i))
            .collect::<Vec<_>>()
            .join(" || ");
        let nested = format!("$x = true && ({})", mixed);
        let expr = parse(&nested).unwrap();
        assert_eq!(parse(&expr.to_string()).unwrap(), expr);
    }

    #[test]
    fn test_identifiers_are_ascii() {
        assert!(parse("$âge = 1").is_err());
        assert!(parse("$age_2.value = 1").is_ok());
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        let source = format!("{}$a = 1{}", "(".repeat(500), ")".repeat(500));
        let err = parse(&source).unwrap_err();
        assert!(err.message.contains("nesting"));

        let shallow = format!("{}$a = 1{}", "(".repeat(10), ")".repeat(10));
        assert!(parse(&shallow).is_ok());
    }
}
