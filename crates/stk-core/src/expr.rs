//! Arithmetic expression evaluation over a named numeric scope.
//!
//! Supported surface: `+ - * / ^`, parentheses, unary minus, decimal and
//! integer literals, identifiers, and unit-suffix literals (`5 mm`,
//! `0.25 in`) which are reduced to millimetres at evaluation time.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),
    #[error("domain error: {0}")]
    Domain(String),
    #[error("overflow: result is not finite")]
    Overflow,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '+' => {
                    self.chars.next();
                    tokens.push(Token::Plus);
                }
                '-' => {
                    self.chars.next();
                    tokens.push(Token::Minus);
                }
                '*' => {
                    self.chars.next();
                    tokens.push(Token::Star);
                }
                '/' => {
                    self.chars.next();
                    tokens.push(Token::Slash);
                }
                '^' => {
                    self.chars.next();
                    tokens.push(Token::Caret);
                }
                '(' => {
                    self.chars.next();
                    tokens.push(Token::LParen);
                }
                ')' => {
                    self.chars.next();
                    tokens.push(Token::RParen);
                }
                c if c.is_ascii_digit() || c == '.' => {
                    tokens.push(Token::Number(self.read_number()?));
                }
                c if c.is_alphabetic() || c == '_' => {
                    tokens.push(Token::Ident(self.read_ident()));
                }
                other => {
                    return Err(EvalError::Syntax(format!("unexpected character '{other}'")));
                }
            }
        }
        Ok(tokens)
    }

    fn read_number(&mut self) -> Result<f64, EvalError> {
        let mut s = String::new();
        let mut seen_dot = false;
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.chars.next();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s.parse::<f64>()
            .map_err(|_| EvalError::Syntax(format!("invalid number literal '{s}'")))
    }

    fn read_ident(&mut self) -> String {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                s.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        s
    }
}

struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    scope: &'s HashMap<String, f64>,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn parse_expr(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.next();
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.next();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.next();
                    value *= self.parse_unary()?;
                }
                Some(Token::Slash) => {
                    self.next();
                    let divisor = self.parse_unary()?;
                    if divisor == 0.0 {
                        return Err(EvalError::Domain("division by zero".into()));
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn parse_unary(&mut self) -> Result<f64, EvalError> {
        if let Some(Token::Minus) = self.peek() {
            self.next();
            return Ok(-self.parse_unary()?);
        }
        if let Some(Token::Plus) = self.peek() {
            self.next();
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<f64, EvalError> {
        let base = self.parse_atom()?;
        if let Some(Token::Caret) = self.peek() {
            self.next();
            let exponent = self.parse_unary()?;
            let result = base.powf(exponent);
            if base < 0.0 && exponent.fract() != 0.0 {
                return Err(EvalError::Domain("negative base with fractional exponent".into()));
            }
            return Ok(result);
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<f64, EvalError> {
        match self.next() {
            Some(Token::Number(n)) => {
                // Optional unit suffix directly following a numeric literal.
                if let Some(Token::Ident(name)) = self.peek() {
                    match name.as_str() {
                        "mm" => {
                            self.next();
                            return Ok(n);
                        }
                        "in" => {
                            self.next();
                            return Ok(n * 25.4);
                        }
                        _ => {}
                    }
                }
                Ok(n)
            }
            Some(Token::Ident(name)) => self
                .scope
                .get(&name)
                .copied()
                .ok_or(EvalError::UnknownIdentifier(name)),
            Some(Token::LParen) => {
                let value = self.parse_expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(EvalError::Syntax("expected ')'".into())),
                }
            }
            Some(other) => Err(EvalError::Syntax(format!("unexpected token {other:?}"))),
            None => Err(EvalError::Syntax("unexpected end of expression".into())),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Evaluate `expression` against `scope` (identifiers already resolved to
/// millimetre values). Blank/whitespace input evaluates to 0 without error.
pub fn eval(expression: &str, scope: &HashMap<String, f64>) -> Result<f64, EvalError> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    let tokens = Lexer::new(trimmed).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        scope,
    };
    let value = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(EvalError::Syntax("trailing input after expression".into()));
    }
    if !value.is_finite() {
        return Err(EvalError::Overflow);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn blank_is_zero() {
        assert_eq!(eval("", &HashMap::new()).unwrap(), 0.0);
        assert_eq!(eval("   ", &HashMap::new()).unwrap(), 0.0);
    }

    #[test]
    fn basic_arithmetic_and_precedence() {
        assert!((eval("2 + 3 * 4", &HashMap::new()).unwrap() - 14.0).abs() < 1e-10);
        assert!((eval("(2 + 3) * 4", &HashMap::new()).unwrap() - 20.0).abs() < 1e-10);
        assert!((eval("2 ^ 3 ^ 2", &HashMap::new()).unwrap() - 512.0).abs() < 1e-9); // right-assoc
    }

    #[test]
    fn unary_minus() {
        assert!((eval("-5 + 3", &HashMap::new()).unwrap() - (-2.0)).abs() < 1e-10);
    }

    #[test]
    fn unit_suffix_reduces_to_mm() {
        assert!((eval("1 in", &HashMap::new()).unwrap() - 25.4).abs() < 1e-9);
        assert!((eval("5 mm", &HashMap::new()).unwrap() - 5.0).abs() < 1e-9);
        assert!((eval("0.25 in + 1 mm", &HashMap::new()).unwrap() - (0.25 * 25.4 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn identifiers_resolve_from_scope() {
        let s = scope(&[("D", 10.0)]);
        assert!((eval("D / 2", &s).unwrap() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn unknown_identifier_errors() {
        let err = eval("unknown_param + 1", &HashMap::new()).unwrap_err();
        assert!(matches!(err, EvalError::UnknownIdentifier(_)));
    }

    #[test]
    fn divide_by_zero_is_domain_error() {
        let err = eval("1 / 0", &HashMap::new()).unwrap_err();
        assert!(matches!(err, EvalError::Domain(_)));
    }

    #[test]
    fn unparseable_input_is_syntax_error() {
        let err = eval("2 + + +", &HashMap::new()).unwrap_err();
        assert!(matches!(err, EvalError::Syntax(_)));

        let err2 = eval("2 @ 3", &HashMap::new()).unwrap_err();
        assert!(matches!(err2, EvalError::Syntax(_)));
    }

    #[test]
    fn evaluation_is_order_independent_for_independent_parameters() {
        // Expression equivalence property: reordering independent
        // scope entries doesn't change the result.
        let mut s1 = HashMap::new();
        s1.insert("a".to_string(), 2.0);
        s1.insert("b".to_string(), 3.0);
        let mut s2 = HashMap::new();
        s2.insert("b".to_string(), 3.0);
        s2.insert("a".to_string(), 2.0);
        assert_eq!(eval("a * b + 1", &s1).unwrap(), eval("a * b + 1", &s2).unwrap());
    }
}
