//! Tokenizer and recursive-descent parser for condition expressions.
//!
//! Grammar:
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | atom
//! atom   := NUMBER | '[' ID ']' | '(' expr ')'
//! ```

use super::{Comparator, Expression};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64, String),
    Variable(String),
    Operator(char),
    LeftParen,
    RightParen,
    Compare(Comparator),
}

impl Token {
    /// Source text of the token.
    pub fn text(&self) -> String {
        match self {
            Token::Number(_, text) => text.clone(),
            Token::Variable(var) => format!("[{var}]"),
            Token::Operator(op) => op.to_string(),
            Token::LeftParen => "(".to_string(),
            Token::RightParen => ")".to_string(),
            Token::Compare(cmp) => cmp.symbol().to_string(),
        }
    }
}

fn invalid(expression: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidExpression {
        expression: expression.to_string(),
        message: message.into(),
    }
}

pub fn tokenize(text: &str) -> Result<Vec<Token>, ConfigError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' | '-' | '*' | '/' => {
                tokens.push(Token::Operator(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LeftParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                i += 1;
            }
            '>' | '<' => {
                let with_equal = chars.get(i + 1) == Some(&'=');
                let cmp = match (c, with_equal) {
                    ('>', false) => Comparator::GreaterThan,
                    ('>', true) => Comparator::GreaterThanOrEqual,
                    ('<', false) => Comparator::SmallerThan,
                    _ => Comparator::SmallerThanOrEqual,
                };
                tokens.push(Token::Compare(cmp));
                i += if with_equal { 2 } else { 1 };
            }
            '[' => {
                let end = chars[i..]
                    .iter()
                    .position(|&ch| ch == ']')
                    .ok_or_else(|| invalid(text, "unclosed '['"))?;
                let name: String = chars[i + 1..i + end].iter().collect();
                let name = name.trim();
                if name.is_empty() {
                    return Err(invalid(text, "empty variable name"));
                }
                tokens.push(Token::Variable(name.to_string()));
                i += end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part, e.g. 1e-3.
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| invalid(text, format!("invalid number '{literal}'")))?;
                tokens.push(Token::Number(value, literal));
            }
            other => return Err(invalid(text, format!("unexpected character '{other}'"))),
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    source: &'a str,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> Result<Expression, ConfigError> {
        let mut left = self.term()?;
        while let Some(Token::Operator(op @ ('+' | '-'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.term()?;
            left = if op == '+' {
                Expression::Sum(Box::new(left), Box::new(right))
            } else {
                Expression::Subtract(Box::new(left), Box::new(right))
            };
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Expression, ConfigError> {
        let mut left = self.unary()?;
        while let Some(Token::Operator(op @ ('*' | '/'))) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.unary()?;
            left = if op == '*' {
                Expression::Multiply(Box::new(left), Box::new(right))
            } else {
                Expression::Divide(Box::new(left), Box::new(right))
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expression, ConfigError> {
        if let Some(Token::Operator('-')) = self.peek() {
            self.pos += 1;
            return Ok(Expression::Negate(Box::new(self.unary()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expression, ConfigError> {
        let source = self.source;
        match self.next().cloned() {
            Some(Token::Number(value, _)) => Ok(Expression::Literal(value)),
            Some(Token::Variable(var)) => Ok(Expression::Input(var)),
            Some(Token::LeftParen) => {
                let inner = self.expression()?;
                match self.next() {
                    Some(Token::RightParen) => Ok(inner),
                    _ => Err(invalid(source, "missing ')'")),
                }
            }
            Some(token) => Err(invalid(source, format!("unexpected '{}'", token.text()))),
            None => Err(invalid(source, "unexpected end of expression")),
        }
    }
}

/// Parses an arithmetic expression (no comparator allowed).
pub fn parse_tokens(tokens: &[Token], source: &str) -> Result<Expression, ConfigError> {
    if tokens.is_empty() {
        return Err(invalid(source, "empty expression"));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        source,
    };
    let expression = parser.expression()?;
    match parser.peek() {
        None => Ok(expression),
        Some(token) => Err(invalid(source, format!("unexpected '{}'", token.text()))),
    }
}

pub fn parse_expression(text: &str) -> Result<Expression, ConfigError> {
    parse_tokens(&tokenize(text)?, text)
}
