use crate::ast::{Comparator, Expression, Token, parse_tokens, tokenize};
use crate::error::{ConfigError, EvaluationError};
use crate::evaluator::FrameEngine;
use ahash::AHashMap;
use std::collections::BTreeSet;
use std::fmt;

/// `expression comparator threshold`, evaluated node by node.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub expression: Expression,
    /// Source tokens of the expression, e.g. `["[H]", "+", "2"]`.
    pub tokens: Vec<String>,
    pub comparator: Comparator,
    pub threshold: f64,
}

impl Condition {
    pub fn new(expression: &str, comparator: Comparator, threshold: f64) -> Result<Self, ConfigError> {
        let tokens = tokenize(expression)?;
        if tokens.iter().any(|t| matches!(t, Token::Compare(_))) {
            return Err(ConfigError::InvalidExpression {
                expression: expression.to_string(),
                message: "comparator inside the expression".to_string(),
            });
        }
        Ok(Self {
            expression: parse_tokens(&tokens, expression)?,
            tokens: tokens.iter().map(Token::text).collect(),
            comparator,
            threshold,
        })
    }

    /// Parses the textual form written by `Display`, e.g. `[H] > 0.5`.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let invalid = |message: &str| ConfigError::InvalidExpression {
            expression: text.to_string(),
            message: message.to_string(),
        };
        let tokens = tokenize(text)?;
        let compare_positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| matches!(t, Token::Compare(_)))
            .map(|(i, _)| i)
            .collect();
        let [position] = compare_positions[..] else {
            return Err(invalid("expected exactly one comparator"));
        };
        let Token::Compare(comparator) = &tokens[position] else {
            return Err(invalid("expected exactly one comparator"));
        };
        let threshold = match &tokens[position + 1..] {
            [Token::Number(value, _)] => *value,
            [Token::Operator('-'), Token::Number(value, _)] => -*value,
            _ => return Err(invalid("the threshold must be a number")),
        };
        let left = &tokens[..position];
        Ok(Self {
            expression: parse_tokens(left, text)?,
            tokens: left.iter().map(Token::text).collect(),
            comparator: *comparator,
            threshold,
        })
    }

    /// Textual form without any whitespace, used for default column names.
    pub fn tight(&self) -> String {
        self.to_string().chars().filter(|c| !c.is_whitespace()).collect()
    }

    pub fn required_variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.expression.required_variables(&mut vars);
        vars
    }

    /// Whether the condition holds at every node of a frame.
    pub fn evaluate(&self, values: &AHashMap<String, Vec<f64>>, nb_nodes: usize) -> Result<Vec<bool>, EvaluationError> {
        let lhs = FrameEngine::new(values, nb_nodes).evaluate(&self.expression)?;
        Ok(lhs
            .into_iter()
            .map(|v| self.comparator.holds(v, self.threshold))
            .collect())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.tokens.join(" "), self.comparator, self.threshold)
    }
}
