pub mod expression;
pub mod parser;

pub use expression::*;
pub use parser::{Token, parse_expression, parse_tokens, tokenize};
