//! Recursive descent parser for SpEL expressions.
//!
//! One token of lookahead, no backtracking. [`parse_expression`] is the
//! usual entry point: it enforces the length limit, tokenizes and parses.

mod cursor;
mod error;
mod grammar;

pub use cursor::{token_text, Cursor};
pub use error::ParseError;

use spel_diagnostic::SpelMessage;
use spel_ir::{Expr, Span, TokenList};
use tracing::debug;

/// Longest expression accepted unless configured otherwise.
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = 10_000;

/// Parser state.
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
        }
    }

    /// Parse a complete expression; trailing tokens are an error.
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.cursor.is_at_end() {
            return Err(ParseError::new(
                SpelMessage::Ood,
                self.cursor.current_span(),
            ));
        }
        let expr = self.parse_expr()?;
        if !self.cursor.is_at_end() {
            let token = self.cursor.current();
            return Err(ParseError::new(SpelMessage::MoreInput, token.span)
                .with_insert(token_text(&token.kind)));
        }
        Ok(expr)
    }
}

/// Parse an already tokenized expression.
pub fn parse(tokens: &TokenList) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}

/// Check the length limit, tokenize and parse `source`.
pub fn parse_expression(source: &str, max_length: usize) -> Result<Expr, ParseError> {
    let length = source.chars().count();
    if length > max_length {
        return Err(
            ParseError::new(SpelMessage::MaxExpressionLengthExceeded, Span::point(0))
                .with_insert(max_length),
        );
    }
    let tokens = spel_lexer::tokenize(source)?;
    debug!(length, tokens = tokens.len(), "parsing expression");
    parse(&tokens)
}

#[cfg(test)]
mod tests;
