//! Parse error type.

use spel_diagnostic::{Diagnostic, SpelMessage};
use spel_ir::Span;
use spel_lexer::LexError;

/// A syntax error with its message code and position.
///
/// Lexical errors are carried through unchanged.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("{0}")]
pub struct ParseError(pub Diagnostic);

impl ParseError {
    pub fn new(message: SpelMessage, span: Span) -> Self {
        ParseError(Diagnostic::new(message, span))
    }

    #[must_use]
    pub fn with_insert(self, insert: impl ToString) -> Self {
        ParseError(self.0.with_insert(insert))
    }

    pub fn message(&self) -> SpelMessage {
        self.0.message
    }

    pub fn span(&self) -> Span {
        self.0.span
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        &self.0
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError(err.0)
    }
}
