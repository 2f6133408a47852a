//! Token cursor for navigating the token stream.

use spel_diagnostic::SpelMessage;
use spel_ir::{Span, Token, TokenKind, TokenList};
use tracing::trace;

use crate::ParseError;

static EOF: Token = Token {
    kind: TokenKind::Eof,
    span: Span::DUMMY,
};

/// Position in a token list. The list always ends with EOF and the cursor
/// never moves past it.
pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a TokenList) -> Self {
        Cursor {
            tokens: tokens.as_slice(),
            pos: 0,
        }
    }

    #[inline]
    pub fn current(&self) -> &'a Token {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    #[inline]
    pub fn current_kind(&self) -> &'a TokenKind {
        &self.current().kind
    }

    #[inline]
    pub fn current_span(&self) -> Span {
        self.current().span
    }

    #[inline]
    pub fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::DUMMY, |t| t.span)
    }

    #[inline]
    pub fn peek_next_kind(&self) -> &'a TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map_or(&EOF.kind, |t| &t.kind)
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    #[inline]
    pub fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Current token is the identifier `name` (case-sensitive).
    #[inline]
    pub fn check_ident_named(&self, name: &str) -> bool {
        matches!(self.current_kind(), TokenKind::Ident(id) if id == name)
    }

    /// Consume the current token. At EOF this is a no-op.
    pub fn advance(&mut self) -> &'a Token {
        let token = self.current();
        trace!(
            pos = self.pos,
            kind = %token.kind.display_name(),
            span_start = token.span.start,
            span_end = token.span.end,
            "advance"
        );
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// Consume `kind` if it is the current token.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or fail with `Ood` at EOF, `NotExpectedToken` otherwise.
    pub fn expect(&mut self, kind: &TokenKind) -> Result<Span, ParseError> {
        if self.check(kind) {
            return Ok(self.advance().span);
        }
        Err(self.unexpected(kind.display_name()))
    }

    /// Consume an identifier and return its text.
    pub fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        if let TokenKind::Ident(name) = self.current_kind() {
            let span = self.advance().span;
            return Ok((name.clone(), span));
        }
        Err(self.unexpected("identifier"))
    }

    /// Error for the current token where `expected` should have been.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.current();
        if self.is_at_end() {
            return ParseError::new(SpelMessage::Ood, token.span);
        }
        ParseError::new(SpelMessage::NotExpectedToken, token.span)
            .with_insert(expected)
            .with_insert(token_text(&token.kind))
    }
}

/// Source-like rendering of a token for error inserts.
pub fn token_text(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Int(n) => n.to_string(),
        TokenKind::Long(n) => format!("{n}L"),
        TokenKind::Float(bits) => format!("{}f", f32::from_bits(*bits)),
        TokenKind::Double(bits) => f64::from_bits(*bits).to_string(),
        TokenKind::Str(s) => format!("'{s}'"),
        TokenKind::Ident(name) => name.clone(),
        other => other.display_name().to_string(),
    }
}
