//! Lexer for SpEL expressions using logos.
//!
//! [`tokenize`] turns an expression string into a [`TokenList`] terminated by
//! an EOF token, or fails with the first [`LexError`].

mod convert;
mod keywords;
mod raw_token;

use logos::Logos;
use spel_diagnostic::{Diagnostic, SpelMessage};
use spel_ir::{Span, Token, TokenKind, TokenList};

use raw_token::RawToken;

/// A lexical error: message code, position and inserts.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("{0}")]
pub struct LexError(pub Diagnostic);

impl LexError {
    fn new(message: SpelMessage, span: Span) -> Self {
        LexError(Diagnostic::new(message, span))
    }

    #[must_use]
    fn with_insert(self, insert: impl ToString) -> Self {
        LexError(self.0.with_insert(insert))
    }

    pub fn message(&self) -> SpelMessage {
        self.0.message
    }

    pub fn span(&self) -> Span {
        self.0.span
    }
}

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Result<TokenList, LexError> {
    let mut tokens = TokenList::with_capacity(source.len() / 2 + 1);
    let mut lexer = RawToken::lexer(source);
    let mut after_dot = false;

    while let Some(raw) = lexer.next() {
        let span = Span::from_range(lexer.span());
        let slice = lexer.slice();
        let Ok(raw) = raw else {
            return Err(LexError::new(SpelMessage::UnexpectedCharacter, span).with_insert(slice));
        };
        let kind = convert_token(raw, slice, span, after_dot)?;
        after_dot = matches!(kind, TokenKind::Dot | TokenKind::SafeNav);
        tokens.push(Token::new(kind, span));
    }

    let end = u32::try_from(source.len()).unwrap_or(u32::MAX);
    tokens.push(Token::new(TokenKind::Eof, Span::point(end)));
    Ok(tokens)
}

fn convert_token(
    raw: RawToken,
    slice: &str,
    span: Span,
    after_dot: bool,
) -> Result<TokenKind, LexError> {
    let literal = |result: Result<TokenKind, SpelMessage>| {
        result.map_err(|message| LexError::new(message, span).with_insert(slice))
    };
    let kind = match raw {
        RawToken::Dot => TokenKind::Dot,
        RawToken::SafeNav => TokenKind::SafeNav,
        RawToken::DotDot => TokenKind::DotDot,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBrace => TokenKind::LBrace,
        RawToken::RBrace => TokenKind::RBrace,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Div,
        RawToken::Percent => TokenKind::Mod,
        RawToken::Caret => TokenKind::Caret,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::NotEq => TokenKind::NotEq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::Gt => TokenKind::Gt,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::AmpAmp => TokenKind::And,
        RawToken::PipePipe => TokenKind::Or,
        RawToken::Bang => TokenKind::Not,
        RawToken::Question => TokenKind::Question,
        RawToken::Elvis => TokenKind::Elvis,
        RawToken::Eq => TokenKind::Assign,
        RawToken::Hash => TokenKind::Hash,
        RawToken::At => TokenKind::At,
        RawToken::SelectAll => TokenKind::SelectAll,
        RawToken::SelectFirst => TokenKind::SelectFirst,
        RawToken::SelectLast => TokenKind::SelectLast,
        RawToken::Project => TokenKind::Project,
        RawToken::HexInt => literal(convert::hex_literal(slice))?,
        RawToken::Real => literal(convert::real_literal(slice))?,
        RawToken::Int => literal(convert::int_literal(slice))?,
        RawToken::Str => TokenKind::Str(convert::string_literal(slice, '\'')),
        RawToken::DoubleStr => TokenKind::Str(convert::string_literal(slice, '"')),
        RawToken::UnterminatedStr => {
            return Err(LexError::new(SpelMessage::NonTerminatingQuotedString, span));
        }
        RawToken::UnterminatedDoubleStr => {
            return Err(LexError::new(
                SpelMessage::NonTerminatingDoubleQuotedString,
                span,
            ));
        }
        RawToken::Ident => {
            if after_dot {
                TokenKind::Ident(slice.to_string())
            } else {
                keywords::lookup(slice).unwrap_or_else(|| TokenKind::Ident(slice.to_string()))
            }
        }
    };
    Ok(kind)
}

#[cfg(test)]
mod tests;
