//! Token types produced by the lexer.

use super::Span;
use std::fmt;

/// A token with its span in the source.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Token { kind, span }
    }

    /// Create a token with no source position.
    pub fn dummy(kind: TokenKind) -> Self {
        Token {
            kind,
            span: Span::DUMMY,
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {}", self.kind, self.span)
    }
}

/// Token kinds.
///
/// Real literals store their bits so the enum stays `Eq + Hash`.
/// Textual operators (`and`, `div`, `instanceof`, ...) are matched
/// case-insensitively by the lexer and folded into the same kinds as their
/// symbolic forms where one exists.
#[derive(Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    /// `42`, `0x2A`
    Int(i32),
    /// `42L`, `0x2AL`
    Long(i64),
    /// `1.5f` (bits of an `f32`)
    Float(u32),
    /// `1.5`, `1e3`, `2d` (bits of an `f64`)
    Double(u64),
    /// Quoted string with escapes already resolved.
    Str(String),
    Ident(String),

    True,
    False,
    Null,
    New,

    /// `and`, `&&`
    And,
    /// `or`, `||`
    Or,
    /// `not`, `!`
    Not,
    /// `div`, `/`
    Div,
    /// `mod`, `%`
    Mod,
    /// `eq`, `==`
    EqEq,
    /// `ne`, `!=`
    NotEq,
    /// `lt`, `<`
    Lt,
    /// `le`, `<=`
    LtEq,
    /// `gt`, `>`
    Gt,
    /// `ge`, `>=`
    GtEq,
    Matches,
    InstanceOf,
    Between,

    Dot,
    /// `?.`
    SafeNav,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Plus,
    Minus,
    Star,
    Caret,
    Question,
    /// `?:`
    Elvis,
    Assign,
    Hash,
    At,
    /// `?[`
    SelectAll,
    /// `^[`
    SelectFirst,
    /// `$[`
    SelectLast,
    /// `![`
    Project,
    /// `..`
    DotDot,

    Eof,
}

impl TokenKind {
    /// Human-readable name used in "expected X but found Y" messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            TokenKind::Int(_) => "integer literal",
            TokenKind::Long(_) => "long literal",
            TokenKind::Float(_) => "float literal",
            TokenKind::Double(_) => "double literal",
            TokenKind::Str(_) => "string literal",
            TokenKind::Ident(_) => "identifier",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::New => "new",
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "!",
            TokenKind::Div => "/",
            TokenKind::Mod => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Matches => "matches",
            TokenKind::InstanceOf => "instanceof",
            TokenKind::Between => "between",
            TokenKind::Dot => ".",
            TokenKind::SafeNav => "?.",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Caret => "^",
            TokenKind::Question => "?",
            TokenKind::Elvis => "?:",
            TokenKind::Assign => "=",
            TokenKind::Hash => "#",
            TokenKind::At => "@",
            TokenKind::SelectAll => "?[",
            TokenKind::SelectFirst => "^[",
            TokenKind::SelectLast => "$[",
            TokenKind::Project => "![",
            TokenKind::DotDot => "..",
            TokenKind::Eof => "end of input",
        }
    }

    /// Whether this token may start an operand.
    pub fn starts_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Int(_)
                | TokenKind::Long(_)
                | TokenKind::Float(_)
                | TokenKind::Double(_)
                | TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::New
                | TokenKind::Not
                | TokenKind::Minus
                | TokenKind::Plus
                | TokenKind::LParen
                | TokenKind::LBrace
                | TokenKind::Hash
                | TokenKind::At
        )
    }
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "Int({n})"),
            TokenKind::Long(n) => write!(f, "Long({n})"),
            TokenKind::Float(bits) => write!(f, "Float({})", f32::from_bits(*bits)),
            TokenKind::Double(bits) => write!(f, "Double({})", f64::from_bits(*bits)),
            TokenKind::Str(s) => write!(f, "Str({s:?})"),
            TokenKind::Ident(s) => write!(f, "Ident({s})"),
            other => write!(f, "{}", other.display_name()),
        }
    }
}

/// Lexer output: tokens in source order, always terminated by [`TokenKind::Eof`].
#[derive(Clone, Default, Eq, PartialEq)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    #[inline]
    pub fn new() -> Self {
        TokenList { tokens: Vec::new() }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        TokenList {
            tokens: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn from_vec(tokens: Vec<Token>) -> Self {
        TokenList { tokens }
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn into_vec(self) -> Vec<Token> {
        self.tokens
    }
}

impl fmt::Debug for TokenList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tokens.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a TokenList {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
