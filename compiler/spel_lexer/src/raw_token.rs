//! Raw Token Definition
//!
//! The `RawToken` enum is the logos-derived tokenizer output before literal
//! parsing and keyword folding.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub(crate) enum RawToken {
    #[token(".")]
    Dot,
    #[token("?.")]
    SafeNav,
    #[token("..")]
    DotDot,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("?:")]
    Elvis,
    #[token("=")]
    Eq,
    #[token("#")]
    Hash,
    #[token("@")]
    At,
    #[token("?[")]
    SelectAll,
    #[token("^[")]
    SelectFirst,
    #[token("$[")]
    SelectLast,
    #[token("![")]
    Project,

    #[regex(r"0[xX][0-9a-fA-F]+[lL]?")]
    HexInt,

    // A trailing `l`/`L` is accepted here so it can be reported as an error
    // instead of lexing as a separate identifier.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[fFdDlL]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFdDlL]?")]
    #[regex(r"[0-9]+[fFdD]")]
    Real,

    #[regex(r"[0-9]+[lL]?")]
    Int,

    #[regex(r"'([^']|'')*'")]
    Str,
    #[regex(r#""([^"]|"")*""#)]
    DoubleStr,

    #[regex(r"'([^']|'')*")]
    UnterminatedStr,
    #[regex(r#""([^"]|"")*"#)]
    UnterminatedDoubleStr,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Ident,
}
