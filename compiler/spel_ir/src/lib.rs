//! SpEL IR - spans, tokens and the syntax tree
//!
//! This crate holds the data shared by the front end:
//! - [`Span`] for source locations
//! - [`Token`], [`TokenKind`] and [`TokenList`] for lexer output
//! - [`Expr`] and friends for parser output, plus [`to_string_ast`]
//!
//! Nothing here depends on runtime values; the evaluator lowers `Expr` into
//! its own node type.

pub mod ast;
mod span;
mod token;

pub use ast::{to_string_ast, BinaryOp, Expr, ExprKind, Literal, SelectionKind, UnaryOp};
pub use span::Span;
pub use token::{Token, TokenKind, TokenList};
