//! Diagnostics for the expression engine.
//!
//! Every failure the lexer, parser or evaluator reports is a [`SpelMessage`]
//! (a stable `ELxxxxE` code plus a message template), positioned by a
//! [`Span`](spel_ir::Span) and filled in with inserts. [`Diagnostic`] bundles
//! the three; [`emitter::render`] turns one into a caret report against the
//! expression source.

mod diagnostic;
pub mod emitter;
mod message;

pub use diagnostic::Diagnostic;
pub use message::SpelMessage;
