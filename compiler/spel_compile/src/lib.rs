//! SpEL Compile - lowering of hot node trees to verified stack code.
//!
//! # Architecture
//!
//! - [`Compilable`]: per-node `is_compilable` and `generate_code`, driven
//!   by what interpretation recorded on the nodes (exit descriptors, cached
//!   reflective executors).
//! - [`CodeFlow`]: the descriptor stack per compilation scope, the
//!   receiver each step of a compound sees.
//! - [`Emitter`]: instructions, labels and pools; `finish` resolves labels
//!   and runs the verifier.
//! - [`verify`]: stack-shape checking. Paths joining at a label must agree
//!   on every descriptor.
//! - [`vm`]: the stack machine. Shares numeric promotion, equality and
//!   ordering with the interpreter.
//! - [`SpelCompiler`] / [`CompiledExpression`]: the entry points.

mod code_flow;
mod compiler;
mod emitter;
mod error;
mod generate;
mod instr;
mod program;
pub mod verify;
pub mod vm;

pub use code_flow::CodeFlow;
pub use compiler::{CompilationState, CompiledExpression, SpelCompiler};
pub use emitter::Emitter;
pub use error::CompileError;
pub use generate::Compilable;
pub use instr::{Instr, Label};
pub use program::{MemberRef, Program};

#[cfg(test)]
mod tests;
