//! Entry points: compile a node tree, run the result.

use spel_eval::{EvalError, EvaluationContext, NodeKind, SpelNode, TypeDescriptor, TypedValue};
use spel_stack::ensure_sufficient_stack;
use tracing::debug;

use crate::code_flow::CodeFlow;
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::generate::Compilable;
use crate::instr::Instr;
use crate::program::Program;
use crate::vm;

/// Where a node tree stands with respect to compilation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CompilationState {
    /// Never evaluated.
    Uninitialized,
    /// Evaluated, but some node has not recorded what compilation needs
    /// (an untaken branch, a short-circuited operand). More evaluations may
    /// change that.
    Interpreted,
    Compilable,
    NotCompilable,
}

/// Whether any node under `node` is still missing its exit descriptor.
fn has_unrecorded_exit(node: &SpelNode) -> bool {
    ensure_sufficient_stack(|| {
        let records_exit = !matches!(
            node.kind(),
            NodeKind::Assign | NodeKind::Compound | NodeKind::Constructor { .. }
        );
        (records_exit && node.exit_descriptor().is_none())
            || node.children().iter().any(has_unrecorded_exit)
    })
}

impl CompilationState {
    /// Classify `node`. `evaluated` says whether the interpreter has run it
    /// at least once.
    pub fn of(node: &SpelNode, evaluated: bool) -> CompilationState {
        if !evaluated {
            CompilationState::Uninitialized
        } else if node.is_compilable() {
            CompilationState::Compilable
        } else if has_unrecorded_exit(node) {
            CompilationState::Interpreted
        } else {
            CompilationState::NotCompilable
        }
    }
}

/// Turns evaluated node trees into [`CompiledExpression`]s.
#[derive(Copy, Clone, Default, Debug)]
pub struct SpelCompiler;

impl SpelCompiler {
    pub fn new() -> Self {
        SpelCompiler
    }

    #[tracing::instrument(level = "debug", skip_all, fields(node = root.kind().node_name()))]
    pub fn compile(&self, root: &SpelNode) -> Result<CompiledExpression, CompileError> {
        if !root.is_compilable() {
            debug!("not compilable");
            return Err(CompileError::NotCompilable {
                node: root.kind().node_name(),
            });
        }
        let mut em = Emitter::new();
        let mut cf = CodeFlow::new();
        root.generate_code(&mut em, &mut cf)?;
        em.set_span(root.span());
        em.emit(Instr::Return);
        let program = em.finish(cf.locals())?;
        debug!(instructions = program.code().len(), "compiled");
        Ok(CompiledExpression { program })
    }
}

/// A compiled node tree. Holds no reference to the tree it came from.
#[derive(Debug)]
pub struct CompiledExpression {
    program: Program,
}

impl CompiledExpression {
    /// Evaluate against `ctx`, with `root` as the root object.
    pub fn get_value(
        &self,
        ctx: &dyn EvaluationContext,
        root: &TypedValue,
    ) -> Result<TypedValue, EvalError> {
        let value = vm::execute(&self.program, ctx, root)?;
        let descriptor = match self.program.result_descriptor() {
            TypeDescriptor::Null => TypeDescriptor::Any,
            other => other.to_boxed(),
        };
        Ok(TypedValue::with_descriptor(value, descriptor))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}
