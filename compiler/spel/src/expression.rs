//! Parsed expressions and the compile-on-demand policy.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use spel_compile::{CompilationState, CompiledExpression, SpelCompiler};
use spel_diagnostic::SpelMessage;
use spel_eval::support::StandardTypeConverter;
use spel_eval::{
    EvalError, EvaluationContext, ExpressionState, FromValue, SpelNode,
    StandardEvaluationContext, TypeConverter, TypedValue, Value,
};
use spel_ir::{to_string_ast, Expr};
use tracing::{debug, warn};

use crate::config::{CompilerMode, SpelParserConfiguration};

/// Interpretations before a [`CompilerMode::Mixed`] expression is compiled.
pub const INTERPRETED_COUNT_THRESHOLD: u32 = 100;

/// Failed compilations after which an expression stops trying.
pub const FAILED_ATTEMPTS_THRESHOLD: u32 = 100;

/// Anything [`SpelExpressionParser`](crate::SpelExpressionParser) produces.
///
/// Calls without a context use a [`StandardEvaluationContext`] owned by
/// the expression.
pub trait Expression: Send + Sync {
    /// The text this expression was parsed from.
    fn expression_string(&self) -> &str;

    fn get_value(&self) -> Result<TypedValue, EvalError>;

    fn get_value_with_root(&self, root: TypedValue) -> Result<TypedValue, EvalError>;

    fn get_value_in(&self, ctx: &dyn EvaluationContext) -> Result<TypedValue, EvalError>;

    fn get_value_in_with_root(
        &self,
        ctx: &dyn EvaluationContext,
        root: TypedValue,
    ) -> Result<TypedValue, EvalError>;

    fn is_writable(&self, ctx: &dyn EvaluationContext) -> Result<bool, EvalError>;

    fn set_value(&self, ctx: &dyn EvaluationContext, value: Value) -> Result<(), EvalError>;

    /// Converter for results of calls that do not pass a context.
    fn type_converter(&self) -> &dyn TypeConverter {
        &StandardTypeConverter
    }
}

impl dyn Expression + '_ {
    /// Evaluate and convert the result to `T`.
    pub fn get_value_as<T: FromValue>(&self) -> Result<T, EvalError> {
        T::from_value(self.get_value()?.into_value(), self.type_converter())
    }

    /// Evaluate in `ctx` and convert the result with its converter.
    pub fn get_value_in_as<T: FromValue>(&self, ctx: &dyn EvaluationContext) -> Result<T, EvalError> {
        T::from_value(self.get_value_in(ctx)?.into_value(), ctx.type_converter())
    }
}

/// A parsed SpEL expression.
///
/// Shareable between threads. Interpretation records what the compiler
/// needs on the node tree; depending on the configured [`CompilerMode`]
/// the tree is then compiled and later evaluations run the compiled form.
pub struct SpelExpression {
    source: String,
    expr: Expr,
    ast: SpelNode,
    config: SpelParserConfiguration,
    context: OnceLock<StandardEvaluationContext>,
    compiled: ArcSwapOption<CompiledExpression>,
    compile_lock: Mutex<()>,
    interpreted_count: AtomicU32,
    failed_attempts: AtomicU32,
}

impl SpelExpression {
    pub(crate) fn new(source: &str, expr: Expr, config: SpelParserConfiguration) -> Self {
        let ast = SpelNode::lower(&expr);
        SpelExpression {
            source: source.to_owned(),
            expr,
            ast,
            config,
            context: OnceLock::new(),
            compiled: ArcSwapOption::empty(),
            compile_lock: Mutex::new(()),
            interpreted_count: AtomicU32::new(0),
            failed_attempts: AtomicU32::new(0),
        }
    }

    pub fn ast(&self) -> &SpelNode {
        &self.ast
    }

    pub fn config(&self) -> &SpelParserConfiguration {
        &self.config
    }

    /// The expression re-rendered from its syntax tree.
    pub fn to_string_ast(&self) -> String {
        to_string_ast(&self.expr)
    }

    pub fn get_value_as<T: FromValue>(&self) -> Result<T, EvalError> {
        (self as &dyn Expression).get_value_as()
    }

    pub fn get_value_in_as<T: FromValue>(&self, ctx: &dyn EvaluationContext) -> Result<T, EvalError> {
        (self as &dyn Expression).get_value_in_as(ctx)
    }

    /// The context used by calls that do not pass one, created on first use.
    pub fn evaluation_context(&self) -> &StandardEvaluationContext {
        self.context.get_or_init(StandardEvaluationContext::new)
    }

    pub fn set_evaluation_context(&mut self, ctx: StandardEvaluationContext) {
        self.context = OnceLock::from(ctx);
    }

    /// Compile now, regardless of mode. Returns whether a compiled form is
    /// in place afterwards.
    pub fn compile_expression(&self) -> bool {
        if self.compiled.load().is_some() {
            return true;
        }
        if self.failed_attempts.load(Ordering::Relaxed) >= FAILED_ATTEMPTS_THRESHOLD {
            return false;
        }
        let _guard = self.compile_lock.lock();
        if self.compiled.load().is_some() {
            return true;
        }
        match SpelCompiler::new().compile(&self.ast) {
            Ok(compiled) => {
                debug!(expression = %self.source, "compiled");
                self.compiled.store(Some(Arc::new(compiled)));
                true
            }
            Err(err) => {
                let failures = self.failed_attempts.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(expression = %self.source, %err, failures, "compilation failed");
                false
            }
        }
    }

    /// Drop any compiled form and reset the counters.
    pub fn revert_to_interpreted(&self) {
        let _guard = self.compile_lock.lock();
        self.compiled.store(None);
        self.interpreted_count.store(0, Ordering::Relaxed);
        self.failed_attempts.store(0, Ordering::Relaxed);
    }

    pub fn compiled(&self) -> Option<Arc<CompiledExpression>> {
        self.compiled.load_full()
    }

    pub fn compilation_state(&self) -> CompilationState {
        let evaluated =
            self.compiled.load().is_some() || self.interpreted_count.load(Ordering::Relaxed) > 0;
        CompilationState::of(&self.ast, evaluated)
    }

    fn evaluate(
        &self,
        ctx: &dyn EvaluationContext,
        root: TypedValue,
    ) -> Result<TypedValue, EvalError> {
        if let Some(compiled) = self.compiled.load_full() {
            match compiled.get_value(ctx, &root) {
                Ok(value) => return Ok(value),
                Err(err) if self.config.compiler_mode == CompilerMode::Mixed => {
                    warn!(expression = %self.source, %err, "compiled expression failed, reverting");
                    self.compiled.store(None);
                    self.interpreted_count.store(0, Ordering::Relaxed);
                }
                Err(err) => {
                    return Err(EvalError::unpositioned(
                        SpelMessage::ExceptionRunningCompiledExpression,
                    )
                    .with_cause(err));
                }
            }
        }

        let mut state = ExpressionState::with_root(ctx, root);
        let value = self.ast.get_value(&mut state)?;
        self.check_compile();
        Ok(value)
    }

    fn check_compile(&self) {
        let count = self
            .interpreted_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_add(1)))
            .map_or(u32::MAX, |n| n.saturating_add(1));
        match self.config.compiler_mode {
            CompilerMode::Off => {}
            CompilerMode::Immediate => {
                self.compile_expression();
            }
            CompilerMode::Mixed => {
                if count >= INTERPRETED_COUNT_THRESHOLD {
                    self.compile_expression();
                }
            }
        }
    }
}

impl Expression for SpelExpression {
    fn expression_string(&self) -> &str {
        &self.source
    }

    fn get_value(&self) -> Result<TypedValue, EvalError> {
        let ctx = self.evaluation_context();
        self.evaluate(ctx, ctx.root_object())
    }

    fn get_value_with_root(&self, root: TypedValue) -> Result<TypedValue, EvalError> {
        self.evaluate(self.evaluation_context(), root)
    }

    fn get_value_in(&self, ctx: &dyn EvaluationContext) -> Result<TypedValue, EvalError> {
        self.evaluate(ctx, ctx.root_object())
    }

    fn get_value_in_with_root(
        &self,
        ctx: &dyn EvaluationContext,
        root: TypedValue,
    ) -> Result<TypedValue, EvalError> {
        self.evaluate(ctx, root)
    }

    fn is_writable(&self, ctx: &dyn EvaluationContext) -> Result<bool, EvalError> {
        self.ast.is_writable(&mut ExpressionState::new(ctx))
    }

    fn set_value(&self, ctx: &dyn EvaluationContext, value: Value) -> Result<(), EvalError> {
        self.ast.set_value(&mut ExpressionState::new(ctx), value)
    }

    fn type_converter(&self) -> &dyn TypeConverter {
        self.evaluation_context().type_converter()
    }
}

impl std::fmt::Debug for SpelExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpelExpression")
            .field("source", &self.source)
            .field("mode", &self.config.compiler_mode)
            .field("compiled", &self.compiled.load().is_some())
            .finish_non_exhaustive()
    }
}
