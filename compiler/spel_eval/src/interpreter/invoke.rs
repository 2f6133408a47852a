//! Method, function and constructor calls.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use spel_diagnostic::{Diagnostic, SpelMessage};
use tracing::debug;

use super::{class_name, with_access_cause};
use crate::cache::{ArgumentTypes, CacheSlot, CachedConstructorExecutor, CachedMethodExecutor};
use crate::context::{ConstructorExecutor, EvaluationContext, MethodExecutor};
use crate::error::{AccessError, EvalError, EvalResult, UserError};
use crate::node::{NodeKind, SpelNode};
use crate::state::ExpressionState;
use crate::support::format_method;
use crate::types::TypeDescriptor;
use crate::{TypedValue, Value};

fn argument_types(args: &[Value]) -> ArgumentTypes {
    args.iter().map(Value::descriptor).collect()
}

impl SpelNode {
    /// Method arguments, each evaluated with the scope root as the active
    /// context object.
    fn method_arguments(&self, state: &mut ExpressionState<'_>) -> Result<Vec<Value>, EvalError> {
        let scope_root = state.scope_root().clone();
        let mut args = Vec::with_capacity(self.children().len());
        for child in self.children() {
            let mut active = state.push_active(scope_root.clone());
            args.push(child.get_value(&mut active)?.into_value());
        }
        Ok(args)
    }

    fn plain_arguments(&self, state: &mut ExpressionState<'_>) -> Result<Vec<Value>, EvalError> {
        self.children()
            .iter()
            .map(|child| child.get_value(state).map(TypedValue::into_value))
            .collect()
    }

    pub(super) fn method(&self, state: &mut ExpressionState<'_>) -> EvalResult {
        let NodeKind::Method {
            name,
            null_safe,
            cache,
            original_primitive_exit,
        } = self.kind()
        else {
            return Ok(TypedValue::NULL);
        };
        let ctx = state.context();
        let target = state.active_context_object().clone();
        let args = self.method_arguments(state)?;
        let arg_types = argument_types(&args);

        let target = target.value();
        if target.is_null() {
            if *null_safe {
                return Ok(TypedValue::NULL);
            }
            return Err(EvalError::new(
                SpelMessage::MethodCallOnNullObjectNotAllowed,
                self.span(),
            )
            .with_insert(format_method(name, &arg_types)));
        }

        let target_type = target.descriptor();
        let cacheable = ctx.method_resolvers().iter().all(|r| r.is_cacheable());
        if let Some(cached) = cache.load() {
            if cacheable && cached.is_suitable(target, &target_type, &arg_types) {
                match cached.get().execute(ctx, target, args.clone()) {
                    Ok(result) => {
                        self.record_method_exit(
                            &**cached.get(),
                            &result,
                            *null_safe,
                            original_primitive_exit,
                        );
                        return Ok(result);
                    }
                    Err(AccessError::User(err)) => {
                        return Err(self.method_invocation_failed(name, target, err));
                    }
                    Err(err) => {
                        debug!(name, %err, "cached method executor invalidated");
                    }
                }
            }
            cache.clear();
        }

        let executor = self.find_method(ctx, target, name, &arg_types)?;
        cache.store(CachedMethodExecutor::new(
            executor.clone(),
            target,
            target_type,
            &arg_types,
        ));
        match executor.execute(ctx, target, args) {
            Ok(result) => {
                self.record_method_exit(&*executor, &result, *null_safe, original_primitive_exit);
                Ok(result)
            }
            Err(AccessError::User(err)) => Err(self.method_invocation_failed(name, target, err)),
            Err(AccessError::Eval(err)) => Err((*err).at(self.span())),
            Err(err @ (AccessError::Stale | AccessError::Failed(_))) => Err(EvalError::new(
                SpelMessage::ExceptionDuringMethodInvocation,
                self.span(),
            )
            .with_insert(name)
            .with_insert(class_name(target))
            .with_insert(err)),
        }
    }

    fn find_method(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        arg_types: &[TypeDescriptor],
    ) -> Result<Arc<dyn MethodExecutor>, EvalError> {
        for resolver in ctx.method_resolvers() {
            match resolver.resolve(ctx, target, name, arg_types) {
                Ok(Some(executor)) => return Ok(executor),
                Ok(None) => {}
                Err(err) => {
                    let base = EvalError::new(SpelMessage::ProblemLocatingMethod, self.span())
                        .with_insert(format_method(name, arg_types))
                        .with_insert(class_name(target));
                    return Err(with_access_cause(base, err));
                }
            }
        }
        Err(EvalError::new(SpelMessage::MethodNotFound, self.span())
            .with_insert(format_method(name, arg_types))
            .with_insert(class_name(target)))
    }

    fn method_invocation_failed(&self, name: &str, target: &Value, err: UserError) -> EvalError {
        let message = err.message().to_owned();
        EvalError::from_user(
            err,
            Diagnostic::new(SpelMessage::ExceptionDuringMethodInvocation, self.span())
                .with_insert(name)
                .with_insert(class_name(target))
                .with_insert(message),
        )
    }

    /// Value-type results keep their primitive descriptor, except behind
    /// `?.`, where the result may be null and so is boxed.
    fn record_method_exit(
        &self,
        executor: &dyn MethodExecutor,
        result: &TypedValue,
        null_safe: bool,
        original_primitive_exit: &ArcSwapOption<TypeDescriptor>,
    ) {
        let declared = executor
            .as_reflective()
            .map(|reflective| reflective.method().return_type.clone());
        let exit = match declared {
            Some(declared) if declared.is_value_type() => declared,
            _ if result.is_null() => TypeDescriptor::Any,
            _ => result.value().descriptor(),
        };
        if null_safe && exit.is_value_type() {
            self.set_exit_descriptor(exit.to_boxed());
            original_primitive_exit.store(Some(Arc::new(exit)));
        } else {
            self.set_exit_descriptor(exit);
        }
    }

    /// `#name(args)`: call a function bound as a variable.
    pub(super) fn function(&self, state: &mut ExpressionState<'_>, name: &str) -> EvalResult {
        let ctx = state.context();
        let function = match state.lookup_variable(name).into_value() {
            Value::Function(function) => function,
            Value::Null => {
                return Err(
                    EvalError::new(SpelMessage::FunctionNotDefined, self.span()).with_insert(name)
                );
            }
            other => {
                return Err(EvalError::new(
                    SpelMessage::FunctionReferenceCannotBeInvoked,
                    self.span(),
                )
                .with_insert(other)
                .with_insert(name));
            }
        };

        let mut args = self.plain_arguments(state)?;
        if let Some(params) = function.params() {
            if params.len() != args.len() {
                return Err(EvalError::new(
                    SpelMessage::IncorrectNumberOfArgumentsToFunction,
                    self.span(),
                )
                .with_insert(name)
                .with_insert(args.len())
                .with_insert(params.len()));
            }
            let converter = ctx.type_converter();
            for ((arg, param), child) in args.iter_mut().zip(params).zip(self.children()) {
                if arg.is_null() || *param == TypeDescriptor::Any || param.same_kind(&arg.descriptor())
                {
                    continue;
                }
                *arg = converter
                    .convert(arg, param)
                    .map_err(|e| e.at(child.span()))?;
            }
        }

        let value = function.call(&args).map_err(|err| {
            let message = err.message().to_owned();
            EvalError::from_user(
                err,
                Diagnostic::new(SpelMessage::ExceptionDuringFunctionCall, self.span())
                    .with_insert(name)
                    .with_insert(message),
            )
        })?;
        self.set_exit_descriptor(if value.is_null() {
            TypeDescriptor::Any
        } else {
            value.descriptor()
        });
        Ok(TypedValue::new(value))
    }

    /// `new Type(args)`.
    pub(super) fn constructor(&self, state: &mut ExpressionState<'_>) -> EvalResult {
        let NodeKind::Constructor { type_name, cache } = self.kind() else {
            return Ok(TypedValue::NULL);
        };
        let ctx = state.context();
        let args = self.plain_arguments(state)?;
        let arg_types = argument_types(&args);

        if let Some(cached) = cache.load() {
            if cached.is_suitable(&arg_types) {
                match cached.get().execute(ctx, args.clone()) {
                    Ok(result) => {
                        self.set_exit_descriptor(result.value().descriptor());
                        return Ok(result);
                    }
                    Err(AccessError::User(err)) => {
                        return Err(self.construction_failed(type_name, &arg_types, err));
                    }
                    Err(err) => debug!(type_name, %err, "cached constructor invalidated"),
                }
            }
            cache.clear();
        }

        let executor = self.find_constructor(ctx, type_name, &arg_types, cache)?;
        match executor.execute(ctx, args) {
            Ok(result) => {
                self.set_exit_descriptor(result.value().descriptor());
                Ok(result)
            }
            Err(AccessError::User(err)) => Err(self.construction_failed(type_name, &arg_types, err)),
            Err(AccessError::Eval(err)) => Err((*err).at(self.span())),
            Err(err) => Err(with_access_cause(
                EvalError::new(SpelMessage::ConstructorInvocationProblem, self.span())
                    .with_insert(type_name)
                    .with_insert(format_method("", &arg_types)),
                err,
            )),
        }
    }

    fn find_constructor(
        &self,
        ctx: &dyn EvaluationContext,
        type_name: &str,
        arg_types: &[TypeDescriptor],
        cache: &CacheSlot<CachedConstructorExecutor>,
    ) -> Result<Arc<dyn ConstructorExecutor>, EvalError> {
        for resolver in ctx.constructor_resolvers() {
            match resolver.resolve(ctx, type_name, arg_types) {
                Ok(Some(executor)) => {
                    cache.store(CachedConstructorExecutor::new(executor.clone(), arg_types));
                    return Ok(executor);
                }
                Ok(None) => {}
                Err(AccessError::Eval(err)) => return Err((*err).at(self.span())),
                Err(err) => {
                    let base =
                        EvalError::new(SpelMessage::ConstructorInvocationProblem, self.span())
                            .with_insert(type_name)
                            .with_insert(format_method("", arg_types));
                    return Err(with_access_cause(base, err));
                }
            }
        }
        Err(EvalError::new(SpelMessage::ConstructorNotFound, self.span())
            .with_insert(type_name)
            .with_insert(format_method("", arg_types)))
    }

    fn construction_failed(
        &self,
        type_name: &str,
        arg_types: &[TypeDescriptor],
        err: UserError,
    ) -> EvalError {
        EvalError::from_user(
            err,
            Diagnostic::new(SpelMessage::ConstructorInvocationProblem, self.span())
                .with_insert(type_name)
                .with_insert(format_method("", arg_types)),
        )
    }
}
