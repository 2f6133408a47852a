//! Tree-walking evaluation of [`SpelNode`]s.
//!
//! Every node evaluates against an [`ExpressionState`]. Nodes that can be
//! assigned to (properties, indexers, variables, and compounds ending in
//! one of those) also resolve to a [`ValueRef`].

mod collection;
mod invoke;
mod operators;
mod reference;
mod value_ref;

use spel_diagnostic::SpelMessage;
use spel_ir::Span;
use spel_stack::ensure_sufficient_stack;

use crate::error::{AccessError, EvalError, EvalResult};
use crate::node::{NodeKind, SpelNode};
use crate::state::ExpressionState;
use crate::types::TypeDescriptor;
use crate::{TypedValue, Value};

pub use operators::{equality, relational, MAX_REPEATED_TEXT_SIZE};
use reference::PropertySite;
pub use value_ref::ValueRef;

/// Type name for messages. A type reference reports the type it names.
pub(crate) fn class_name(value: &Value) -> String {
    match value {
        Value::Type(info) => info.name().to_owned(),
        other => other.type_name(),
    }
}

/// Attach whatever engine or host error sits behind an access failure.
pub(crate) fn with_access_cause(base: EvalError, err: AccessError) -> EvalError {
    match err {
        AccessError::Eval(inner) => base.with_cause(*inner),
        AccessError::User(user) => base.with_cause(EvalError::User(user)),
        AccessError::Stale | AccessError::Failed(_) => base,
    }
}

/// Convert a condition result to `bool`. Null is never a boolean.
pub(crate) fn condition(
    state: &ExpressionState<'_>,
    value: &TypedValue,
    span: Span,
) -> Result<bool, EvalError> {
    match value.value() {
        Value::Bool(b) => Ok(*b),
        Value::Null => Err(EvalError::new(SpelMessage::TypeConversionError, span)
            .with_insert("null")
            .with_insert("boolean")),
        other => {
            let converted = state
                .context()
                .type_converter()
                .convert(other, &TypeDescriptor::BOOLEAN)
                .map_err(|e| e.at(span))?;
            Ok(converted.as_bool().unwrap_or(false))
        }
    }
}

fn missing_operand(node: &SpelNode) -> EvalError {
    EvalError::new(SpelMessage::RunOutOfArguments, node.span())
}

impl SpelNode {
    /// Evaluate this node.
    pub fn get_value(&self, state: &mut ExpressionState<'_>) -> EvalResult {
        ensure_sufficient_stack(|| self.evaluate(state))
    }

    /// Resolve this node to something that can be read or written.
    pub fn get_value_ref<'n>(
        &'n self,
        state: &mut ExpressionState<'_>,
    ) -> Result<ValueRef<'n>, EvalError> {
        match self.kind() {
            NodeKind::Property {
                name,
                null_safe,
                cache,
                original_primitive_exit,
            } => Ok(ValueRef::Property {
                site: PropertySite {
                    node: self,
                    name,
                    null_safe: *null_safe,
                    cache,
                    original_primitive_exit,
                },
                target: state.active_context_object().clone(),
            }),
            NodeKind::Indexer {
                null_safe,
                cache,
                indexed_type,
            } => self.indexer_ref(state, *null_safe, cache, indexed_type),
            NodeKind::Variable { name } if name != "this" && name != "root" => {
                Ok(ValueRef::Variable {
                    name,
                    value: state.lookup_variable(name),
                })
            }
            NodeKind::Compound => {
                ensure_sufficient_stack(|| self.compound_ref(self.children(), state))
            }
            _ => Ok(ValueRef::ReadOnly {
                value: self.get_value(state)?,
                node: self,
            }),
        }
    }

    /// Assign `value` to whatever this node refers to.
    pub fn set_value(&self, state: &mut ExpressionState<'_>, value: Value) -> Result<(), EvalError> {
        let ctx = state.context();
        self.get_value_ref(state)?
            .set_value(ctx, value)
            .map_err(|e| e.at(self.span()))
    }

    pub fn is_writable(&self, state: &mut ExpressionState<'_>) -> Result<bool, EvalError> {
        let ctx = state.context();
        Ok(self.get_value_ref(state)?.is_writable(ctx))
    }

    fn evaluate(&self, state: &mut ExpressionState<'_>) -> EvalResult {
        match self.kind() {
            NodeKind::Literal { value, descriptor } => {
                self.set_exit_descriptor(descriptor.clone());
                Ok(TypedValue::with_descriptor(value.clone(), descriptor.clone()))
            }
            NodeKind::Compound => {
                let ctx = state.context();
                let result = self.compound_ref(self.children(), state)?.get_value(ctx)?;
                if let Some(exit) = self.children().last().and_then(SpelNode::exit_descriptor) {
                    self.set_exit_descriptor(exit);
                }
                Ok(result)
            }
            NodeKind::Property { .. } | NodeKind::Indexer { .. } => {
                let ctx = state.context();
                self.get_value_ref(state)?.get_value(ctx)
            }
            NodeKind::Variable { name } => {
                let value = state.lookup_variable(name);
                self.set_exit_descriptor(if value.is_null() {
                    TypeDescriptor::Any
                } else {
                    value.value().descriptor()
                });
                Ok(value)
            }
            NodeKind::Method { .. } => self.method(state),
            NodeKind::Function { name } => self.function(state, name),
            NodeKind::Constructor { .. } => self.constructor(state),
            NodeKind::Binary { op, pattern } => self.binary(state, *op, pattern),
            NodeKind::Unary { op } => self.unary(state, *op),
            NodeKind::Ternary => self.ternary(state),
            NodeKind::Elvis => self.elvis(state),
            NodeKind::Assign => self.assign(state),
            NodeKind::Selection { kind, null_safe } => self.selection(state, *kind, *null_safe),
            NodeKind::Projection { null_safe } => self.projection(state, *null_safe),
            NodeKind::InlineList { constant } => self.inline_list(state, constant.as_ref()),
            NodeKind::InlineMap { constant } => self.inline_map(state, constant.as_ref()),
            NodeKind::TypeReference {
                type_name,
                resolved,
            } => {
                let info = state
                    .context()
                    .type_locator()
                    .find_type(type_name)
                    .map_err(|e| e.at(self.span()))?;
                resolved.store(Some(info.clone()));
                self.set_exit_descriptor(TypeDescriptor::Type);
                Ok(TypedValue::with_descriptor(
                    Value::Type(info),
                    TypeDescriptor::Type,
                ))
            }
            NodeKind::Bean { name } => self.bean(state, name),
        }
    }

    /// Each step of a compound becomes the active context object of the
    /// next; the last step is resolved to a reference. A null-safe step
    /// reached with a null target ends the whole chain with null.
    fn compound_ref<'n>(
        &'n self,
        steps: &'n [SpelNode],
        state: &mut ExpressionState<'_>,
    ) -> Result<ValueRef<'n>, EvalError> {
        match steps {
            [] => Ok(ValueRef::Null),
            [last] => last.get_value_ref(state),
            [first, rest @ ..] => {
                let value = first.get_value(state)?;
                if value.is_null() && rest.first().is_some_and(SpelNode::is_null_safe) {
                    return Ok(ValueRef::Null);
                }
                let mut active = state.push_active(value);
                self.compound_ref(rest, &mut active)
            }
        }
    }

    fn ternary(&self, state: &mut ExpressionState<'_>) -> EvalResult {
        let [cond, if_true, if_false] = self.children() else {
            return Err(missing_operand(self));
        };
        let test = cond.get_value(state)?;
        let result = if condition(state, &test, cond.span())? {
            if_true.get_value(state)?
        } else {
            if_false.get_value(state)?
        };
        if let (Some(a), Some(b)) = (if_true.exit_descriptor(), if_false.exit_descriptor()) {
            if a == b {
                self.set_exit_descriptor(a);
            }
        }
        Ok(result)
    }

    fn elvis(&self, state: &mut ExpressionState<'_>) -> EvalResult {
        let [left, right] = self.children() else {
            return Err(missing_operand(self));
        };
        let value = left.get_value(state)?;
        let empty = match value.value() {
            Value::Null => true,
            Value::Str(s) => s.is_empty(),
            _ => false,
        };
        let result = if empty {
            right.get_value(state)?
        } else {
            value
        };
        match (left.exit_descriptor(), right.exit_descriptor()) {
            (Some(a), Some(b)) if a == b => self.set_exit_descriptor(a),
            _ => self.set_exit_descriptor(TypeDescriptor::Any),
        }
        Ok(result)
    }

    fn assign(&self, state: &mut ExpressionState<'_>) -> EvalResult {
        let [target, value_node] = self.children() else {
            return Err(missing_operand(self));
        };
        let value = value_node.get_value(state)?;
        let ctx = state.context();
        target
            .get_value_ref(state)?
            .set_value(ctx, value.value().clone())
            .map_err(|e| e.at(target.span()))?;
        Ok(value)
    }

    fn inline_list(&self, state: &mut ExpressionState<'_>, constant: Option<&Value>) -> EvalResult {
        self.set_exit_descriptor(TypeDescriptor::List);
        if let Some(list) = constant {
            return Ok(TypedValue::new(list.clone()));
        }
        let mut items = Vec::with_capacity(self.children().len());
        for child in self.children() {
            items.push(child.get_value(state)?.into_value());
        }
        Ok(TypedValue::new(Value::list(items)))
    }

    fn inline_map(&self, state: &mut ExpressionState<'_>, constant: Option<&Value>) -> EvalResult {
        self.set_exit_descriptor(TypeDescriptor::Map);
        if let Some(map) = constant {
            return Ok(TypedValue::new(map.clone()));
        }
        let mut entries = Vec::with_capacity(self.children().len() / 2);
        for pair in self.children().chunks(2) {
            let [key, value] = pair else {
                return Err(missing_operand(self));
            };
            let key = match key.bare_name() {
                Some(name) => Value::string(name),
                None => key.get_value(state)?.into_value(),
            };
            entries.push((key, value.get_value(state)?.into_value()));
        }
        Ok(TypedValue::new(Value::map(entries)))
    }

    fn bean(&self, state: &ExpressionState<'_>, name: &str) -> EvalResult {
        let ctx = state.context();
        let Some(resolver) = ctx.service_resolver() else {
            return Err(
                EvalError::new(SpelMessage::NoBeanResolverRegistered, self.span()).with_insert(name),
            );
        };
        let value = resolver.resolve(ctx, name).map_err(|err| {
            let base = EvalError::new(SpelMessage::ExceptionDuringBeanResolution, self.span())
                .with_insert(name)
                .with_insert(&err);
            with_access_cause(base, err)
        })?;
        self.set_exit_descriptor(value.descriptor());
        Ok(TypedValue::new(value))
    }
}

#[cfg(test)]
mod tests;
