//! Selection (`?[]`, `^[]`, `$[]`) and projection (`![]`).
//!
//! Both iterate the active context object. Each element (for maps, each
//! `Map.Entry`) is evaluated in its own scope, so `#this` and unqualified
//! names inside the brackets resolve against the element.

use spel_diagnostic::SpelMessage;
use spel_ir::SelectionKind;

use super::class_name;
use crate::error::{EvalError, EvalResult};
use crate::node::SpelNode;
use crate::state::ExpressionState;
use crate::types::{map_entry, TypeDescriptor};
use crate::{TypedValue, Value};

impl SpelNode {
    /// Evaluate the predicate against `element`; only `true` and `false`
    /// are acceptable.
    fn select(
        &self,
        predicate: &SpelNode,
        state: &mut ExpressionState<'_>,
        element: Value,
    ) -> Result<bool, EvalError> {
        let mut scope = state.enter_scope(TypedValue::new(element));
        let result = predicate.get_value(&mut scope)?;
        match result.value() {
            Value::Bool(b) => Ok(*b),
            _ => Err(EvalError::new(
                SpelMessage::ResultOfSelectionCriteriaIsNotBoolean,
                predicate.span(),
            )),
        }
    }

    pub(super) fn selection(
        &self,
        state: &mut ExpressionState<'_>,
        kind: SelectionKind,
        null_safe: bool,
    ) -> EvalResult {
        let Some(predicate) = self.child(0) else {
            return Err(EvalError::new(
                SpelMessage::MissingSelectionExpression,
                self.span(),
            ));
        };
        let operand = state.active_context_object().clone();
        match operand.value() {
            Value::Null if null_safe => Ok(TypedValue::NULL),
            Value::Map(map) => {
                let mut selected = Vec::new();
                for (key, value) in map.entries() {
                    let entry = map_entry(key.clone(), value.clone());
                    if self.select(predicate, state, entry)? {
                        selected.push((key, value));
                        if kind == SelectionKind::First {
                            break;
                        }
                    }
                }
                let chosen = match kind {
                    SelectionKind::All => selected,
                    SelectionKind::First => selected.into_iter().take(1).collect(),
                    SelectionKind::Last => selected.pop().into_iter().collect(),
                };
                if chosen.is_empty() && kind != SelectionKind::All {
                    self.set_exit_descriptor(TypeDescriptor::Any);
                    return Ok(TypedValue::NULL);
                }
                self.set_exit_descriptor(TypeDescriptor::Map);
                Ok(TypedValue::new(Value::map(chosen)))
            }
            Value::List(list) => {
                let mut selected = Vec::new();
                for element in list.snapshot() {
                    if self.select(predicate, state, element.clone())? {
                        if kind == SelectionKind::First {
                            self.set_exit_descriptor(TypeDescriptor::Any);
                            return Ok(TypedValue::new(element));
                        }
                        selected.push(element);
                    }
                }
                match kind {
                    SelectionKind::All => {
                        self.set_exit_descriptor(TypeDescriptor::List);
                        Ok(TypedValue::new(Value::list(selected)))
                    }
                    _ => {
                        self.set_exit_descriptor(TypeDescriptor::Any);
                        Ok(selected.pop().map_or(TypedValue::NULL, TypedValue::new))
                    }
                }
            }
            other => Err(
                EvalError::new(SpelMessage::InvalidTypeForSelection, self.span())
                    .with_insert(class_name(other)),
            ),
        }
    }

    pub(super) fn projection(&self, state: &mut ExpressionState<'_>, null_safe: bool) -> EvalResult {
        let Some(expr) = self.child(0) else {
            return Err(EvalError::new(
                SpelMessage::MissingSelectionExpression,
                self.span(),
            ));
        };
        let operand = state.active_context_object().clone();
        let elements: Vec<Value> = match operand.value() {
            Value::Null if null_safe => return Ok(TypedValue::NULL),
            Value::Map(map) => map
                .entries()
                .into_iter()
                .map(|(key, value)| map_entry(key, value))
                .collect(),
            Value::List(list) => list.snapshot(),
            other => {
                return Err(
                    EvalError::new(SpelMessage::ProjectionNotSupportedOnType, self.span())
                        .with_insert(class_name(other)),
                );
            }
        };
        let mut projected = Vec::with_capacity(elements.len());
        for element in elements {
            let mut scope = state.enter_scope(TypedValue::new(element));
            projected.push(expr.get_value(&mut scope)?.into_value());
        }
        self.set_exit_descriptor(TypeDescriptor::List);
        Ok(TypedValue::new(Value::list(projected)))
    }
}
