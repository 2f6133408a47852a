//! Property and indexer access.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use spel_diagnostic::SpelMessage;
use tracing::debug;

use super::{class_name, with_access_cause, ValueRef};
use crate::cache::{CacheSlot, CachedIndexAccessor, CachedPropertyAccessor};
use crate::context::{EvaluationContext, PropertyAccessor};
use crate::error::{AccessError, EvalError, EvalResult};
use crate::node::SpelNode;
use crate::state::ExpressionState;
use crate::support::accessors_to_try;
use crate::types::TypeDescriptor;
use crate::{TypedValue, Value};

/// A property node, borrowed for one access.
pub struct PropertySite<'n> {
    pub(super) node: &'n SpelNode,
    pub(super) name: &'n str,
    pub(super) null_safe: bool,
    pub(super) cache: &'n CacheSlot<CachedPropertyAccessor>,
    pub(super) original_primitive_exit: &'n ArcSwapOption<TypeDescriptor>,
}

impl PropertySite<'_> {
    fn read_failed(&self, err: AccessError) -> EvalError {
        let base = EvalError::new(SpelMessage::ExceptionDuringPropertyRead, self.node.span())
            .with_insert(self.name)
            .with_insert(&err);
        with_access_cause(base, err)
    }

    fn record_exit(&self, accessor: &dyn PropertyAccessor) {
        let Some(optimal) = accessor.as_optimal() else {
            return;
        };
        let descriptor = optimal.member().descriptor().clone();
        if self.null_safe && descriptor.is_value_type() {
            self.node.set_exit_descriptor(descriptor.to_boxed());
            self.original_primitive_exit.store(Some(Arc::new(descriptor)));
        } else {
            self.node.set_exit_descriptor(descriptor);
        }
    }

    pub(super) fn read(&self, ctx: &dyn EvaluationContext, target: &TypedValue) -> EvalResult {
        let value = target.value();
        if value.is_null() {
            if self.null_safe {
                return Ok(TypedValue::NULL);
            }
            return Err(EvalError::new(
                SpelMessage::PropertyOrFieldNotReadableOnNull,
                self.node.span(),
            )
            .with_insert(self.name));
        }

        let target_type = value.descriptor();
        if let Some(cached) = self.cache.load() {
            if cached.is_suitable(value, &target_type) {
                match cached.get().read(ctx, value, self.name) {
                    Ok(result) => {
                        self.record_exit(&**cached.get());
                        return Ok(result);
                    }
                    Err(AccessError::Stale | AccessError::Failed(_)) => {
                        debug!(name = self.name, "cached property accessor went stale");
                    }
                    Err(err) => return Err(self.read_failed(err)),
                }
            }
            self.cache.clear();
        }

        for accessor in accessors_to_try(ctx, value) {
            if !accessor
                .can_read(ctx, value, self.name)
                .map_err(|e| self.read_failed(e))?
            {
                continue;
            }
            let accessor = accessor
                .optimal_for(ctx, value, self.name)
                .unwrap_or(accessor);
            self.cache
                .store(CachedPropertyAccessor::new(accessor.clone(), value));
            let result = accessor
                .read(ctx, value, self.name)
                .map_err(|e| self.read_failed(e))?;
            self.record_exit(&*accessor);
            return Ok(result);
        }

        Err(
            EvalError::new(SpelMessage::PropertyOrFieldNotReadable, self.node.span())
                .with_insert(self.name)
                .with_insert(class_name(value)),
        )
    }

    pub(super) fn write(
        &self,
        ctx: &dyn EvaluationContext,
        target: &TypedValue,
        new_value: Value,
    ) -> Result<(), EvalError> {
        let value = target.value();
        if value.is_null() {
            if self.null_safe {
                return Ok(());
            }
            return Err(EvalError::new(
                SpelMessage::PropertyOrFieldNotWritableOnNull,
                self.node.span(),
            )
            .with_insert(self.name));
        }
        for accessor in accessors_to_try(ctx, value) {
            let writable = accessor
                .can_write(ctx, value, self.name)
                .unwrap_or(false);
            if writable {
                return accessor
                    .write(ctx, value, self.name, new_value)
                    .map_err(|err| {
                        let base = EvalError::new(
                            SpelMessage::ExceptionDuringPropertyWrite,
                            self.node.span(),
                        )
                        .with_insert(self.name)
                        .with_insert(&err);
                        with_access_cause(base, err)
                    });
            }
        }
        Err(
            EvalError::new(SpelMessage::PropertyOrFieldNotWritable, self.node.span())
                .with_insert(self.name)
                .with_insert(class_name(value)),
        )
    }

    pub(super) fn is_writable(&self, ctx: &dyn EvaluationContext, target: &TypedValue) -> bool {
        let value = target.value();
        !value.is_null()
            && accessors_to_try(ctx, value)
                .iter()
                .any(|a| a.can_write(ctx, value, self.name).unwrap_or(false))
    }
}

/// An indexer node reading a property by name (`person['name']`).
pub struct IndexSite<'n> {
    pub(super) node: &'n SpelNode,
    pub(super) cache: &'n CacheSlot<CachedIndexAccessor>,
}

impl IndexSite<'_> {
    fn not_supported(&self, target: &Value) -> EvalError {
        EvalError::new(SpelMessage::IndexingNotSupportedForType, self.node.span())
            .with_insert(class_name(target))
    }

    pub(super) fn read(
        &self,
        ctx: &dyn EvaluationContext,
        target: &TypedValue,
        name: &str,
    ) -> EvalResult {
        let value = target.value();
        let target_type = value.descriptor();
        let read_failed = |err: AccessError| {
            let base = EvalError::new(SpelMessage::ExceptionDuringPropertyRead, self.node.span())
                .with_insert(name)
                .with_insert(&err);
            with_access_cause(base, err)
        };

        if let Some(cached) = self.cache.load() {
            if cached.is_suitable(name, &target_type) {
                match cached.get().read(ctx, value, name) {
                    Ok(result) => return Ok(result),
                    Err(AccessError::Stale | AccessError::Failed(_)) => {
                        debug!(name, "cached index accessor went stale");
                    }
                    Err(err) => return Err(read_failed(err)),
                }
            }
            self.cache.clear();
        }

        for accessor in accessors_to_try(ctx, value) {
            if !accessor.can_read(ctx, value, name).map_err(read_failed)? {
                continue;
            }
            let accessor = accessor.optimal_for(ctx, value, name).unwrap_or(accessor);
            self.cache.store(CachedIndexAccessor::new(
                accessor.clone(),
                name,
                target_type,
            ));
            return accessor.read(ctx, value, name).map_err(read_failed);
        }
        Err(self.not_supported(value))
    }

    pub(super) fn write(
        &self,
        ctx: &dyn EvaluationContext,
        target: &TypedValue,
        name: &str,
        new_value: Value,
    ) -> Result<(), EvalError> {
        let value = target.value();
        for accessor in accessors_to_try(ctx, value) {
            if accessor.can_write(ctx, value, name).unwrap_or(false) {
                return accessor.write(ctx, value, name, new_value).map_err(|err| {
                    let base =
                        EvalError::new(SpelMessage::ExceptionDuringPropertyWrite, self.node.span())
                            .with_insert(name)
                            .with_insert(&err);
                    with_access_cause(base, err)
                });
            }
        }
        Err(self.not_supported(value))
    }

    pub(super) fn is_writable(
        &self,
        ctx: &dyn EvaluationContext,
        target: &TypedValue,
        name: &str,
    ) -> bool {
        accessors_to_try(ctx, target.value())
            .iter()
            .any(|a| a.can_write(ctx, target.value(), name).unwrap_or(false))
    }
}

impl SpelNode {
    /// `target[index]`, resolved up to the element.
    pub(super) fn indexer_ref<'n>(
        &'n self,
        state: &mut ExpressionState<'_>,
        null_safe: bool,
        cache: &'n CacheSlot<CachedIndexAccessor>,
        indexed_type: &ArcSwapOption<TypeDescriptor>,
    ) -> Result<ValueRef<'n>, EvalError> {
        let ctx = state.context();
        let target = state.active_context_object().clone();
        if !target.is_null() {
            let descriptor = target.value().descriptor();
            if indexed_type.load().as_deref() != Some(&descriptor) {
                indexed_type.store(Some(Arc::new(descriptor)));
            }
        }
        let Some(index_node) = self.child(0) else {
            return Ok(ValueRef::Null);
        };

        // A bare identifier indexing a map is the key itself: `map[key]`.
        let index = match (target.value(), index_node.bare_name()) {
            (Value::Map(_), Some(name)) => Value::string(name),
            _ => {
                let root = state.root().clone();
                let mut active = state.push_active(root);
                index_node.get_value(&mut active)?.into_value()
            }
        };

        let to_int = |index: &Value| -> Result<i64, EvalError> {
            let converted = ctx
                .type_converter()
                .convert(index, &TypeDescriptor::INT)
                .map_err(|e| e.at(index_node.span()))?;
            Ok(converted.as_i64().unwrap_or_default())
        };

        match target.value() {
            Value::Null => {
                if null_safe {
                    Ok(ValueRef::Null)
                } else {
                    Err(EvalError::new(
                        SpelMessage::CannotIndexIntoNullValue,
                        self.span(),
                    ))
                }
            }
            Value::Map(map) => {
                self.set_exit_descriptor(TypeDescriptor::Any);
                Ok(ValueRef::MapEntry {
                    map: map.clone(),
                    key: index,
                })
            }
            Value::List(list) => {
                let index = to_int(&index)?;
                self.set_exit_descriptor(TypeDescriptor::Any);
                Ok(ValueRef::ListElement {
                    node: self,
                    list: list.clone(),
                    index,
                })
            }
            Value::Str(text) => {
                let index = to_int(&index)?;
                let count = text.chars().count();
                let found = usize::try_from(index)
                    .ok()
                    .and_then(|i| text.chars().nth(i));
                let Some(ch) = found else {
                    return Err(EvalError::new(
                        SpelMessage::StringIndexOutOfBounds,
                        self.span(),
                    )
                    .with_insert(count)
                    .with_insert(index));
                };
                self.set_exit_descriptor(TypeDescriptor::Str);
                Ok(ValueRef::ReadOnly {
                    value: TypedValue::new(Value::string(ch.to_string())),
                    node: self,
                })
            }
            _ => {
                let name = ctx
                    .type_converter()
                    .convert(&index, &TypeDescriptor::Str)
                    .map_err(|e| e.at(index_node.span()))?
                    .to_string();
                Ok(ValueRef::IndexedProperty {
                    site: IndexSite { node: self, cache },
                    target,
                    name,
                })
            }
        }
    }
}
