//! L-values.
//!
//! `get_value_ref` resolves everything up to the final step of an
//! assignable expression (the target object, the index) and returns a
//! [`ValueRef`] that can then be read, written, or asked whether it is
//! writable.

use spel_diagnostic::SpelMessage;

use super::reference::{IndexSite, PropertySite};
use crate::context::EvaluationContext;
use crate::error::EvalError;
use crate::node::SpelNode;
use crate::value::{ListRef, MapRef};
use crate::{TypedValue, Value};

pub enum ValueRef<'n> {
    /// Result of a null-safe step on a null target.
    Null,
    /// A computed value with nowhere to write back to.
    ReadOnly {
        value: TypedValue,
        node: &'n SpelNode,
    },
    Variable {
        name: &'n str,
        value: TypedValue,
    },
    Property {
        site: PropertySite<'n>,
        target: TypedValue,
    },
    ListElement {
        node: &'n SpelNode,
        list: ListRef,
        index: i64,
    },
    MapEntry {
        map: MapRef,
        key: Value,
    },
    IndexedProperty {
        site: IndexSite<'n>,
        target: TypedValue,
        name: String,
    },
}

fn list_index(node: &SpelNode, list: &ListRef, index: i64) -> Result<usize, EvalError> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < list.len())
        .ok_or_else(|| {
            EvalError::new(SpelMessage::CollectionIndexOutOfBounds, node.span())
                .with_insert(list.len())
                .with_insert(index)
        })
}

impl ValueRef<'_> {
    pub fn get_value(&self, ctx: &dyn EvaluationContext) -> Result<TypedValue, EvalError> {
        match self {
            ValueRef::Null => Ok(TypedValue::NULL),
            ValueRef::ReadOnly { value, .. } | ValueRef::Variable { value, .. } => Ok(value.clone()),
            ValueRef::Property { site, target } => site.read(ctx, target),
            ValueRef::ListElement { node, list, index } => {
                let at = list_index(node, list, *index)?;
                Ok(list.get(at).map_or(TypedValue::NULL, TypedValue::new))
            }
            ValueRef::MapEntry { map, key } => {
                Ok(map.get(key).map_or(TypedValue::NULL, TypedValue::new))
            }
            ValueRef::IndexedProperty { site, target, name } => site.read(ctx, target, name),
        }
    }

    pub fn set_value(&self, ctx: &dyn EvaluationContext, value: Value) -> Result<(), EvalError> {
        match self {
            ValueRef::Null => {
                Err(EvalError::unpositioned(SpelMessage::NotAssignable).with_insert("null"))
            }
            ValueRef::ReadOnly { node, .. } => Err(EvalError::new(
                SpelMessage::SetValueNotSupported,
                node.span(),
            )
            .with_insert(node.kind().node_name())),
            ValueRef::Variable { name, .. } => {
                ctx.set_variable(name, value);
                Ok(())
            }
            ValueRef::Property { site, target } => site.write(ctx, target, value),
            ValueRef::ListElement { node, list, index } => {
                let at = list_index(node, list, *index)?;
                list.set(at, value).map(drop).map_err(EvalError::User)
            }
            ValueRef::MapEntry { map, key } => map
                .insert(key.clone(), value)
                .map(drop)
                .map_err(EvalError::User),
            ValueRef::IndexedProperty { site, target, name } => site.write(ctx, target, name, value),
        }
    }

    pub fn is_writable(&self, ctx: &dyn EvaluationContext) -> bool {
        match self {
            ValueRef::Null | ValueRef::ReadOnly { .. } => false,
            ValueRef::Variable { .. } => true,
            ValueRef::Property { site, target } => site.is_writable(ctx, target),
            ValueRef::ListElement { list, .. } => !list.is_frozen(),
            ValueRef::MapEntry { map, .. } => !map.is_frozen(),
            ValueRef::IndexedProperty { site, target, name } => site.is_writable(ctx, target, name),
        }
    }
}
