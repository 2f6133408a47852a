//! Default collaborator implementations.
//!
//! The reflective resolvers work off [`TypeInfo`] tables, walking the
//! supertype chain through the context's type locator. Argument matching
//! ranks candidates as exact, close (assignable without conversion) or
//! requiring conversion, and picks the best; the first candidate wins ties.

mod comparator;
mod constructor;
mod converter;
mod locator;
mod map_accessor;
mod method;
mod overloader;
mod property;
mod service;

use std::sync::Arc;

use smallvec::SmallVec;

use crate::context::{EvaluationContext, PropertyAccessor, TypeConverter, TypeLocator};
use crate::error::AccessError;
use crate::types::{Primitive, TypeDescriptor, TypeInfo};
use crate::Value;

pub use comparator::StandardTypeComparator;
pub use constructor::{ReflectiveConstructorExecutor, ReflectiveConstructorResolver};
pub use converter::StandardTypeConverter;
pub use locator::StandardTypeLocator;
pub use map_accessor::MapAccessor;
pub use method::{dispatch, ReflectiveMethodExecutor, ReflectiveMethodResolver};
pub use overloader::StandardOperatorOverloader;
pub use property::{OptimalPropertyAccessor, PropertyMember, ReflectivePropertyAccessor};
pub use service::MapServiceResolver;

/// Longest supertype chain followed before giving up on a cycle.
const MAX_HIERARCHY_DEPTH: usize = 32;

/// `info` followed by its supertypes, nearest first.
pub fn type_hierarchy(
    locator: &dyn TypeLocator,
    info: Arc<TypeInfo>,
) -> SmallVec<[Arc<TypeInfo>; 4]> {
    let mut chain: SmallVec<[Arc<TypeInfo>; 4]> = SmallVec::new();
    let mut current = Some(info);
    while let Some(ty) = current {
        if chain.len() >= MAX_HIERARCHY_DEPTH || chain.iter().any(|t| t.name() == ty.name()) {
            break;
        }
        current = ty
            .supertype()
            .and_then(|name| locator.find_type(name).ok());
        chain.push(ty);
    }
    chain
}

/// Whether `value` is an instance of `target` or one of its subtypes.
pub fn is_instance_of(locator: &dyn TypeLocator, value: &Value, target: &TypeInfo) -> bool {
    locator.type_of(value).is_some_and(|info| {
        type_hierarchy(locator, info)
            .iter()
            .any(|ty| ty.name() == target.name())
    })
}

/// Whether a value of type `from` can flow into a `to` slot unchanged.
pub(crate) fn is_assignable(
    locator: &dyn TypeLocator,
    to: &TypeDescriptor,
    from: &TypeDescriptor,
) -> bool {
    if to.same_kind(from) || *to == TypeDescriptor::Any {
        return true;
    }
    if *from == TypeDescriptor::Null {
        return to.is_reference();
    }
    let (Some(to_name), Some(from_name)) = (to.type_name(), from.type_name()) else {
        return false;
    };
    locator.find_type(from_name).is_ok_and(|info| {
        type_hierarchy(locator, info)
            .iter()
            .any(|ty| ty.name() == to_name)
    })
}

/// How well an argument list fits a parameter list. Lower is better.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub(crate) enum ArgumentMatch {
    Exact,
    Close,
    /// Conversion needed; the payload ranks widening below other conversions.
    RequiresConversion(u32),
}

fn numeric_rank(p: Primitive) -> u8 {
    match p {
        Primitive::Int => 1,
        Primitive::Long => 2,
        Primitive::Float => 3,
        Primitive::Double => 4,
        Primitive::Bool | Primitive::Char => 0,
    }
}

fn conversion_cost(from: &TypeDescriptor, to: &TypeDescriptor) -> u32 {
    match (from.primitive(), to.primitive()) {
        (Some(a), Some(b)) if a.is_numeric() && b.is_numeric() && numeric_rank(a) < numeric_rank(b) => {
            1
        }
        _ => 2,
    }
}

pub(crate) fn match_arguments(
    ctx: &dyn EvaluationContext,
    params: &[TypeDescriptor],
    args: &[TypeDescriptor],
) -> Option<ArgumentMatch> {
    if params.len() != args.len() {
        return None;
    }
    let mut close = false;
    let mut cost = 0;
    for (param, arg) in params.iter().zip(args) {
        if *arg == TypeDescriptor::Null {
            if param.is_value_type() {
                return None;
            }
            continue;
        }
        if param.same_kind(arg) {
            continue;
        }
        if is_assignable(ctx.type_locator(), param, arg) {
            close = true;
        } else if ctx.type_converter().can_convert(arg, param) {
            cost += conversion_cost(arg, param);
        } else {
            return None;
        }
    }
    Some(if cost > 0 {
        ArgumentMatch::RequiresConversion(cost)
    } else if close {
        ArgumentMatch::Close
    } else {
        ArgumentMatch::Exact
    })
}

/// Convert `args` to `params` where the types differ. Returns whether any
/// conversion happened.
pub(crate) fn convert_arguments(
    ctx: &dyn EvaluationContext,
    params: &[TypeDescriptor],
    args: &mut [Value],
) -> Result<bool, AccessError> {
    let converter: &dyn TypeConverter = ctx.type_converter();
    let mut converted = false;
    for (param, arg) in params.iter().zip(args.iter_mut()) {
        let actual = arg.descriptor();
        if arg.is_null() || is_assignable(ctx.type_locator(), param, &actual) {
            continue;
        }
        *arg = converter.convert(arg, param)?;
        converted = true;
    }
    Ok(converted)
}

/// Accessors to consult for `target`: those specific to its type first,
/// then the general ones.
pub(crate) fn accessors_to_try(
    ctx: &dyn EvaluationContext,
    target: &Value,
) -> Vec<Arc<dyn PropertyAccessor>> {
    let target_type = target.descriptor();
    let mut specific = Vec::new();
    let mut general = Vec::new();
    for accessor in ctx.property_accessors() {
        match accessor.specific_target_types() {
            None => general.push(accessor.clone()),
            Some(types) => {
                if !target.is_null() && types.iter().any(|t| t.same_kind(&target_type)) {
                    specific.push(accessor.clone());
                }
            }
        }
    }
    specific.extend(general);
    specific
}

/// `name(Integer, String)`, as used in method-related messages.
pub fn format_method(name: &str, argument_types: &[TypeDescriptor]) -> String {
    let args: Vec<String> = argument_types.iter().map(ToString::to_string).collect();
    format!("{name}({})", args.join(", "))
}

#[cfg(test)]
mod tests;
