use std::sync::Arc;

use tracing::trace;

use super::type_hierarchy;
use crate::context::{EvaluationContext, PropertyAccessor};
use crate::error::{AccessError, UserError};
use crate::types::{MethodInfo, PropertyInfo, TypeDescriptor, TypeInfo};
use crate::{TypedValue, Value};

/// Reads properties declared on a target's [`TypeInfo`] (or its
/// supertypes), falling back to `getName()` / `isName()` style methods.
/// On a type reference (`T(Math).PI`) static properties come first.
#[derive(Copy, Clone, Default, Debug)]
pub struct ReflectivePropertyAccessor;

/// The member a property name resolved to.
#[derive(Clone, Debug)]
pub enum PropertyMember {
    Property(Arc<PropertyInfo>),
    Getter(Arc<MethodInfo>),
}

impl PropertyMember {
    pub fn descriptor(&self) -> &TypeDescriptor {
        match self {
            PropertyMember::Property(p) => &p.descriptor,
            PropertyMember::Getter(m) => &m.return_type,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            PropertyMember::Property(p) => p.is_static,
            PropertyMember::Getter(m) => m.is_static,
        }
    }

    pub fn is_public(&self) -> bool {
        match self {
            PropertyMember::Property(_) => true,
            PropertyMember::Getter(m) => m.is_public(),
        }
    }

    pub fn declaring_type(&self) -> &str {
        match self {
            PropertyMember::Property(p) => &p.declaring_type,
            PropertyMember::Getter(m) => &m.declaring_type,
        }
    }

    pub fn read(&self, target: &Value) -> Result<Value, UserError> {
        match self {
            PropertyMember::Property(p) => match &p.getter {
                Some(getter) => getter(target),
                None => Err(UserError::system(format!(
                    "property '{}' is write-only",
                    p.name
                ))),
            },
            PropertyMember::Getter(m) => m.invoke(target, &[]),
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn getter_in(info: &TypeInfo, name: &str, is_static: bool) -> Option<PropertyMember> {
    if let Some(property) = info.property(name, is_static) {
        if property.getter.is_some() {
            return Some(PropertyMember::Property(property.clone()));
        }
    }
    let cap = capitalize(name);
    let get = format!("get{cap}");
    let is = format!("is{cap}");
    info.methods()
        .iter()
        .find(|m| {
            m.is_static == is_static
                && m.params.is_empty()
                && (m.name == get || (m.name == is && m.return_type.same_kind(&TypeDescriptor::BOOLEAN)))
        })
        .map(|m| PropertyMember::Getter(m.clone()))
}

enum WriteMember {
    Property(Arc<PropertyInfo>),
    Setter(Arc<MethodInfo>),
}

fn setter_in(info: &TypeInfo, name: &str, is_static: bool) -> Option<WriteMember> {
    if let Some(property) = info.property(name, is_static) {
        if property.setter.is_some() {
            return Some(WriteMember::Property(property.clone()));
        }
    }
    let set = format!("set{}", capitalize(name));
    info.methods()
        .iter()
        .find(|m| m.is_static == is_static && m.params.len() == 1 && m.name == set)
        .map(|m| WriteMember::Setter(m.clone()))
}

fn find_member<T>(
    ctx: &dyn EvaluationContext,
    target: &Value,
    name: &str,
    lookup: impl Fn(&TypeInfo, &str, bool) -> Option<T>,
) -> Option<T> {
    if let Value::Type(info) = target {
        if let Some(found) = lookup(info, name, true) {
            return Some(found);
        }
    }
    let locator = ctx.type_locator();
    let info = locator.type_of(target)?;
    type_hierarchy(locator, info)
        .iter()
        .find_map(|ty| lookup(ty, name, false))
}

impl ReflectivePropertyAccessor {
    pub fn find_readable(
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Option<PropertyMember> {
        find_member(ctx, target, name, getter_in)
    }
}

impl PropertyAccessor for ReflectivePropertyAccessor {
    fn can_read(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<bool, AccessError> {
        Ok(ReflectivePropertyAccessor::find_readable(ctx, target, name).is_some())
    }

    fn read(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<TypedValue, AccessError> {
        let member = ReflectivePropertyAccessor::find_readable(ctx, target, name)
            .ok_or_else(|| AccessError::failed(format!("no readable property '{name}'")))?;
        let value = member.read(target)?;
        Ok(TypedValue::with_descriptor(value, member.descriptor().clone()))
    }

    fn can_write(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<bool, AccessError> {
        Ok(find_member(ctx, target, name, setter_in).is_some())
    }

    fn write(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), AccessError> {
        let member = find_member(ctx, target, name, setter_in)
            .ok_or_else(|| AccessError::failed(format!("no writable property '{name}'")))?;
        let converter = ctx.type_converter();
        match member {
            WriteMember::Property(property) => {
                let value = if value.is_null() {
                    value
                } else {
                    converter.convert(&value, &property.descriptor)?
                };
                match &property.setter {
                    Some(setter) => setter(target, value).map_err(AccessError::User),
                    None => Err(AccessError::failed(format!("property '{name}' is read-only"))),
                }
            }
            WriteMember::Setter(method) => {
                let value = match method.params.first() {
                    Some(param) if !value.is_null() => converter.convert(&value, param)?,
                    _ => value,
                };
                method.invoke(target, &[value]).map(drop).map_err(AccessError::User)
            }
        }
    }

    fn optimal_for(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Option<Arc<dyn PropertyAccessor>> {
        let member = ReflectivePropertyAccessor::find_readable(ctx, target, name)?;
        trace!(name, target = %target.type_name(), "optimal property accessor");
        Some(Arc::new(OptimalPropertyAccessor {
            member,
            target_type: target.descriptor(),
            static_type: match target {
                Value::Type(info) => Some(info.clone()),
                _ => None,
            },
        }))
    }
}

/// A property read bound to one member, cached at a call site.
///
/// Reports `Stale` when handed a target of another type.
#[derive(Clone, Debug)]
pub struct OptimalPropertyAccessor {
    member: PropertyMember,
    target_type: TypeDescriptor,
    static_type: Option<Arc<TypeInfo>>,
}

impl OptimalPropertyAccessor {
    #[inline]
    pub fn member(&self) -> &PropertyMember {
        &self.member
    }

    /// Type the accessor was resolved against.
    #[inline]
    pub fn target_type(&self) -> &TypeDescriptor {
        &self.target_type
    }

    fn applies_to(&self, target: &Value) -> bool {
        match (&self.static_type, target) {
            (Some(expected), Value::Type(actual)) => {
                expected.name() == actual.name() || !self.member.is_static()
            }
            (Some(_), _) => false,
            (None, _) => target.descriptor() == self.target_type,
        }
    }
}

impl PropertyAccessor for OptimalPropertyAccessor {
    fn can_read(
        &self,
        _ctx: &dyn EvaluationContext,
        target: &Value,
        _name: &str,
    ) -> Result<bool, AccessError> {
        Ok(self.applies_to(target))
    }

    fn read(
        &self,
        _ctx: &dyn EvaluationContext,
        target: &Value,
        _name: &str,
    ) -> Result<TypedValue, AccessError> {
        if !self.applies_to(target) {
            return Err(AccessError::Stale);
        }
        let value = self.member.read(target)?;
        Ok(TypedValue::with_descriptor(
            value,
            self.member.descriptor().clone(),
        ))
    }

    fn can_write(
        &self,
        _ctx: &dyn EvaluationContext,
        _target: &Value,
        _name: &str,
    ) -> Result<bool, AccessError> {
        Ok(false)
    }

    fn write(
        &self,
        _ctx: &dyn EvaluationContext,
        _target: &Value,
        name: &str,
        _value: Value,
    ) -> Result<(), AccessError> {
        Err(AccessError::failed(format!(
            "cached read accessor cannot write '{name}'"
        )))
    }

    fn as_optimal(&self) -> Option<&OptimalPropertyAccessor> {
        Some(self)
    }
}
