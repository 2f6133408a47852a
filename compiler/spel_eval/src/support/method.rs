use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use super::{convert_arguments, match_arguments, type_hierarchy};
use crate::context::{EvaluationContext, MethodExecutor, MethodResolver, TypeLocator};
use crate::error::AccessError;
use crate::types::{MethodInfo, TypeDescriptor, TypeInfo};
use crate::{TypedValue, Value};

/// Resolves methods from [`TypeInfo`] tables.
///
/// On a type reference (`T(Math).max(1, 2)`) static methods are searched
/// first, then the members of `Type` itself (`T(String).getName()`).
/// Otherwise instance methods are searched up the supertype chain, a
/// subtype's method hiding any it overrides.
#[derive(Copy, Clone, Default, Debug)]
pub struct ReflectiveMethodResolver;

type Candidates = SmallVec<[Arc<MethodInfo>; 8]>;

fn collect_methods(chain: &[Arc<TypeInfo>], name: &str, is_static: bool, out: &mut Candidates) {
    for ty in chain {
        for method in ty.methods_named(name, is_static) {
            if !method.is_public() || out.iter().any(|seen| seen.overrides(method)) {
                continue;
            }
            out.push(method.clone());
        }
    }
}

fn candidates(ctx: &dyn EvaluationContext, target: &Value, name: &str) -> Candidates {
    let locator = ctx.type_locator();
    let mut out = Candidates::new();
    if let Value::Type(info) = target {
        collect_methods(&type_hierarchy(locator, info.clone()), name, true, &mut out);
    }
    if let Some(info) = locator.type_of(target) {
        collect_methods(&type_hierarchy(locator, info), name, false, &mut out);
    }
    out
}

impl MethodResolver for ReflectiveMethodResolver {
    #[tracing::instrument(level = "trace", skip(self, ctx, target, argument_types))]
    fn resolve(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        argument_types: &[TypeDescriptor],
    ) -> Result<Option<Arc<dyn MethodExecutor>>, AccessError> {
        let best = candidates(ctx, target, name)
            .into_iter()
            .filter_map(|m| match_arguments(ctx, &m.params, argument_types).map(|rank| (rank, m)))
            .min_by_key(|(rank, _)| *rank);
        Ok(best.map(|(_, method)| {
            let public_declaring_type = public_declaring_type(ctx.type_locator(), &method);
            Arc::new(ReflectiveMethodExecutor::new(method, public_declaring_type))
                as Arc<dyn MethodExecutor>
        }))
    }

    fn is_cacheable(&self) -> bool {
        true
    }
}

/// The method `receiver`'s runtime type actually runs for `method`: the
/// nearest override between the receiver's type and the declaring type.
pub fn dispatch(locator: &dyn TypeLocator, receiver: &Value, method: &Arc<MethodInfo>) -> Arc<MethodInfo> {
    let Some(info) = locator.type_of(receiver) else {
        return method.clone();
    };
    for ty in type_hierarchy(locator, info) {
        if ty.name() == &*method.declaring_type {
            break;
        }
        if let Some(found) = ty
            .methods()
            .iter()
            .find(|m| !m.is_static && m.overrides(method))
        {
            return found.clone();
        }
    }
    method.clone()
}

/// The nearest public type declaring `method` (or a method it overrides).
fn public_declaring_type(locator: &dyn TypeLocator, method: &MethodInfo) -> Option<Arc<str>> {
    let declaring = locator.find_type(&method.declaring_type).ok()?;
    type_hierarchy(locator, declaring)
        .iter()
        .find(|ty| {
            ty.is_public()
                && ty
                    .methods()
                    .iter()
                    .any(|m| m.is_static == method.is_static && method.overrides(m))
        })
        .map(|ty| Arc::from(ty.name()))
}

/// Invokes one resolved [`MethodInfo`].
///
/// Remembers whether any call needed argument conversion; call sites that
/// did are not compiled, since generated code passes arguments as-is.
#[derive(Debug)]
pub struct ReflectiveMethodExecutor {
    method: Arc<MethodInfo>,
    public_declaring_type: Option<Arc<str>>,
    argument_conversion_occurred: AtomicBool,
}

impl ReflectiveMethodExecutor {
    pub fn new(method: Arc<MethodInfo>, public_declaring_type: Option<Arc<str>>) -> Self {
        ReflectiveMethodExecutor {
            method,
            public_declaring_type,
            argument_conversion_occurred: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn method(&self) -> &Arc<MethodInfo> {
        &self.method
    }

    /// Public type to dispatch through, `None` when no public type in the
    /// hierarchy declares the method.
    #[inline]
    pub fn public_declaring_type(&self) -> Option<&str> {
        self.public_declaring_type.as_deref()
    }

    pub fn did_argument_conversion_occur(&self) -> bool {
        self.argument_conversion_occurred.load(Ordering::Relaxed)
    }

    fn applies_to(&self, locator: &dyn TypeLocator, target: &Value) -> bool {
        let declaring = &*self.method.declaring_type;
        let in_chain = |info: Arc<TypeInfo>| {
            type_hierarchy(locator, info)
                .iter()
                .any(|ty| ty.name() == declaring)
        };
        match target {
            Value::Type(info) if self.method.is_static => in_chain(info.clone()),
            _ if self.method.is_static => false,
            other => locator.type_of(other).is_some_and(in_chain),
        }
    }
}

impl MethodExecutor for ReflectiveMethodExecutor {
    fn execute(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        mut args: Vec<Value>,
    ) -> Result<TypedValue, AccessError> {
        if !self.applies_to(ctx.type_locator(), target) {
            return Err(AccessError::Stale);
        }
        if convert_arguments(ctx, &self.method.params, &mut args)? {
            self.argument_conversion_occurred
                .store(true, Ordering::Relaxed);
        }
        let method = if self.method.is_static {
            self.method.clone()
        } else {
            dispatch(ctx.type_locator(), target, &self.method)
        };
        let value = method.invoke(target, &args)?;
        Ok(TypedValue::with_descriptor(
            value,
            self.method.return_type.clone(),
        ))
    }

    fn as_reflective(&self) -> Option<&ReflectiveMethodExecutor> {
        Some(self)
    }
}
