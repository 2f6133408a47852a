//! Collaborator traits.
//!
//! Everything the interpreter does not know how to do itself is asked of an
//! [`EvaluationContext`](super::EvaluationContext) through these traits.
//! Resolvers report "not mine" as `Ok(None)` and reserve `Err` for genuine
//! failures.

use std::cmp::Ordering;
use std::sync::Arc;

use spel_diagnostic::SpelMessage;
use spel_ir::BinaryOp;

use super::EvaluationContext;
use crate::error::{AccessError, EvalError};
use crate::support::{OptimalPropertyAccessor, ReflectiveMethodExecutor};
use crate::types::{TypeDescriptor, TypeInfo};
use crate::{TypedValue, Value};

/// Reads and writes named properties of some targets.
pub trait PropertyAccessor: Send + Sync {
    /// Target types this accessor is specific to. Accessors with specific
    /// types are consulted before general ones, and only for those types.
    fn specific_target_types(&self) -> Option<&[TypeDescriptor]> {
        None
    }

    fn can_read(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<bool, AccessError>;

    fn read(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<TypedValue, AccessError>;

    fn can_write(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<bool, AccessError>;

    fn write(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), AccessError>;

    /// A specialised accessor to cache at the call site for this target,
    /// instead of `self`.
    fn optimal_for(
        &self,
        _ctx: &dyn EvaluationContext,
        _target: &Value,
        _name: &str,
    ) -> Option<Arc<dyn PropertyAccessor>> {
        None
    }

    /// Direct member access, for generated code.
    fn as_optimal(&self) -> Option<&OptimalPropertyAccessor> {
        None
    }
}

/// Finds a method for a call site.
pub trait MethodResolver: Send + Sync {
    fn resolve(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        argument_types: &[TypeDescriptor],
    ) -> Result<Option<Arc<dyn MethodExecutor>>, AccessError>;

    /// Whether executors from this resolver may be cached at call sites.
    /// Call-site caching is only used when every resolver in the context
    /// agrees.
    fn is_cacheable(&self) -> bool {
        false
    }
}

/// A resolved method.
pub trait MethodExecutor: Send + Sync {
    /// Invoke on `target`. Arguments are owned so the executor can convert
    /// them in place. `AccessError::Stale` tells the call site to drop its
    /// cache and resolve again.
    fn execute(
        &self,
        ctx: &dyn EvaluationContext,
        target: &Value,
        args: Vec<Value>,
    ) -> Result<TypedValue, AccessError>;

    fn as_reflective(&self) -> Option<&ReflectiveMethodExecutor> {
        None
    }
}

/// Finds a constructor for `new Type(args)`.
pub trait ConstructorResolver: Send + Sync {
    fn resolve(
        &self,
        ctx: &dyn EvaluationContext,
        type_name: &str,
        argument_types: &[TypeDescriptor],
    ) -> Result<Option<Arc<dyn ConstructorExecutor>>, AccessError>;
}

/// A resolved constructor.
pub trait ConstructorExecutor: Send + Sync {
    fn execute(
        &self,
        ctx: &dyn EvaluationContext,
        args: Vec<Value>,
    ) -> Result<TypedValue, AccessError>;
}

/// Converts values between types.
pub trait TypeConverter: Send + Sync {
    fn can_convert(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool;

    /// Convert `value` to `to`. Failures are `TypeConversionError`s with
    /// no position; the calling node positions them.
    fn convert(&self, value: &Value, to: &TypeDescriptor) -> Result<Value, EvalError>;
}

/// Orders values for `<`, `between` and friends.
pub trait TypeComparator: Send + Sync {
    fn can_compare(&self, left: &Value, right: &Value) -> bool;

    fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, EvalError>;
}

/// User-defined meaning for operators on non-numeric operands.
pub trait OperatorOverloader: Send + Sync {
    fn overrides_operation(&self, op: BinaryOp, left: &Value, right: &Value) -> bool;

    fn operate(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError>;
}

/// Resolves `@name` references.
pub trait ServiceResolver: Send + Sync {
    fn resolve(&self, ctx: &dyn EvaluationContext, name: &str) -> Result<Value, AccessError>;
}

/// Finds types by name for `T(..)`, `new` and reflective resolution.
pub trait TypeLocator: Send + Sync {
    fn find_type(&self, name: &str) -> Result<Arc<TypeInfo>, EvalError>;

    /// The type describing `value`'s members. `None` for null.
    fn type_of(&self, value: &Value) -> Option<Arc<TypeInfo>> {
        match value {
            Value::Null => None,
            Value::Object(obj) => Some(obj.info().clone()),
            other => other
                .descriptor()
                .type_name()
                .and_then(|name| self.find_type(name).ok()),
        }
    }
}

pub(crate) fn type_not_found(name: &str) -> EvalError {
    EvalError::unpositioned(SpelMessage::TypeNotFound).with_insert(name)
}
