//! SpEL Eval - the interpreter and its collaborators.
//!
//! # Architecture
//!
//! - [`SpelNode`]: the evaluable tree, lowered once from a parsed `Expr`
//!   and shared between threads. Call-site caches live on the nodes.
//! - [`ExpressionState`]: per-evaluation stacks for `#this` and the scope
//!   root.
//! - [`EvaluationContext`]: everything supplied from outside: root object,
//!   variables, and the ordered resolver chains.
//! - [`support`]: the default accessors, resolvers, converter, comparator
//!   and type locator.
//! - [`types`]: descriptions of host types ([`TypeInfo`]) and the registry.

pub mod cache;
pub mod context;
mod error;
mod interpreter;
pub mod node;
pub mod numeric;
mod state;
pub mod support;
mod typed_value;
pub mod types;
mod value;

pub use context::{
    ConstructorExecutor, ConstructorResolver, EvaluationContext, MethodExecutor, MethodResolver,
    OperatorOverloader, PropertyAccessor, ServiceResolver, StandardEvaluationContext,
    TypeComparator, TypeConverter, TypeLocator,
};
pub use error::{AccessError, EvalError, EvalResult, UserError, UserErrorKind};
pub use interpreter::{equality, relational, ValueRef, MAX_REPEATED_TEXT_SIZE};
pub use node::{NodeKind, SpelNode};
pub use state::{ActiveGuard, ExpressionState, ScopeGuard};
pub use typed_value::TypedValue;
pub use types::{TypeBuilder, TypeDescriptor, TypeInfo, TypeRegistry};
pub use value::{FromValue, FunctionRef, ListRef, MapRef, ObjectRef, Value};
