//! Evaluation context.
//!
//! The context bundles everything an evaluation needs from the outside: the
//! root object, variables, and the resolver chains. It is supplied by the
//! caller and never owned by the expression.
//!
//! Resolver lists are only mutable through `&mut StandardEvaluationContext`,
//! so a context cannot change under an evaluation that borrows it. To share
//! one context across threads, finish configuring it first. Variables are
//! the exception: assignments to `#name` write through an internal lock.

mod traits;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::support::{
    MapAccessor, ReflectiveConstructorResolver, ReflectiveMethodResolver,
    ReflectivePropertyAccessor, StandardOperatorOverloader, StandardTypeComparator,
    StandardTypeConverter, StandardTypeLocator,
};
use crate::types::TypeRegistry;
use crate::value::FunctionRef;
use crate::{TypedValue, Value};

pub(crate) use traits::type_not_found;
pub use traits::{
    ConstructorExecutor, ConstructorResolver, MethodExecutor, MethodResolver, OperatorOverloader,
    PropertyAccessor, ServiceResolver, TypeComparator, TypeConverter, TypeLocator,
};

/// What an evaluation is performed against.
pub trait EvaluationContext: Send + Sync {
    fn root_object(&self) -> TypedValue;

    /// Accessors, in the order they are consulted.
    fn property_accessors(&self) -> &[Arc<dyn PropertyAccessor>];

    fn constructor_resolvers(&self) -> &[Arc<dyn ConstructorResolver>];

    fn method_resolvers(&self) -> &[Arc<dyn MethodResolver>];

    fn service_resolver(&self) -> Option<&dyn ServiceResolver>;

    fn type_locator(&self) -> &dyn TypeLocator;

    fn type_converter(&self) -> &dyn TypeConverter;

    fn type_comparator(&self) -> &dyn TypeComparator;

    fn operator_overloader(&self) -> &dyn OperatorOverloader;

    fn set_variable(&self, name: &str, value: Value);

    fn lookup_variable(&self, name: &str) -> Option<Value>;
}

/// The general-purpose context.
///
/// Defaults: accessors `[MapAccessor, ReflectivePropertyAccessor]`, the
/// reflective method and constructor resolvers, the standard converter,
/// comparator and overloader, and a type locator over the builtin types.
/// No service resolver.
pub struct StandardEvaluationContext {
    root: TypedValue,
    property_accessors: Vec<Arc<dyn PropertyAccessor>>,
    constructor_resolvers: Vec<Arc<dyn ConstructorResolver>>,
    method_resolvers: Vec<Arc<dyn MethodResolver>>,
    service_resolver: Option<Arc<dyn ServiceResolver>>,
    type_locator: Arc<dyn TypeLocator>,
    type_converter: Arc<dyn TypeConverter>,
    type_comparator: Arc<dyn TypeComparator>,
    operator_overloader: Arc<dyn OperatorOverloader>,
    variables: RwLock<FxHashMap<String, Value>>,
}

impl Default for StandardEvaluationContext {
    fn default() -> Self {
        StandardEvaluationContext {
            root: TypedValue::NULL,
            property_accessors: vec![
                Arc::new(MapAccessor),
                Arc::new(ReflectivePropertyAccessor),
            ],
            constructor_resolvers: vec![Arc::new(ReflectiveConstructorResolver)],
            method_resolvers: vec![Arc::new(ReflectiveMethodResolver)],
            service_resolver: None,
            type_locator: Arc::new(StandardTypeLocator::default()),
            type_converter: Arc::new(StandardTypeConverter),
            type_comparator: Arc::new(StandardTypeComparator),
            operator_overloader: Arc::new(StandardOperatorOverloader),
            variables: RwLock::new(FxHashMap::default()),
        }
    }
}

/// Insert before the last (default) entry so the default stays the fallback.
fn add_before_default<T: ?Sized>(list: &mut Vec<Arc<T>>, item: Arc<T>) {
    let at = list.len().saturating_sub(1);
    list.insert(at, item);
}

fn remove_ptr<T: ?Sized>(list: &mut Vec<Arc<T>>, item: &Arc<T>) -> bool {
    let before = list.len();
    list.retain(|existing| !Arc::ptr_eq(existing, item));
    list.len() != before
}

impl StandardEvaluationContext {
    pub fn new() -> Self {
        StandardEvaluationContext::default()
    }

    pub fn with_root(root: impl Into<Value>) -> Self {
        let mut ctx = StandardEvaluationContext::default();
        ctx.set_root_object(root);
        ctx
    }

    /// A context whose type locator sees `registry`.
    #[must_use]
    pub fn with_types(mut self, registry: TypeRegistry) -> Self {
        self.type_locator = Arc::new(StandardTypeLocator::new(Arc::new(registry)));
        self
    }

    pub fn set_root_object(&mut self, root: impl Into<Value>) {
        self.root = TypedValue::new(root.into());
    }

    pub fn set_root_typed(&mut self, root: TypedValue) {
        self.root = root;
    }

    pub fn add_property_accessor(&mut self, accessor: Arc<dyn PropertyAccessor>) {
        add_before_default(&mut self.property_accessors, accessor);
    }

    pub fn remove_property_accessor(&mut self, accessor: &Arc<dyn PropertyAccessor>) -> bool {
        remove_ptr(&mut self.property_accessors, accessor)
    }

    pub fn set_property_accessors(&mut self, accessors: Vec<Arc<dyn PropertyAccessor>>) {
        self.property_accessors = accessors;
    }

    pub fn add_method_resolver(&mut self, resolver: Arc<dyn MethodResolver>) {
        add_before_default(&mut self.method_resolvers, resolver);
    }

    pub fn remove_method_resolver(&mut self, resolver: &Arc<dyn MethodResolver>) -> bool {
        remove_ptr(&mut self.method_resolvers, resolver)
    }

    pub fn set_method_resolvers(&mut self, resolvers: Vec<Arc<dyn MethodResolver>>) {
        self.method_resolvers = resolvers;
    }

    pub fn add_constructor_resolver(&mut self, resolver: Arc<dyn ConstructorResolver>) {
        add_before_default(&mut self.constructor_resolvers, resolver);
    }

    pub fn remove_constructor_resolver(
        &mut self,
        resolver: &Arc<dyn ConstructorResolver>,
    ) -> bool {
        remove_ptr(&mut self.constructor_resolvers, resolver)
    }

    pub fn set_constructor_resolvers(&mut self, resolvers: Vec<Arc<dyn ConstructorResolver>>) {
        self.constructor_resolvers = resolvers;
    }

    pub fn set_service_resolver(&mut self, resolver: Arc<dyn ServiceResolver>) {
        self.service_resolver = Some(resolver);
    }

    pub fn set_type_locator(&mut self, locator: Arc<dyn TypeLocator>) {
        self.type_locator = locator;
    }

    pub fn set_type_converter(&mut self, converter: Arc<dyn TypeConverter>) {
        self.type_converter = converter;
    }

    pub fn set_type_comparator(&mut self, comparator: Arc<dyn TypeComparator>) {
        self.type_comparator = comparator;
    }

    pub fn set_operator_overloader(&mut self, overloader: Arc<dyn OperatorOverloader>) {
        self.operator_overloader = overloader;
    }

    pub fn set_variables<I, K>(&self, variables: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut map = self.variables.write();
        for (name, value) in variables {
            map.insert(name.into(), value);
        }
    }

    /// Bind `function` as the variable of the same name, callable as `#name(..)`.
    pub fn register_function(&self, function: FunctionRef) {
        let name = function.name().to_owned();
        self.set_variable(&name, Value::Function(function));
    }
}

impl EvaluationContext for StandardEvaluationContext {
    fn root_object(&self) -> TypedValue {
        self.root.clone()
    }

    fn property_accessors(&self) -> &[Arc<dyn PropertyAccessor>] {
        &self.property_accessors
    }

    fn constructor_resolvers(&self) -> &[Arc<dyn ConstructorResolver>] {
        &self.constructor_resolvers
    }

    fn method_resolvers(&self) -> &[Arc<dyn MethodResolver>] {
        &self.method_resolvers
    }

    fn service_resolver(&self) -> Option<&dyn ServiceResolver> {
        self.service_resolver.as_deref()
    }

    fn type_locator(&self) -> &dyn TypeLocator {
        &*self.type_locator
    }

    fn type_converter(&self) -> &dyn TypeConverter {
        &*self.type_converter
    }

    fn type_comparator(&self) -> &dyn TypeComparator {
        &*self.type_comparator
    }

    fn operator_overloader(&self) -> &dyn OperatorOverloader {
        &*self.operator_overloader
    }

    fn set_variable(&self, name: &str, value: Value) {
        self.variables.write().insert(name.to_owned(), value);
    }

    fn lookup_variable(&self, name: &str) -> Option<Value> {
        self.variables.read().get(name).cloned()
    }
}

impl fmt::Debug for StandardEvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StandardEvaluationContext")
            .field("root", &self.root)
            .field("property_accessors", &self.property_accessors.len())
            .field("method_resolvers", &self.method_resolvers.len())
            .field("constructor_resolvers", &self.constructor_resolvers.len())
            .field("variables", &self.variables.read().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
