use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::AccessError;
use crate::types::TypeDescriptor;

/// Serves every property of every target as its name.
struct Echo;

impl PropertyAccessor for Echo {
    fn can_read(&self, _: &dyn EvaluationContext, _: &Value, _: &str) -> Result<bool, AccessError> {
        Ok(true)
    }

    fn read(
        &self,
        _: &dyn EvaluationContext,
        _: &Value,
        name: &str,
    ) -> Result<TypedValue, AccessError> {
        Ok(TypedValue::new(Value::string(name)))
    }

    fn can_write(&self, _: &dyn EvaluationContext, _: &Value, _: &str) -> Result<bool, AccessError> {
        Ok(false)
    }

    fn write(
        &self,
        _: &dyn EvaluationContext,
        _: &Value,
        _: &str,
        _: Value,
    ) -> Result<(), AccessError> {
        Err(AccessError::failed("read-only"))
    }
}

#[test]
fn added_accessors_precede_the_default() {
    let mut ctx = StandardEvaluationContext::new();
    assert_eq!(ctx.property_accessors().len(), 2);

    let echo: Arc<dyn PropertyAccessor> = Arc::new(Echo);
    ctx.add_property_accessor(echo.clone());
    let accessors = ctx.property_accessors();
    assert_eq!(accessors.len(), 3);
    assert!(Arc::ptr_eq(&accessors[1], &echo));

    assert!(ctx.remove_property_accessor(&echo));
    assert!(!ctx.remove_property_accessor(&echo));
    assert_eq!(ctx.property_accessors().len(), 2);
}

#[test]
fn resolver_lists_can_be_replaced() {
    let mut ctx = StandardEvaluationContext::new();
    ctx.set_method_resolvers(Vec::new());
    ctx.set_constructor_resolvers(Vec::new());
    assert!(ctx.method_resolvers().is_empty());
    assert!(ctx.constructor_resolvers().is_empty());
    assert!(ctx.service_resolver().is_none());
}

#[test]
fn variables_are_shared_through_the_lock() {
    let ctx = StandardEvaluationContext::new();
    assert_eq!(ctx.lookup_variable("x"), None);
    ctx.set_variables([("x", Value::Int(1)), ("y", Value::Null)]);
    assert_eq!(ctx.lookup_variable("x"), Some(Value::Int(1)));
    assert_eq!(ctx.lookup_variable("y"), Some(Value::Null));
    ctx.set_variable("x", Value::Int(2));
    assert_eq!(ctx.lookup_variable("x"), Some(Value::Int(2)));
}

#[test]
fn functions_are_variables() {
    let ctx = StandardEvaluationContext::new();
    ctx.register_function(FunctionRef::variadic("nothing", |_| Ok(Value::Null)));
    assert!(matches!(
        ctx.lookup_variable("nothing"),
        Some(Value::Function(f)) if f.name() == "nothing"
    ));
}

#[test]
fn root_object_keeps_its_runtime_type() {
    let ctx = StandardEvaluationContext::with_root(3);
    assert_eq!(ctx.root_object().value(), &Value::Int(3));
    assert_eq!(ctx.root_object().descriptor(), &Value::Int(3).descriptor());

    let mut typed = StandardEvaluationContext::new();
    typed.set_root_typed(TypedValue::with_descriptor(Value::Null, TypeDescriptor::Str));
    assert!(typed.root_object().is_null());
}

#[test]
fn custom_types_are_visible_to_the_locator() {
    let mut registry = TypeRegistry::with_builtins();
    registry.register(crate::types::TypeBuilder::new("demo.Thing").build());
    let ctx = StandardEvaluationContext::new().with_types(registry);
    assert!(ctx.type_locator().find_type("demo.Thing").is_ok());
    assert!(ctx.type_locator().find_type("String").is_ok());
    assert!(StandardEvaluationContext::new()
        .type_locator()
        .find_type("demo.Thing")
        .is_err());
}
