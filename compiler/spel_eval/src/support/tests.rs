use std::cmp::Ordering;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::context::{
    ConstructorResolver, MethodResolver, StandardEvaluationContext, TypeComparator,
};
use crate::types::{TypeBuilder, TypeRegistry};
use crate::MapRef;

fn shape_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::with_builtins();
    registry.register(
        TypeBuilder::new("demo.Shape")
            .method("area", vec![], TypeDescriptor::DOUBLE, |_, _| Ok(Value::Double(0.0)))
            .method("scale", vec![TypeDescriptor::DOUBLE], TypeDescriptor::Str, |_, _| {
                Ok(Value::string("double"))
            })
            .build(),
    );
    registry.register(
        TypeBuilder::new("demo.Square")
            .supertype("demo.Shape")
            .method("area", vec![], TypeDescriptor::DOUBLE, |_, _| Ok(Value::Double(4.0)))
            .method("scale", vec![TypeDescriptor::INT], TypeDescriptor::Str, |_, _| {
                Ok(Value::string("int"))
            })
            .method("scale", vec![TypeDescriptor::Str], TypeDescriptor::Str, |_, _| {
                Ok(Value::string("text"))
            })
            .constructor(vec![], |_| Ok(Value::Null))
            .build(),
    );
    registry
}

fn square(ctx: &StandardEvaluationContext) -> Value {
    match ctx.type_locator().find_type("demo.Square") {
        Ok(info) => Value::object(&info, ()),
        Err(err) => panic!("{err}"),
    }
}

fn resolve(ctx: &StandardEvaluationContext, name: &str, args: &[TypeDescriptor]) -> Option<Value> {
    let target = square(ctx);
    let executor = ReflectiveMethodResolver
        .resolve(ctx, &target, name, args)
        .ok()
        .flatten()?;
    let args: Vec<Value> = args
        .iter()
        .map(|d| match d.primitive() {
            Some(Primitive::Int) => Value::Int(2),
            Some(Primitive::Long) => Value::Long(2),
            Some(_) => Value::Double(2.0),
            None => Value::string("2"),
        })
        .collect();
    executor
        .execute(ctx, &target, args)
        .ok()
        .map(crate::TypedValue::into_value)
}

#[test]
fn subtype_methods_hide_overridden_ones() {
    let ctx = StandardEvaluationContext::new().with_types(shape_registry());
    assert_eq!(resolve(&ctx, "area", &[]), Some(Value::Double(4.0)));
}

#[test]
fn exact_matches_beat_conversions() {
    let ctx = StandardEvaluationContext::new().with_types(shape_registry());
    let int = TypeDescriptor::Boxed(Primitive::Int);
    assert_eq!(resolve(&ctx, "scale", &[int]), Some(Value::string("int")));
    assert_eq!(resolve(&ctx, "scale", &[TypeDescriptor::Str]), Some(Value::string("text")));
    // Long converts to double more cheaply than to int or String.
    let long = TypeDescriptor::Boxed(Primitive::Long);
    assert_eq!(resolve(&ctx, "scale", &[long]), Some(Value::string("double")));
    assert_eq!(resolve(&ctx, "scale", &[TypeDescriptor::List]), None);
}

#[test]
fn executors_go_stale_on_foreign_targets() {
    let ctx = StandardEvaluationContext::new().with_types(shape_registry());
    let executor = ReflectiveMethodResolver
        .resolve(&ctx, &square(&ctx), "area", &[])
        .ok()
        .flatten();
    let Some(executor) = executor else {
        panic!("area should resolve");
    };
    assert!(matches!(
        executor.execute(&ctx, &Value::string("x"), Vec::new()),
        Err(AccessError::Stale)
    ));
}

#[test]
fn argument_matching_ranks() {
    let ctx = StandardEvaluationContext::new();
    let int = TypeDescriptor::Boxed(Primitive::Int);
    assert_eq!(
        match_arguments(&ctx, &[TypeDescriptor::INT], &[int.clone()]),
        Some(ArgumentMatch::Exact)
    );
    assert_eq!(
        match_arguments(&ctx, &[TypeDescriptor::object("Number")], &[int.clone()]),
        Some(ArgumentMatch::Close)
    );
    assert_eq!(
        match_arguments(&ctx, &[TypeDescriptor::LONG], &[int.clone()]),
        Some(ArgumentMatch::RequiresConversion(1))
    );
    assert_eq!(match_arguments(&ctx, &[TypeDescriptor::INT], &[TypeDescriptor::Null]), None);
    assert_eq!(match_arguments(&ctx, &[], &[int]), None);
}

#[test]
fn hierarchy_follows_supertypes() {
    let locator = StandardTypeLocator::new(Arc::new(shape_registry()));
    let Ok(info) = locator.find_type("demo.Square") else {
        panic!("demo.Square should be registered");
    };
    let names: Vec<String> = type_hierarchy(&locator, info)
        .iter()
        .map(|t| t.name().to_owned())
        .collect();
    assert_eq!(names, vec!["demo.Square", "demo.Shape", "Object"]);
    let Ok(number) = locator.find_type("Number") else {
        panic!("Number should be builtin");
    };
    assert!(is_instance_of(&locator, &Value::Long(1), &number));
    assert!(!is_instance_of(&locator, &Value::string("1"), &number));
}

#[test]
fn locator_tries_import_prefixes() {
    let locator = StandardTypeLocator::new(Arc::new(shape_registry())).with_import_prefix("demo");
    assert!(locator.find_type("Square").is_ok());
    assert!(locator.find_type("demo.Square").is_ok());
    let Err(err) = locator.find_type("Circle") else {
        panic!("Circle is not registered");
    };
    assert_eq!(err.message(), Some(spel_diagnostic::SpelMessage::TypeNotFound));
}

#[test]
fn converter_widens_parses_and_renders() {
    let converter = StandardTypeConverter;
    assert_eq!(converter.convert(&Value::Int(1), &TypeDescriptor::DOUBLE).ok(), Some(Value::Double(1.0)));
    assert_eq!(
        converter.convert(&Value::string(" 12 "), &TypeDescriptor::LONG).ok(),
        Some(Value::Long(12))
    );
    assert_eq!(
        converter.convert(&Value::string("yes"), &TypeDescriptor::BOOLEAN).ok(),
        Some(Value::Bool(true))
    );
    assert_eq!(
        converter.convert(&Value::Double(1.5), &TypeDescriptor::Str).ok(),
        Some(Value::string("1.5"))
    );
    assert!(converter.convert(&Value::Null, &TypeDescriptor::INT).is_err());
    assert_eq!(
        converter.convert(&Value::Null, &TypeDescriptor::Str).ok(),
        Some(Value::Null)
    );
    assert!(converter.can_convert(&TypeDescriptor::Null, &TypeDescriptor::Boxed(Primitive::Int)));
    assert!(!converter.can_convert(&TypeDescriptor::Null, &TypeDescriptor::INT));
    assert!(!converter.can_convert(&TypeDescriptor::BOOLEAN, &TypeDescriptor::INT));
}

#[test]
fn comparator_orders_nulls_first() {
    let comparator = StandardTypeComparator;
    assert_eq!(comparator.compare(&Value::Null, &Value::Int(0)).ok(), Some(Ordering::Less));
    assert_eq!(
        comparator.compare(&Value::Int(2), &Value::Double(1.5)).ok(),
        Some(Ordering::Greater)
    );
    assert_eq!(
        comparator.compare(&Value::string("b"), &Value::string("a")).ok(),
        Some(Ordering::Greater)
    );
    assert!(!comparator.can_compare(&Value::string("a"), &Value::Int(1)));
    assert!(comparator.compare(&Value::string("a"), &Value::Int(1)).is_err());
}

#[test]
fn map_accessor_is_tried_first_for_maps_only() {
    let ctx = StandardEvaluationContext::new();
    let map = Value::map(vec![(Value::string("k"), Value::Int(1))]);
    assert_eq!(accessors_to_try(&ctx, &map).len(), 2);
    assert_eq!(accessors_to_try(&ctx, &Value::Int(1)).len(), 1);
    assert_eq!(accessors_to_try(&ctx, &Value::Null).len(), 1);

    let accessor = MapAccessor;
    assert_eq!(accessor.can_read(&ctx, &map, "k").ok(), Some(true));
    assert_eq!(accessor.can_read(&ctx, &map, "size").ok(), Some(false));
    assert!(accessor.write(&ctx, &map, "n", Value::Null).is_ok());
    assert_eq!(map.as_map().map(MapRef::len), Some(2));
}

#[test]
fn constructors_resolve_by_arguments() {
    let ctx = StandardEvaluationContext::new().with_types(shape_registry());
    let found = ReflectiveConstructorResolver.resolve(&ctx, "demo.Square", &[]);
    assert!(matches!(found, Ok(Some(_))));
    let none = ReflectiveConstructorResolver.resolve(&ctx, "demo.Square", &[TypeDescriptor::Str]);
    assert!(matches!(none, Ok(None)));
}

#[test]
fn method_signatures_format_like_calls() {
    assert_eq!(format_method("foo", &[]), "foo()");
    assert_eq!(
        format_method("put", &[TypeDescriptor::Str, TypeDescriptor::Boxed(Primitive::Int)]),
        "put(String, Integer)"
    );
}
