use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use spel_diagnostic::SpelMessage;
use spel_parse::{parse_expression, DEFAULT_MAX_EXPRESSION_LENGTH};

use crate::context::{EvaluationContext, StandardEvaluationContext};
use crate::error::{EvalError, EvalResult, UserError};
use crate::node::{NodeKind, SpelNode};
use crate::state::ExpressionState;
use crate::support::MapServiceResolver;
use crate::types::{Primitive, TypeBuilder, TypeDescriptor, TypeInfo, TypeRegistry};
use crate::value::FunctionRef;
use crate::{TypedValue, Value};

fn node(source: &str) -> SpelNode {
    match parse_expression(source, DEFAULT_MAX_EXPRESSION_LENGTH) {
        Ok(expr) => SpelNode::lower(&expr),
        Err(err) => panic!("failed to parse {source:?}: {err}"),
    }
}

fn eval_in(ctx: &dyn EvaluationContext, source: &str) -> EvalResult {
    let node = node(source);
    let mut state = ExpressionState::new(ctx);
    node.get_value(&mut state)
}

fn eval_with(ctx: &dyn EvaluationContext, source: &str) -> Value {
    match eval_in(ctx, source) {
        Ok(value) => value.into_value(),
        Err(err) => panic!("{source:?} failed: {err}"),
    }
}

fn eval(source: &str) -> Value {
    eval_with(&StandardEvaluationContext::new(), source)
}

fn error_in(ctx: &dyn EvaluationContext, source: &str) -> EvalError {
    match eval_in(ctx, source) {
        Ok(value) => panic!("expected {source:?} to fail, got {value}"),
        Err(err) => err,
    }
}

fn error(source: &str) -> EvalError {
    error_in(&StandardEvaluationContext::new(), source)
}

fn message(source: &str) -> Option<SpelMessage> {
    error(source).message()
}

struct Person {
    name: Mutex<String>,
    age: i32,
}

fn person_type() -> Arc<TypeInfo> {
    fn person(this: &Value) -> Result<&Person, UserError> {
        this.downcast_ref::<Person>()
            .ok_or_else(|| UserError::system("not a person"))
    }
    TypeBuilder::new("demo.Person")
        .property_rw(
            "name",
            TypeDescriptor::Str,
            |this| Ok(Value::string(&*person(this)?.name.lock())),
            |this, value| {
                *person(this)?.name.lock() = value.to_string();
                Ok(())
            },
        )
        .property("age", TypeDescriptor::INT, |this| Ok(Value::Int(person(this)?.age)))
        .method("greet", vec![TypeDescriptor::Str], TypeDescriptor::Str, |this, args| {
            let greeting = args.first().map(ToString::to_string).unwrap_or_default();
            Ok(Value::string(format!("{greeting}, {}", person(this)?.name.lock())))
        })
        .method("fail", vec![], TypeDescriptor::Any, |_, _| {
            Err(UserError::application("bad input"))
        })
        .method("crash", vec![], TypeDescriptor::Any, |_, _| {
            Err(UserError::system("IllegalStateException"))
        })
        .build()
}

fn person_context() -> (StandardEvaluationContext, Arc<TypeInfo>) {
    let info = person_type();
    let mut registry = TypeRegistry::with_builtins();
    registry.register(info.clone());
    let mut ctx = StandardEvaluationContext::new().with_types(registry);
    ctx.set_root_object(Value::object(
        &info,
        Person {
            name: Mutex::new("Ada".to_owned()),
            age: 36,
        },
    ));
    (ctx, info)
}

#[test]
fn arithmetic_promotes_and_wraps() {
    assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
    assert_eq!(eval("7 / 2"), Value::Int(3));
    assert_eq!(eval("7 % 3"), Value::Int(1));
    assert_eq!(eval("10 div 4"), Value::Int(2));
    assert_eq!(eval("2 ^ 10"), Value::Int(1024));
    assert_eq!(eval("-2 ^ 2"), Value::Int(-4));
    assert_eq!(eval("(-2) ^ 2"), Value::Int(4));
    assert_eq!(eval("1 + 2L"), Value::Long(3));
    assert_eq!(eval("1.5 + 1"), Value::Double(2.5));
    assert_eq!(eval("2147483647 + 1"), Value::Int(i32::MIN));
    assert_eq!(eval("-(3)"), Value::Int(-3));
}

#[test]
fn integer_division_by_zero_is_reported() {
    assert_eq!(message("1 / 0"), Some(SpelMessage::DivisionByZero));
    assert_eq!(message("1L % 0L"), Some(SpelMessage::DivisionByZero));
    assert_eq!(eval("1.0 / 0"), Value::Double(f64::INFINITY));
}

#[test]
fn plus_concatenates_strings() {
    assert_eq!(eval("'a' + 1"), Value::string("a1"));
    assert_eq!(eval("1 + 'a'"), Value::string("1a"));
    assert_eq!(eval("'a' + null"), Value::string("anull"));
}

#[test]
fn string_repetition_is_bounded() {
    assert_eq!(eval("'ab' * 3"), Value::string("ababab"));
    assert_eq!(
        message("'abcd' * 100"),
        Some(SpelMessage::MaxRepeatedTextSizeExceeded)
    );
    assert!(matches!(error("'a' * -1"), EvalError::User(_)));
}

#[test]
fn unsupported_operands_name_both_types() {
    let err = error("true - 1");
    assert_eq!(err.message(), Some(SpelMessage::OperatorNotSupportedBetweenTypes));
    assert_eq!(
        err.diagnostic().map(|d| d.inserts.clone()),
        Some(vec!["-".to_owned(), "Boolean".to_owned(), "Integer".to_owned()])
    );
}

#[test]
fn comparisons() {
    assert_eq!(eval("1 < 2L"), Value::Bool(true));
    assert_eq!(eval("2.5 >= 2"), Value::Bool(true));
    assert_eq!(eval("'a' < 'b'"), Value::Bool(true));
    assert_eq!(eval("1 == 1.0"), Value::Bool(true));
    assert_eq!(eval("'a' != 'a'"), Value::Bool(false));
    assert_eq!(eval("null == null"), Value::Bool(true));
    assert_eq!(eval("null < 1"), Value::Bool(true));
    assert_eq!(eval("2 between {1, 3}"), Value::Bool(true));
    assert_eq!(eval("4 between {1, 3}"), Value::Bool(false));
    assert_eq!(
        message("1 between 2"),
        Some(SpelMessage::BetweenRightOperandMustBeTwoElementList)
    );
    assert_eq!(message("'a' < 1"), Some(SpelMessage::NotComparable));
}

#[test]
fn instanceof_follows_supertypes() {
    assert_eq!(eval("'abc' instanceof T(String)"), Value::Bool(true));
    assert_eq!(eval("1 instanceof T(Number)"), Value::Bool(true));
    assert_eq!(eval("1 instanceof T(String)"), Value::Bool(false));
    assert_eq!(eval("null instanceof T(String)"), Value::Bool(false));
    assert_eq!(
        message("1 instanceof 'String'"),
        Some(SpelMessage::InstanceofOperatorNeedsClassOperand)
    );
}

#[test]
fn matches_is_a_whole_string_match() {
    assert_eq!(eval("'abc' matches '[a-c]+'"), Value::Bool(true));
    assert_eq!(eval("'abcd' matches 'abc'"), Value::Bool(false));
    assert_eq!(message("'a' matches '('"), Some(SpelMessage::InvalidPattern));
    assert_eq!(
        message("1 matches 'a'"),
        Some(SpelMessage::InvalidFirstOperandForMatchesOperator)
    );
}

#[test]
fn matches_pattern_is_cached_per_node() {
    let ctx = StandardEvaluationContext::new();
    let node = node("#text matches '[0-9]+'");
    for (text, expected) in [("123", true), ("12a", false)] {
        ctx.set_variable("text", Value::string(text));
        let mut state = ExpressionState::new(&ctx);
        assert_eq!(
            node.get_value(&mut state).ok().map(TypedValue::into_value),
            Some(Value::Bool(expected))
        );
    }
    let NodeKind::Binary { pattern, .. } = node.kind() else {
        panic!("expected an operator node");
    };
    assert_eq!(
        pattern.load_full().map(|p| p.source.clone()),
        Some("[0-9]+".to_owned())
    );
}

#[test]
fn logical_operators_short_circuit() {
    assert_eq!(eval("true and false"), Value::Bool(false));
    assert_eq!(eval("false or true"), Value::Bool(true));
    assert_eq!(eval("false and null"), Value::Bool(false));
    assert_eq!(eval("true or 1 / 0 == 1"), Value::Bool(true));
    assert_eq!(eval("!true"), Value::Bool(false));
    assert_eq!(message("null and true"), Some(SpelMessage::TypeConversionError));
    assert_eq!(message("!null"), Some(SpelMessage::TypeConversionError));
}

#[test]
fn ternary_and_elvis() {
    assert_eq!(eval("1 > 0 ? 'yes' : 'no'"), Value::string("yes"));
    assert_eq!(eval("null ?: 'x'"), Value::string("x"));
    assert_eq!(eval("'' ?: 'x'"), Value::string("x"));
    assert_eq!(eval("'a' ?: 'x'"), Value::string("a"));
    assert_eq!(message("null ? 1 : 2"), Some(SpelMessage::TypeConversionError));
}

#[test]
fn strings_and_indexers() {
    assert_eq!(eval("'hello'.length()"), Value::Int(5));
    assert_eq!(eval("'hello'.toUpperCase()"), Value::string("HELLO"));
    assert_eq!(eval("'abc'[1]"), Value::string("b"));
    assert_eq!(message("'abc'[5]"), Some(SpelMessage::StringIndexOutOfBounds));
    assert_eq!(eval("{1, 2, 3}[1]"), Value::Int(2));
    assert_eq!(message("{1, 2}[5]"), Some(SpelMessage::CollectionIndexOutOfBounds));
    assert_eq!(eval("{a: 1, b: 2}['b']"), Value::Int(2));
    assert_eq!(eval("{a: 1, b: 2}[a]"), Value::Int(1));
    assert_eq!(eval("{a: 1}['zzz']"), Value::Null);
}

#[test]
fn indexing_null() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("n", Value::Null);
    assert_eq!(
        error_in(&ctx, "#n[0]").message(),
        Some(SpelMessage::CannotIndexIntoNullValue)
    );
    assert_eq!(eval_with(&ctx, "#n?.[0]"), Value::Null);
}

#[test]
fn inline_literals_are_constant_and_frozen() {
    let list = node("{1, 2, 3}");
    let NodeKind::InlineList { constant } = list.kind() else {
        panic!("expected an inline list");
    };
    assert!(constant.is_some());
    assert!(matches!(node("{1, #x}").kind(), NodeKind::InlineList { constant: None }));

    assert!(matches!(error("{1, 2}[0] = 5"), EvalError::User(_)));
    assert_eq!(eval("{}"), Value::list(vec![]));
    assert_eq!(eval("{:}"), Value::map(vec![]));
}

#[test]
fn selection_over_lists_and_maps() {
    assert_eq!(
        eval("{1, 2, 3, 4}.?[#this > 2]"),
        Value::list(vec![Value::Int(3), Value::Int(4)])
    );
    assert_eq!(eval("{1, 2, 3, 4}.^[#this > 2]"), Value::Int(3));
    assert_eq!(eval("{1, 2, 3, 4}.$[#this > 2]"), Value::Int(4));
    assert_eq!(eval("{1, 2}.^[#this > 5]"), Value::Null);
    assert_eq!(eval("{a: 1, b: 2}.?[value > 1]").to_string(), "{b=2}");
    assert_eq!(eval("{a: 1, b: 2}.^[value > 0]").to_string(), "{a=1}");
    assert_eq!(
        message("{1, 2}.?[#this]"),
        Some(SpelMessage::ResultOfSelectionCriteriaIsNotBoolean)
    );
    assert_eq!(message("'abc'.?[true]"), Some(SpelMessage::InvalidTypeForSelection));
}

#[test]
fn projection_over_lists_and_maps() {
    assert_eq!(eval("{1, 2, 3}.![#this * 2]").to_string(), "[2, 4, 6]");
    assert_eq!(eval("{a: 1, b: 2}.![key]").to_string(), "[a, b]");
    assert_eq!(message("'abc'.![#this]"), Some(SpelMessage::ProjectionNotSupportedOnType));
}

#[test]
fn method_arguments_see_the_scope_root() {
    assert_eq!(eval("{'ab', 'cd'}.![concat(#this)]").to_string(), "[abab, cdcd]");
    assert_eq!(eval("{'a', 'bb'}.?[length() > 1]").to_string(), "[bb]");
}

#[test]
fn type_references_and_statics() {
    assert_eq!(eval("T(Math).max(3, 7)"), Value::Int(7));
    assert_eq!(eval("T(Math).PI"), Value::Double(std::f64::consts::PI));
    assert_eq!(eval("T(Integer).parseInt('42')"), Value::Int(42));
    assert_eq!(message("T(Nope)"), Some(SpelMessage::TypeNotFound));
}

#[test]
fn variables_and_assignment() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("x", Value::Int(5));
    assert_eq!(eval_with(&ctx, "#x + 1"), Value::Int(6));
    assert_eq!(eval_with(&ctx, "#y = 3"), Value::Int(3));
    assert_eq!(ctx.lookup_variable("y"), Some(Value::Int(3)));
    assert_eq!(eval_with(&ctx, "#missing"), Value::Null);
}

#[test]
fn this_and_root() {
    let ctx = StandardEvaluationContext::with_root("abc");
    assert_eq!(eval_with(&ctx, "#root.length()"), Value::Int(3));
    assert_eq!(eval_with(&ctx, "length()"), Value::Int(3));
    assert_eq!(eval_with(&ctx, "#this"), Value::string("abc"));
}

#[test]
fn writes_through_lists_and_maps() {
    let ctx = StandardEvaluationContext::new();
    let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
    let map = Value::map(vec![]);
    ctx.set_variable("l", list.clone());
    ctx.set_variable("m", map.clone());

    assert_eq!(eval_with(&ctx, "#l[0] = 5"), Value::Int(5));
    assert_eq!(list.as_list().and_then(|l| l.get(0)), Some(Value::Int(5)));
    eval_with(&ctx, "#m['k'] = 'v'");
    assert_eq!(
        map.as_map().and_then(|m| m.get(&Value::string("k"))),
        Some(Value::string("v"))
    );
}

#[test]
fn functions() {
    let ctx = StandardEvaluationContext::new();
    ctx.register_function(FunctionRef::new("twice", vec![TypeDescriptor::INT], |args| {
        Ok(Value::Int(args.first().and_then(Value::as_i64).map_or(0, |n| n as i32 * 2)))
    }));
    ctx.register_function(FunctionRef::new("boom", vec![], |_| {
        Err(UserError::application("no"))
    }));
    ctx.set_variable("notfn", Value::Int(1));

    assert_eq!(eval_with(&ctx, "#twice(4)"), Value::Int(8));
    assert_eq!(eval_with(&ctx, "#twice('21')"), Value::Int(42));
    assert_eq!(
        error_in(&ctx, "#twice(1, 2)").message(),
        Some(SpelMessage::IncorrectNumberOfArgumentsToFunction)
    );
    assert_eq!(
        error_in(&ctx, "#nope()").message(),
        Some(SpelMessage::FunctionNotDefined)
    );
    assert_eq!(
        error_in(&ctx, "#notfn()").message(),
        Some(SpelMessage::FunctionReferenceCannotBeInvoked)
    );
    let err = error_in(&ctx, "#boom()");
    assert!(matches!(err, EvalError::InvocationTarget { .. }));
    assert_eq!(err.message(), Some(SpelMessage::ExceptionDuringFunctionCall));
}

#[test]
fn host_properties_read_and_write() {
    let (ctx, _) = person_context();
    assert_eq!(eval_with(&ctx, "name"), Value::string("Ada"));
    assert_eq!(eval_with(&ctx, "age + 1"), Value::Int(37));
    assert_eq!(eval_with(&ctx, "name = 'Grace'"), Value::string("Grace"));
    assert_eq!(eval_with(&ctx, "name"), Value::string("Grace"));
    assert_eq!(
        error_in(&ctx, "age = 3").message(),
        Some(SpelMessage::PropertyOrFieldNotWritable)
    );
    assert_eq!(
        error_in(&ctx, "height").message(),
        Some(SpelMessage::PropertyOrFieldNotReadable)
    );
}

#[test]
fn property_cache_and_exit_descriptor() {
    let (ctx, _) = person_context();
    let node = node("age");
    let mut state = ExpressionState::new(&ctx);
    assert!(node.get_value(&mut state).is_ok());
    let NodeKind::Property { cache, .. } = node.kind() else {
        panic!("expected a property node");
    };
    assert!(!cache.is_empty());
    assert_eq!(node.exit_descriptor(), Some(TypeDescriptor::INT));

    // A target of another type invalidates the cached accessor.
    let other = StandardEvaluationContext::with_root(Value::map(vec![(
        Value::string("age"),
        Value::Int(9),
    )]));
    let mut state = ExpressionState::new(&other);
    assert_eq!(
        node.get_value(&mut state).ok().map(TypedValue::into_value),
        Some(Value::Int(9))
    );
}

#[test]
fn null_safe_navigation() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("p", Value::Null);
    assert_eq!(eval_with(&ctx, "#p?.name"), Value::Null);
    assert_eq!(eval_with(&ctx, "#p?.greet('hi')"), Value::Null);
    assert_eq!(
        error_in(&ctx, "#p.name").message(),
        Some(SpelMessage::PropertyOrFieldNotReadableOnNull)
    );
    assert_eq!(
        error_in(&ctx, "#p.greet('hi')").message(),
        Some(SpelMessage::MethodCallOnNullObjectNotAllowed)
    );
}

#[test]
fn null_safe_step_ends_the_whole_chain() {
    let (ctx, _) = person_context();
    ctx.set_variable("p", Value::Null);
    assert_eq!(eval_with(&ctx, "#p?.name.length()"), Value::Null);
    assert_eq!(eval_with(&ctx, "#p?.name.toUpperCase().length()"), Value::Null);
    // The skipped call's arguments are never evaluated.
    assert_eq!(eval_with(&ctx, "#p?.greet(1 / 0).length()"), Value::Null);
    assert_eq!(
        error_in(&ctx, "#p.name?.length()").message(),
        Some(SpelMessage::PropertyOrFieldNotReadableOnNull)
    );

    ctx.set_variable("p", ctx.root_object().into_value());
    assert_eq!(eval_with(&ctx, "#p?.name.length()"), Value::Int(3));
}

#[test]
fn null_safe_value_type_exit_is_boxed() {
    let (ctx, _) = person_context();
    let node = node("#this?.age");
    let mut state = ExpressionState::new(&ctx);
    assert!(node.get_value(&mut state).is_ok());
    let Some(age) = node.child(1) else {
        panic!("expected a compound");
    };
    assert_eq!(age.exit_descriptor(), Some(TypeDescriptor::Boxed(Primitive::Int)));
    assert_eq!(age.original_primitive_exit(), Some(TypeDescriptor::INT));
}

#[test]
fn method_errors() {
    let (ctx, _) = person_context();
    assert_eq!(eval_with(&ctx, "greet('Hi')"), Value::string("Hi, Ada"));

    let err = error_in(&ctx, "fail()");
    assert!(matches!(err, EvalError::InvocationTarget { .. }));
    assert_eq!(err.message(), Some(SpelMessage::ExceptionDuringMethodInvocation));
    assert_eq!(err.user_error().map(UserError::message), Some("bad input"));

    let err = error_in(&ctx, "crash()");
    assert!(matches!(err, EvalError::User(ref u) if u.message() == "IllegalStateException"));

    let err = error_in(&ctx, "'abc'.foo()");
    assert_eq!(err.message(), Some(SpelMessage::MethodNotFound));
    assert_eq!(
        err.diagnostic().map(|d| d.inserts.clone()),
        Some(vec!["foo()".to_owned(), "String".to_owned()])
    );
}

#[test]
fn method_cache_follows_the_target_type() {
    let ctx = StandardEvaluationContext::new();
    assert_eq!(eval_with(&ctx, "{1, 'a', 2}.![toString()]").to_string(), "[1, a, 2]");

    let node = node("#v.toString()");
    for value in [Value::Int(1), Value::string("x"), Value::Long(2)] {
        ctx.set_variable("v", value.clone());
        let mut state = ExpressionState::new(&ctx);
        assert_eq!(
            node.get_value(&mut state).ok().map(TypedValue::into_value),
            Some(Value::string(value.to_string()))
        );
    }
    let Some(NodeKind::Method { cache, .. }) = node.child(1).map(SpelNode::kind) else {
        panic!("expected a method node");
    };
    assert_eq!(
        cache.load().map(|c| c.target_type().clone()),
        Some(TypeDescriptor::Boxed(Primitive::Long))
    );
}

struct Overloads;

fn overloads_context() -> StandardEvaluationContext {
    let info = TypeBuilder::new("demo.Overloads")
        .method("m", vec![TypeDescriptor::INT], TypeDescriptor::Str, |_, _| {
            Ok(Value::string("int"))
        })
        .method("m", vec![TypeDescriptor::Str], TypeDescriptor::Str, |_, _| {
            Ok(Value::string("str"))
        })
        .build();
    let mut registry = TypeRegistry::with_builtins();
    registry.register(info.clone());
    let mut ctx = StandardEvaluationContext::new().with_types(registry);
    ctx.set_root_object(Value::object(&info, Overloads));
    ctx
}

#[test]
fn cached_overload_is_replaced_when_argument_types_change() {
    let ctx = overloads_context();
    let node = node("m(#x)");
    let mut picked = Vec::new();
    for x in [Value::Int(1), Value::string("a"), Value::Int(2), Value::string("b")] {
        ctx.set_variable("x", x);
        let mut state = ExpressionState::new(&ctx);
        match node.get_value(&mut state) {
            Ok(value) => picked.push(value.into_value().to_string()),
            Err(err) => panic!("m(#x) failed: {err}"),
        }
        let NodeKind::Method { cache, .. } = node.kind() else {
            panic!("expected a method node");
        };
        let params = cache
            .load()
            .and_then(|c| c.get().as_reflective().map(|r| r.method().params.clone()));
        let expected = if picked.len() % 2 == 1 {
            TypeDescriptor::INT
        } else {
            TypeDescriptor::Str
        };
        assert_eq!(params, Some(vec![expected]));
    }
    assert_eq!(picked, vec!["int", "str", "int", "str"]);
}

#[test]
fn method_exit_descriptor_is_primitive_for_value_types() {
    let node = node("'abc'.length()");
    let ctx = StandardEvaluationContext::new();
    let mut state = ExpressionState::new(&ctx);
    assert!(node.get_value(&mut state).is_ok());
    assert_eq!(
        node.child(1).and_then(SpelNode::exit_descriptor),
        Some(TypeDescriptor::INT)
    );
    assert_eq!(node.exit_descriptor(), Some(TypeDescriptor::INT));
}

#[derive(Debug)]
struct Point {
    x: i32,
}

fn point_registry() -> TypeRegistry {
    fn point_x(this: &Value) -> Result<Value, UserError> {
        this.downcast_ref::<Point>()
            .map(|p| Value::Int(p.x))
            .ok_or_else(|| UserError::system("not a point"))
    }
    // Instances carry a member-only description; the registered type adds
    // the constructors.
    let instance = TypeBuilder::new("demo.Point")
        .property("x", TypeDescriptor::INT, point_x)
        .build();
    let from_text = instance.clone();
    let registered = TypeBuilder::new("demo.Point")
        .property("x", TypeDescriptor::INT, point_x)
        .constructor(vec![TypeDescriptor::INT], move |args| {
            let x = args.first().and_then(Value::as_i64).unwrap_or_default();
            Ok(Value::object(&instance, Point { x: x as i32 }))
        })
        .constructor(vec![TypeDescriptor::Str], move |args| {
            let text = args.first().map(ToString::to_string).unwrap_or_default();
            match text.parse::<i32>() {
                Ok(x) => Ok(Value::object(&from_text, Point { x })),
                Err(_) => Err(UserError::application(format!("bad point '{text}'"))),
            }
        })
        .build();
    let mut registry = TypeRegistry::with_builtins();
    registry.register(registered);
    registry
}

#[test]
fn constructors_pick_the_best_overload() {
    let ctx = StandardEvaluationContext::new().with_types(point_registry());
    assert_eq!(eval_with(&ctx, "new demo.Point(3).x"), Value::Int(3));
    assert_eq!(eval_with(&ctx, "new demo.Point('4').x"), Value::Int(4));
    assert_eq!(
        error_in(&ctx, "new demo.Point('zz')").message(),
        Some(SpelMessage::ConstructorInvocationProblem)
    );
    assert_eq!(
        error_in(&ctx, "new demo.Point(1, 2)").message(),
        Some(SpelMessage::ConstructorNotFound)
    );
    assert_eq!(
        error_in(&ctx, "new demo.Nope()").message(),
        Some(SpelMessage::TypeNotFound)
    );
}

#[test]
fn constructor_cache_is_keyed_by_argument_types() {
    let ctx = StandardEvaluationContext::new().with_types(point_registry());
    let node = node("new demo.Point(#arg).x");
    for (arg, expected) in [(Value::Int(1), 1), (Value::string("2"), 2), (Value::Int(3), 3)] {
        ctx.set_variable("arg", arg);
        let mut state = ExpressionState::new(&ctx);
        assert_eq!(
            node.get_value(&mut state).ok().map(TypedValue::into_value),
            Some(Value::Int(expected))
        );
    }
}

#[test]
fn beans() {
    assert_eq!(message("@svc"), Some(SpelMessage::NoBeanResolverRegistered));

    let mut ctx = StandardEvaluationContext::new();
    ctx.set_service_resolver(Arc::new(MapServiceResolver::new().with("svc", "hello")));
    assert_eq!(eval_with(&ctx, "@svc.length()"), Value::Int(5));
    assert_eq!(
        error_in(&ctx, "@other").message(),
        Some(SpelMessage::ExceptionDuringBeanResolution)
    );
}

#[test]
fn value_refs() {
    let (ctx, _) = person_context();
    let name = node("name");
    let mut state = ExpressionState::new(&ctx);
    assert_eq!(name.is_writable(&mut state).ok(), Some(true));
    assert!(name.set_value(&mut state, Value::string("Lin")).is_ok());
    assert_eq!(eval_with(&ctx, "name"), Value::string("Lin"));

    let literal = node("'x'");
    assert_eq!(literal.is_writable(&mut state).ok(), Some(false));
    let err = match literal.set_value(&mut state, Value::Null) {
        Ok(()) => panic!("literal should not be writable"),
        Err(err) => err,
    };
    assert_eq!(err.message(), Some(SpelMessage::SetValueNotSupported));
}

#[test]
fn errors_carry_positions() {
    let err = error("1 + 'abc'.foo()");
    assert_eq!(err.span().map(|s| s.start), Some(10));
}

#[test]
fn deep_nesting_does_not_overflow() {
    let source = format!("{}1{}", "(".repeat(2_000), ")".repeat(2_000));
    assert_eq!(eval(&source), Value::Int(1));
}
