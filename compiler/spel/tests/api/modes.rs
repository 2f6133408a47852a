//! Compiler modes: when expressions compile and what happens when the
//! compiled form fails.

use pretty_assertions::assert_eq;
use spel::{
    CompilationState, CompilerMode, EvaluationContext, Expression, SpelExpression,
    SpelExpressionParser, SpelMessage, SpelParserConfiguration, StandardEvaluationContext,
    TypeBuilder, TypeDescriptor, TypeRegistry, Value, INTERPRETED_COUNT_THRESHOLD,
};

fn parse(mode: CompilerMode, source: &str) -> SpelExpression {
    SpelExpressionParser::new(SpelParserConfiguration::new(mode))
        .parse_expression(source)
        .unwrap()
}

fn division() -> StandardEvaluationContext {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("n", Value::Int(8));
    ctx.set_variable("d", Value::Int(2));
    ctx
}

#[test]
fn off_never_compiles_on_its_own() {
    let ctx = division();
    let expr = parse(CompilerMode::Off, "#n / #d");
    assert_eq!(expr.compilation_state(), CompilationState::Uninitialized);
    for _ in 0..(INTERPRETED_COUNT_THRESHOLD + 10) {
        assert_eq!(expr.get_value_in_as::<i32>(&ctx).unwrap(), 4);
    }
    assert!(expr.compiled().is_none());
    assert_eq!(expr.compilation_state(), CompilationState::Compilable);

    assert!(expr.compile_expression());
    assert!(expr.compiled().is_some());
    assert_eq!(expr.get_value_in_as::<i32>(&ctx).unwrap(), 4);
}

#[test]
fn immediate_compiles_after_the_first_evaluation() {
    let ctx = division();
    let expr = parse(CompilerMode::Immediate, "#n / #d");
    assert_eq!(expr.get_value_in_as::<i32>(&ctx).unwrap(), 4);
    assert!(expr.compiled().is_some());

    ctx.set_variable("n", Value::Int(10));
    assert_eq!(expr.get_value_in_as::<i32>(&ctx).unwrap(), 5);
}

#[test]
fn immediate_reports_compiled_failures() {
    let ctx = division();
    let expr = parse(CompilerMode::Immediate, "#n / #d");
    expr.get_value_in(&ctx).unwrap();

    ctx.set_variable("d", Value::Int(0));
    let err = expr.get_value_in(&ctx).unwrap_err();
    assert_eq!(err.message(), Some(SpelMessage::ExceptionRunningCompiledExpression));
    assert_eq!(
        err.cause().and_then(spel::EvalError::message),
        Some(SpelMessage::DivisionByZero)
    );
    assert!(expr.compiled().is_some());
}

#[test]
fn mixed_compiles_after_repeated_interpretation() {
    let ctx = division();
    let expr = parse(CompilerMode::Mixed, "#n / #d");
    for _ in 1..INTERPRETED_COUNT_THRESHOLD {
        expr.get_value_in(&ctx).unwrap();
    }
    assert!(expr.compiled().is_none());
    expr.get_value_in(&ctx).unwrap();
    assert!(expr.compiled().is_some());
}

#[test]
fn mixed_falls_back_to_the_interpreter() {
    let ctx = division();
    let expr = parse(CompilerMode::Mixed, "#n / #d");
    for _ in 0..INTERPRETED_COUNT_THRESHOLD {
        expr.get_value_in(&ctx).unwrap();
    }
    assert!(expr.compiled().is_some());

    ctx.set_variable("d", Value::Int(0));
    let err = expr.get_value_in(&ctx).unwrap_err();
    assert_eq!(err.message(), Some(SpelMessage::DivisionByZero));
    assert!(expr.compiled().is_none());

    ctx.set_variable("d", Value::Int(4));
    assert_eq!(expr.get_value_in_as::<i32>(&ctx).unwrap(), 2);
    assert!(expr.compiled().is_none());
}

struct Overloads;

fn overloads() -> StandardEvaluationContext {
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
fn mixed_follows_the_overload_each_argument_picks() {
    let ctx = overloads();
    let expr = parse(CompilerMode::Mixed, "m(#x)");
    ctx.set_variable("x", Value::Int(1));
    for _ in 0..INTERPRETED_COUNT_THRESHOLD {
        assert_eq!(expr.get_value_in_as::<String>(&ctx).unwrap(), "int");
    }
    assert!(expr.compiled().is_some());

    for i in 0..6 {
        let (x, expected) = if i % 2 == 0 {
            (Value::string("s"), "str")
        } else {
            (Value::Int(i), "int")
        };
        ctx.set_variable("x", x);
        assert_eq!(expr.get_value_in_as::<String>(&ctx).unwrap(), expected, "call {i}");
    }
}

#[test]
fn reverting_drops_the_compiled_form() {
    let ctx = division();
    let expr = parse(CompilerMode::Immediate, "#n / #d");
    expr.get_value_in(&ctx).unwrap();
    assert!(expr.compiled().is_some());

    expr.revert_to_interpreted();
    assert!(expr.compiled().is_none());
    assert_eq!(expr.compilation_state(), CompilationState::Uninitialized);

    expr.get_value_in(&ctx).unwrap();
    assert!(expr.compiled().is_some());
}

#[test]
fn uncompilable_expressions_keep_interpreting() {
    let ctx = StandardEvaluationContext::new();
    let expr = parse(CompilerMode::Immediate, "'abc' matches 'a.*'");
    for _ in 0..3 {
        assert!(expr.get_value_in_as::<bool>(&ctx).unwrap());
    }
    assert!(expr.compiled().is_none());
    assert!(!expr.compile_expression());
    assert_eq!(expr.compilation_state(), CompilationState::NotCompilable);
}

#[test]
fn compiled_and_interpreted_results_agree() {
    let json: serde_json::Value =
        serde_json::from_str(r#"{"name": "ada", "scores": [3, 4, 5]}"#).unwrap();
    let mut ctx = StandardEvaluationContext::new();
    ctx.set_root_object(Value::from_json(&json));
    for source in [
        "name.toUpperCase() + '!'",
        "scores[1] * 10",
        "name == 'ada' ? 'yes' : 'no'",
        "#missing?.length() ?: 'none'",
    ] {
        let interpreted = parse(CompilerMode::Off, source).get_value_in(&ctx).unwrap();
        let expr = parse(CompilerMode::Immediate, source);
        expr.get_value_in(&ctx).unwrap();
        let compiled = expr.get_value_in(&ctx).unwrap();
        assert_eq!(compiled.into_value(), interpreted.into_value(), "{source}");
    }
}
