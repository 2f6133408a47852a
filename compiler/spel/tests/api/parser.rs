//! Parsing through `SpelExpressionParser` and evaluating the result.

use pretty_assertions::assert_eq;
use spel::{
    CompilerMode, EvaluationContext, Expression, SpelExpressionParser, SpelMessage,
    SpelParserConfiguration, StandardEvaluationContext, TypedValue, Value,
};

fn parse(source: &str) -> spel::SpelExpression {
    SpelExpressionParser::default()
        .parse_expression(source)
        .unwrap()
}

fn json_root(text: &str) -> StandardEvaluationContext {
    let json: serde_json::Value = serde_json::from_str(text).unwrap();
    let mut ctx = StandardEvaluationContext::new();
    ctx.set_root_object(Value::from_json(&json));
    ctx
}

#[test]
fn evaluates_without_a_context() {
    let expr = parse("'Hello' + ' ' + 'World'");
    assert_eq!(expr.get_value_as::<String>().unwrap(), "Hello World");
    assert_eq!(expr.expression_string(), "'Hello' + ' ' + 'World'");
    assert_eq!(expr.to_string_ast(), "(('Hello' + ' ') + 'World')");
}

#[test]
fn results_convert_to_the_requested_type() {
    let expr = parse("6 * 7");
    assert_eq!(expr.get_value_as::<i32>().unwrap(), 42);
    assert_eq!(expr.get_value_as::<String>().unwrap(), "42");
    assert_eq!(expr.get_value_as::<i64>().unwrap(), 42);
}

#[test]
fn json_roots_are_navigable() {
    let ctx = json_root(r#"{"name": "ada", "langs": ["en", "fr"], "age": 36}"#);
    assert_eq!(
        parse("name.toUpperCase()").get_value_in_as::<String>(&ctx).unwrap(),
        "ADA"
    );
    assert_eq!(
        parse("langs[1]").get_value_in_as::<String>(&ctx).unwrap(),
        "fr"
    );
    assert!(parse("age > 30").get_value_in_as::<bool>(&ctx).unwrap());
}

#[test]
fn an_explicit_root_replaces_the_context_root() {
    let ctx = json_root(r#"{"n": 1}"#);
    let expr = parse("#root * 2");
    let value = expr
        .get_value_in_with_root(&ctx, TypedValue::new(Value::Int(21)))
        .unwrap();
    assert_eq!(value.into_value(), Value::Int(42));
    let value = expr
        .get_value_with_root(TypedValue::new(Value::Int(5)))
        .unwrap();
    assert_eq!(value.into_value(), Value::Int(10));
}

#[test]
fn variables_are_writable_and_results_are_not() {
    let ctx = StandardEvaluationContext::new();
    let var = parse("#x");
    assert!(var.is_writable(&ctx).unwrap());
    var.set_value(&ctx, Value::Int(7)).unwrap();
    assert_eq!(var.get_value_in_as::<i32>(&ctx).unwrap(), 7);

    let sum = parse("1 + 2");
    assert!(!sum.is_writable(&ctx).unwrap());
    let err = sum.set_value(&ctx, Value::Int(1)).unwrap_err();
    assert_eq!(err.message(), Some(SpelMessage::SetValueNotSupported));
}

#[test]
fn long_expressions_are_rejected() {
    let config = SpelParserConfiguration::new(CompilerMode::Off).with_max_expression_length(5);
    let parser = SpelExpressionParser::new(config);
    assert!(parser.parse_expression("1 + 2").is_ok());
    let err = parser.parse_expression("1 + 2 + 3").unwrap_err();
    assert_eq!(err.message(), SpelMessage::MaxExpressionLengthExceeded);
}

#[test]
fn syntax_errors_carry_a_position() {
    let err = SpelExpressionParser::default()
        .parse_expression("1 +")
        .unwrap_err();
    assert_eq!(err.message(), SpelMessage::Ood);
}
