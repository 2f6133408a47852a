//! `#{...}` templates.

use pretty_assertions::assert_eq;
use spel::{
    EvaluationContext, Expression, SpelExpressionParser, SpelMessage,
    StandardEvaluationContext, TemplateError, TemplateParserContext, Value,
};

fn template(text: &str) -> Box<dyn Expression> {
    SpelExpressionParser::default()
        .parse_template(text, &TemplateParserContext::default())
        .unwrap()
}

#[test]
fn parts_are_concatenated() {
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("who", Value::string("world"));
    let expr = template("Hello #{#who}, #{1 + 1} times!");
    assert_eq!(expr.get_value_in_as::<String>(&ctx).unwrap(), "Hello world, 2 times!");
    assert_eq!(expr.expression_string(), "Hello #{#who}, #{1 + 1} times!");
}

#[test]
fn null_parts_contribute_nothing() {
    let ctx = StandardEvaluationContext::new();
    let expr = template("[#{#missing}]");
    assert_eq!(expr.get_value_in_as::<String>(&ctx).unwrap(), "[]");
}

#[test]
fn plain_text_is_a_literal() {
    let expr = template("no expressions here");
    assert_eq!(expr.get_value_as::<String>().unwrap(), "no expressions here");
    let ctx = StandardEvaluationContext::new();
    assert!(!expr.is_writable(&ctx).unwrap());
    let err = expr.set_value(&ctx, Value::Int(1)).unwrap_err();
    assert_eq!(err.message(), Some(SpelMessage::NotAssignable));
}

#[test]
fn a_lone_expression_keeps_its_type() {
    let expr = template("#{6 * 7}");
    assert_eq!(expr.get_value().unwrap().into_value(), Value::Int(42));
}

#[test]
fn custom_delimiters() {
    let context = TemplateParserContext::new("${", "}");
    let expr = SpelExpressionParser::default()
        .parse_template("total: ${2 * 21}", &context)
        .unwrap();
    assert_eq!(expr.get_value_as::<String>().unwrap(), "total: 42");
}

#[test]
fn embedded_syntax_errors_report_their_offset() {
    let parsed = SpelExpressionParser::default()
        .parse_template("ok #{1 +}", &TemplateParserContext::default());
    match parsed {
        Err(TemplateError::Expression { offset, source }) => {
            assert_eq!(offset, 5);
            assert_eq!(source.message(), SpelMessage::Ood);
        }
        Err(other) => panic!("expected an expression error, got {other:?}"),
        Ok(expr) => panic!("expected a parse error, got {:?}", expr.expression_string()),
    }
}
