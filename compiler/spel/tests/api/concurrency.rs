//! One parsed expression evaluated from many threads while it moves from
//! interpreted to compiled.

use pretty_assertions::assert_eq;
use rayon::prelude::*;
use spel::{
    CompilerMode, EvaluationContext, Expression, SpelExpressionParser,
    SpelParserConfiguration, StandardEvaluationContext, TypedValue, Value,
};

#[test]
fn shared_expression_under_parallel_evaluation() {
    let parser = SpelExpressionParser::new(SpelParserConfiguration::new(CompilerMode::Mixed));
    let expr = parser.parse_expression("#root * 2 + #offset").unwrap();
    let ctx = StandardEvaluationContext::new();
    ctx.set_variable("offset", Value::Int(1));

    let results: Vec<i32> = (0..2_000)
        .into_par_iter()
        .map(|i| {
            let value = expr
                .get_value_in_with_root(&ctx, TypedValue::new(Value::Int(i)))
                .unwrap();
            match value.into_value() {
                Value::Int(n) => n,
                other => panic!("expected an int, got {other:?}"),
            }
        })
        .collect();

    let expected: Vec<i32> = (0..2_000).map(|i| i * 2 + 1).collect();
    assert_eq!(results, expected);
    assert!(expr.compiled().is_some());
}

#[test]
fn templates_are_shareable() {
    let parser = SpelExpressionParser::default();
    let template = parser
        .parse_template("item-#{#root}", &spel::TemplateParserContext::default())
        .unwrap();
    let ctx = StandardEvaluationContext::new();
    let rendered: Vec<String> = (0..100)
        .into_par_iter()
        .map(|i| {
            template
                .get_value_in_with_root(&ctx, TypedValue::new(Value::Int(i)))
                .unwrap()
                .into_value()
                .to_string()
        })
        .collect();
    assert_eq!(rendered[7], "item-7");
    assert_eq!(rendered.len(), 100);
}
