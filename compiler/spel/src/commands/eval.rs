//! `spel eval`: evaluate an expression against JSON data.

use spel::{
    CompilerMode, EvalError, Expression, SpelExpressionParser, SpelParserConfiguration,
    StandardEvaluationContext, TemplateError, TemplateParserContext, Value,
};
use spel_eval::EvaluationContext;
use tracing::info;

use super::{fail, report, report_short};

/// Options of `spel eval`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvalOptions {
    /// Root object, as JSON.
    pub root: Option<String>,
    /// `(name, json)` pairs.
    pub variables: Vec<(String, String)>,
    pub mode: Option<CompilerMode>,
    pub repeat: u32,
    /// Parse as a `#{...}` template.
    pub template: bool,
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| format!("missing value for {flag}"))
}

/// Split `spel eval` arguments into the expression and its options.
/// Flags take their value as the next argument or after `=`.
pub fn parse_eval_args(args: &[String]) -> Result<(String, EvalOptions), String> {
    let mut options = EvalOptions {
        repeat: 1,
        ..EvalOptions::default()
    };
    let mut source = None;
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value)),
            _ => (arg, None),
        };
        let mut take = || -> Result<String, String> {
            if let Some(value) = inline {
                return Ok(value.to_owned());
            }
            let value = value_of(args, i, flag)?.to_owned();
            i += 1;
            Ok(value)
        };
        match flag {
            "--root" => options.root = Some(take()?),
            "--var" => {
                let binding = take()?;
                let Some((name, json)) = binding.split_once('=') else {
                    return Err(format!("--var expects name=<json>, got '{binding}'"));
                };
                options.variables.push((name.to_owned(), json.to_owned()));
            }
            "--mode" => {
                let mode = take()?;
                options.mode = Some(mode.parse().map_err(|e| format!("{e}"))?);
            }
            "--repeat" => {
                let count = take()?;
                options.repeat = count
                    .parse()
                    .map_err(|_| format!("--repeat expects a number, got '{count}'"))?;
            }
            "--template" => options.template = true,
            _ if arg.starts_with("--") => return Err(format!("unknown option '{arg}'")),
            _ if source.is_none() => source = Some(arg.to_owned()),
            _ => return Err(format!("unexpected argument '{arg}'")),
        }
        i += 1;
    }
    let source = source.ok_or_else(|| "missing expression".to_owned())?;
    Ok((source, options))
}

fn json(text: &str, what: &str) -> Value {
    match serde_json::from_str(text) {
        Ok(json) => Value::from_json(&json),
        Err(err) => fail(format!("{what} is not valid JSON: {err}")),
    }
}

fn report_template_error(source: &str, err: &TemplateError) {
    match err {
        TemplateError::Expression { offset, source: inner } => {
            let mut diagnostic = inner.diagnostic().clone();
            let shift = u32::try_from(*offset).unwrap_or(0);
            diagnostic.span.start += shift;
            diagnostic.span.end += shift;
            report(source, &diagnostic);
        }
        other => eprintln!("{other}"),
    }
}

fn report_eval_error(source: &str, template: bool, err: &EvalError) {
    match err.diagnostic() {
        Some(diagnostic) if !template => report(source, diagnostic),
        Some(diagnostic) => report_short(diagnostic),
        None => eprintln!("{err}"),
    }
    let mut cause = err.cause();
    while let Some(inner) = cause {
        eprintln!("  caused by: {inner}");
        cause = inner.cause();
    }
}

/// Evaluate `source` `options.repeat` times and print the last result.
pub fn eval_expression(source: &str, options: &EvalOptions) {
    let mut config = match SpelParserConfiguration::from_env() {
        Ok(config) => config,
        Err(err) => fail(err),
    };
    if let Some(mode) = options.mode {
        config.compiler_mode = mode;
    }
    let parser = SpelExpressionParser::new(config);

    let mut ctx = StandardEvaluationContext::new();
    if let Some(root) = &options.root {
        ctx.set_root_object(json(root, "--root"));
    }
    for (name, text) in &options.variables {
        ctx.set_variable(name, json(text, &format!("variable '{name}'")));
    }

    let expression: Box<dyn Expression> = if options.template {
        match parser.parse_template(source, &TemplateParserContext::default()) {
            Ok(expression) => expression,
            Err(err) => {
                report_template_error(source, &err);
                fail("template did not parse");
            }
        }
    } else {
        match parser.parse_expression(source) {
            Ok(expression) => Box::new(expression),
            Err(err) => {
                report(source, err.diagnostic());
                fail("expression did not parse");
            }
        }
    };

    let mut last = None;
    for _ in 0..options.repeat.max(1) {
        match expression.get_value_in(&ctx) {
            Ok(value) => last = Some(value),
            Err(err) => {
                report_eval_error(source, options.template, &err);
                fail("evaluation failed");
            }
        }
    }
    info!(mode = %config.compiler_mode, repeat = options.repeat, "evaluated");
    if let Some(value) = last {
        match value.value() {
            Value::Str(_) | Value::Null => println!("{}", value.value()),
            other => println!("{}", other.to_json()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn flags_take_separate_or_inline_values() {
        let parsed = parse_eval_args(&args(&[
            "#x + 1",
            "--var",
            "x=41",
            "--mode=mixed",
            "--repeat",
            "3",
            "--root={\"a\": 1}",
        ]));
        assert_eq!(
            parsed,
            Ok((
                "#x + 1".to_owned(),
                EvalOptions {
                    root: Some("{\"a\": 1}".to_owned()),
                    variables: vec![("x".to_owned(), "41".to_owned())],
                    mode: Some(CompilerMode::Mixed),
                    repeat: 3,
                    template: false,
                }
            ))
        );
    }

    #[test]
    fn bad_arguments_are_explained() {
        assert_eq!(
            parse_eval_args(&args(&["1", "--repeat"])),
            Err("missing value for --repeat".to_owned())
        );
        assert_eq!(
            parse_eval_args(&args(&["1", "--var", "x"])),
            Err("--var expects name=<json>, got 'x'".to_owned())
        );
        assert_eq!(
            parse_eval_args(&args(&["--template"])),
            Err("missing expression".to_owned())
        );
        assert!(parse_eval_args(&args(&["1", "--mode", "sometimes"])).is_err());
        assert!(parse_eval_args(&args(&["1", "2"])).is_err());
    }
}
