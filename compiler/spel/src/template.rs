//! Templates: literal text with embedded `#{...}` expressions.

use spel_diagnostic::SpelMessage;
use spel_eval::support::StandardTypeConverter;
use spel_eval::{EvalError, EvaluationContext, TypeConverter, TypeDescriptor, TypedValue, Value};
use spel_parse::ParseError;

use crate::expression::Expression;

/// Delimiters of embedded expressions.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TemplateParserContext {
    prefix: String,
    suffix: String,
}

impl Default for TemplateParserContext {
    fn default() -> Self {
        TemplateParserContext::new("#{", "}")
    }
}

impl TemplateParserContext {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        TemplateParserContext {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

/// A malformed template. Positions are byte offsets into the template.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("No ending suffix '{suffix}' for expression starting at character {position}: {rest}")]
    MissingSuffix {
        suffix: String,
        position: usize,
        rest: String,
    },

    #[error("No expression defined within delimiter '{delimiter}' at character {position}")]
    EmptyExpression { delimiter: String, position: usize },

    #[error("Found closing '{found}' at position {position} without an opening '{expected}'")]
    UnopenedBracket {
        found: char,
        expected: char,
        position: usize,
    },

    #[error("Found closing '{found}' at position {position} but most recent opening is '{open}' at position {open_position}")]
    MismatchedBracket {
        found: char,
        position: usize,
        open: char,
        open_position: usize,
    },

    #[error("Missing closing '{expected}' for '{open}' at position {position}")]
    UnclosedBracket {
        expected: char,
        open: char,
        position: usize,
    },

    #[error("Found non terminating string literal starting at position {position}")]
    UnterminatedString { position: usize },

    /// An embedded expression failed to parse. `offset` is where it starts
    /// in the template; the error's own span is relative to it.
    #[error("{source}")]
    Expression {
        offset: usize,
        #[source]
        source: ParseError,
    },
}

/// One piece of a template.
pub(crate) enum Part<'a> {
    Literal(&'a str),
    /// Trimmed expression text and its byte offset in the template.
    Expression(&'a str, usize),
}

fn closing_for(open: u8) -> u8 {
    match open {
        b'{' => b'}',
        b'[' => b']',
        _ => b')',
    }
}

fn opening_for(close: u8) -> u8 {
    match close {
        b'}' => b'{',
        b']' => b'[',
        _ => b'(',
    }
}

/// Position of the suffix closing the expression that starts at `from`.
///
/// Brackets must balance and quoted strings are skipped, so a suffix
/// inside either does not end the expression.
fn find_end_suffix(text: &str, suffix: &str, from: usize) -> Result<Option<usize>, TemplateError> {
    if !text[from..].contains(suffix) {
        return Ok(None);
    }
    let bytes = text.as_bytes();
    let mut open: Vec<(u8, usize)> = Vec::new();
    let mut pos = from;
    while pos < bytes.len() {
        if open.is_empty() && text[pos..].starts_with(suffix) {
            return Ok(Some(pos));
        }
        match bytes[pos] {
            b @ (b'{' | b'[' | b'(') => open.push((b, pos)),
            b @ (b'}' | b']' | b')') => match open.pop() {
                None => {
                    return Err(TemplateError::UnopenedBracket {
                        found: char::from(b),
                        expected: char::from(opening_for(b)),
                        position: pos,
                    });
                }
                Some((o, open_position)) if closing_for(o) != b => {
                    return Err(TemplateError::MismatchedBracket {
                        found: char::from(b),
                        position: pos,
                        open: char::from(o),
                        open_position,
                    });
                }
                Some(_) => {}
            },
            quote @ (b'\'' | b'"') => {
                let Some(end) = bytes[pos + 1..].iter().position(|&c| c == quote) else {
                    return Err(TemplateError::UnterminatedString { position: pos });
                };
                pos += end + 1;
            }
            _ => {}
        }
        pos += 1;
    }
    if let Some((o, position)) = open.pop() {
        return Err(TemplateError::UnclosedBracket {
            expected: char::from(closing_for(o)),
            open: char::from(o),
            position,
        });
    }
    Ok(None)
}

/// Split `text` into literal runs and embedded expressions.
pub(crate) fn split<'a>(
    text: &'a str,
    context: &TemplateParserContext,
) -> Result<Vec<Part<'a>>, TemplateError> {
    let (prefix, suffix) = (context.prefix(), context.suffix());
    let mut parts = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let Some(found) = text[start..].find(prefix) else {
            parts.push(Part::Literal(&text[start..]));
            break;
        };
        let prefix_at = start + found;
        if prefix_at > start {
            parts.push(Part::Literal(&text[start..prefix_at]));
        }
        let after_prefix = prefix_at + prefix.len();
        let Some(suffix_at) = find_end_suffix(text, suffix, after_prefix)? else {
            return Err(TemplateError::MissingSuffix {
                suffix: suffix.to_owned(),
                position: prefix_at,
                rest: text[prefix_at..].to_owned(),
            });
        };
        let raw = &text[after_prefix..suffix_at];
        let body = raw.trim();
        if body.is_empty() {
            return Err(TemplateError::EmptyExpression {
                delimiter: format!("{prefix}{suffix}"),
                position: prefix_at,
            });
        }
        let leading = raw.len() - raw.trim_start().len();
        parts.push(Part::Expression(body, after_prefix + leading));
        start = suffix_at + suffix.len();
    }
    Ok(parts)
}

/// Fixed text posing as an expression.
#[derive(Clone, Debug)]
pub struct LiteralExpression {
    literal: String,
}

impl LiteralExpression {
    pub fn new(literal: impl Into<String>) -> Self {
        LiteralExpression {
            literal: literal.into(),
        }
    }

    fn value(&self) -> TypedValue {
        TypedValue::new(Value::string(&self.literal))
    }
}

fn not_assignable(text: &str) -> EvalError {
    EvalError::unpositioned(SpelMessage::NotAssignable).with_insert(text)
}

impl Expression for LiteralExpression {
    fn expression_string(&self) -> &str {
        &self.literal
    }

    fn get_value(&self) -> Result<TypedValue, EvalError> {
        Ok(self.value())
    }

    fn get_value_with_root(&self, _root: TypedValue) -> Result<TypedValue, EvalError> {
        Ok(self.value())
    }

    fn get_value_in(&self, _ctx: &dyn EvaluationContext) -> Result<TypedValue, EvalError> {
        Ok(self.value())
    }

    fn get_value_in_with_root(
        &self,
        _ctx: &dyn EvaluationContext,
        _root: TypedValue,
    ) -> Result<TypedValue, EvalError> {
        Ok(self.value())
    }

    fn is_writable(&self, _ctx: &dyn EvaluationContext) -> Result<bool, EvalError> {
        Ok(false)
    }

    fn set_value(&self, _ctx: &dyn EvaluationContext, _value: Value) -> Result<(), EvalError> {
        Err(not_assignable(&self.literal))
    }
}

/// A template with at least two parts. Evaluates every part and
/// concatenates their text; null parts contribute nothing.
pub struct CompositeStringExpression {
    source: String,
    parts: Vec<Box<dyn Expression>>,
}

impl CompositeStringExpression {
    pub(crate) fn new(source: &str, parts: Vec<Box<dyn Expression>>) -> Self {
        CompositeStringExpression {
            source: source.to_owned(),
            parts,
        }
    }

    pub fn expressions(&self) -> &[Box<dyn Expression>] {
        &self.parts
    }

    fn render(
        &self,
        converter: &dyn TypeConverter,
        evaluate: impl Fn(&dyn Expression) -> Result<TypedValue, EvalError>,
    ) -> Result<TypedValue, EvalError> {
        let mut out = String::new();
        for part in &self.parts {
            let value = evaluate(part.as_ref())?.into_value();
            if value.is_null() {
                continue;
            }
            let text = converter.convert(&value, &TypeDescriptor::Str)?;
            match text.as_str() {
                Some(s) => out.push_str(s),
                None => out.push_str(&text.to_string()),
            }
        }
        Ok(TypedValue::new(Value::string(out)))
    }
}

impl Expression for CompositeStringExpression {
    fn expression_string(&self) -> &str {
        &self.source
    }

    fn get_value(&self) -> Result<TypedValue, EvalError> {
        self.render(&StandardTypeConverter, |part| part.get_value())
    }

    fn get_value_with_root(&self, root: TypedValue) -> Result<TypedValue, EvalError> {
        self.render(&StandardTypeConverter, |part| {
            part.get_value_with_root(root.clone())
        })
    }

    fn get_value_in(&self, ctx: &dyn EvaluationContext) -> Result<TypedValue, EvalError> {
        self.render(ctx.type_converter(), |part| part.get_value_in(ctx))
    }

    fn get_value_in_with_root(
        &self,
        ctx: &dyn EvaluationContext,
        root: TypedValue,
    ) -> Result<TypedValue, EvalError> {
        self.render(ctx.type_converter(), |part| {
            part.get_value_in_with_root(ctx, root.clone())
        })
    }

    fn is_writable(&self, _ctx: &dyn EvaluationContext) -> Result<bool, EvalError> {
        Ok(false)
    }

    fn set_value(&self, _ctx: &dyn EvaluationContext, _value: Value) -> Result<(), EvalError> {
        Err(not_assignable(&self.source))
    }
}

impl std::fmt::Debug for CompositeStringExpression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeStringExpression")
            .field("source", &self.source)
            .field("parts", &self.parts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn pieces(text: &str) -> Vec<String> {
        match split(text, &TemplateParserContext::default()) {
            Ok(parts) => parts
                .into_iter()
                .map(|part| match part {
                    Part::Literal(s) => format!("L:{s}"),
                    Part::Expression(s, at) => format!("E@{at}:{s}"),
                })
                .collect(),
            Err(err) => panic!("{text:?} failed to split: {err}"),
        }
    }

    fn failure(text: &str) -> TemplateError {
        match split(text, &TemplateParserContext::default()) {
            Ok(_) => panic!("expected {text:?} to fail"),
            Err(err) => err,
        }
    }

    #[test]
    fn literals_and_expressions_alternate() {
        assert_eq!(pieces("hello #{name}!"), ["L:hello ", "E@8:name", "L:!"]);
        assert_eq!(pieces("#{ 1 + 2 }"), ["E@3:1 + 2"]);
        assert_eq!(pieces("no expressions"), ["L:no expressions"]);
        assert!(pieces("").is_empty());
    }

    #[test]
    fn suffix_inside_brackets_and_strings_is_skipped() {
        assert_eq!(pieces("#{ {1, 2}.size() }"), ["E@3:{1, 2}.size()"]);
        assert_eq!(pieces("#{'}'}"), ["E@2:'}'"]);
        assert_eq!(pieces("#{a}#{b}"), ["E@2:a", "E@6:b"]);
    }

    #[test]
    fn malformed_templates() {
        assert_eq!(
            failure("x #{name"),
            TemplateError::MissingSuffix {
                suffix: "}".to_owned(),
                position: 2,
                rest: "#{name".to_owned(),
            }
        );
        assert_eq!(
            failure("#{ }"),
            TemplateError::EmptyExpression {
                delimiter: "#{}".to_owned(),
                position: 0,
            }
        );
        assert!(matches!(
            failure("#{ (1] }"),
            TemplateError::MismatchedBracket {
                found: ']',
                open: '(',
                ..
            }
        ));
        assert!(matches!(
            failure("#{ 'abc }"),
            TemplateError::UnterminatedString { position: 3 }
        ));
        assert!(matches!(
            failure("#{ ('}'"),
            TemplateError::UnclosedBracket { open: '(', position: 3, .. }
        ));
    }

    #[test]
    fn custom_delimiters() {
        let context = TemplateParserContext::new("${", "}");
        let parts = match split("a ${b} #{c}", &context) {
            Ok(parts) => parts.len(),
            Err(err) => panic!("{err}"),
        };
        assert_eq!(parts, 3);
    }
}
