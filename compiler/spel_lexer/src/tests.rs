use pretty_assertions::assert_eq;
use spel_diagnostic::SpelMessage;
use spel_ir::{Span, TokenKind};

use super::tokenize;

fn kinds(source: &str) -> Vec<TokenKind> {
    match tokenize(source) {
        Ok(tokens) => tokens.iter().map(|t| t.kind.clone()).collect(),
        Err(err) => panic!("unexpected lex error for {source:?}: {err}"),
    }
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Ident(name.to_string())
}

fn lex_error(source: &str) -> (SpelMessage, Span) {
    match tokenize(source) {
        Ok(tokens) => panic!("expected an error for {source:?}, got {tokens:?}"),
        Err(err) => (err.message(), err.span()),
    }
}

#[test]
fn empty_source_is_just_eof() {
    assert_eq!(kinds("   "), vec![TokenKind::Eof]);
}

#[test]
fn eof_sits_at_end_of_source() {
    let tokens = tokenize("a + b").unwrap_or_default();
    let eof = tokens.as_slice().last().map(|t| t.span);
    assert_eq!(eof, Some(Span::point(5)));
}

#[test]
fn arithmetic_with_spans() {
    let tokens = tokenize("1 + 2*3").unwrap_or_default();
    let spans: Vec<_> = tokens.iter().map(|t| t.span).collect();
    assert_eq!(
        spans,
        vec![
            Span::new(0, 1),
            Span::new(2, 3),
            Span::new(4, 5),
            Span::new(5, 6),
            Span::new(6, 7),
            Span::point(7),
        ]
    );
}

#[test]
fn navigation_and_collection_operators() {
    assert_eq!(
        kinds("a?.b.c[0].?[x].^[y].$[z].![w]"),
        vec![
            ident("a"),
            TokenKind::SafeNav,
            ident("b"),
            TokenKind::Dot,
            ident("c"),
            TokenKind::LBracket,
            TokenKind::Int(0),
            TokenKind::RBracket,
            TokenKind::Dot,
            TokenKind::SelectAll,
            ident("x"),
            TokenKind::RBracket,
            TokenKind::Dot,
            TokenKind::SelectFirst,
            ident("y"),
            TokenKind::RBracket,
            TokenKind::Dot,
            TokenKind::SelectLast,
            ident("z"),
            TokenKind::RBracket,
            TokenKind::Dot,
            TokenKind::Project,
            ident("w"),
            TokenKind::RBracket,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn symbolic_and_textual_operators_fold_together() {
    assert_eq!(kinds("a && b"), kinds("a and b"));
    assert_eq!(kinds("a || b"), kinds("a OR b"));
    assert_eq!(kinds("!a"), kinds("not a"));
    assert_eq!(kinds("a / b"), kinds("a div b"));
    assert_eq!(kinds("a % b"), kinds("a MOD b"));
    assert_eq!(kinds("a == b"), kinds("a eq b"));
    assert_eq!(kinds("a != b"), kinds("a ne b"));
    assert_eq!(kinds("a < b"), kinds("a lt b"));
    assert_eq!(kinds("a <= b"), kinds("a le b"));
    assert_eq!(kinds("a > b"), kinds("a gt b"));
    assert_eq!(kinds("a >= b"), kinds("a Ge b"));
}

#[test]
fn keyword_after_dot_stays_identifier() {
    assert_eq!(
        kinds("a.div"),
        vec![ident("a"), TokenKind::Dot, ident("div"), TokenKind::Eof]
    );
    assert_eq!(
        kinds("a?.new"),
        vec![ident("a"), TokenKind::SafeNav, ident("new"), TokenKind::Eof]
    );
}

#[test]
fn ternary_and_elvis() {
    assert_eq!(
        kinds("a ? b : c ?: d"),
        vec![
            ident("a"),
            TokenKind::Question,
            ident("b"),
            TokenKind::Colon,
            ident("c"),
            TokenKind::Elvis,
            ident("d"),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn literal_forms() {
    assert_eq!(
        kinds("42 42L 0x1F 1.5 1.5f 2e3 3d true NULL 'x' \"y\""),
        vec![
            TokenKind::Int(42),
            TokenKind::Long(42),
            TokenKind::Int(31),
            TokenKind::Double(1.5f64.to_bits()),
            TokenKind::Float(1.5f32.to_bits()),
            TokenKind::Double(2000f64.to_bits()),
            TokenKind::Double(3f64.to_bits()),
            TokenKind::True,
            TokenKind::Null,
            TokenKind::Str("x".into()),
            TokenKind::Str("y".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn int_followed_by_method_call() {
    assert_eq!(
        kinds("3.toString()"),
        vec![
            TokenKind::Int(3),
            TokenKind::Dot,
            ident("toString"),
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn type_references_variables_and_beans() {
    assert_eq!(
        kinds("T(java.lang.Math) #root @svc $x"),
        vec![
            ident("T"),
            TokenKind::LParen,
            ident("java"),
            TokenKind::Dot,
            ident("lang"),
            TokenKind::Dot,
            ident("Math"),
            TokenKind::RParen,
            TokenKind::Hash,
            ident("root"),
            TokenKind::At,
            ident("svc"),
            ident("$x"),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn quoted_quote_escapes() {
    assert_eq!(
        kinds("'it''s' + \"a\"\"b\""),
        vec![
            TokenKind::Str("it's".into()),
            TokenKind::Plus,
            TokenKind::Str("a\"b".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unterminated_strings() {
    assert_eq!(
        lex_error("'abc").0,
        SpelMessage::NonTerminatingQuotedString
    );
    assert_eq!(
        lex_error("1 + \"abc").0,
        SpelMessage::NonTerminatingDoubleQuotedString
    );
}

#[test]
fn numeric_errors() {
    assert_eq!(lex_error("2147483648").0, SpelMessage::NotAnInteger);
    assert_eq!(lex_error("1.5L").0, SpelMessage::RealCannotBeLong);
    assert_eq!(
        lex_error("99999999999999999999L").0,
        SpelMessage::NotALong
    );
}

#[test]
fn unexpected_character_reports_offset() {
    let (message, span) = lex_error("a ~ b");
    assert_eq!(message, SpelMessage::UnexpectedCharacter);
    assert_eq!(span.start, 2);
}
