use spel_ir::TokenKind;

use super::lookup;

#[test]
fn textual_operators_ignore_case() {
    assert_eq!(lookup("and"), Some(TokenKind::And));
    assert_eq!(lookup("AND"), Some(TokenKind::And));
    assert_eq!(lookup("InstanceOf"), Some(TokenKind::InstanceOf));
    assert_eq!(lookup("DIV"), Some(TokenKind::Div));
}

#[test]
fn literals_are_keywords() {
    assert_eq!(lookup("TRUE"), Some(TokenKind::True));
    assert_eq!(lookup("Null"), Some(TokenKind::Null));
}

#[test]
fn ordinary_identifiers_are_not() {
    assert_eq!(lookup("andy"), None);
    assert_eq!(lookup("T"), None);
    assert_eq!(lookup("instanceofx"), None);
}
