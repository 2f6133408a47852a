//! Keyword folding.
//!
//! Keywords and textual operators are matched case-insensitively. An
//! identifier directly after `.` or `?.` is always a property or method name,
//! so `a.div` or `x.new` still navigate.

use spel_ir::TokenKind;

/// Map an identifier slice to its keyword kind, if it is one.
pub(crate) fn lookup(ident: &str) -> Option<TokenKind> {
    // Longest keyword is `instanceof`.
    if ident.len() > 10 {
        return None;
    }
    let lower = ident.to_ascii_lowercase();
    let kind = match lower.as_str() {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "new" => TokenKind::New,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "not" => TokenKind::Not,
        "div" => TokenKind::Div,
        "mod" => TokenKind::Mod,
        "eq" => TokenKind::EqEq,
        "ne" => TokenKind::NotEq,
        "lt" => TokenKind::Lt,
        "le" => TokenKind::LtEq,
        "gt" => TokenKind::Gt,
        "ge" => TokenKind::GtEq,
        "matches" => TokenKind::Matches,
        "instanceof" => TokenKind::InstanceOf,
        "between" => TokenKind::Between,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests;
