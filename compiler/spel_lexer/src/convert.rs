//! Literal conversion.
//!
//! Turns the source slice of a numeric or string token into its value,
//! reporting overflow and malformed suffixes as [`SpelMessage`]s.

use spel_diagnostic::SpelMessage;
use spel_ir::TokenKind;

/// Decimal integer, with optional `L` suffix.
pub(crate) fn int_literal(slice: &str) -> Result<TokenKind, SpelMessage> {
    if let Some(digits) = strip_long_suffix(slice) {
        return digits
            .parse::<i64>()
            .map(TokenKind::Long)
            .map_err(|_| SpelMessage::NotALong);
    }
    slice
        .parse::<i32>()
        .map(TokenKind::Int)
        .map_err(|_| SpelMessage::NotAnInteger)
}

/// `0x` literal. Values up to the full unsigned width are accepted and
/// reinterpreted as two's complement, so `0xFFFFFFFF` is `-1`.
pub(crate) fn hex_literal(slice: &str) -> Result<TokenKind, SpelMessage> {
    let body = &slice[2..];
    if let Some(digits) = strip_long_suffix(body) {
        return u64::from_str_radix(digits, 16)
            .map(|bits| TokenKind::Long(i64::from_ne_bytes(bits.to_ne_bytes())))
            .map_err(|_| SpelMessage::NotALong);
    }
    u32::from_str_radix(body, 16)
        .map(|bits| TokenKind::Int(i32::from_ne_bytes(bits.to_ne_bytes())))
        .map_err(|_| SpelMessage::NotAnInteger)
}

/// Real literal: `f`/`F` makes a float, `d`/`D` or no suffix a double.
pub(crate) fn real_literal(slice: &str) -> Result<TokenKind, SpelMessage> {
    let (body, suffix) = match slice.as_bytes().last() {
        Some(b'l' | b'L') => return Err(SpelMessage::RealCannotBeLong),
        Some(&c @ (b'f' | b'F' | b'd' | b'D')) => (&slice[..slice.len() - 1], Some(c)),
        _ => (slice, None),
    };
    match suffix {
        Some(b'f' | b'F') => body
            .parse::<f32>()
            .map(|f| TokenKind::Float(f.to_bits()))
            .map_err(|_| SpelMessage::NotAReal),
        _ => body
            .parse::<f64>()
            .map(|d| TokenKind::Double(d.to_bits()))
            .map_err(|_| SpelMessage::NotAReal),
    }
}

/// Strip the surrounding quotes and collapse doubled quotes.
pub(crate) fn string_literal(slice: &str, quote: char) -> String {
    let inner = &slice[1..slice.len() - 1];
    let doubled = if quote == '\'' { "''" } else { "\"\"" };
    if inner.contains(doubled) {
        inner.replace(doubled, &quote.to_string())
    } else {
        inner.to_string()
    }
}

fn strip_long_suffix(slice: &str) -> Option<&str> {
    slice
        .strip_suffix('L')
        .or_else(|| slice.strip_suffix('l'))
}
