//! Token to operator mapping per precedence level.

use spel_ir::{BinaryOp, TokenKind};

pub(super) fn relational_op(kind: &TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::EqEq => BinaryOp::Eq,
        TokenKind::NotEq => BinaryOp::Ne,
        TokenKind::Lt => BinaryOp::Lt,
        TokenKind::LtEq => BinaryOp::Le,
        TokenKind::Gt => BinaryOp::Gt,
        TokenKind::GtEq => BinaryOp::Ge,
        TokenKind::InstanceOf => BinaryOp::InstanceOf,
        TokenKind::Matches => BinaryOp::Matches,
        TokenKind::Between => BinaryOp::Between,
        _ => return None,
    })
}

pub(super) fn additive_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

pub(super) fn multiplicative_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Div => Some(BinaryOp::Div),
        TokenKind::Mod => Some(BinaryOp::Mod),
        _ => None,
    }
}
