//! Binary numeric promotion and arithmetic.
//!
//! Shared by the interpreter and the compiled-code VM so both paths agree
//! bit for bit. Operands widen along `int < long < float < double`;
//! integral arithmetic wraps in two's complement.

use spel_diagnostic::SpelMessage;
use spel_ir::BinaryOp;

use crate::error::EvalError;
use crate::types::Primitive;
use crate::Value;

/// Both operands widened to their common type.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Promoted {
    Int(i32, i32),
    Long(i64, i64),
    Float(f32, f32),
    Double(f64, f64),
}

impl Promoted {
    pub fn primitive(self) -> Primitive {
        match self {
            Promoted::Int(..) => Primitive::Int,
            Promoted::Long(..) => Primitive::Long,
            Promoted::Float(..) => Primitive::Float,
            Promoted::Double(..) => Primitive::Double,
        }
    }
}

fn rank(value: &Value) -> Option<u8> {
    match value {
        Value::Int(_) => Some(0),
        Value::Long(_) => Some(1),
        Value::Float(_) => Some(2),
        Value::Double(_) => Some(3),
        _ => None,
    }
}

/// The common type of two numeric operands, `None` if either is not a
/// number.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "binary numeric promotion widens long to float"
)]
pub fn promote(left: &Value, right: &Value) -> Option<Promoted> {
    let common = rank(left)?.max(rank(right)?);
    Some(match common {
        0 => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Promoted::Int(*a, *b),
            _ => return None,
        },
        1 => Promoted::Long(left.as_i64()?, right.as_i64()?),
        2 => {
            let widen = |v: &Value| match v {
                Value::Int(n) => Some(*n as f32),
                Value::Long(n) => Some(*n as f32),
                Value::Float(n) => Some(*n),
                _ => None,
            };
            Promoted::Float(widen(left)?, widen(right)?)
        }
        _ => Promoted::Double(left.as_f64()?, right.as_f64()?),
    })
}

fn division_by_zero() -> EvalError {
    EvalError::unpositioned(SpelMessage::DivisionByZero)
}

/// Apply an arithmetic operator to two numbers.
///
/// Returns `Ok(None)` when the operands are not both numeric, leaving the
/// caller to try strings or the operator overloader.
pub fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Option<Value>, EvalError> {
    let Some(promoted) = promote(left, right) else {
        return Ok(None);
    };
    let value = match (op, promoted) {
        (BinaryOp::Add, Promoted::Int(a, b)) => Value::Int(a.wrapping_add(b)),
        (BinaryOp::Add, Promoted::Long(a, b)) => Value::Long(a.wrapping_add(b)),
        (BinaryOp::Add, Promoted::Float(a, b)) => Value::Float(a + b),
        (BinaryOp::Add, Promoted::Double(a, b)) => Value::Double(a + b),

        (BinaryOp::Sub, Promoted::Int(a, b)) => Value::Int(a.wrapping_sub(b)),
        (BinaryOp::Sub, Promoted::Long(a, b)) => Value::Long(a.wrapping_sub(b)),
        (BinaryOp::Sub, Promoted::Float(a, b)) => Value::Float(a - b),
        (BinaryOp::Sub, Promoted::Double(a, b)) => Value::Double(a - b),

        (BinaryOp::Mul, Promoted::Int(a, b)) => Value::Int(a.wrapping_mul(b)),
        (BinaryOp::Mul, Promoted::Long(a, b)) => Value::Long(a.wrapping_mul(b)),
        (BinaryOp::Mul, Promoted::Float(a, b)) => Value::Float(a * b),
        (BinaryOp::Mul, Promoted::Double(a, b)) => Value::Double(a * b),

        (BinaryOp::Div | BinaryOp::Mod, Promoted::Int(_, 0) | Promoted::Long(_, 0)) => {
            return Err(division_by_zero());
        }
        (BinaryOp::Div, Promoted::Int(a, b)) => Value::Int(a.wrapping_div(b)),
        (BinaryOp::Div, Promoted::Long(a, b)) => Value::Long(a.wrapping_div(b)),
        (BinaryOp::Div, Promoted::Float(a, b)) => Value::Float(a / b),
        (BinaryOp::Div, Promoted::Double(a, b)) => Value::Double(a / b),

        (BinaryOp::Mod, Promoted::Int(a, b)) => Value::Int(a.wrapping_rem(b)),
        (BinaryOp::Mod, Promoted::Long(a, b)) => Value::Long(a.wrapping_rem(b)),
        (BinaryOp::Mod, Promoted::Float(a, b)) => Value::Float(a % b),
        (BinaryOp::Mod, Promoted::Double(a, b)) => Value::Double(a % b),

        (BinaryOp::Power, promoted) => power(promoted),

        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// `a ^ b`. Integer powers widen to `long` when the result no longer fits
/// an `int`.
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "integral powers are computed in double and truncated"
)]
fn power(promoted: Promoted) -> Value {
    match promoted {
        Promoted::Int(a, b) => {
            let result = f64::from(a).powf(f64::from(b));
            if result >= f64::from(i32::MIN) && result <= f64::from(i32::MAX) {
                Value::Int(result as i32)
            } else {
                Value::Long(result as i64)
            }
        }
        Promoted::Long(a, b) => Value::Long((a as f64).powf(b as f64) as i64),
        Promoted::Float(a, b) => Value::Float(a.powf(b)),
        Promoted::Double(a, b) => Value::Double(a.powf(b)),
    }
}

/// Numeric equality after promotion; `None` if either side is not a number.
#[expect(
    clippy::float_cmp,
    reason = "expression equality is exact, like the host language's =="
)]
pub fn numeric_eq(left: &Value, right: &Value) -> Option<bool> {
    Some(match promote(left, right)? {
        Promoted::Int(a, b) => a == b,
        Promoted::Long(a, b) => a == b,
        Promoted::Float(a, b) => a == b,
        Promoted::Double(a, b) => a == b,
    })
}

/// Unary minus; `None` for non-numbers.
pub fn negate(value: &Value) -> Option<Value> {
    Some(match value {
        Value::Int(n) => Value::Int(n.wrapping_neg()),
        Value::Long(n) => Value::Long(n.wrapping_neg()),
        Value::Float(n) => Value::Float(-n),
        Value::Double(n) => Value::Double(-n),
        _ => return None,
    })
}
