use std::cmp::Ordering;

use spel_diagnostic::SpelMessage;

use crate::context::TypeComparator;
use crate::error::EvalError;
use crate::numeric::{promote, Promoted};
use crate::Value;

/// Orders nulls first, numbers after promotion, then strings, booleans and
/// characters among themselves.
#[derive(Copy, Clone, Default, Debug)]
pub struct StandardTypeComparator;

impl TypeComparator for StandardTypeComparator {
    fn can_compare(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Null, _) | (_, Value::Null) => true,
            (l, r) if l.is_number() && r.is_number() => true,
            (Value::Str(_), Value::Str(_))
            | (Value::Bool(_), Value::Bool(_))
            | (Value::Char(_), Value::Char(_)) => true,
            _ => false,
        }
    }

    fn compare(&self, left: &Value, right: &Value) -> Result<Ordering, EvalError> {
        match (left, right) {
            (Value::Null, Value::Null) => Ok(Ordering::Equal),
            (Value::Null, _) => Ok(Ordering::Less),
            (_, Value::Null) => Ok(Ordering::Greater),
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::Char(a), Value::Char(b)) => Ok(a.cmp(b)),
            _ => match promote(left, right) {
                Some(Promoted::Int(a, b)) => Ok(a.cmp(&b)),
                Some(Promoted::Long(a, b)) => Ok(a.cmp(&b)),
                Some(Promoted::Float(a, b)) => Ok(a.total_cmp(&b)),
                Some(Promoted::Double(a, b)) => Ok(a.total_cmp(&b)),
                None => Err(EvalError::unpositioned(SpelMessage::NotComparable)
                    .with_insert(left.type_name())
                    .with_insert(right.type_name())),
            },
        }
    }
}
