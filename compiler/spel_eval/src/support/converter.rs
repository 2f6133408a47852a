use spel_diagnostic::SpelMessage;

use crate::context::TypeConverter;
use crate::error::EvalError;
use crate::types::{Primitive, TypeDescriptor};
use crate::Value;

/// Numeric widening and narrowing, number/char/boolean parsing from
/// strings, and anything-to-string.
#[derive(Copy, Clone, Default, Debug)]
pub struct StandardTypeConverter;

fn conversion_error(value: &Value, to: &TypeDescriptor) -> EvalError {
    EvalError::unpositioned(SpelMessage::TypeConversionError)
        .with_insert(value.type_name())
        .with_insert(to)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    reason = "numeric conversions follow two's-complement narrowing"
)]
fn convert_number(value: &Value, to: Primitive) -> Option<Value> {
    let as_i64 = |v: &Value| -> Option<i64> {
        match v {
            Value::Float(f) => Some(*f as i64),
            Value::Double(d) => Some(*d as i64),
            other => other.as_i64(),
        }
    };
    Some(match to {
        Primitive::Int => Value::Int(as_i64(value)? as i32),
        Primitive::Long => Value::Long(as_i64(value)?),
        Primitive::Float => Value::Float(match value {
            Value::Char(c) => u32::from(*c) as f32,
            other => other.as_f64()? as f32,
        }),
        Primitive::Double => Value::Double(match value {
            Value::Char(c) => f64::from(u32::from(*c)),
            other => other.as_f64()?,
        }),
        Primitive::Char => {
            let code = as_i64(value)?;
            Value::Char(char::from_u32(code as u32)?)
        }
        Primitive::Bool => return None,
    })
}

fn parse_str(s: &str, to: Primitive) -> Option<Value> {
    let s = s.trim();
    Some(match to {
        Primitive::Int => Value::Int(s.parse().ok()?),
        Primitive::Long => Value::Long(s.parse().ok()?),
        Primitive::Float => Value::Float(s.parse().ok()?),
        Primitive::Double => Value::Double(s.parse().ok()?),
        Primitive::Bool => match s.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => Value::Bool(true),
            "false" | "off" | "no" | "0" => Value::Bool(false),
            _ => return None,
        },
        Primitive::Char => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return None,
            }
        }
    })
}

impl TypeConverter for StandardTypeConverter {
    fn can_convert(&self, from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
        if from.same_kind(to) || *to == TypeDescriptor::Any || *to == TypeDescriptor::Str {
            return true;
        }
        match (from, to.primitive()) {
            (TypeDescriptor::Null, Some(_)) => to.is_boxed(),
            (TypeDescriptor::Null, None) => true,
            (TypeDescriptor::Str, Some(_)) => true,
            (from, Some(Primitive::Bool)) => from.primitive() == Some(Primitive::Bool),
            (from, Some(_)) => from
                .primitive()
                .is_some_and(|p| p != Primitive::Bool),
            _ => false,
        }
    }

    fn convert(&self, value: &Value, to: &TypeDescriptor) -> Result<Value, EvalError> {
        if value.is_null() {
            return if to.is_value_type() {
                Err(conversion_error(value, to))
            } else {
                Ok(Value::Null)
            };
        }
        let from = value.descriptor();
        if from.same_kind(to) || *to == TypeDescriptor::Any {
            return Ok(value.clone());
        }
        if let Some(target) = to.primitive() {
            let converted = match value {
                Value::Str(s) => parse_str(s, target),
                Value::Bool(_) => None,
                other => convert_number(other, target),
            };
            return converted.ok_or_else(|| conversion_error(value, to));
        }
        match to {
            TypeDescriptor::Str => Ok(Value::string(value.to_string())),
            TypeDescriptor::Object(name) if value.type_name() == **name => Ok(value.clone()),
            _ => Err(conversion_error(value, to)),
        }
    }
}
