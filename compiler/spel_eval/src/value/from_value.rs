use crate::context::TypeConverter;
use crate::error::EvalError;
use crate::types::TypeDescriptor;
use crate::Value;

/// Extraction of a Rust value from an evaluation result.
///
/// Goes through the context's [`TypeConverter`], so `get_value_as::<i64>()`
/// accepts an `Integer` result and `get_value_as::<String>()` renders
/// anything.
pub trait FromValue: Sized {
    /// Descriptor the value is converted to first.
    fn descriptor() -> TypeDescriptor;

    fn from_converted(value: Value) -> Option<Self>;

    fn from_value(value: Value, converter: &dyn TypeConverter) -> Result<Self, EvalError> {
        let target = Self::descriptor();
        let source = value.type_name();
        let converted = converter.convert(&value, &target)?;
        Self::from_converted(converted).ok_or_else(|| {
            EvalError::unpositioned(spel_diagnostic::SpelMessage::TypeConversionError)
                .with_insert(source)
                .with_insert(target)
        })
    }
}

macro_rules! from_value_scalar {
    ($ty:ty, $desc:expr, $variant:ident) => {
        impl FromValue for $ty {
            fn descriptor() -> TypeDescriptor {
                $desc
            }

            fn from_converted(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

from_value_scalar!(bool, TypeDescriptor::BOOLEAN, Bool);
from_value_scalar!(i32, TypeDescriptor::INT, Int);
from_value_scalar!(i64, TypeDescriptor::LONG, Long);
from_value_scalar!(f32, TypeDescriptor::FLOAT, Float);
from_value_scalar!(f64, TypeDescriptor::DOUBLE, Double);
from_value_scalar!(char, TypeDescriptor::CHAR, Char);

impl FromValue for String {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Str
    }

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Str(s) => Some(s.to_string()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::Any
    }

    fn from_converted(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for Vec<Value> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::List
    }

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::List(list) => Some(list.snapshot()),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn descriptor() -> TypeDescriptor {
        T::descriptor().to_boxed()
    }

    fn from_converted(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_converted(other).map(Some),
        }
    }

    fn from_value(value: Value, converter: &dyn TypeConverter) -> Result<Self, EvalError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, converter).map(Some),
        }
    }
}
