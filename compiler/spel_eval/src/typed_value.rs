use std::fmt;

use crate::types::TypeDescriptor;
use crate::Value;

/// An evaluation result: a value and the type it was produced as.
///
/// The descriptor may be more precise than the value's runtime type: an
/// `int` literal produces `Value::Int` with descriptor `int`, while the same
/// value read from a list carries `Integer`.
#[derive(Clone, PartialEq, Debug)]
pub struct TypedValue {
    value: Value,
    descriptor: TypeDescriptor,
}

impl TypedValue {
    pub const NULL: TypedValue = TypedValue {
        value: Value::Null,
        descriptor: TypeDescriptor::Null,
    };

    /// A value typed by its runtime type.
    pub fn new(value: Value) -> Self {
        let descriptor = value.descriptor();
        TypedValue { value, descriptor }
    }

    /// A value with a statically known type. `Any` falls back to the runtime
    /// type; a null value always reports `null`.
    pub fn with_descriptor(value: Value, descriptor: TypeDescriptor) -> Self {
        match (&value, descriptor) {
            (Value::Null, _) => TypedValue::NULL,
            (_, TypeDescriptor::Any) => TypedValue::new(value),
            (_, descriptor) => TypedValue { value, descriptor },
        }
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn into_value(self) -> Value {
        self.value
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

impl From<Value> for TypedValue {
    fn from(value: Value) -> Self {
        TypedValue::new(value)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}
