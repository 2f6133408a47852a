//! Runtime values.
//!
//! Scalars are stored inline. Strings are shared immutable `Arc<str>`.
//! Lists and maps are shared and interior-mutable, so `list.add(x)` inside
//! an expression is visible to the host that supplied the list. Host objects
//! pair their data with the [`TypeInfo`] that describes them.
//!
//! Construct heap values through the factory methods (`Value::string`,
//! `Value::list`, `Value::map`, `Value::object`).

mod from_value;
mod json;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::UserError;
use crate::types::{TypeDescriptor, TypeInfo};

pub use from_value::FromValue;

#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(Arc<str>),
    List(ListRef),
    Map(MapRef),
    Object(ObjectRef),
    /// A type reference, as produced by `T(Name)`.
    Type(Arc<TypeInfo>),
    Function(FunctionRef),
}

impl Value {
    #[inline]
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(ListRef::new(items))
    }

    /// A list that rejects mutation.
    #[inline]
    pub fn frozen_list(items: Vec<Value>) -> Self {
        Value::List(ListRef::frozen(items))
    }

    #[inline]
    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(MapRef::new(entries))
    }

    /// A map that rejects mutation.
    #[inline]
    pub fn frozen_map(entries: Vec<(Value, Value)>) -> Self {
        Value::Map(MapRef::frozen(entries))
    }

    /// Wrap host data as an instance of `info`.
    pub fn object<T: Any + Send + Sync>(info: &Arc<TypeInfo>, data: T) -> Self {
        Value::Object(ObjectRef::new(info.clone(), data))
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_)
        )
    }

    /// Runtime type. Primitives report their boxed form.
    pub fn descriptor(&self) -> TypeDescriptor {
        use crate::types::Primitive;
        match self {
            Value::Null => TypeDescriptor::Null,
            Value::Bool(_) => TypeDescriptor::Boxed(Primitive::Bool),
            Value::Int(_) => TypeDescriptor::Boxed(Primitive::Int),
            Value::Long(_) => TypeDescriptor::Boxed(Primitive::Long),
            Value::Float(_) => TypeDescriptor::Boxed(Primitive::Float),
            Value::Double(_) => TypeDescriptor::Boxed(Primitive::Double),
            Value::Char(_) => TypeDescriptor::Boxed(Primitive::Char),
            Value::Str(_) => TypeDescriptor::Str,
            Value::List(_) => TypeDescriptor::List,
            Value::Map(_) => TypeDescriptor::Map,
            Value::Object(obj) => obj.info().descriptor().clone(),
            Value::Type(_) => TypeDescriptor::Type,
            Value::Function(_) => TypeDescriptor::Function,
        }
    }

    /// Name used in messages: `Integer`, `String`, `demo.Person`, `null`.
    pub fn type_name(&self) -> String {
        self.descriptor().to_string()
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral value, widened.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            Value::Char(c) => Some(i64::from(u32::from(*c))),
            _ => None,
        }
    }

    /// Any numeric value as a double.
    #[expect(
        clippy::cast_precision_loss,
        reason = "numeric widening to double mirrors the expression semantics"
    )]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Float(n) => Some(f64::from(*n)),
            Value::Double(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Borrow the host data of an object value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(ObjectRef::downcast_ref)
    }

    /// Identity for shared values, equality for scalars.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a.ptr_eq(b),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => self == other,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.ptr_eq(b) || a.snapshot() == b.snapshot(),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b) || a.content_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Type(a), Value::Type(b)) => a.name() == b.name(),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::Double(n) => write!(f, "{n:?}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::List(list) => {
                f.write_str("[")?;
                for (i, item) in list.snapshot().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}={value}")?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => match obj.info().format(self) {
                Some(text) => f.write_str(&text),
                None => write!(f, "{}@{:x}", obj.info().name(), obj.address()),
            },
            Value::Type(info) => write!(f, "class {}", info.name()),
            Value::Function(func) => write!(f, "function {}", func.name()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Double(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

fn unsupported(what: &str) -> UserError {
    UserError::system(format!("UnsupportedOperationException: {what} is read-only"))
}

/// Shared, interior-mutable list.
#[derive(Clone)]
pub struct ListRef {
    items: Arc<RwLock<Vec<Value>>>,
    frozen: bool,
}

impl ListRef {
    pub fn new(items: Vec<Value>) -> Self {
        ListRef {
            items: Arc::new(RwLock::new(items)),
            frozen: false,
        }
    }

    pub fn frozen(items: Vec<Value>) -> Self {
        ListRef {
            items: Arc::new(RwLock::new(items)),
            frozen: true,
        }
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.items.read().get(index).cloned()
    }

    /// Copy of the current elements. Iterate over this rather than holding
    /// the lock while nested expressions run.
    pub fn snapshot(&self) -> Vec<Value> {
        self.items.read().clone()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.read().iter().any(|item| item == value)
    }

    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.items.read().iter().position(|item| item == value)
    }

    pub fn push(&self, value: Value) -> Result<(), UserError> {
        if self.frozen {
            return Err(unsupported("list"));
        }
        self.items.write().push(value);
        Ok(())
    }

    /// Replace the element at `index`, returning the old one.
    pub fn set(&self, index: usize, value: Value) -> Result<Value, UserError> {
        if self.frozen {
            return Err(unsupported("list"));
        }
        let mut items = self.items.write();
        match items.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, value)),
            None => Err(UserError::system(format!(
                "IndexOutOfBoundsException: Index {index} out of bounds for length {}",
                items.len()
            ))),
        }
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ListRef) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.snapshot().iter()).finish()
    }
}

/// Shared, interior-mutable, insertion-ordered map.
///
/// Keys are compared with `Value` equality; lookups are linear, which suits
/// the small maps expressions build and receive.
#[derive(Clone)]
pub struct MapRef {
    entries: Arc<RwLock<Vec<(Value, Value)>>>,
    frozen: bool,
}

impl MapRef {
    pub fn new(entries: Vec<(Value, Value)>) -> Self {
        MapRef {
            entries: Arc::new(RwLock::new(dedup_entries(entries))),
            frozen: false,
        }
    }

    pub fn frozen(entries: Vec<(Value, Value)>) -> Self {
        MapRef {
            entries: Arc::new(RwLock::new(dedup_entries(entries))),
            frozen: true,
        }
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.read().iter().any(|(k, _)| k == key)
    }

    /// Insert or replace, returning the previous value.
    pub fn insert(&self, key: Value, value: Value) -> Result<Option<Value>, UserError> {
        if self.frozen {
            return Err(unsupported("map"));
        }
        let mut entries = self.entries.write();
        if let Some((_, slot)) = entries.iter_mut().find(|(k, _)| *k == key) {
            return Ok(Some(std::mem::replace(slot, value)));
        }
        entries.push((key, value));
        Ok(None)
    }

    /// Copy of the current entries, in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.read().clone()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.read().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.read().iter().map(|(_, v)| v.clone()).collect()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    fn content_eq(&self, other: &MapRef) -> bool {
        let mine = self.entries();
        mine.len() == other.len()
            && mine
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|theirs| theirs == *v))
    }
}

fn dedup_entries(entries: Vec<(Value, Value)>) -> Vec<(Value, Value)> {
    let mut out: Vec<(Value, Value)> = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => out.push((key, value)),
        }
    }
    out
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries().into_iter())
            .finish()
    }
}

/// Host data tagged with its type.
#[derive(Clone)]
pub struct ObjectRef {
    info: Arc<TypeInfo>,
    data: Arc<dyn Any + Send + Sync>,
}

impl ObjectRef {
    pub fn new<T: Any + Send + Sync>(info: Arc<TypeInfo>, data: T) -> Self {
        ObjectRef {
            info,
            data: Arc::new(data),
        }
    }

    #[inline]
    pub fn info(&self) -> &Arc<TypeInfo> {
        &self.info
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.data).cast::<()>() as usize
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:x}", self.info.name(), self.address())
    }
}

type NativeFn = dyn Fn(&[Value]) -> Result<Value, UserError> + Send + Sync;

/// A host function bound to a variable and invoked as `#name(args)`.
#[derive(Clone)]
pub struct FunctionRef {
    name: Arc<str>,
    params: Option<Arc<[TypeDescriptor]>>,
    func: Arc<NativeFn>,
}

impl FunctionRef {
    /// A function with a fixed parameter list; arguments are converted to
    /// the declared types before the call.
    pub fn new<F>(name: &str, params: Vec<TypeDescriptor>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, UserError> + Send + Sync + 'static,
    {
        FunctionRef {
            name: Arc::from(name),
            params: Some(Arc::from(params)),
            func: Arc::new(func),
        }
    }

    /// A function taking any number of arguments, unconverted.
    pub fn variadic<F>(name: &str, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, UserError> + Send + Sync + 'static,
    {
        FunctionRef {
            name: Arc::from(name),
            params: None,
            func: Arc::new(func),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameters; `None` for variadic functions.
    #[inline]
    pub fn params(&self) -> Option<&[TypeDescriptor]> {
        self.params.as_deref()
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, UserError> {
        (self.func)(args)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &FunctionRef) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.name)
    }
}

#[cfg(test)]
mod tests;
