use std::fmt;
use std::sync::Arc;

/// Primitive value kinds.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Primitive {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Primitive {
    /// Unboxed name (`int`).
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "boolean",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }

    /// Boxed name (`Integer`), which is also the builtin type's name.
    pub const fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Bool => "Boolean",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
            Primitive::Char => "Character",
        }
    }

    #[inline]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Primitive::Int | Primitive::Long | Primitive::Float | Primitive::Double
        )
    }
}

/// The type of a value, as tracked by nodes and matched by resolvers.
///
/// Primitives come in two flavours. `Primitive` is what a literal or an
/// arithmetic node produces and what a host member declares; `Boxed` is the
/// runtime type of any primitive value flowing through a reference slot.
/// The distinction only matters to the compiler, which must insert box and
/// unbox steps where the two meet.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Boxed(Primitive),
    Null,
    Str,
    List,
    Map,
    Type,
    Function,
    /// A host type, by registered name.
    Object(Arc<str>),
    /// Anything; no static knowledge.
    Any,
}

impl TypeDescriptor {
    pub const BOOLEAN: TypeDescriptor = TypeDescriptor::Primitive(Primitive::Bool);
    pub const INT: TypeDescriptor = TypeDescriptor::Primitive(Primitive::Int);
    pub const LONG: TypeDescriptor = TypeDescriptor::Primitive(Primitive::Long);
    pub const FLOAT: TypeDescriptor = TypeDescriptor::Primitive(Primitive::Float);
    pub const DOUBLE: TypeDescriptor = TypeDescriptor::Primitive(Primitive::Double);
    pub const CHAR: TypeDescriptor = TypeDescriptor::Primitive(Primitive::Char);

    pub fn object(name: impl AsRef<str>) -> Self {
        TypeDescriptor::Object(Arc::from(name.as_ref()))
    }

    /// Unboxed primitive, the kind that lives on an evaluation stack as-is.
    #[inline]
    pub fn is_value_type(&self) -> bool {
        matches!(self, TypeDescriptor::Primitive(_))
    }

    #[inline]
    pub fn is_boxed(&self) -> bool {
        matches!(self, TypeDescriptor::Boxed(_))
    }

    #[inline]
    pub fn is_reference(&self) -> bool {
        !self.is_value_type()
    }

    /// The primitive kind, boxed or not.
    #[inline]
    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            TypeDescriptor::Primitive(p) | TypeDescriptor::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.primitive().is_some_and(Primitive::is_numeric)
    }

    #[must_use]
    pub fn to_boxed(&self) -> TypeDescriptor {
        match self {
            TypeDescriptor::Primitive(p) => TypeDescriptor::Boxed(*p),
            other => other.clone(),
        }
    }

    #[must_use]
    pub fn to_unboxed(&self) -> TypeDescriptor {
        match self {
            TypeDescriptor::Boxed(p) => TypeDescriptor::Primitive(*p),
            other => other.clone(),
        }
    }

    /// Same type once boxing is ignored.
    pub fn same_kind(&self, other: &TypeDescriptor) -> bool {
        match (self.primitive(), other.primitive()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    /// Name of the registered type describing values of this descriptor.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            TypeDescriptor::Primitive(p) | TypeDescriptor::Boxed(p) => Some(p.boxed_name()),
            TypeDescriptor::Str => Some("String"),
            TypeDescriptor::List => Some("List"),
            TypeDescriptor::Map => Some("Map"),
            TypeDescriptor::Type => Some("Type"),
            TypeDescriptor::Function => Some("Function"),
            TypeDescriptor::Object(name) => Some(name),
            TypeDescriptor::Any => Some("Object"),
            TypeDescriptor::Null => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(p) => f.write_str(p.name()),
            TypeDescriptor::Null => f.write_str("null"),
            other => f.write_str(other.type_name().unwrap_or("null")),
        }
    }
}
