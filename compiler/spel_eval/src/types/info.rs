//! Host type descriptions.
//!
//! A [`TypeInfo`] is the engine's view of a host type: named properties with
//! getters and setters, instance and static methods, constructors, and a
//! supertype name. The reflective resolvers read these tables; nothing else
//! about the host type is visible to expressions.

use std::fmt;
use std::sync::Arc;

use crate::error::UserError;
use crate::types::TypeDescriptor;
use crate::Value;

/// Reads a property from its target.
pub type Getter = Arc<dyn Fn(&Value) -> Result<Value, UserError> + Send + Sync>;
/// Writes a property on its target.
pub type Setter = Arc<dyn Fn(&Value, Value) -> Result<(), UserError> + Send + Sync>;
/// Invokes a method on a target (`Value::Null` for static methods).
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, UserError> + Send + Sync>;
/// Builds a new instance.
pub type Factory = Arc<dyn Fn(&[Value]) -> Result<Value, UserError> + Send + Sync>;
/// Renders a value of the type as text.
pub type Formatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Whether generated code may call a member directly.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

pub struct PropertyInfo {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub is_static: bool,
    pub declaring_type: Arc<str>,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .field("is_static", &self.is_static)
            .field("readable", &self.getter.is_some())
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

pub struct MethodInfo {
    pub name: String,
    pub params: Vec<TypeDescriptor>,
    pub return_type: TypeDescriptor,
    pub is_static: bool,
    pub visibility: Visibility,
    pub declaring_type: Arc<str>,
    pub invoker: Invoker,
}

impl MethodInfo {
    /// `name(int, String)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({})", self.name, params.join(", "))
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Same name and parameter list.
    pub fn overrides(&self, other: &MethodInfo) -> bool {
        self.name == other.name && self.params == other.params
    }

    pub fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value, UserError> {
        (self.invoker)(target, args)
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{} -> {}",
            if self.is_static { "static " } else { "" },
            self.declaring_type,
            self.signature(),
            self.return_type
        )
    }
}

pub struct ConstructorInfo {
    pub params: Vec<TypeDescriptor>,
    pub declaring_type: Arc<str>,
    pub factory: Factory,
}

impl ConstructorInfo {
    pub fn invoke(&self, args: &[Value]) -> Result<Value, UserError> {
        (self.factory)(args)
    }
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        write!(f, "new {}({})", self.declaring_type, params.join(", "))
    }
}

/// A host type, as seen by expressions.
pub struct TypeInfo {
    name: Arc<str>,
    descriptor: TypeDescriptor,
    supertype: Option<Arc<str>>,
    visibility: Visibility,
    value_type: bool,
    properties: Vec<Arc<PropertyInfo>>,
    methods: Vec<Arc<MethodInfo>>,
    constructors: Vec<Arc<ConstructorInfo>>,
    formatter: Option<Formatter>,
}

impl TypeInfo {
    /// Fully qualified name, e.g. `demo.Person`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last dotted segment of the name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Descriptor of values of this type.
    #[inline]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    #[inline]
    pub fn supertype(&self) -> Option<&str> {
        self.supertype.as_deref()
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Values of this type are copied rather than shared (numbers, booleans,
    /// host value types).
    #[inline]
    pub fn is_value_type(&self) -> bool {
        self.value_type
    }

    pub fn property(&self, name: &str, is_static: bool) -> Option<&Arc<PropertyInfo>> {
        self.properties
            .iter()
            .find(|p| p.is_static == is_static && p.name == name)
    }

    pub fn properties(&self) -> &[Arc<PropertyInfo>] {
        &self.properties
    }

    pub fn methods(&self) -> &[Arc<MethodInfo>] {
        &self.methods
    }

    pub fn methods_named<'a>(
        &'a self,
        name: &'a str,
        is_static: bool,
    ) -> impl Iterator<Item = &'a Arc<MethodInfo>> + 'a {
        self.methods
            .iter()
            .filter(move |m| m.is_static == is_static && m.name == name)
    }

    pub fn constructors(&self) -> &[Arc<ConstructorInfo>] {
        &self.constructors
    }

    /// Render `value` with the type's formatter, if it has one.
    pub fn format(&self, value: &Value) -> Option<String> {
        self.formatter.as_ref().map(|f| f(value))
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("supertype", &self.supertype)
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`TypeInfo`].
///
/// ```text
/// let point = TypeBuilder::new("demo.Point")
///     .property("x", TypeDescriptor::INT, |p| Ok(Value::Int(point_of(p)?.x)))
///     .method("norm", vec![], TypeDescriptor::DOUBLE, |p, _| ...)
///     .constructor(vec![TypeDescriptor::INT, TypeDescriptor::INT], |args| ...)
///     .build();
/// ```
pub struct TypeBuilder {
    info: TypeInfo,
}

impl TypeBuilder {
    /// A public host type whose supertype is `Object`.
    pub fn new(name: impl AsRef<str>) -> Self {
        let name: Arc<str> = Arc::from(name.as_ref());
        TypeBuilder::with_descriptor(name.clone(), TypeDescriptor::Object(name))
    }

    pub(crate) fn with_descriptor(name: Arc<str>, descriptor: TypeDescriptor) -> Self {
        let supertype = if &*name == "Object" {
            None
        } else {
            Some(Arc::from("Object"))
        };
        TypeBuilder {
            info: TypeInfo {
                name,
                descriptor,
                supertype,
                visibility: Visibility::Public,
                value_type: false,
                properties: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                formatter: None,
            },
        }
    }

    #[must_use]
    pub fn supertype(mut self, name: impl AsRef<str>) -> Self {
        self.info.supertype = Some(Arc::from(name.as_ref()));
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.info.visibility = visibility;
        self
    }

    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.info.value_type = true;
        self
    }

    /// Read-only instance property.
    #[must_use]
    pub fn property<G>(self, name: &str, descriptor: TypeDescriptor, getter: G) -> Self
    where
        G: Fn(&Value) -> Result<Value, UserError> + Send + Sync + 'static,
    {
        self.add_property(name, descriptor, false, Some(Arc::new(getter)), None)
    }

    /// Read-write instance property.
    #[must_use]
    pub fn property_rw<G, S>(
        self,
        name: &str,
        descriptor: TypeDescriptor,
        getter: G,
        setter: S,
    ) -> Self
    where
        G: Fn(&Value) -> Result<Value, UserError> + Send + Sync + 'static,
        S: Fn(&Value, Value) -> Result<(), UserError> + Send + Sync + 'static,
    {
        self.add_property(
            name,
            descriptor,
            false,
            Some(Arc::new(getter)),
            Some(Arc::new(setter)),
        )
    }

    /// Read-only static property (a constant, typically).
    #[must_use]
    pub fn static_property<G>(self, name: &str, descriptor: TypeDescriptor, getter: G) -> Self
    where
        G: Fn() -> Result<Value, UserError> + Send + Sync + 'static,
    {
        self.add_property(
            name,
            descriptor,
            true,
            Some(Arc::new(move |_: &Value| getter())),
            None,
        )
    }

    fn add_property(
        mut self,
        name: &str,
        descriptor: TypeDescriptor,
        is_static: bool,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Self {
        self.info.properties.push(Arc::new(PropertyInfo {
            name: name.to_owned(),
            descriptor,
            is_static,
            declaring_type: self.info.name.clone(),
            getter,
            setter,
        }));
        self
    }

    #[must_use]
    pub fn method<F>(
        self,
        name: &str,
        params: Vec<TypeDescriptor>,
        return_type: TypeDescriptor,
        invoker: F,
    ) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, UserError> + Send + Sync + 'static,
    {
        self.add_method(
            name,
            params,
            return_type,
            false,
            Visibility::Public,
            Arc::new(invoker),
        )
    }

    /// Instance method that generated code may not call directly.
    #[must_use]
    pub fn private_method<F>(
        self,
        name: &str,
        params: Vec<TypeDescriptor>,
        return_type: TypeDescriptor,
        invoker: F,
    ) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, UserError> + Send + Sync + 'static,
    {
        self.add_method(
            name,
            params,
            return_type,
            false,
            Visibility::Private,
            Arc::new(invoker),
        )
    }

    #[must_use]
    pub fn static_method<F>(
        self,
        name: &str,
        params: Vec<TypeDescriptor>,
        return_type: TypeDescriptor,
        invoker: F,
    ) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, UserError> + Send + Sync + 'static,
    {
        self.add_method(
            name,
            params,
            return_type,
            true,
            Visibility::Public,
            Arc::new(move |_: &Value, args: &[Value]| invoker(args)),
        )
    }

    fn add_method(
        mut self,
        name: &str,
        params: Vec<TypeDescriptor>,
        return_type: TypeDescriptor,
        is_static: bool,
        visibility: Visibility,
        invoker: Invoker,
    ) -> Self {
        self.info.methods.push(Arc::new(MethodInfo {
            name: name.to_owned(),
            params,
            return_type,
            is_static,
            visibility,
            declaring_type: self.info.name.clone(),
            invoker,
        }));
        self
    }

    #[must_use]
    pub fn constructor<F>(mut self, params: Vec<TypeDescriptor>, factory: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, UserError> + Send + Sync + 'static,
    {
        self.info.constructors.push(Arc::new(ConstructorInfo {
            params,
            declaring_type: self.info.name.clone(),
            factory: Arc::new(factory),
        }));
        self
    }

    /// How values of this type render in string concatenation.
    #[must_use]
    pub fn display<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.info.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn build(self) -> Arc<TypeInfo> {
        Arc::new(self.info)
    }
}
