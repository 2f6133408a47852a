//! Type model: descriptors, host type descriptions and the registry.

mod builtins;
mod descriptor;
mod info;
mod registry;

pub use builtins::{map_entry, map_entry_type, MapEntry};
pub use descriptor::{Primitive, TypeDescriptor};
pub use info::{
    ConstructorInfo, Factory, Formatter, Getter, Invoker, MethodInfo, PropertyInfo, Setter,
    TypeBuilder, TypeInfo, Visibility,
};
pub use registry::TypeRegistry;
