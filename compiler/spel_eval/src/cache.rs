//! Call-site caches.
//!
//! Each property, method, constructor and indexer node owns one
//! [`CacheSlot`] holding the last resolution and the runtime types it was
//! made for. Slots are lock-free snapshots: readers load an `Arc`, writers
//! swap in a whole new entry. A racing writer only costs a redundant
//! re-resolution.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use smallvec::SmallVec;

use crate::context::{ConstructorExecutor, MethodExecutor, PropertyAccessor};
use crate::types::TypeDescriptor;
use crate::Value;

pub(crate) type ArgumentTypes = SmallVec<[TypeDescriptor; 4]>;

/// One node's cache entry.
pub struct CacheSlot<T> {
    entry: ArcSwapOption<T>,
}

impl<T> Default for CacheSlot<T> {
    fn default() -> Self {
        CacheSlot {
            entry: ArcSwapOption::empty(),
        }
    }
}

impl<T> CacheSlot<T> {
    pub fn new() -> Self {
        CacheSlot::default()
    }

    #[inline]
    pub fn load(&self) -> Option<Arc<T>> {
        self.entry.load_full()
    }

    pub fn store(&self, entry: T) -> Arc<T> {
        let entry = Arc::new(entry);
        self.entry.store(Some(entry.clone()));
        entry
    }

    pub fn clear(&self) {
        self.entry.store(None);
    }

    pub fn is_empty(&self) -> bool {
        self.entry.load().is_none()
    }
}

impl<T> fmt::Debug for CacheSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_empty() { "CacheSlot(empty)" } else { "CacheSlot(filled)" })
    }
}

/// The type a static call was resolved against, if the target is a type.
fn static_class(target: &Value) -> Option<Arc<str>> {
    match target {
        Value::Type(info) => Some(Arc::from(info.name())),
        _ => None,
    }
}

fn same_static_class(cached: Option<&str>, target: &Value) -> bool {
    match (cached, target) {
        (None, _) => true,
        (Some(name), Value::Type(info)) => name == info.name(),
        (Some(_), _) => false,
    }
}

/// A method resolution and the call-site shape it is valid for.
pub struct CachedMethodExecutor {
    executor: Arc<dyn MethodExecutor>,
    static_class: Option<Arc<str>>,
    target_type: TypeDescriptor,
    argument_types: ArgumentTypes,
}

impl CachedMethodExecutor {
    pub fn new(
        executor: Arc<dyn MethodExecutor>,
        target: &Value,
        target_type: TypeDescriptor,
        argument_types: &[TypeDescriptor],
    ) -> Self {
        CachedMethodExecutor {
            executor,
            static_class: static_class(target),
            target_type,
            argument_types: argument_types.iter().cloned().collect(),
        }
    }

    /// Same static class (for type targets), same target type, and the
    /// same argument types position by position.
    pub fn is_suitable(
        &self,
        target: &Value,
        target_type: &TypeDescriptor,
        argument_types: &[TypeDescriptor],
    ) -> bool {
        same_static_class(self.static_class.as_deref(), target)
            && self.target_type == *target_type
            && self.argument_types.as_slice() == argument_types
    }

    #[inline]
    pub fn get(&self) -> &Arc<dyn MethodExecutor> {
        &self.executor
    }

    pub fn target_type(&self) -> &TypeDescriptor {
        &self.target_type
    }
}

/// A property read accessor and the target it was chosen for.
pub struct CachedPropertyAccessor {
    accessor: Arc<dyn PropertyAccessor>,
    static_class: Option<Arc<str>>,
    target_type: TypeDescriptor,
}

impl CachedPropertyAccessor {
    pub fn new(accessor: Arc<dyn PropertyAccessor>, target: &Value) -> Self {
        CachedPropertyAccessor {
            accessor,
            static_class: static_class(target),
            target_type: target.descriptor(),
        }
    }

    pub fn is_suitable(&self, target: &Value, target_type: &TypeDescriptor) -> bool {
        same_static_class(self.static_class.as_deref(), target) && self.target_type == *target_type
    }

    #[inline]
    pub fn get(&self) -> &Arc<dyn PropertyAccessor> {
        &self.accessor
    }
}

/// A constructor resolution and the argument types it was made for.
pub struct CachedConstructorExecutor {
    executor: Arc<dyn ConstructorExecutor>,
    argument_types: ArgumentTypes,
}

impl CachedConstructorExecutor {
    pub fn new(executor: Arc<dyn ConstructorExecutor>, argument_types: &[TypeDescriptor]) -> Self {
        CachedConstructorExecutor {
            executor,
            argument_types: argument_types.iter().cloned().collect(),
        }
    }

    pub fn is_suitable(&self, argument_types: &[TypeDescriptor]) -> bool {
        self.argument_types.as_slice() == argument_types
    }

    #[inline]
    pub fn get(&self) -> &Arc<dyn ConstructorExecutor> {
        &self.executor
    }
}

/// Accessor for `object['name']`, the indexer's property form.
pub struct CachedIndexAccessor {
    accessor: Arc<dyn PropertyAccessor>,
    name: Arc<str>,
    target_type: TypeDescriptor,
}

impl CachedIndexAccessor {
    pub fn new(accessor: Arc<dyn PropertyAccessor>, name: &str, target_type: TypeDescriptor) -> Self {
        CachedIndexAccessor {
            accessor,
            name: Arc::from(name),
            target_type,
        }
    }

    pub fn is_suitable(&self, name: &str, target_type: &TypeDescriptor) -> bool {
        *self.name == *name && self.target_type == *target_type
    }

    #[inline]
    pub fn get(&self) -> &Arc<dyn PropertyAccessor> {
        &self.accessor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EvaluationContext, MethodExecutor};
    use crate::error::AccessError;
    use crate::types::TypeRegistry;
    use crate::TypedValue;

    struct Noop;

    impl MethodExecutor for Noop {
        fn execute(
            &self,
            _ctx: &dyn EvaluationContext,
            _target: &Value,
            _args: Vec<Value>,
        ) -> Result<TypedValue, AccessError> {
            Ok(TypedValue::NULL)
        }
    }

    #[test]
    fn slot_load_store_clear() {
        let slot: CacheSlot<u32> = CacheSlot::new();
        assert!(slot.load().is_none());
        slot.store(7);
        assert_eq!(slot.load().as_deref(), Some(&7));
        slot.clear();
        assert!(slot.is_empty());
    }

    #[test]
    fn method_cache_requires_exact_argument_types() {
        let target = Value::string("abc");
        let cached = CachedMethodExecutor::new(
            Arc::new(Noop),
            &target,
            TypeDescriptor::Str,
            &[TypeDescriptor::Boxed(crate::types::Primitive::Int)],
        );
        let int = TypeDescriptor::Boxed(crate::types::Primitive::Int);
        assert!(cached.is_suitable(&target, &TypeDescriptor::Str, &[int.clone()]));
        assert!(!cached.is_suitable(&target, &TypeDescriptor::Str, &[TypeDescriptor::Str]));
        assert!(!cached.is_suitable(&target, &TypeDescriptor::Str, &[int.clone(), int]));
        assert!(!cached.is_suitable(&Value::list(vec![]), &TypeDescriptor::List, &[]));
    }

    #[test]
    fn static_calls_are_keyed_by_class() {
        let registry = TypeRegistry::with_builtins();
        let (Some(math), Some(string)) = (registry.get("Math"), registry.get("String")) else {
            panic!("builtins missing");
        };
        let math = Value::Type(math.clone());
        let string = Value::Type(string.clone());
        let cached = CachedMethodExecutor::new(Arc::new(Noop), &math, TypeDescriptor::Type, &[]);
        assert!(cached.is_suitable(&math, &TypeDescriptor::Type, &[]));
        assert!(!cached.is_suitable(&string, &TypeDescriptor::Type, &[]));
    }
}
