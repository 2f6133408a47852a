use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::builtins;
use super::TypeInfo;

/// Types visible to `T(..)`, `new` and the reflective resolvers.
#[derive(Default, Debug)]
pub struct TypeRegistry {
    types: FxHashMap<Arc<str>, Arc<TypeInfo>>,
}

impl TypeRegistry {
    /// An empty registry. Most callers want [`with_builtins`](Self::with_builtins).
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    /// A registry holding the builtin types (`Object`, `String`, `Integer`,
    /// `List`, `Map`, `Math`, ...).
    pub fn with_builtins() -> Self {
        let mut registry = TypeRegistry::new();
        for info in builtins::all() {
            registry.register(info);
        }
        registry
    }

    /// Register `info` under its full name, replacing any previous entry.
    pub fn register(&mut self, info: Arc<TypeInfo>) -> Arc<TypeInfo> {
        self.types.insert(Arc::from(info.name()), info.clone());
        info
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeInfo>> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
