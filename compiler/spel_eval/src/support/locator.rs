use std::sync::Arc;

use crate::context::{type_not_found, TypeLocator};
use crate::error::EvalError;
use crate::types::{TypeInfo, TypeRegistry};

/// Looks types up in a [`TypeRegistry`], first by the name as written and
/// then under each import prefix (`T(Person)` finding `demo.Person`).
#[derive(Clone, Debug)]
pub struct StandardTypeLocator {
    registry: Arc<TypeRegistry>,
    import_prefixes: Vec<String>,
}

impl Default for StandardTypeLocator {
    fn default() -> Self {
        StandardTypeLocator::new(Arc::new(TypeRegistry::with_builtins()))
    }
}

impl StandardTypeLocator {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        StandardTypeLocator {
            registry,
            import_prefixes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_import_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.import_prefixes.push(prefix.into());
        self
    }

    pub fn import_prefixes(&self) -> &[String] {
        &self.import_prefixes
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }
}

impl TypeLocator for StandardTypeLocator {
    fn find_type(&self, name: &str) -> Result<Arc<TypeInfo>, EvalError> {
        if let Some(info) = self.registry.get(name) {
            return Ok(info.clone());
        }
        self.import_prefixes
            .iter()
            .find_map(|prefix| self.registry.get(&format!("{prefix}.{name}")).cloned())
            .ok_or_else(|| type_not_found(name))
    }
}
