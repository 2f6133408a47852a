use rustc_hash::FxHashMap;

use crate::context::{EvaluationContext, ServiceResolver};
use crate::error::AccessError;
use crate::Value;

/// Resolves `@name` from a fixed table.
#[derive(Clone, Default, Debug)]
pub struct MapServiceResolver {
    services: FxHashMap<String, Value>,
}

impl MapServiceResolver {
    pub fn new() -> Self {
        MapServiceResolver::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, service: impl Into<Value>) {
        self.services.insert(name.into(), service.into());
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, service: impl Into<Value>) -> Self {
        self.insert(name, service);
        self
    }
}

impl ServiceResolver for MapServiceResolver {
    fn resolve(&self, _ctx: &dyn EvaluationContext, name: &str) -> Result<Value, AccessError> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| AccessError::failed(format!("no service named '{name}'")))
    }
}
