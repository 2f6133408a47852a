use crate::context::{EvaluationContext, PropertyAccessor};
use crate::error::AccessError;
use crate::types::TypeDescriptor;
use crate::{TypedValue, Value};

static MAP_ONLY: [TypeDescriptor; 1] = [TypeDescriptor::Map];

/// Treats `map.key` as `map['key']`.
///
/// Reading a missing key falls through to the next accessor, so `map.size`
/// still reaches the `Map` type's members.
#[derive(Copy, Clone, Default, Debug)]
pub struct MapAccessor;

impl PropertyAccessor for MapAccessor {
    fn specific_target_types(&self) -> Option<&[TypeDescriptor]> {
        Some(&MAP_ONLY)
    }

    fn can_read(
        &self,
        _ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<bool, AccessError> {
        Ok(target
            .as_map()
            .is_some_and(|map| map.contains_key(&Value::string(name))))
    }

    fn read(
        &self,
        _ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
    ) -> Result<TypedValue, AccessError> {
        let map = target
            .as_map()
            .ok_or_else(|| AccessError::failed("target is not a map"))?;
        Ok(TypedValue::new(
            map.get(&Value::string(name)).unwrap_or(Value::Null),
        ))
    }

    fn can_write(
        &self,
        _ctx: &dyn EvaluationContext,
        target: &Value,
        _name: &str,
    ) -> Result<bool, AccessError> {
        Ok(target.as_map().is_some())
    }

    fn write(
        &self,
        _ctx: &dyn EvaluationContext,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), AccessError> {
        let map = target
            .as_map()
            .ok_or_else(|| AccessError::failed("target is not a map"))?;
        map.insert(Value::string(name), value)?;
        Ok(())
    }
}
