use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{convert_arguments, match_arguments};
use crate::context::{ConstructorExecutor, ConstructorResolver, EvaluationContext};
use crate::error::AccessError;
use crate::types::{ConstructorInfo, TypeDescriptor};
use crate::{TypedValue, Value};

/// Resolves `new Type(args)` against the constructors registered on the
/// located type, picking the best argument match.
#[derive(Copy, Clone, Default, Debug)]
pub struct ReflectiveConstructorResolver;

impl ConstructorResolver for ReflectiveConstructorResolver {
    #[tracing::instrument(level = "trace", skip(self, ctx, argument_types))]
    fn resolve(
        &self,
        ctx: &dyn EvaluationContext,
        type_name: &str,
        argument_types: &[TypeDescriptor],
    ) -> Result<Option<Arc<dyn ConstructorExecutor>>, AccessError> {
        let info = ctx.type_locator().find_type(type_name)?;
        let best = info
            .constructors()
            .iter()
            .filter_map(|c| match_arguments(ctx, &c.params, argument_types).map(|rank| (rank, c)))
            .min_by_key(|(rank, _)| *rank);
        Ok(best.map(|(_, ctor)| {
            Arc::new(ReflectiveConstructorExecutor::new(ctor.clone())) as Arc<dyn ConstructorExecutor>
        }))
    }
}

/// Invokes one resolved [`ConstructorInfo`].
#[derive(Debug)]
pub struct ReflectiveConstructorExecutor {
    constructor: Arc<ConstructorInfo>,
    argument_conversion_occurred: AtomicBool,
}

impl ReflectiveConstructorExecutor {
    pub fn new(constructor: Arc<ConstructorInfo>) -> Self {
        ReflectiveConstructorExecutor {
            constructor,
            argument_conversion_occurred: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn constructor(&self) -> &Arc<ConstructorInfo> {
        &self.constructor
    }

    pub fn did_argument_conversion_occur(&self) -> bool {
        self.argument_conversion_occurred.load(Ordering::Relaxed)
    }
}

impl ConstructorExecutor for ReflectiveConstructorExecutor {
    fn execute(
        &self,
        ctx: &dyn EvaluationContext,
        mut args: Vec<Value>,
    ) -> Result<TypedValue, AccessError> {
        if convert_arguments(ctx, &self.constructor.params, &mut args)? {
            self.argument_conversion_occurred
                .store(true, Ordering::Relaxed);
        }
        let value = self.constructor.invoke(&args)?;
        Ok(TypedValue::new(value))
    }
}
