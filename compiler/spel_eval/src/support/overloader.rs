use spel_diagnostic::SpelMessage;
use spel_ir::BinaryOp;

use crate::context::OperatorOverloader;
use crate::error::EvalError;
use crate::Value;

/// Overloads nothing.
#[derive(Copy, Clone, Default, Debug)]
pub struct StandardOperatorOverloader;

impl OperatorOverloader for StandardOperatorOverloader {
    fn overrides_operation(&self, _op: BinaryOp, _left: &Value, _right: &Value) -> bool {
        false
    }

    fn operate(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        Err(
            EvalError::unpositioned(SpelMessage::OperatorNotSupportedBetweenTypes)
                .with_insert(op.as_symbol())
                .with_insert(left.type_name())
                .with_insert(right.type_name()),
        )
    }
}
