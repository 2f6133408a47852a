//! Binary and unary operators.

use std::cmp::Ordering;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use regex::Regex;
use spel_diagnostic::SpelMessage;
use spel_ir::{BinaryOp, UnaryOp};

use super::{condition, missing_operand};
use crate::context::TypeComparator;
use crate::error::{EvalError, EvalResult, UserError};
use crate::node::{CachedPattern, SpelNode};
use crate::numeric::{arithmetic, negate, numeric_eq, promote, Promoted};
use crate::state::ExpressionState;
use crate::support::is_instance_of;
use crate::types::TypeDescriptor;
use crate::{TypedValue, Value};

/// Longest string `'text' * n` may produce.
pub const MAX_REPEATED_TEXT_SIZE: usize = 256;

/// Numeric ordering after promotion. `Some(None)` for unordered floats.
fn numeric_order(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    Some(match promote(left, right)? {
        Promoted::Int(a, b) => Some(a.cmp(&b)),
        Promoted::Long(a, b) => Some(a.cmp(&b)),
        Promoted::Float(a, b) => a.partial_cmp(&b),
        Promoted::Double(a, b) => a.partial_cmp(&b),
    })
}

/// Whether `left op right` holds for a relational `op`. Numbers compare
/// after promotion, with NaN unordered; everything else goes through the
/// comparator.
pub fn relational(
    comparator: &dyn TypeComparator,
    op: BinaryOp,
    left: &Value,
    right: &Value,
) -> Result<bool, EvalError> {
    let order = match numeric_order(left, right) {
        Some(Some(order)) => order,
        Some(None) => return Ok(false),
        None => comparator.compare(left, right)?,
    };
    Ok(match op {
        BinaryOp::Lt => order == Ordering::Less,
        BinaryOp::Le => order != Ordering::Greater,
        BinaryOp::Gt => order == Ordering::Greater,
        _ => order != Ordering::Less,
    })
}

/// `==` semantics: numbers compare by value across types, everything else
/// by [`Value`] equality.
pub fn equality(left: &Value, right: &Value) -> bool {
    numeric_eq(left, right).unwrap_or_else(|| left == right)
}

fn boolean(value: bool) -> TypedValue {
    TypedValue::with_descriptor(Value::Bool(value), TypeDescriptor::BOOLEAN)
}

/// Primitive descriptor for an arithmetic result.
fn numeric_exit(value: &Value) -> TypeDescriptor {
    value.descriptor().to_unboxed()
}

impl SpelNode {
    pub(super) fn binary(
        &self,
        state: &mut ExpressionState<'_>,
        op: BinaryOp,
        pattern: &ArcSwapOption<CachedPattern>,
    ) -> EvalResult {
        let [left, right] = self.children() else {
            return Err(missing_operand(self));
        };

        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            self.set_exit_descriptor(TypeDescriptor::BOOLEAN);
            let lhs = left.get_value(state)?;
            let lhs = condition(state, &lhs, left.span())?;
            // Short-circuit.
            if lhs == (op == BinaryOp::Or) {
                return Ok(boolean(lhs));
            }
            let rhs = right.get_value(state)?;
            return Ok(boolean(condition(state, &rhs, right.span())?));
        }

        let lhs = left.get_value(state)?;
        let rhs = right.get_value(state)?;
        let (l, r) = (lhs.value(), rhs.value());

        match op {
            BinaryOp::Add => self.add(state, l, r),
            BinaryOp::Mul => match (l, r) {
                (Value::Str(text), Value::Int(count)) => self.repeat(text, *count),
                _ => self.arithmetic(state, op, l, r),
            },
            BinaryOp::Sub | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Power => {
                self.arithmetic(state, op, l, r)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                self.set_exit_descriptor(TypeDescriptor::BOOLEAN);
                Ok(boolean(equality(l, r) == (op == BinaryOp::Eq)))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                self.set_exit_descriptor(TypeDescriptor::BOOLEAN);
                let holds = relational(state.context().type_comparator(), op, l, r)
                    .map_err(|e| e.at(self.span()))?;
                Ok(boolean(holds))
            }
            BinaryOp::InstanceOf => {
                self.set_exit_descriptor(TypeDescriptor::BOOLEAN);
                let Value::Type(info) = r else {
                    return Err(EvalError::new(
                        SpelMessage::InstanceofOperatorNeedsClassOperand,
                        self.span(),
                    )
                    .with_insert(r.type_name()));
                };
                let ctx = state.context();
                Ok(boolean(
                    !l.is_null() && is_instance_of(ctx.type_locator(), l, info),
                ))
            }
            BinaryOp::Matches => self.matches(l, r, pattern),
            BinaryOp::Between => {
                self.set_exit_descriptor(TypeDescriptor::BOOLEAN);
                let bounds = match r {
                    Value::List(list) if list.len() == 2 => list.snapshot(),
                    _ => {
                        return Err(EvalError::new(
                            SpelMessage::BetweenRightOperandMustBeTwoElementList,
                            right.span(),
                        ));
                    }
                };
                let [low, high] = bounds.as_slice() else {
                    return Err(EvalError::new(
                        SpelMessage::BetweenRightOperandMustBeTwoElementList,
                        right.span(),
                    ));
                };
                Ok(boolean(
                    self.compare(state, low, l)? != Ordering::Greater
                        && self.compare(state, l, high)? != Ordering::Greater,
                ))
            }
            BinaryOp::And | BinaryOp::Or => Err(missing_operand(self)),
        }
    }

    fn compare(
        &self,
        state: &ExpressionState<'_>,
        left: &Value,
        right: &Value,
    ) -> Result<Ordering, EvalError> {
        state
            .context()
            .type_comparator()
            .compare(left, right)
            .map_err(|e| e.at(self.span()))
    }

    fn arithmetic(
        &self,
        state: &ExpressionState<'_>,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> EvalResult {
        match arithmetic(op, left, right).map_err(|e| e.at(self.span()))? {
            Some(value) => {
                self.set_exit_descriptor(numeric_exit(&value));
                Ok(TypedValue::with_descriptor(
                    value.clone(),
                    numeric_exit(&value),
                ))
            }
            None => self.overloaded(state, op, left, right),
        }
    }

    /// Hand non-numeric operands to the operator overloader.
    fn overloaded(
        &self,
        state: &ExpressionState<'_>,
        op: BinaryOp,
        left: &Value,
        right: &Value,
    ) -> EvalResult {
        let overloader = state.context().operator_overloader();
        if overloader.overrides_operation(op, left, right) {
            let value = overloader
                .operate(op, left, right)
                .map_err(|e| e.at(self.span()))?;
            self.set_exit_descriptor(TypeDescriptor::Any);
            return Ok(TypedValue::new(value));
        }
        Err(
            EvalError::new(SpelMessage::OperatorNotSupportedBetweenTypes, self.span())
                .with_insert(op.as_symbol())
                .with_insert(left.type_name())
                .with_insert(right.type_name()),
        )
    }

    /// `+`: numeric addition, or concatenation when either side is a string.
    fn add(&self, state: &ExpressionState<'_>, left: &Value, right: &Value) -> EvalResult {
        if !matches!(left, Value::Str(_)) && !matches!(right, Value::Str(_)) {
            return self.arithmetic(state, BinaryOp::Add, left, right);
        }
        let converter = state.context().type_converter();
        let as_text = |value: &Value| -> Result<String, EvalError> {
            match value {
                Value::Null => Ok("null".to_owned()),
                Value::Str(s) => Ok(s.to_string()),
                other => Ok(converter
                    .convert(other, &TypeDescriptor::Str)
                    .map_err(|e| e.at(self.span()))?
                    .to_string()),
            }
        };
        let mut text = as_text(left)?;
        text.push_str(&as_text(right)?);
        self.set_exit_descriptor(TypeDescriptor::Str);
        Ok(TypedValue::new(Value::string(text)))
    }

    /// `'ab' * 3`.
    fn repeat(&self, text: &str, count: i32) -> EvalResult {
        let Ok(count) = usize::try_from(count) else {
            return Err(EvalError::User(UserError::system(format!(
                "count is negative: {count}"
            ))));
        };
        if text.chars().count().saturating_mul(count) > MAX_REPEATED_TEXT_SIZE {
            return Err(
                EvalError::new(SpelMessage::MaxRepeatedTextSizeExceeded, self.span())
                    .with_insert(MAX_REPEATED_TEXT_SIZE),
            );
        }
        self.set_exit_descriptor(TypeDescriptor::Str);
        Ok(TypedValue::new(Value::string(text.repeat(count))))
    }

    /// `text matches 'regex'`: a whole-string match, the pattern compiled
    /// once per distinct source.
    fn matches(
        &self,
        left: &Value,
        right: &Value,
        pattern: &ArcSwapOption<CachedPattern>,
    ) -> EvalResult {
        self.set_exit_descriptor(TypeDescriptor::BOOLEAN);
        let Value::Str(text) = left else {
            return Err(EvalError::new(
                SpelMessage::InvalidFirstOperandForMatchesOperator,
                self.span(),
            )
            .with_insert(left));
        };
        let Value::Str(source) = right else {
            return Err(EvalError::new(
                SpelMessage::InvalidSecondOperandForMatchesOperator,
                self.span(),
            )
            .with_insert(right));
        };

        let cached = pattern.load_full().filter(|p| *p.source == **source);
        let compiled = match cached {
            Some(compiled) => compiled,
            None => {
                let regex = Regex::new(&format!("^(?:{source})$")).map_err(|err| {
                    EvalError::new(SpelMessage::InvalidPattern, self.span())
                        .with_insert(source)
                        .with_cause(EvalError::User(UserError::system(err.to_string())))
                })?;
                let compiled = Arc::new(CachedPattern {
                    source: source.to_string(),
                    regex,
                });
                pattern.store(Some(compiled.clone()));
                compiled
            }
        };
        Ok(boolean(compiled.regex.is_match(text)))
    }

    pub(super) fn unary(&self, state: &mut ExpressionState<'_>, op: UnaryOp) -> EvalResult {
        let Some(operand_node) = self.child(0) else {
            return Err(missing_operand(self));
        };
        let operand = operand_node.get_value(state)?;
        match op {
            UnaryOp::Not => {
                self.set_exit_descriptor(TypeDescriptor::BOOLEAN);
                let value = condition(state, &operand, operand_node.span())?;
                Ok(boolean(!value))
            }
            UnaryOp::Neg => match negate(operand.value()) {
                Some(value) => {
                    self.set_exit_descriptor(numeric_exit(&value));
                    Ok(TypedValue::with_descriptor(value.clone(), numeric_exit(&value)))
                }
                None => self.overloaded(state, BinaryOp::Sub, operand.value(), &Value::Null),
            },
            UnaryOp::Plus => {
                let value = operand.value();
                if value.is_number() {
                    self.set_exit_descriptor(numeric_exit(value));
                    Ok(TypedValue::with_descriptor(value.clone(), numeric_exit(value)))
                } else {
                    self.overloaded(state, BinaryOp::Add, value, &Value::Null)
                }
            }
        }
    }
}
