//! The stack machine that runs verified programs.
//!
//! Values carry their own runtime type, so `Box` costs nothing and the
//! typed instructions only check. Errors mirror what the interpreter
//! reports for the same failure, positioned at the instruction's span.

use smallvec::SmallVec;
use spel_diagnostic::{Diagnostic, SpelMessage};
use spel_eval::numeric::{arithmetic, negate};
use spel_eval::support::{dispatch, format_method, is_instance_of};
use spel_eval::types::{MethodInfo, Primitive};
use spel_eval::{
    equality, relational, EvalError, EvaluationContext, TypeDescriptor, TypeLocator, TypedValue,
    Value,
};
use spel_ir::{BinaryOp, Span};

use crate::instr::Instr;
use crate::program::Program;

fn class_name(value: &Value) -> String {
    match value {
        Value::Type(info) => info.name().to_owned(),
        other => other.type_name(),
    }
}

fn conversion_error(span: Span, from: impl ToString, to: impl ToString) -> EvalError {
    EvalError::new(SpelMessage::TypeConversionError, span)
        .with_insert(from)
        .with_insert(to)
}

/// A program that does not behave as verified.
fn corrupt(span: Span) -> EvalError {
    EvalError::new(SpelMessage::ExceptionRunningCompiledExpression, span)
}

/// Whether `value` may sit in a slot described by `descriptor`.
fn conforms(locator: &dyn TypeLocator, value: &Value, descriptor: &TypeDescriptor) -> bool {
    match descriptor {
        _ if value.is_null() => true,
        TypeDescriptor::Any => true,
        TypeDescriptor::Null => false,
        TypeDescriptor::Primitive(p) | TypeDescriptor::Boxed(p) => {
            value.descriptor().primitive() == Some(*p)
        }
        TypeDescriptor::Object(name) => locator
            .find_type(name)
            .is_ok_and(|info| is_instance_of(locator, value, &info)),
        other => value.descriptor().same_kind(other),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "widening to float follows binary numeric promotion"
)]
fn widen(value: &Value, to: Primitive) -> Option<Value> {
    Some(match to {
        Primitive::Long => Value::Long(value.as_i64()?),
        Primitive::Float => Value::Float(match value {
            Value::Int(n) => *n as f32,
            Value::Long(n) => *n as f32,
            Value::Float(n) => *n,
            _ => return None,
        }),
        Primitive::Double => Value::Double(value.as_f64()?),
        Primitive::Int | Primitive::Bool | Primitive::Char => value.clone(),
    })
}

fn pop(stack: &mut Vec<Value>, span: Span) -> Result<Value, EvalError> {
    stack.pop().ok_or_else(|| corrupt(span))
}

fn pop_args(stack: &mut Vec<Value>, argc: usize, span: Span) -> Result<SmallVec<[Value; 4]>, EvalError> {
    let Some(start) = stack.len().checked_sub(argc) else {
        return Err(corrupt(span));
    };
    Ok(stack.drain(start..).collect())
}

fn to_text(ctx: &dyn EvaluationContext, value: &Value, span: Span) -> Result<String, EvalError> {
    Ok(match value {
        Value::Null => "null".to_owned(),
        Value::Str(s) => s.to_string(),
        other => ctx
            .type_converter()
            .convert(other, &TypeDescriptor::Str)
            .map_err(|e| e.at(span))?
            .to_string(),
    })
}

fn invocation_failed(
    method: &MethodInfo,
    receiver: &Value,
    err: spel_eval::UserError,
    span: Span,
) -> EvalError {
    let message = err.message().to_owned();
    EvalError::from_user(
        err,
        Diagnostic::new(SpelMessage::ExceptionDuringMethodInvocation, span)
            .with_insert(&method.name)
            .with_insert(class_name(receiver))
            .with_insert(message),
    )
}

/// Run `program` with `root` as the root object.
pub fn execute(
    program: &Program,
    ctx: &dyn EvaluationContext,
    root: &TypedValue,
) -> Result<Value, EvalError> {
    let mut stack: Vec<Value> = Vec::with_capacity(8);
    let mut locals: Vec<Value> = vec![Value::Null; program.locals];
    let mut pc = 0;

    loop {
        let span = program.spans.get(pc).copied().unwrap_or_default();
        let Some(instr) = program.code.get(pc) else {
            return Err(corrupt(span));
        };
        pc += 1;

        match instr {
            Instr::PushConst(n) => {
                let (value, _) = program.constants.get(*n).ok_or_else(|| corrupt(span))?;
                stack.push(value.clone());
            }
            Instr::PushNull => stack.push(Value::Null),
            Instr::LoadRoot => stack.push(root.value().clone()),
            Instr::LoadVariable(n) => {
                let name = program.names.get(*n).ok_or_else(|| corrupt(span))?;
                stack.push(ctx.lookup_variable(name).unwrap_or(Value::Null));
            }
            Instr::LoadType(n) => {
                let info = program.types.get(*n).ok_or_else(|| corrupt(span))?;
                stack.push(Value::Type(info.clone()));
            }
            Instr::LoadLocal(n) => {
                let value = locals.get(*n).ok_or_else(|| corrupt(span))?;
                stack.push(value.clone());
            }
            Instr::StoreLocal(n) => {
                let value = pop(&mut stack, span)?;
                let slot = locals.get_mut(*n).ok_or_else(|| corrupt(span))?;
                *slot = value;
            }
            Instr::Dup => {
                let top = stack.last().cloned().ok_or_else(|| corrupt(span))?;
                stack.push(top);
            }
            Instr::Pop => {
                pop(&mut stack, span)?;
            }
            Instr::PopN(n) => {
                pop_args(&mut stack, *n, span)?;
            }
            Instr::CheckCast(descriptor) => {
                let top = stack.last().ok_or_else(|| corrupt(span))?;
                if !conforms(ctx.type_locator(), top, descriptor) {
                    return Err(conversion_error(span, class_name(top), descriptor));
                }
            }
            Instr::Box(_) => {}
            Instr::Unbox(kind) => {
                let top = stack.last().ok_or_else(|| corrupt(span))?;
                if top.descriptor().primitive() != Some(*kind) {
                    let from = if top.is_null() {
                        "null".to_owned()
                    } else {
                        class_name(top)
                    };
                    return Err(conversion_error(span, from, kind.name()));
                }
            }
            Instr::Convert { to, .. } => {
                let value = pop(&mut stack, span)?;
                stack.push(widen(&value, *to).ok_or_else(|| corrupt(span))?);
            }
            Instr::Arith { op, .. } => {
                let right = pop(&mut stack, span)?;
                let left = pop(&mut stack, span)?;
                match arithmetic(*op, &left, &right).map_err(|e| e.at(span))? {
                    Some(value) => stack.push(value),
                    None => return Err(unsupported(span, *op, &left, &right)),
                }
            }
            Instr::Neg(_) => {
                let value = pop(&mut stack, span)?;
                match negate(&value) {
                    Some(value) => stack.push(value),
                    None => return Err(unsupported(span, BinaryOp::Sub, &value, &Value::Null)),
                }
            }
            Instr::Concat => {
                let right = pop(&mut stack, span)?;
                let left = pop(&mut stack, span)?;
                let mut text = to_text(ctx, &left, span)?;
                text.push_str(&to_text(ctx, &right, span)?);
                stack.push(Value::string(text));
            }
            Instr::Compare(op) => {
                let right = pop(&mut stack, span)?;
                let left = pop(&mut stack, span)?;
                let holds = relational(ctx.type_comparator(), *op, &left, &right)
                    .map_err(|e| e.at(span))?;
                stack.push(Value::Bool(holds));
            }
            Instr::Equals { negate } => {
                let right = pop(&mut stack, span)?;
                let left = pop(&mut stack, span)?;
                stack.push(Value::Bool(equality(&left, &right) != *negate));
            }
            Instr::Not => {
                let value = pop(&mut stack, span)?;
                let Value::Bool(b) = value else {
                    return Err(conversion_error(span, class_name(&value), "boolean"));
                };
                stack.push(Value::Bool(!b));
            }
            Instr::GetProperty(n) => {
                let member = program.members.get(*n).ok_or_else(|| corrupt(span))?;
                let receiver = pop(&mut stack, span)?;
                if receiver.is_null() {
                    return Err(
                        EvalError::new(SpelMessage::PropertyOrFieldNotReadableOnNull, span)
                            .with_insert(&member.name),
                    );
                }
                let value = member.member.read(&receiver).map_err(|err| {
                    EvalError::new(SpelMessage::ExceptionDuringPropertyRead, span)
                        .with_insert(&member.name)
                        .with_insert(&err)
                        .with_cause(EvalError::User(err))
                })?;
                stack.push(value);
            }
            Instr::Invoke { method, argc } => {
                let method = program.methods.get(*method).ok_or_else(|| corrupt(span))?;
                let args = pop_args(&mut stack, *argc, span)?;
                let receiver = pop(&mut stack, span)?;
                if receiver.is_null() {
                    let types: Vec<TypeDescriptor> = args.iter().map(Value::descriptor).collect();
                    return Err(EvalError::new(
                        SpelMessage::MethodCallOnNullObjectNotAllowed,
                        span,
                    )
                    .with_insert(format_method(&method.name, &types)));
                }
                let target = dispatch(ctx.type_locator(), &receiver, method);
                let value = target
                    .invoke(&receiver, &args)
                    .map_err(|err| invocation_failed(&target, &receiver, err, span))?;
                stack.push(value);
            }
            Instr::InvokeStatic { method, argc } => {
                let method = program.methods.get(*method).ok_or_else(|| corrupt(span))?;
                let args = pop_args(&mut stack, *argc, span)?;
                let value = method
                    .invoke(&Value::Null, &args)
                    .map_err(|err| invocation_failed(method, &Value::Null, err, span))?;
                stack.push(value);
            }
            Instr::ListGet => {
                let index = pop(&mut stack, span)?;
                let receiver = pop(&mut stack, span)?;
                let list = match &receiver {
                    Value::List(list) => list,
                    Value::Null => {
                        return Err(EvalError::new(SpelMessage::CannotIndexIntoNullValue, span));
                    }
                    other => return Err(conversion_error(span, class_name(other), "List")),
                };
                let index = index.as_i64().ok_or_else(|| corrupt(span))?;
                let element = usize::try_from(index).ok().and_then(|i| list.get(i));
                let Some(element) = element else {
                    return Err(EvalError::new(SpelMessage::CollectionIndexOutOfBounds, span)
                        .with_insert(list.len())
                        .with_insert(index));
                };
                stack.push(element);
            }
            Instr::Jump(label) => pc = program.resolve(*label),
            Instr::JumpIfTrue(label) | Instr::JumpIfFalse(label) => {
                let value = pop(&mut stack, span)?;
                let Value::Bool(b) = value else {
                    return Err(conversion_error(span, class_name(&value), "boolean"));
                };
                if b == matches!(instr, Instr::JumpIfTrue(_)) {
                    pc = program.resolve(*label);
                }
            }
            Instr::JumpIfNotNull { depth, target } => {
                let index = stack.len().checked_sub(depth + 1).ok_or_else(|| corrupt(span))?;
                if !stack[index].is_null() {
                    pc = program.resolve(*target);
                }
            }
            Instr::JumpIfPresent(label) => {
                let present = match pop(&mut stack, span)? {
                    Value::Null => false,
                    Value::Str(s) => !s.is_empty(),
                    _ => true,
                };
                if present {
                    pc = program.resolve(*label);
                }
            }
            Instr::Return => return pop(&mut stack, span),
        }
    }
}

fn unsupported(span: Span, op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    EvalError::new(SpelMessage::OperatorNotSupportedBetweenTypes, span)
        .with_insert(op.as_symbol())
        .with_insert(left.type_name())
        .with_insert(right.type_name())
}
