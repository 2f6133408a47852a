//! Operators, `?:` and the ternary.

use spel_eval::{SpelNode, TypeDescriptor, Value};
use spel_ir::{BinaryOp, UnaryOp};

use super::{exit_of, is_boolean, not_compilable, operand, Compilable};
use crate::code_flow::{widest, CodeFlow};
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::instr::Instr;

fn exits<const N: usize>(node: &SpelNode) -> Option<[TypeDescriptor; N]> {
    let children: &[SpelNode; N] = node.children().try_into().ok()?;
    if !children.iter().all(Compilable::is_compilable) {
        return None;
    }
    let collected: Vec<TypeDescriptor> = children
        .iter()
        .map(SpelNode::exit_descriptor)
        .collect::<Option<_>>()?;
    collected.try_into().ok()
}

/// Common numeric kind of an arithmetic node, if it matches what the
/// interpreter produced.
fn arithmetic_kind(
    node: &SpelNode,
    left: &TypeDescriptor,
    right: &TypeDescriptor,
) -> Option<TypeDescriptor> {
    let kind = widest(left.primitive()?, right.primitive()?)?;
    let kind = TypeDescriptor::Primitive(kind);
    (node.exit_descriptor()? == kind).then_some(kind)
}

pub(super) fn is_compilable_binary(node: &SpelNode, op: BinaryOp) -> bool {
    let Some([left, right]) = exits::<2>(node) else {
        return false;
    };
    let Some(exit) = node.exit_descriptor() else {
        return false;
    };
    match op {
        BinaryOp::And | BinaryOp::Or => is_boolean(&left) && is_boolean(&right),
        BinaryOp::Add if exit == TypeDescriptor::Str => {
            left == TypeDescriptor::Str || right == TypeDescriptor::Str
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic_kind(node, &left, &right).is_some()
        }
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => true,
        _ => false,
    }
}

pub(super) fn is_compilable_unary(node: &SpelNode, op: UnaryOp) -> bool {
    let Some([operand]) = exits::<1>(node) else {
        return false;
    };
    match op {
        UnaryOp::Not => is_boolean(&operand),
        UnaryOp::Neg | UnaryOp::Plus => operand.is_numeric()
            && node.exit_descriptor() == Some(operand.to_unboxed()),
    }
}

pub(super) fn is_compilable_ternary(node: &SpelNode) -> bool {
    matches!(exits::<3>(node), Some([cond, a, b]) if is_boolean(&cond) && a == b)
}

pub(super) fn is_compilable_elvis(node: &SpelNode) -> bool {
    matches!(exits::<2>(node), Some([a, b]) if a == b)
}

fn push_bool(em: &mut Emitter, value: bool) {
    let constant = em.constant(Value::Bool(value), TypeDescriptor::BOOLEAN);
    em.emit(Instr::PushConst(constant));
}

fn children<const N: usize>(node: &SpelNode) -> Result<&[SpelNode; N], CompileError> {
    node.children()
        .try_into()
        .map_err(|_| not_compilable(node))
}

pub(super) fn binary(
    node: &SpelNode,
    em: &mut Emitter,
    cf: &mut CodeFlow,
    op: BinaryOp,
) -> Result<(), CompileError> {
    let [left, right] = children::<2>(node)?;
    let (left_exit, right_exit) = (exit_of(left)?, exit_of(right)?);
    let exit = exit_of(node)?;

    match op {
        BinaryOp::And | BinaryOp::Or => {
            let short = em.new_label();
            let end = em.new_label();
            operand(em, cf, left, &TypeDescriptor::BOOLEAN)?;
            if op == BinaryOp::And {
                em.emit(Instr::JumpIfFalse(short));
            } else {
                em.emit(Instr::JumpIfTrue(short));
            }
            operand(em, cf, right, &TypeDescriptor::BOOLEAN)?;
            em.emit(Instr::Jump(end));
            em.place(short);
            push_bool(em, op == BinaryOp::Or);
            em.place(end);
            cf.push_descriptor(TypeDescriptor::BOOLEAN);
        }
        BinaryOp::Add if exit == TypeDescriptor::Str => {
            operand(em, cf, left, &left_exit)?;
            operand(em, cf, right, &right_exit)?;
            em.emit(Instr::Concat);
            cf.push_descriptor(TypeDescriptor::Str);
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            let kind = arithmetic_kind(node, &left_exit, &right_exit)
                .ok_or_else(|| not_compilable(node))?;
            operand(em, cf, left, &kind)?;
            operand(em, cf, right, &kind)?;
            let Some(primitive) = kind.primitive() else {
                return Err(not_compilable(node));
            };
            em.emit(Instr::Arith {
                op,
                kind: primitive,
            });
            cf.push_descriptor(kind);
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            operand(em, cf, left, &left_exit)?;
            operand(em, cf, right, &right_exit)?;
            em.emit(Instr::Equals {
                negate: op == BinaryOp::Ne,
            });
            cf.push_descriptor(TypeDescriptor::BOOLEAN);
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            operand(em, cf, left, &left_exit)?;
            operand(em, cf, right, &right_exit)?;
            em.emit(Instr::Compare(op));
            cf.push_descriptor(TypeDescriptor::BOOLEAN);
        }
        _ => return Err(not_compilable(node)),
    }
    Ok(())
}

pub(super) fn unary(
    node: &SpelNode,
    em: &mut Emitter,
    cf: &mut CodeFlow,
    op: UnaryOp,
) -> Result<(), CompileError> {
    let [child] = children::<1>(node)?;
    match op {
        UnaryOp::Not => {
            operand(em, cf, child, &TypeDescriptor::BOOLEAN)?;
            em.emit(Instr::Not);
            cf.push_descriptor(TypeDescriptor::BOOLEAN);
        }
        UnaryOp::Neg | UnaryOp::Plus => {
            let exit = exit_of(node)?;
            let Some(kind) = exit.primitive().filter(|_| exit.is_value_type()) else {
                return Err(not_compilable(node));
            };
            operand(em, cf, child, &exit)?;
            if op == UnaryOp::Neg {
                em.emit(Instr::Neg(kind));
            }
            cf.push_descriptor(exit);
        }
    }
    Ok(())
}

pub(super) fn ternary(node: &SpelNode, em: &mut Emitter, cf: &mut CodeFlow) -> Result<(), CompileError> {
    let [cond, if_true, if_false] = children::<3>(node)?;
    let exit = exit_of(if_true)?;
    let otherwise = em.new_label();
    let end = em.new_label();
    operand(em, cf, cond, &TypeDescriptor::BOOLEAN)?;
    em.emit(Instr::JumpIfFalse(otherwise));
    operand(em, cf, if_true, &exit)?;
    em.emit(Instr::Jump(end));
    em.place(otherwise);
    operand(em, cf, if_false, &exit)?;
    em.place(end);
    cf.push_descriptor(exit);
    Ok(())
}

/// `left ?: right`: keep `left` unless it is null or the empty string.
pub(super) fn elvis(node: &SpelNode, em: &mut Emitter, cf: &mut CodeFlow) -> Result<(), CompileError> {
    let [left, right] = children::<2>(node)?;
    let exit = exit_of(left)?;
    let end = em.new_label();
    operand(em, cf, left, &exit)?;
    em.emit(Instr::Dup);
    em.emit(Instr::JumpIfPresent(end));
    em.emit(Instr::Pop);
    operand(em, cf, right, &exit)?;
    em.place(end);
    cf.push_descriptor(exit);
    Ok(())
}
