use pretty_assertions::assert_eq;
use spel_eval::types::Primitive;
use spel_eval::{TypeDescriptor, Value};

use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::instr::Instr;
use crate::program::Program;

fn verified(em: Emitter) -> Program {
    match em.finish(0) {
        Ok(program) => program,
        Err(err) => panic!("verification failed: {err}"),
    }
}

fn push_int(em: &mut Emitter, n: i32) {
    let constant = em.constant(Value::Int(n), TypeDescriptor::INT);
    em.emit(Instr::PushConst(constant));
}

fn push_bool(em: &mut Emitter, b: bool) {
    let constant = em.constant(Value::Bool(b), TypeDescriptor::BOOLEAN);
    em.emit(Instr::PushConst(constant));
}

#[test]
fn straight_line_result() {
    let mut em = Emitter::new();
    push_int(&mut em, 1);
    push_int(&mut em, 2);
    em.emit(Instr::Arith {
        op: spel_ir::BinaryOp::Add,
        kind: Primitive::Int,
    });
    em.emit(Instr::Return);
    let program = verified(em);
    assert_eq!(program.result_descriptor(), &TypeDescriptor::INT);
}

#[test]
fn branches_must_agree_at_the_join() {
    let mut em = Emitter::new();
    let otherwise = em.new_label();
    let end = em.new_label();
    push_bool(&mut em, true);
    em.emit(Instr::JumpIfFalse(otherwise));
    push_int(&mut em, 1);
    em.emit(Instr::Jump(end));
    em.place(otherwise);
    let text = em.constant(Value::string("x"), TypeDescriptor::Str);
    em.emit(Instr::PushConst(text));
    em.place(end);
    em.emit(Instr::Return);

    match em.finish(0) {
        Err(CompileError::StackShapeMismatch {
            expected, found, ..
        }) => {
            assert_eq!(expected, vec![TypeDescriptor::INT]);
            assert_eq!(found, vec![TypeDescriptor::Str]);
        }
        other => panic!("expected a shape mismatch, got {other:?}"),
    }
}

#[test]
fn boxed_branches_join() {
    let mut em = Emitter::new();
    let otherwise = em.new_label();
    let end = em.new_label();
    push_bool(&mut em, false);
    em.emit(Instr::JumpIfFalse(otherwise));
    push_int(&mut em, 1);
    em.emit(Instr::Box(Primitive::Int));
    em.emit(Instr::Jump(end));
    em.place(otherwise);
    em.emit(Instr::PushNull);
    em.emit(Instr::CheckCast(TypeDescriptor::Boxed(Primitive::Int)));
    em.place(end);
    em.emit(Instr::Return);
    let program = verified(em);
    assert_eq!(
        program.result_descriptor(),
        &TypeDescriptor::Boxed(Primitive::Int)
    );
}

#[test]
fn unplaced_labels_are_rejected() {
    let mut em = Emitter::new();
    let nowhere = em.new_label();
    push_bool(&mut em, true);
    em.emit(Instr::JumpIfTrue(nowhere));
    push_int(&mut em, 1);
    em.emit(Instr::Return);
    assert!(matches!(em.finish(0), Err(CompileError::UnresolvedLabel(_))));
}

#[test]
fn jumps_only_go_forward() {
    let mut em = Emitter::new();
    let top = em.new_label();
    em.place(top);
    push_int(&mut em, 1);
    em.emit(Instr::Pop);
    em.emit(Instr::Jump(top));
    assert_eq!(em.finish(0).err(), Some(CompileError::BackwardJump { at: 2 }));
}

#[test]
fn return_needs_exactly_one_value() {
    let mut em = Emitter::new();
    push_int(&mut em, 1);
    push_int(&mut em, 2);
    em.emit(Instr::Return);
    assert_eq!(
        em.finish(0).err(),
        Some(CompileError::BadReturn { at: 2, depth: 2 })
    );
}

#[test]
fn operand_types_are_checked() {
    let mut em = Emitter::new();
    push_int(&mut em, 1);
    em.emit(Instr::Not);
    em.emit(Instr::Return);
    assert!(matches!(
        em.finish(0),
        Err(CompileError::OperandMismatch { at: 1, .. })
    ));
}

#[test]
fn locals_must_be_stored_first() {
    let mut em = Emitter::new();
    em.emit(Instr::LoadLocal(0));
    em.emit(Instr::Return);
    assert_eq!(
        em.finish(1).err(),
        Some(CompileError::UninitializedLocal { at: 0, local: 0 })
    );
}

#[test]
fn missing_return_falls_off_the_end() {
    let mut em = Emitter::new();
    push_int(&mut em, 1);
    assert_eq!(em.finish(0).err(), Some(CompileError::FallsOffEnd));
}
