//! Stack-shape verification.
//!
//! One linear pass. Jumps only go forward, so every state flowing into a
//! label is known by the time the pass reaches it. Joining states must agree
//! on the whole descriptor stack; locals are intersected.

use spel_eval::types::Primitive;
use spel_eval::TypeDescriptor;

use crate::error::CompileError;
use crate::instr::Instr;
use crate::program::Program;

#[derive(Clone, PartialEq, Debug)]
struct Frame {
    stack: Vec<TypeDescriptor>,
    locals: Vec<Option<TypeDescriptor>>,
}

impl Frame {
    fn pop(&mut self, at: usize) -> Result<TypeDescriptor, CompileError> {
        self.stack.pop().ok_or(CompileError::StackUnderflow { at })
    }

    fn pop_primitive(&mut self, at: usize, kind: Primitive) -> Result<(), CompileError> {
        let found = self.pop(at)?;
        if found == TypeDescriptor::Primitive(kind) {
            Ok(())
        } else {
            Err(CompileError::OperandMismatch {
                at,
                expected: kind.name().to_owned(),
                found,
            })
        }
    }

    fn pop_reference(&mut self, at: usize) -> Result<TypeDescriptor, CompileError> {
        let found = self.pop(at)?;
        if found.is_reference() {
            Ok(found)
        } else {
            Err(CompileError::OperandMismatch {
                at,
                expected: "a reference".to_owned(),
                found,
            })
        }
    }

    fn pop_n(&mut self, at: usize, n: usize) -> Result<(), CompileError> {
        if self.stack.len() < n {
            return Err(CompileError::StackUnderflow { at });
        }
        self.stack.truncate(self.stack.len() - n);
        Ok(())
    }

    /// Fold `other` into `self` at instruction `at`.
    fn join(&mut self, at: usize, other: &Frame) -> Result<(), CompileError> {
        if self.stack != other.stack {
            return Err(CompileError::StackShapeMismatch {
                at,
                expected: self.stack.clone(),
                found: other.stack.clone(),
            });
        }
        for (mine, theirs) in self.locals.iter_mut().zip(&other.locals) {
            if mine != theirs {
                *mine = None;
            }
        }
        Ok(())
    }
}

/// Check `program` and return the descriptor of its result.
pub fn verify(program: &Program) -> Result<TypeDescriptor, CompileError> {
    let code = program.code();
    let mut incoming: Vec<Option<Frame>> = vec![None; code.len() + 1];
    let mut current = Some(Frame {
        stack: Vec::new(),
        locals: vec![None; program.locals],
    });
    let mut result: Option<TypeDescriptor> = None;

    for (at, instr) in code.iter().enumerate() {
        if let Some(pending) = incoming[at].take() {
            current = match current.take() {
                Some(frame) => {
                    let mut joined = pending;
                    joined.join(at, &frame)?;
                    Some(joined)
                }
                None => Some(pending),
            };
        }
        let Some(frame) = current.as_mut() else {
            // Unreachable.
            continue;
        };

        if let Some(label) = instr.target() {
            let target = program.resolve(label);
            if target <= at {
                return Err(CompileError::BackwardJump { at });
            }
            let mut branch = frame.clone();
            if matches!(instr, Instr::JumpIfTrue(_) | Instr::JumpIfFalse(_)) {
                branch.pop_primitive(at, Primitive::Bool)?;
            } else if matches!(instr, Instr::JumpIfPresent(_)) {
                branch.pop(at)?;
            } else if let Instr::JumpIfNotNull { depth, .. } = instr {
                let index = branch.stack.len().checked_sub(depth + 1);
                match index.map(|i| &branch.stack[i]) {
                    Some(found) if found.is_value_type() => {
                        return Err(CompileError::OperandMismatch {
                            at,
                            expected: "a reference".to_owned(),
                            found: found.clone(),
                        });
                    }
                    Some(_) => {}
                    None => return Err(CompileError::StackUnderflow { at }),
                }
            }
            if let Some(existing) = incoming[target].as_mut() {
                existing.join(target, &branch)?;
            } else {
                incoming[target] = Some(branch);
            }
        }

        step(frame, at, instr, program)?;

        if let Instr::Return = instr {
            let depth = frame.stack.len();
            let [top] = frame.stack.as_slice() else {
                return Err(CompileError::BadReturn { at, depth });
            };
            match &result {
                Some(previous) if previous != top => {
                    return Err(CompileError::StackShapeMismatch {
                        at,
                        expected: vec![previous.clone()],
                        found: vec![top.clone()],
                    });
                }
                Some(_) => {}
                None => result = Some(top.clone()),
            }
        }
        if instr.is_terminal() {
            current = None;
        }
    }

    if current.is_some() || incoming[code.len()].is_some() {
        return Err(CompileError::FallsOffEnd);
    }
    result.ok_or(CompileError::FallsOffEnd)
}

/// Apply the fall-through effect of one instruction.
fn step(frame: &mut Frame, at: usize, instr: &Instr, program: &Program) -> Result<(), CompileError> {
    match instr {
        Instr::PushConst(n) => {
            let descriptor = program
                .constants
                .get(*n)
                .map_or(TypeDescriptor::Any, |(_, d)| d.clone());
            frame.stack.push(descriptor);
        }
        Instr::PushNull => frame.stack.push(TypeDescriptor::Null),
        Instr::LoadRoot | Instr::LoadVariable(_) => frame.stack.push(TypeDescriptor::Any),
        Instr::LoadType(_) => frame.stack.push(TypeDescriptor::Type),
        Instr::LoadLocal(local) => {
            let Some(Some(descriptor)) = frame.locals.get(*local) else {
                return Err(CompileError::UninitializedLocal { at, local: *local });
            };
            frame.stack.push(descriptor.clone());
        }
        Instr::StoreLocal(local) => {
            let value = frame.pop(at)?;
            let Some(slot) = frame.locals.get_mut(*local) else {
                return Err(CompileError::UninitializedLocal { at, local: *local });
            };
            *slot = Some(value);
        }
        Instr::Dup => {
            let top = frame.pop(at)?;
            frame.stack.push(top.clone());
            frame.stack.push(top);
        }
        Instr::Pop => {
            frame.pop(at)?;
        }
        Instr::PopN(n) => frame.pop_n(at, *n)?,
        Instr::CheckCast(descriptor) => {
            frame.pop_reference(at)?;
            frame.stack.push(descriptor.clone());
        }
        Instr::Box(kind) => {
            frame.pop_primitive(at, *kind)?;
            frame.stack.push(TypeDescriptor::Boxed(*kind));
        }
        Instr::Unbox(kind) => {
            frame.pop_reference(at)?;
            frame.stack.push(TypeDescriptor::Primitive(*kind));
        }
        Instr::Convert { from, to } => {
            frame.pop_primitive(at, *from)?;
            frame.stack.push(TypeDescriptor::Primitive(*to));
        }
        Instr::Arith { kind, .. } => {
            frame.pop_primitive(at, *kind)?;
            frame.pop_primitive(at, *kind)?;
            frame.stack.push(TypeDescriptor::Primitive(*kind));
        }
        Instr::Neg(kind) => {
            frame.pop_primitive(at, *kind)?;
            frame.stack.push(TypeDescriptor::Primitive(*kind));
        }
        Instr::Concat => {
            frame.pop_n(at, 2)?;
            frame.stack.push(TypeDescriptor::Str);
        }
        Instr::Compare(_) | Instr::Equals { .. } => {
            frame.pop_n(at, 2)?;
            frame.stack.push(TypeDescriptor::BOOLEAN);
        }
        Instr::Not => {
            frame.pop_primitive(at, Primitive::Bool)?;
            frame.stack.push(TypeDescriptor::BOOLEAN);
        }
        Instr::GetProperty(n) => {
            frame.pop_reference(at)?;
            let descriptor = program
                .members
                .get(*n)
                .map_or(TypeDescriptor::Any, |m| m.member.descriptor().clone());
            frame.stack.push(descriptor);
        }
        Instr::Invoke { method, argc } | Instr::InvokeStatic { method, argc } => {
            frame.pop_n(at, *argc)?;
            if matches!(instr, Instr::Invoke { .. }) {
                frame.pop_reference(at)?;
            }
            let descriptor = program
                .methods
                .get(*method)
                .map_or(TypeDescriptor::Any, |m| m.return_type.clone());
            frame.stack.push(descriptor);
        }
        Instr::ListGet => {
            frame.pop_primitive(at, Primitive::Int)?;
            frame.pop_reference(at)?;
            frame.stack.push(TypeDescriptor::Any);
        }
        Instr::JumpIfTrue(_) | Instr::JumpIfFalse(_) => {
            frame.pop_primitive(at, Primitive::Bool)?;
        }
        Instr::JumpIfPresent(_) => {
            frame.pop(at)?;
        }
        Instr::Jump(_) | Instr::JumpIfNotNull { .. } | Instr::Return => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests;
