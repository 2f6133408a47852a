//! The instruction set.
//!
//! A program is a flat `Vec<Instr>` over a value stack, with pools for
//! constants, names, types, members and methods. Operands that index a pool
//! are plain `usize`s. Jumps name a [`Label`]; the emitter records where each
//! label was placed.

use spel_eval::types::Primitive;
use spel_eval::TypeDescriptor;
use spel_ir::BinaryOp;

/// A jump target.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label(pub(crate) usize);

#[derive(Clone, PartialEq, Debug)]
pub enum Instr {
    // Loads
    /// Push constant `n`.
    PushConst(usize),
    PushNull,
    /// Push the root object.
    LoadRoot,
    /// Push the variable named by name `n`; null when unset.
    LoadVariable(usize),
    /// Push type `n`.
    LoadType(usize),
    LoadLocal(usize),
    StoreLocal(usize),

    // Stack shuffling
    Dup,
    Pop,
    PopN(usize),

    // Typing
    /// Check that the top of stack conforms to a descriptor. Null passes.
    CheckCast(TypeDescriptor),
    /// Primitive to its boxed form.
    Box(Primitive),
    /// Boxed or untyped value to a primitive. Null fails.
    Unbox(Primitive),
    /// Numeric widening.
    Convert { from: Primitive, to: Primitive },

    // Operators
    /// Arithmetic on two operands already widened to `kind`.
    Arith { op: BinaryOp, kind: Primitive },
    Neg(Primitive),
    Concat,
    /// `<`, `<=`, `>`, `>=`.
    Compare(BinaryOp),
    /// `==`, or `!=` when negated.
    Equals { negate: bool },
    Not,

    // Members
    /// Read member `n` of the receiver.
    GetProperty(usize),
    /// Call method `method` on a receiver below `argc` arguments,
    /// dispatching to the receiver's override.
    Invoke { method: usize, argc: usize },
    /// Call static method `method` with `argc` arguments.
    InvokeStatic { method: usize, argc: usize },
    /// `list[int]`.
    ListGet,

    // Control flow
    Jump(Label),
    /// Pop a boolean, jump when true.
    JumpIfTrue(Label),
    /// Pop a boolean, jump when false.
    JumpIfFalse(Label),
    /// Jump when the value `depth` slots below the top is not null. Pops
    /// nothing.
    JumpIfNotNull { depth: usize, target: Label },
    /// Pop, jump when the value was neither null nor the empty string.
    JumpIfPresent(Label),
    Return,
}

impl Instr {
    /// The label this instruction may jump to.
    pub fn target(&self) -> Option<Label> {
        match self {
            Instr::Jump(label)
            | Instr::JumpIfTrue(label)
            | Instr::JumpIfFalse(label)
            | Instr::JumpIfPresent(label)
            | Instr::JumpIfNotNull { target: label, .. } => Some(*label),
            _ => None,
        }
    }

    /// Whether control never continues to the next instruction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Instr::Jump(_) | Instr::Return)
    }
}
