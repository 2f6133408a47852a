//! Compile-time failures.
//!
//! None of these reach a caller evaluating an expression: a failed
//! compilation leaves the expression interpreted.

use spel_eval::TypeDescriptor;

/// Why a node tree could not be turned into a program.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
pub enum CompileError {
    /// The node, or something under it, has no compiled form yet.
    #[error("{node} is not compilable")]
    NotCompilable { node: &'static str },

    /// Two paths reach instruction `at` with different stacks.
    #[error("stack shape mismatch at {at}: expected [{}], found [{}]", describe(expected), describe(found))]
    StackShapeMismatch {
        at: usize,
        expected: Vec<TypeDescriptor>,
        found: Vec<TypeDescriptor>,
    },

    /// An operand of the instruction at `at` has the wrong type.
    #[error("operand mismatch at {at}: expected {expected}, found {found}")]
    OperandMismatch {
        at: usize,
        expected: String,
        found: TypeDescriptor,
    },

    #[error("stack underflow at {at}")]
    StackUnderflow { at: usize },

    #[error("label {0} was never placed")]
    UnresolvedLabel(usize),

    /// Only forward jumps are emitted; anything else is a generator bug.
    #[error("jump at {at} does not go forward")]
    BackwardJump { at: usize },

    #[error("local {local} read before it was stored at {at}")]
    UninitializedLocal { at: usize, local: usize },

    /// `Return` must see exactly one value.
    #[error("return at {at} with {depth} values on the stack")]
    BadReturn { at: usize, depth: usize },

    #[error("control falls off the end of the program")]
    FallsOffEnd,
}

fn describe(stack: &[TypeDescriptor]) -> String {
    stack
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
