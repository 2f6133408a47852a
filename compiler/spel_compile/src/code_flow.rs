//! Static bookkeeping while generating code.
//!
//! Each compilation scope keeps the descriptors of the values its nodes
//! left behind, last on top. Within a compound each step reads the previous
//! step's descriptor as its receiver; operands and arguments enter a scope
//! of their own and so start with no receiver.

use spel_eval::types::Primitive;
use spel_eval::TypeDescriptor;

use crate::emitter::Emitter;
use crate::instr::Instr;

pub struct CodeFlow {
    scopes: Vec<Vec<TypeDescriptor>>,
    locals: usize,
}

impl Default for CodeFlow {
    fn default() -> Self {
        CodeFlow::new()
    }
}

impl CodeFlow {
    pub fn new() -> Self {
        CodeFlow {
            scopes: vec![Vec::new()],
            locals: 0,
        }
    }

    pub fn enter_compilation_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub fn exit_compilation_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn push_descriptor(&mut self, descriptor: TypeDescriptor) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(descriptor);
        }
    }

    /// Descriptor of the receiver on top of the stack, if this scope has
    /// produced one.
    pub fn last_descriptor(&self) -> Option<&TypeDescriptor> {
        self.scopes.last().and_then(|scope| scope.last())
    }

    /// Make sure a receiver is on the stack, loading the root when this
    /// scope has none. Returns its descriptor.
    pub fn load_target(&mut self, em: &mut Emitter) -> TypeDescriptor {
        match self.last_descriptor() {
            Some(descriptor) => descriptor.clone(),
            None => {
                em.emit(Instr::LoadRoot);
                TypeDescriptor::Any
            }
        }
    }

    /// Drop the receiver a step in a compound would otherwise inherit.
    pub fn discard_target(&self, em: &mut Emitter) {
        if self.last_descriptor().is_some() {
            em.emit(Instr::Pop);
        }
    }

    pub fn new_local(&mut self) -> usize {
        self.locals += 1;
        self.locals - 1
    }

    pub fn locals(&self) -> usize {
        self.locals
    }
}

/// Position in the numeric widening order.
fn rank(kind: Primitive) -> Option<u8> {
    match kind {
        Primitive::Int => Some(0),
        Primitive::Long => Some(1),
        Primitive::Float => Some(2),
        Primitive::Double => Some(3),
        Primitive::Bool | Primitive::Char => None,
    }
}

/// The wider of two numeric kinds.
pub fn widest(a: Primitive, b: Primitive) -> Option<Primitive> {
    Some(if rank(a)? >= rank(b)? { a } else { b })
}

fn widens(from: Primitive, to: Primitive) -> bool {
    from == to || matches!((rank(from), rank(to)), (Some(f), Some(t)) if f <= t)
}

/// Whether a value described by `from` can be brought to `to`.
pub fn can_coerce(from: &TypeDescriptor, to: &TypeDescriptor) -> bool {
    match (from, to) {
        _ if from == to => true,
        (_, TypeDescriptor::Any) => true,
        (TypeDescriptor::Primitive(a), TypeDescriptor::Primitive(b)) => widens(*a, *b),
        (TypeDescriptor::Primitive(a), TypeDescriptor::Boxed(b)) => a == b,
        (TypeDescriptor::Primitive(_), _) => false,
        (TypeDescriptor::Null, TypeDescriptor::Primitive(_)) => false,
        (TypeDescriptor::Boxed(a), TypeDescriptor::Primitive(b)) => widens(*a, *b),
        _ => true,
    }
}

/// Emit whatever turns a `from` value on top of the stack into a `to`
/// value, leaving exactly `to` as far as the verifier is concerned.
/// Callers check [`can_coerce`] first.
pub fn coerce(em: &mut Emitter, from: &TypeDescriptor, to: &TypeDescriptor) {
    if from == to {
        return;
    }
    match (from, to) {
        (TypeDescriptor::Primitive(a), TypeDescriptor::Primitive(b)) => {
            em.emit(Instr::Convert { from: *a, to: *b });
        }
        (TypeDescriptor::Boxed(a), TypeDescriptor::Primitive(b)) => {
            em.emit(Instr::Unbox(*a));
            if a != b {
                em.emit(Instr::Convert { from: *a, to: *b });
            }
        }
        (_, TypeDescriptor::Primitive(b)) => em.emit(Instr::Unbox(*b)),
        (TypeDescriptor::Primitive(p), to) => {
            em.emit(Instr::Box(*p));
            if TypeDescriptor::Boxed(*p) != *to {
                em.emit(Instr::CheckCast(to.clone()));
            }
        }
        (_, to) => em.emit(Instr::CheckCast(to.clone())),
    }
}

/// Box a primitive so it can share a slot with references.
pub fn box_if_primitive(em: &mut Emitter, descriptor: &TypeDescriptor) -> TypeDescriptor {
    match descriptor {
        TypeDescriptor::Primitive(p) => {
            em.emit(Instr::Box(*p));
            TypeDescriptor::Boxed(*p)
        }
        other => other.clone(),
    }
}
