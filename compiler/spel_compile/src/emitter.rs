//! Instruction emission.
//!
//! Generators append instructions and intern pool entries; [`Emitter::finish`]
//! checks every label was placed and runs the verifier.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use spel_eval::support::PropertyMember;
use spel_eval::types::MethodInfo;
use spel_eval::{TypeDescriptor, TypeInfo, Value};
use spel_ir::Span;

use crate::error::CompileError;
use crate::instr::{Instr, Label};
use crate::program::{MemberRef, Program};
use crate::verify::verify;

const UNPLACED: usize = usize::MAX;

#[derive(Default)]
pub struct Emitter {
    code: Vec<Instr>,
    spans: Vec<Span>,
    labels: Vec<usize>,
    span: Span,
    constants: Vec<(Value, TypeDescriptor)>,
    names: Vec<String>,
    name_index: FxHashMap<String, usize>,
    types: Vec<Arc<TypeInfo>>,
    members: Vec<MemberRef>,
    methods: Vec<Arc<MethodInfo>>,
}

impl Emitter {
    pub fn new() -> Self {
        Emitter::default()
    }

    /// Span attached to instructions emitted from now on. Returns the
    /// previous one.
    pub fn set_span(&mut self, span: Span) -> Span {
        std::mem::replace(&mut self.span, span)
    }

    pub fn emit(&mut self, instr: Instr) {
        self.code.push(instr);
        self.spans.push(self.span);
    }

    pub fn code(&self) -> &[Instr] {
        &self.code
    }

    /// Index of the next instruction.
    #[inline]
    pub fn here(&self) -> usize {
        self.code.len()
    }

    pub fn new_label(&mut self) -> Label {
        self.labels.push(UNPLACED);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the next instruction.
    pub fn place(&mut self, label: Label) {
        if let Some(slot) = self.labels.get_mut(label.0) {
            *slot = self.code.len();
        }
    }

    /// A constant and the descriptor it is pushed as.
    pub fn constant(&mut self, value: Value, descriptor: TypeDescriptor) -> usize {
        self.constants.push((value, descriptor));
        self.constants.len() - 1
    }

    pub fn name(&mut self, name: &str) -> usize {
        if let Some(index) = self.name_index.get(name) {
            return *index;
        }
        self.names.push(name.to_owned());
        let index = self.names.len() - 1;
        self.name_index.insert(name.to_owned(), index);
        index
    }

    pub fn type_ref(&mut self, info: Arc<TypeInfo>) -> usize {
        if let Some(index) = self.types.iter().position(|t| Arc::ptr_eq(t, &info)) {
            return index;
        }
        self.types.push(info);
        self.types.len() - 1
    }

    pub fn member(&mut self, name: &str, member: PropertyMember) -> usize {
        self.members.push(MemberRef {
            name: name.to_owned(),
            member,
        });
        self.members.len() - 1
    }

    pub fn method(&mut self, method: Arc<MethodInfo>) -> usize {
        if let Some(index) = self.methods.iter().position(|m| Arc::ptr_eq(m, &method)) {
            return index;
        }
        self.methods.push(method);
        self.methods.len() - 1
    }

    /// Resolve labels and verify.
    pub fn finish(self, locals: usize) -> Result<Program, CompileError> {
        if let Some(unplaced) = self.labels.iter().position(|pc| *pc == UNPLACED) {
            return Err(CompileError::UnresolvedLabel(unplaced));
        }
        let mut program = Program {
            code: self.code,
            spans: self.spans,
            labels: self.labels,
            constants: self.constants,
            names: self.names,
            types: self.types,
            members: self.members,
            methods: self.methods,
            locals,
            result: TypeDescriptor::Any,
        };
        program.result = verify(&program)?;
        Ok(program)
    }
}
