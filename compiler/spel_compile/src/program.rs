//! A finished, verified program.

use std::fmt;
use std::sync::Arc;

use spel_eval::support::PropertyMember;
use spel_eval::types::MethodInfo;
use spel_eval::{TypeDescriptor, TypeInfo, Value};
use spel_ir::Span;

use crate::instr::{Instr, Label};

/// A property read bound at compile time.
#[derive(Clone, Debug)]
pub struct MemberRef {
    pub name: String,
    pub member: PropertyMember,
}

#[derive(Debug)]
pub struct Program {
    pub(crate) code: Vec<Instr>,
    /// Source span of each instruction, for error reporting.
    pub(crate) spans: Vec<Span>,
    /// Instruction index of each label.
    pub(crate) labels: Vec<usize>,
    pub(crate) constants: Vec<(Value, TypeDescriptor)>,
    pub(crate) names: Vec<String>,
    pub(crate) types: Vec<Arc<TypeInfo>>,
    pub(crate) members: Vec<MemberRef>,
    pub(crate) methods: Vec<Arc<MethodInfo>>,
    pub(crate) locals: usize,
    /// Descriptor of the value left by `Return`.
    pub(crate) result: TypeDescriptor,
}

impl Program {
    pub fn code(&self) -> &[Instr] {
        &self.code
    }

    pub fn result_descriptor(&self) -> &TypeDescriptor {
        &self.result
    }

    #[inline]
    pub(crate) fn resolve(&self, label: Label) -> usize {
        self.labels.get(label.0).copied().unwrap_or(self.code.len())
    }
}

/// One instruction per line, pool operands shown inline.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, instr) in self.code.iter().enumerate() {
            write!(f, "{pc:4}  ")?;
            match instr {
                Instr::PushConst(n) => match self.constants.get(*n) {
                    Some((value, descriptor)) => write!(f, "PushConst {value} as {descriptor}")?,
                    None => write!(f, "PushConst #{n}")?,
                },
                Instr::LoadVariable(n) => match self.names.get(*n) {
                    Some(name) => write!(f, "LoadVariable #{name}")?,
                    None => write!(f, "LoadVariable #{n}")?,
                },
                Instr::LoadType(n) => match self.types.get(*n) {
                    Some(info) => write!(f, "LoadType {}", info.name())?,
                    None => write!(f, "LoadType #{n}")?,
                },
                Instr::GetProperty(n) => match self.members.get(*n) {
                    Some(member) => write!(f, "GetProperty {}", member.name)?,
                    None => write!(f, "GetProperty #{n}")?,
                },
                Instr::Invoke { method, argc } | Instr::InvokeStatic { method, argc } => {
                    let kind = if matches!(instr, Instr::Invoke { .. }) {
                        "Invoke"
                    } else {
                        "InvokeStatic"
                    };
                    match self.methods.get(*method) {
                        Some(info) => write!(f, "{kind} {}.{}", info.declaring_type, info.signature())?,
                        None => write!(f, "{kind} #{method}/{argc}")?,
                    }
                }
                other => match other.target() {
                    Some(label) => {
                        let name = format!("{other:?}");
                        let name = name.split([' ', '(']).next().unwrap_or_default();
                        write!(f, "{name} -> {}", self.resolve(label))?;
                    }
                    None => write!(f, "{other:?}")?,
                },
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
