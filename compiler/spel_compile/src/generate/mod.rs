//! Code generation for evaluated node trees.
//!
//! A node is compilable once interpretation has recorded everything its
//! code depends on: exit descriptors, and for call sites a cached
//! reflective executor. Generation re-reads those records, so it reports
//! [`CompileError::NotCompilable`] if they changed in between.

mod access;
mod operators;

use spel_eval::{NodeKind, SpelNode, TypeDescriptor};
use spel_stack::ensure_sufficient_stack;

use crate::code_flow::{can_coerce, coerce, CodeFlow};
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::instr::Instr;

/// Nodes that can be lowered to instructions.
pub trait Compilable {
    /// Whether this node and everything under it can be compiled in its
    /// current state.
    fn is_compilable(&self) -> bool;

    /// Emit code leaving this node's value on the stack, typed by its exit
    /// descriptor, and record that descriptor in `cf`.
    fn generate_code(&self, em: &mut Emitter, cf: &mut CodeFlow) -> Result<(), CompileError>;
}

pub(crate) fn not_compilable(node: &SpelNode) -> CompileError {
    CompileError::NotCompilable {
        node: node.kind().node_name(),
    }
}

pub(crate) fn exit_of(node: &SpelNode) -> Result<TypeDescriptor, CompileError> {
    node.exit_descriptor().ok_or_else(|| not_compilable(node))
}

pub(crate) fn is_boolean(descriptor: &TypeDescriptor) -> bool {
    descriptor.same_kind(&TypeDescriptor::BOOLEAN)
}

/// Generate `child` in a scope of its own and bring its value to `to`.
pub(crate) fn operand(
    em: &mut Emitter,
    cf: &mut CodeFlow,
    child: &SpelNode,
    to: &TypeDescriptor,
) -> Result<(), CompileError> {
    cf.enter_compilation_scope();
    let generated = child.generate_code(em, cf);
    cf.exit_compilation_scope();
    generated?;
    coerce_checked(em, child, &exit_of(child)?, to)
}

/// [`coerce`], attributed to `node` and refused when impossible.
pub(crate) fn coerce_checked(
    em: &mut Emitter,
    node: &SpelNode,
    from: &TypeDescriptor,
    to: &TypeDescriptor,
) -> Result<(), CompileError> {
    if !can_coerce(from, to) {
        return Err(not_compilable(node));
    }
    let previous = em.set_span(node.span());
    coerce(em, from, to);
    em.set_span(previous);
    Ok(())
}

/// Whether a node may follow another inside a compound, taking the
/// previous step's value as its receiver or discarding it.
fn is_chain_step(node: &SpelNode) -> bool {
    matches!(
        node.kind(),
        NodeKind::Property { .. }
            | NodeKind::Method { .. }
            | NodeKind::Indexer { .. }
            | NodeKind::Variable { .. }
            | NodeKind::TypeReference { .. }
            | NodeKind::Literal { .. }
            | NodeKind::InlineList { .. }
    )
}

fn has_null_safe_step(node: &SpelNode) -> bool {
    node.children().iter().skip(1).any(SpelNode::is_null_safe)
}

/// A chain that can end early on a null-safe step must produce something
/// null can stand in for.
fn is_compilable_compound(node: &SpelNode) -> bool {
    let steps = node.children();
    steps.iter().all(Compilable::is_compilable)
        && steps.iter().skip(1).all(is_chain_step)
        && (!has_null_safe_step(node)
            || steps
                .last()
                .and_then(SpelNode::exit_descriptor)
                .is_some_and(|exit| !exit.is_value_type()))
}

/// Steps run in order, each on the value the previous one left. A
/// null-safe step whose receiver is null skips the rest of the chain, which
/// then yields null typed as the last step's exit.
fn compound(node: &SpelNode, em: &mut Emitter, cf: &mut CodeFlow) -> Result<(), CompileError> {
    let steps = node.children();
    if !has_null_safe_step(node) {
        for step in steps {
            step.generate_code(em, cf)?;
        }
        return Ok(());
    }
    let exit = steps
        .last()
        .and_then(SpelNode::exit_descriptor)
        .filter(|exit| !exit.is_value_type())
        .ok_or_else(|| not_compilable(node))?;
    let end = em.new_label();
    for (i, step) in steps.iter().enumerate() {
        let receiver = cf.last_descriptor().cloned();
        if i > 0 && step.is_null_safe() && receiver.is_some_and(|r| !r.is_value_type()) {
            let next = em.new_label();
            em.emit(Instr::JumpIfNotNull {
                depth: 0,
                target: next,
            });
            em.emit(Instr::Pop);
            em.emit(Instr::PushNull);
            em.emit(Instr::CheckCast(exit.clone()));
            em.emit(Instr::Jump(end));
            em.place(next);
        }
        step.generate_code(em, cf)?;
    }
    em.place(end);
    Ok(())
}

impl Compilable for SpelNode {
    fn is_compilable(&self) -> bool {
        ensure_sufficient_stack(|| match self.kind() {
            NodeKind::Literal { .. } => true,
            NodeKind::Compound => is_compilable_compound(self),
            NodeKind::Variable { .. } => self.exit_descriptor().is_some(),
            NodeKind::TypeReference { resolved, .. } => resolved.load().is_some(),
            NodeKind::InlineList { constant } => constant.is_some(),
            NodeKind::Property { .. } => access::is_compilable_property(self),
            NodeKind::Method { .. } => access::is_compilable_method(self),
            NodeKind::Indexer { .. } => access::is_compilable_indexer(self),
            NodeKind::Binary { op, .. } => operators::is_compilable_binary(self, *op),
            NodeKind::Unary { op } => operators::is_compilable_unary(self, *op),
            NodeKind::Ternary => operators::is_compilable_ternary(self),
            NodeKind::Elvis => operators::is_compilable_elvis(self),
            NodeKind::Constructor { .. }
            | NodeKind::Assign
            | NodeKind::Selection { .. }
            | NodeKind::Projection { .. }
            | NodeKind::InlineMap { .. }
            | NodeKind::Function { .. }
            | NodeKind::Bean { .. } => false,
        })
    }

    fn generate_code(&self, em: &mut Emitter, cf: &mut CodeFlow) -> Result<(), CompileError> {
        ensure_sufficient_stack(|| {
            let previous = em.set_span(self.span());
            let generated = generate(self, em, cf);
            em.set_span(previous);
            generated
        })
    }
}

fn generate(node: &SpelNode, em: &mut Emitter, cf: &mut CodeFlow) -> Result<(), CompileError> {
    match node.kind() {
        NodeKind::Literal { value, descriptor } => {
            cf.discard_target(em);
            let constant = em.constant(value.clone(), descriptor.clone());
            em.emit(Instr::PushConst(constant));
            cf.push_descriptor(descriptor.clone());
            Ok(())
        }
        NodeKind::InlineList {
            constant: Some(list),
        } => {
            cf.discard_target(em);
            let constant = em.constant(list.clone(), TypeDescriptor::List);
            em.emit(Instr::PushConst(constant));
            cf.push_descriptor(TypeDescriptor::List);
            Ok(())
        }
        NodeKind::Compound => compound(node, em, cf),
        NodeKind::Variable { name } => variable(node, em, cf, name),
        NodeKind::TypeReference { resolved, .. } => {
            let info = resolved.load_full().ok_or_else(|| not_compilable(node))?;
            cf.discard_target(em);
            let index = em.type_ref(info);
            em.emit(Instr::LoadType(index));
            cf.push_descriptor(TypeDescriptor::Type);
            Ok(())
        }
        NodeKind::Property {
            name,
            null_safe,
            cache,
            ..
        } => access::property(node, em, cf, name, *null_safe, cache),
        NodeKind::Method {
            null_safe, cache, ..
        } => access::method(node, em, cf, *null_safe, cache),
        NodeKind::Indexer { .. } => access::indexer(node, em, cf),
        NodeKind::Binary { op, .. } => operators::binary(node, em, cf, *op),
        NodeKind::Unary { op } => operators::unary(node, em, cf, *op),
        NodeKind::Ternary => operators::ternary(node, em, cf),
        NodeKind::Elvis => operators::elvis(node, em, cf),
        _ => Err(not_compilable(node)),
    }
}

/// `#this` keeps the receiver; `#root` and named variables replace it.
fn variable(
    node: &SpelNode,
    em: &mut Emitter,
    cf: &mut CodeFlow,
    name: &str,
) -> Result<(), CompileError> {
    let exit = exit_of(node)?;
    let from = match name {
        "this" => cf.load_target(em),
        "root" => {
            cf.discard_target(em);
            em.emit(Instr::LoadRoot);
            TypeDescriptor::Any
        }
        _ => {
            cf.discard_target(em);
            let index = em.name(name);
            em.emit(Instr::LoadVariable(index));
            TypeDescriptor::Any
        }
    };
    coerce_checked(em, node, &from, &exit)?;
    cf.push_descriptor(exit);
    Ok(())
}
