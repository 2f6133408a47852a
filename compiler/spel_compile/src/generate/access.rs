//! Property reads, method calls and list indexing.

use spel_eval::cache::{CacheSlot, CachedMethodExecutor, CachedPropertyAccessor};
use spel_eval::types::Primitive;
use spel_eval::{NodeKind, SpelNode, TypeDescriptor};

use super::{coerce_checked, exit_of, not_compilable, operand, Compilable};
use crate::code_flow::{box_if_primitive, can_coerce, CodeFlow};
use crate::emitter::Emitter;
use crate::error::CompileError;
use crate::instr::Instr;

/// What a read or call leaves on the stack: the declared type, boxed
/// behind `?.`.
fn produced(declared: &TypeDescriptor, null_safe: bool) -> TypeDescriptor {
    if null_safe {
        declared.to_boxed()
    } else {
        declared.clone()
    }
}

pub(super) fn is_compilable_property(node: &SpelNode) -> bool {
    let NodeKind::Property {
        cache, null_safe, ..
    } = node.kind()
    else {
        return false;
    };
    let (Some(cached), Some(exit)) = (cache.load(), node.exit_descriptor()) else {
        return false;
    };
    let Some(optimal) = cached.get().as_optimal() else {
        return false;
    };
    let member = optimal.member();
    member.is_public() && produced(member.descriptor(), *null_safe) == exit
}

pub(super) fn is_compilable_method(node: &SpelNode) -> bool {
    let NodeKind::Method { cache, .. } = node.kind() else {
        return false;
    };
    let (Some(cached), Some(_)) = (cache.load(), node.exit_descriptor()) else {
        return false;
    };
    let Some(executor) = cached.get().as_reflective() else {
        return false;
    };
    let method = executor.method();
    method.is_public()
        && executor.public_declaring_type().is_some()
        && !executor.did_argument_conversion_occur()
        && method.params.len() == node.children().len()
        && node.children().iter().all(Compilable::is_compilable)
}

pub(super) fn is_compilable_indexer(node: &SpelNode) -> bool {
    let NodeKind::Indexer {
        null_safe,
        indexed_type,
        ..
    } = node.kind()
    else {
        return false;
    };
    let Some(index) = node.child(0) else {
        return false;
    };
    !null_safe
        && indexed_type.load().as_deref() == Some(&TypeDescriptor::List)
        && index.is_compilable()
        && index
            .exit_descriptor()
            .is_some_and(|exit| can_coerce(&exit, &TypeDescriptor::INT))
}

/// Bring the receiver to a reference the member's declaring type accepts.
fn prepare_receiver(
    em: &mut Emitter,
    cf: &mut CodeFlow,
    receiver: TypeDescriptor,
    declaring: &str,
) -> TypeDescriptor {
    let receiver = match receiver {
        // Value-type receivers are parked in a local and reloaded boxed.
        TypeDescriptor::Primitive(kind) => {
            let local = cf.new_local();
            em.emit(Instr::StoreLocal(local));
            em.emit(Instr::LoadLocal(local));
            em.emit(Instr::Box(kind));
            TypeDescriptor::Boxed(kind)
        }
        other => other,
    };
    if receiver.type_name() == Some(declaring) || receiver == TypeDescriptor::Null {
        receiver
    } else {
        let declared = TypeDescriptor::object(declaring);
        em.emit(Instr::CheckCast(declared.clone()));
        declared
    }
}

/// `?.` around a member access. `depth` values sit above the receiver;
/// `access` consumes them and the receiver and leaves `exit`.
fn null_safe_branch(
    em: &mut Emitter,
    depth: usize,
    exit: &TypeDescriptor,
    access: impl FnOnce(&mut Emitter) -> Result<(), CompileError>,
) -> Result<(), CompileError> {
    let call = em.new_label();
    let end = em.new_label();
    em.emit(Instr::JumpIfNotNull {
        depth,
        target: call,
    });
    if depth == 0 {
        em.emit(Instr::Pop);
    } else {
        em.emit(Instr::PopN(depth + 1));
    }
    em.emit(Instr::PushNull);
    em.emit(Instr::CheckCast(exit.clone()));
    em.emit(Instr::Jump(end));
    em.place(call);
    access(em)?;
    em.place(end);
    Ok(())
}

pub(super) fn property(
    node: &SpelNode,
    em: &mut Emitter,
    cf: &mut CodeFlow,
    name: &str,
    null_safe: bool,
    cache: &CacheSlot<CachedPropertyAccessor>,
) -> Result<(), CompileError> {
    let cached = cache.load().ok_or_else(|| not_compilable(node))?;
    let optimal = cached.get().as_optimal().ok_or_else(|| not_compilable(node))?;
    let member = optimal.member().clone();
    let declared = member.descriptor().clone();
    let exit = exit_of(node)?;
    if produced(&declared, null_safe) != exit {
        return Err(not_compilable(node));
    }

    let receiver = cf.load_target(em);
    if member.is_static() {
        // Static members are read off the type itself.
        if receiver != TypeDescriptor::Type {
            return Err(not_compilable(node));
        }
    } else {
        prepare_receiver(em, cf, receiver, member.declaring_type());
    }

    let index = em.member(name, member);
    if null_safe {
        null_safe_branch(em, 0, &exit, |em| {
            em.emit(Instr::GetProperty(index));
            box_if_primitive(em, &declared);
            Ok(())
        })?;
    } else {
        em.emit(Instr::GetProperty(index));
    }
    cf.push_descriptor(exit);
    Ok(())
}

pub(super) fn method(
    node: &SpelNode,
    em: &mut Emitter,
    cf: &mut CodeFlow,
    null_safe: bool,
    cache: &CacheSlot<CachedMethodExecutor>,
) -> Result<(), CompileError> {
    let cached = cache.load().ok_or_else(|| not_compilable(node))?;
    let executor = cached.get().as_reflective().ok_or_else(|| not_compilable(node))?;
    let method = executor.method().clone();
    let public_type = executor
        .public_declaring_type()
        .ok_or_else(|| not_compilable(node))?
        .to_owned();
    let exit = exit_of(node)?;
    let args = node.children();
    if method.params.len() != args.len() {
        return Err(not_compilable(node));
    }

    let receiver = cf.load_target(em);
    let index = em.method(method.clone());
    let argc = args.len();

    if method.is_static {
        // Only a type reference may precede a static call; it is dropped.
        if receiver != TypeDescriptor::Type {
            return Err(not_compilable(node));
        }
        em.emit(Instr::Pop);
        arguments(em, cf, args, &method.params)?;
        em.emit(Instr::InvokeStatic { method: index, argc });
        coerce_checked(em, node, &method.return_type, &exit)?;
        cf.push_descriptor(exit);
        return Ok(());
    }

    prepare_receiver(em, cf, receiver, &public_type);
    // Arguments are evaluated before the receiver is tested for null.
    arguments(em, cf, args, &method.params)?;
    let invoke = |em: &mut Emitter| -> Result<(), CompileError> {
        em.emit(Instr::Invoke { method: index, argc });
        let result = if null_safe {
            box_if_primitive(em, &method.return_type)
        } else {
            method.return_type.clone()
        };
        coerce_checked(em, node, &result, &exit)
    };
    if null_safe {
        null_safe_branch(em, argc, &exit, invoke)?;
    } else {
        invoke(em)?;
    }
    cf.push_descriptor(exit);
    Ok(())
}

fn arguments(
    em: &mut Emitter,
    cf: &mut CodeFlow,
    args: &[SpelNode],
    params: &[TypeDescriptor],
) -> Result<(), CompileError> {
    for (arg, param) in args.iter().zip(params) {
        operand(em, cf, arg, param)?;
    }
    Ok(())
}

pub(super) fn indexer(node: &SpelNode, em: &mut Emitter, cf: &mut CodeFlow) -> Result<(), CompileError> {
    let NodeKind::Indexer {
        null_safe: false, ..
    } = node.kind()
    else {
        return Err(not_compilable(node));
    };
    let index = node.child(0).ok_or_else(|| not_compilable(node))?;
    let receiver = cf.load_target(em);
    if receiver != TypeDescriptor::List {
        em.emit(Instr::CheckCast(TypeDescriptor::List));
    }
    operand(em, cf, index, &TypeDescriptor::Primitive(Primitive::Int))?;
    em.emit(Instr::ListGet);
    cf.push_descriptor(TypeDescriptor::Any);
    Ok(())
}
