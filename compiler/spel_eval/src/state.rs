//! Per-evaluation state.
//!
//! An [`ExpressionState`] lives for one `get_value` call. It tracks the
//! active context object (what `#this` and unqualified names resolve
//! against) and the scope root (what method arguments are evaluated
//! against). Both stacks are only pushed through RAII guards, so every push
//! is undone on all exit paths, error returns included.

use std::ops::{Deref, DerefMut};

use crate::context::EvaluationContext;
use crate::{TypedValue, Value};

pub struct ExpressionState<'a> {
    context: &'a dyn EvaluationContext,
    root: TypedValue,
    active: Vec<TypedValue>,
    scope_roots: Vec<TypedValue>,
}

impl<'a> ExpressionState<'a> {
    /// State rooted at the context's root object.
    pub fn new(context: &'a dyn EvaluationContext) -> Self {
        let root = context.root_object();
        ExpressionState::with_root(context, root)
    }

    /// State rooted at `root`, overriding the context's root object.
    pub fn with_root(context: &'a dyn EvaluationContext, root: TypedValue) -> Self {
        ExpressionState {
            context,
            root,
            active: Vec::new(),
            scope_roots: Vec::new(),
        }
    }

    #[inline]
    pub fn context(&self) -> &'a dyn EvaluationContext {
        self.context
    }

    #[inline]
    pub fn root(&self) -> &TypedValue {
        &self.root
    }

    /// `#this`: the innermost pushed object, or the root.
    pub fn active_context_object(&self) -> &TypedValue {
        self.active.last().unwrap_or(&self.root)
    }

    /// Object method arguments are evaluated against.
    pub fn scope_root(&self) -> &TypedValue {
        self.scope_roots.last().unwrap_or(&self.root)
    }

    /// Make `value` the active context object until the guard drops.
    pub fn push_active(&mut self, value: TypedValue) -> ActiveGuard<'_, 'a> {
        let depth = self.active.len();
        self.active.push(value);
        ActiveGuard { state: self, depth }
    }

    /// Open a scope around `value`: it becomes both the active context
    /// object and the scope root until the guard drops.
    pub fn enter_scope(&mut self, value: TypedValue) -> ScopeGuard<'_, 'a> {
        let active_depth = self.active.len();
        let scope_depth = self.scope_roots.len();
        self.active.push(value.clone());
        self.scope_roots.push(value);
        ScopeGuard {
            state: self,
            active_depth,
            scope_depth,
        }
    }

    /// Variable lookup, with `#this` and `#root` resolved from the state.
    pub fn lookup_variable(&self, name: &str) -> TypedValue {
        match name {
            "this" => self.active_context_object().clone(),
            "root" => self.root.clone(),
            _ => self
                .context
                .lookup_variable(name)
                .map_or(TypedValue::NULL, TypedValue::new),
        }
    }

    pub fn set_variable(&self, name: &str, value: Value) {
        self.context.set_variable(name, value);
    }
}

/// Pops the active context object on drop.
pub struct ActiveGuard<'g, 'a> {
    state: &'g mut ExpressionState<'a>,
    depth: usize,
}

impl Drop for ActiveGuard<'_, '_> {
    fn drop(&mut self) {
        self.state.active.truncate(self.depth);
    }
}

impl<'a> Deref for ActiveGuard<'_, 'a> {
    type Target = ExpressionState<'a>;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for ActiveGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}

/// Closes a scope on drop.
pub struct ScopeGuard<'g, 'a> {
    state: &'g mut ExpressionState<'a>,
    active_depth: usize,
    scope_depth: usize,
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        self.state.active.truncate(self.active_depth);
        self.state.scope_roots.truncate(self.scope_depth);
    }
}

impl<'a> Deref for ScopeGuard<'_, 'a> {
    type Target = ExpressionState<'a>;

    fn deref(&self) -> &Self::Target {
        self.state
    }
}

impl DerefMut for ScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.state
    }
}
