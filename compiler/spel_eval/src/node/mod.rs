//! Evaluable node tree.
//!
//! A [`SpelNode`] is lowered once from a syntax [`Expr`] and then evaluated
//! any number of times, possibly from many threads. The only state a node
//! mutates is its own: the exit descriptor recorded by the last evaluation
//! and, for call sites, one cache slot. Both are atomic swaps.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use regex::Regex;
use spel_ir::{BinaryOp, Expr, ExprKind, Literal, SelectionKind, Span, UnaryOp};
use spel_stack::ensure_sufficient_stack;

use crate::cache::{
    CacheSlot, CachedConstructorExecutor, CachedIndexAccessor, CachedMethodExecutor,
    CachedPropertyAccessor,
};
use crate::numeric::negate;
use crate::types::{TypeDescriptor, TypeInfo};
use crate::Value;

/// A regular expression compiled for a `matches` node, with its source.
#[derive(Debug)]
pub struct CachedPattern {
    pub source: String,
    pub regex: Regex,
}

/// Node payloads. Children live on [`SpelNode`], in evaluation order.
#[derive(Debug)]
pub enum NodeKind {
    Literal {
        value: Value,
        descriptor: TypeDescriptor,
    },
    Compound,
    Property {
        name: String,
        null_safe: bool,
        cache: CacheSlot<CachedPropertyAccessor>,
        /// Unboxed member type when a null-safe read boxed it.
        original_primitive_exit: ArcSwapOption<TypeDescriptor>,
    },
    Method {
        name: String,
        null_safe: bool,
        cache: CacheSlot<CachedMethodExecutor>,
        original_primitive_exit: ArcSwapOption<TypeDescriptor>,
    },
    Indexer {
        null_safe: bool,
        cache: CacheSlot<CachedIndexAccessor>,
        /// Descriptor of the last non-null value indexed.
        indexed_type: ArcSwapOption<TypeDescriptor>,
    },
    Constructor {
        type_name: String,
        cache: CacheSlot<CachedConstructorExecutor>,
    },
    Binary {
        op: BinaryOp,
        /// Compiled pattern of a `matches` node.
        pattern: ArcSwapOption<CachedPattern>,
    },
    Unary {
        op: UnaryOp,
    },
    Ternary,
    Elvis,
    Assign,
    Selection {
        kind: SelectionKind,
        null_safe: bool,
    },
    Projection {
        null_safe: bool,
    },
    InlineList {
        /// The list itself, when every element is a literal.
        constant: Option<Value>,
    },
    /// Children alternate key, value.
    InlineMap {
        constant: Option<Value>,
    },
    Variable {
        name: String,
    },
    Function {
        name: String,
    },
    TypeReference {
        type_name: String,
        resolved: ArcSwapOption<TypeInfo>,
    },
    Bean {
        name: String,
    },
}

impl NodeKind {
    pub fn node_name(&self) -> &'static str {
        match self {
            NodeKind::Literal { .. } => "Literal",
            NodeKind::Compound => "CompoundExpression",
            NodeKind::Property { .. } => "PropertyOrFieldReference",
            NodeKind::Method { .. } => "MethodReference",
            NodeKind::Indexer { .. } => "Indexer",
            NodeKind::Constructor { .. } => "ConstructorReference",
            NodeKind::Binary { .. } => "OperatorNode",
            NodeKind::Unary { .. } => "UnaryOperator",
            NodeKind::Ternary => "Ternary",
            NodeKind::Elvis => "Elvis",
            NodeKind::Assign => "Assign",
            NodeKind::Selection { .. } => "Selection",
            NodeKind::Projection { .. } => "Projection",
            NodeKind::InlineList { .. } => "InlineList",
            NodeKind::InlineMap { .. } => "InlineMap",
            NodeKind::Variable { .. } => "VariableReference",
            NodeKind::Function { .. } => "FunctionReference",
            NodeKind::TypeReference { .. } => "TypeReference",
            NodeKind::Bean { .. } => "BeanReference",
        }
    }
}

#[derive(Debug)]
pub struct SpelNode {
    kind: NodeKind,
    span: Span,
    children: Vec<SpelNode>,
    exit: ArcSwapOption<TypeDescriptor>,
}

fn literal_value(literal: &Literal) -> (Value, TypeDescriptor) {
    match literal {
        Literal::Int(n) => (Value::Int(*n), TypeDescriptor::INT),
        Literal::Long(n) => (Value::Long(*n), TypeDescriptor::LONG),
        Literal::Float(n) => (Value::Float(*n), TypeDescriptor::FLOAT),
        Literal::Double(n) => (Value::Double(*n), TypeDescriptor::DOUBLE),
        Literal::Str(s) => (Value::string(s), TypeDescriptor::Str),
        Literal::Bool(b) => (Value::Bool(*b), TypeDescriptor::BOOLEAN),
        Literal::Null => (Value::Null, TypeDescriptor::Null),
    }
}

impl SpelNode {
    /// Lower a syntax tree.
    pub fn lower(expr: &Expr) -> SpelNode {
        ensure_sufficient_stack(|| {
            let children: Vec<SpelNode> = expr.children().into_iter().map(SpelNode::lower).collect();
            let kind = match &expr.kind {
                ExprKind::Literal(literal) => {
                    let (value, descriptor) = literal_value(literal);
                    NodeKind::Literal { value, descriptor }
                }
                ExprKind::Compound(_) => NodeKind::Compound,
                ExprKind::PropertyOrField { name, null_safe } => NodeKind::Property {
                    name: name.clone(),
                    null_safe: *null_safe,
                    cache: CacheSlot::new(),
                    original_primitive_exit: ArcSwapOption::empty(),
                },
                ExprKind::MethodReference {
                    name, null_safe, ..
                } => NodeKind::Method {
                    name: name.clone(),
                    null_safe: *null_safe,
                    cache: CacheSlot::new(),
                    original_primitive_exit: ArcSwapOption::empty(),
                },
                ExprKind::Indexer { null_safe, .. } => NodeKind::Indexer {
                    null_safe: *null_safe,
                    cache: CacheSlot::new(),
                    indexed_type: ArcSwapOption::empty(),
                },
                ExprKind::ConstructorReference { type_name, .. } => NodeKind::Constructor {
                    type_name: type_name.clone(),
                    cache: CacheSlot::new(),
                },
                ExprKind::Binary { op, .. } => NodeKind::Binary {
                    op: *op,
                    pattern: ArcSwapOption::empty(),
                },
                ExprKind::Unary { op, .. } => NodeKind::Unary { op: *op },
                ExprKind::Ternary { .. } => NodeKind::Ternary,
                ExprKind::Elvis { .. } => NodeKind::Elvis,
                ExprKind::Assign { .. } => NodeKind::Assign,
                ExprKind::Selection {
                    kind, null_safe, ..
                } => NodeKind::Selection {
                    kind: *kind,
                    null_safe: *null_safe,
                },
                ExprKind::Projection { null_safe, .. } => NodeKind::Projection {
                    null_safe: *null_safe,
                },
                ExprKind::InlineList(_) => NodeKind::InlineList {
                    constant: constant_list(&children),
                },
                ExprKind::InlineMap(_) => NodeKind::InlineMap {
                    constant: constant_map(&children),
                },
                ExprKind::Variable(name) => NodeKind::Variable { name: name.clone() },
                ExprKind::FunctionReference { name, .. } => NodeKind::Function { name: name.clone() },
                ExprKind::TypeReference { type_name } => NodeKind::TypeReference {
                    type_name: type_name.clone(),
                    resolved: ArcSwapOption::empty(),
                },
                ExprKind::BeanReference { name } => NodeKind::Bean { name: name.clone() },
            };
            // Literals and constant collections know their type before
            // they are ever evaluated.
            let exit = match &kind {
                NodeKind::Literal { descriptor, .. } => Some(Arc::new(descriptor.clone())),
                NodeKind::InlineList { constant: Some(_) } => Some(Arc::new(TypeDescriptor::List)),
                NodeKind::InlineMap { constant: Some(_) } => Some(Arc::new(TypeDescriptor::Map)),
                _ => None,
            };
            SpelNode {
                kind,
                span: expr.span,
                children,
                exit: ArcSwapOption::new(exit),
            }
        })
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    #[inline]
    pub fn children(&self) -> &[SpelNode] {
        &self.children
    }

    #[inline]
    pub fn child(&self, index: usize) -> Option<&SpelNode> {
        self.children.get(index)
    }

    /// Type this node produced on its last evaluation.
    pub fn exit_descriptor(&self) -> Option<TypeDescriptor> {
        self.exit.load_full().map(|d| (*d).clone())
    }

    pub(crate) fn set_exit_descriptor(&self, descriptor: TypeDescriptor) {
        let current = self.exit.load();
        if current.as_deref() != Some(&descriptor) {
            self.exit.store(Some(Arc::new(descriptor)));
        }
    }

    /// Unboxed result type of a null-safe property or method whose exit
    /// descriptor was boxed.
    pub fn original_primitive_exit(&self) -> Option<TypeDescriptor> {
        match &self.kind {
            NodeKind::Property {
                original_primitive_exit,
                ..
            }
            | NodeKind::Method {
                original_primitive_exit,
                ..
            } => original_primitive_exit.load_full().map(|d| (*d).clone()),
            _ => None,
        }
    }

    pub fn is_null_safe(&self) -> bool {
        match &self.kind {
            NodeKind::Property { null_safe, .. }
            | NodeKind::Method { null_safe, .. }
            | NodeKind::Indexer { null_safe, .. }
            | NodeKind::Selection { null_safe, .. }
            | NodeKind::Projection { null_safe } => *null_safe,
            _ => false,
        }
    }

    /// Value of a literal node, folding a sign applied to a numeric literal.
    pub fn literal_value(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::Literal { value, .. } => Some(value.clone()),
            NodeKind::Unary {
                op: UnaryOp::Neg | UnaryOp::Plus,
            } => {
                let operand = self.children.first()?;
                let NodeKind::Literal { value, .. } = &operand.kind else {
                    return None;
                };
                if !value.is_number() {
                    return None;
                }
                match &self.kind {
                    NodeKind::Unary { op: UnaryOp::Neg } => negate(value),
                    _ => Some(value.clone()),
                }
            }
            _ => None,
        }
    }

    /// Literal, or an inline list or map built only from literals.
    fn constant_value(&self) -> Option<Value> {
        match &self.kind {
            NodeKind::InlineList { constant } | NodeKind::InlineMap { constant } => constant.clone(),
            _ => self.literal_value(),
        }
    }

    /// Name of a bare identifier, which inline maps and indexers treat as a
    /// string key.
    pub(crate) fn bare_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Property { name, .. } => Some(name),
            _ => None,
        }
    }
}

fn constant_list(children: &[SpelNode]) -> Option<Value> {
    let items = children
        .iter()
        .map(SpelNode::constant_value)
        .collect::<Option<Vec<_>>>()?;
    Some(Value::frozen_list(items))
}

fn constant_map(children: &[SpelNode]) -> Option<Value> {
    let mut entries = Vec::with_capacity(children.len() / 2);
    for pair in children.chunks(2) {
        let [key, value] = pair else {
            return None;
        };
        let key = match key.bare_name() {
            Some(name) => Value::string(name),
            None => key.constant_value()?,
        };
        entries.push((key, value.constant_value()?));
    }
    Some(Value::frozen_map(entries))
}
