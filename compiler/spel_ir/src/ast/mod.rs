//! Syntax tree.
//!
//! The parser produces a plain owned tree: every [`Expr`] owns its children
//! and its [`Span`]. Nothing here is evaluable; the interpreter lowers an
//! `Expr` into its own node type that carries runtime caches.

mod operators;
mod print;

pub use operators::{BinaryOp, SelectionKind, UnaryOp};
pub use print::to_string_ast;

use crate::Span;

/// Literal values as written in source.
#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Bool(bool),
    Null,
}

/// A syntax node with its source span.
#[derive(Clone, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    #[inline]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    /// Child expressions in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Literal(_)
            | ExprKind::PropertyOrField { .. }
            | ExprKind::Variable(_)
            | ExprKind::TypeReference { .. }
            | ExprKind::BeanReference { .. } => Vec::new(),
            ExprKind::Compound(parts) | ExprKind::InlineList(parts) => parts.iter().collect(),
            ExprKind::MethodReference { args, .. }
            | ExprKind::ConstructorReference { args, .. }
            | ExprKind::FunctionReference { args, .. } => args.iter().collect(),
            ExprKind::Indexer { index, .. } => vec![&**index],
            ExprKind::Binary { left, right, .. }
            | ExprKind::Elvis { left, right }
            | ExprKind::Assign {
                target: left,
                value: right,
            } => vec![&**left, &**right],
            ExprKind::Unary { operand, .. } => vec![&**operand],
            ExprKind::Ternary {
                condition,
                if_true,
                if_false,
            } => vec![&**condition, &**if_true, &**if_false],
            ExprKind::Selection { predicate, .. } => vec![&**predicate],
            ExprKind::Projection { expr, .. } => vec![&**expr],
            ExprKind::InlineMap(entries) => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
        }
    }

    /// Whether this node is a literal (including a signed numeric literal).
    pub fn is_literal(&self) -> bool {
        match &self.kind {
            ExprKind::Literal(_) => true,
            ExprKind::Unary {
                op: UnaryOp::Neg | UnaryOp::Plus,
                operand,
            } => matches!(
                operand.kind,
                ExprKind::Literal(
                    Literal::Int(_) | Literal::Long(_) | Literal::Float(_) | Literal::Double(_)
                )
            ),
            _ => false,
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    Literal(Literal),

    /// `a.b.c()[0]`: steps evaluated left to right, each against the
    /// previous step's value.
    Compound(Vec<Expr>),

    /// `name` / `?.name`
    PropertyOrField { name: String, null_safe: bool },

    /// `name(args)` / `?.name(args)`
    MethodReference {
        name: String,
        null_safe: bool,
        args: Vec<Expr>,
    },

    /// `[index]` / `?.[index]`
    Indexer { index: Box<Expr>, null_safe: bool },

    /// `new a.b.Type(args)`
    ConstructorReference { type_name: String, args: Vec<Expr> },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    Unary { op: UnaryOp, operand: Box<Expr> },

    /// `condition ? if_true : if_false`
    Ternary {
        condition: Box<Expr>,
        if_true: Box<Expr>,
        if_false: Box<Expr>,
    },

    /// `left ?: right`
    Elvis { left: Box<Expr>, right: Box<Expr> },

    /// `target = value`
    Assign { target: Box<Expr>, value: Box<Expr> },

    /// `.?[predicate]`, `.^[predicate]`, `.$[predicate]`
    Selection {
        kind: SelectionKind,
        predicate: Box<Expr>,
        null_safe: bool,
    },

    /// `.![expr]`
    Projection { expr: Box<Expr>, null_safe: bool },

    /// `{a, b, c}`
    InlineList(Vec<Expr>),

    /// `{k: v, ...}`; `{:}` is the empty map.
    InlineMap(Vec<(Expr, Expr)>),

    /// `#name`, including `#this` and `#root`.
    Variable(String),

    /// `#name(args)`
    FunctionReference { name: String, args: Vec<Expr> },

    /// `T(a.b.Type)`
    TypeReference { type_name: String },

    /// `@name`
    BeanReference { name: String },
}

impl ExprKind {
    /// Short node name used in logs and diagnostics.
    pub fn node_name(&self) -> &'static str {
        match self {
            ExprKind::Literal(_) => "Literal",
            ExprKind::Compound(_) => "CompoundExpression",
            ExprKind::PropertyOrField { .. } => "PropertyOrFieldReference",
            ExprKind::MethodReference { .. } => "MethodReference",
            ExprKind::Indexer { .. } => "Indexer",
            ExprKind::ConstructorReference { .. } => "ConstructorReference",
            ExprKind::Binary { .. } => "OperatorNode",
            ExprKind::Unary { .. } => "UnaryOperator",
            ExprKind::Ternary { .. } => "Ternary",
            ExprKind::Elvis { .. } => "Elvis",
            ExprKind::Assign { .. } => "Assign",
            ExprKind::Selection { .. } => "Selection",
            ExprKind::Projection { .. } => "Projection",
            ExprKind::InlineList(_) => "InlineList",
            ExprKind::InlineMap(_) => "InlineMap",
            ExprKind::Variable(_) => "VariableReference",
            ExprKind::FunctionReference { .. } => "FunctionReference",
            ExprKind::TypeReference { .. } => "TypeReference",
            ExprKind::BeanReference { .. } => "BeanReference",
        }
    }
}
