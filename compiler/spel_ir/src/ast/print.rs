//! AST printer.
//!
//! Produces source text that parses back to a tree printing identically.
//! Every binary, ternary, Elvis and assignment node is parenthesized, so
//! the printer never needs to know precedence.

use std::fmt::Write;

use super::{BinaryOp, Expr, ExprKind, Literal};

/// Render `expr` as expression source.
pub fn to_string_ast(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::Literal(lit) => write_literal(out, lit),
        ExprKind::Compound(parts) => write_compound(out, parts),
        ExprKind::PropertyOrField { name, .. } => out.push_str(name),
        ExprKind::MethodReference { name, args, .. } => {
            out.push_str(name);
            write_args(out, args);
        }
        ExprKind::Indexer { index, .. } => {
            out.push('[');
            write_expr(out, index);
            out.push(']');
        }
        ExprKind::ConstructorReference { type_name, args } => {
            out.push_str("new ");
            out.push_str(type_name);
            write_args(out, args);
        }
        ExprKind::Binary { op, left, right } => {
            out.push('(');
            // A signed base would otherwise take the whole power on reparse.
            if *op == BinaryOp::Power && matches!(left.kind, ExprKind::Unary { .. }) {
                out.push('(');
                write_expr(out, left);
                out.push(')');
            } else {
                write_expr(out, left);
            }
            let _ = write!(out, " {} ", op.as_symbol());
            write_expr(out, right);
            out.push(')');
        }
        ExprKind::Unary { op, operand } => {
            out.push_str(op.as_symbol());
            write_expr(out, operand);
        }
        ExprKind::Ternary {
            condition,
            if_true,
            if_false,
        } => {
            out.push('(');
            write_expr(out, condition);
            out.push_str(" ? ");
            write_expr(out, if_true);
            out.push_str(" : ");
            write_expr(out, if_false);
            out.push(')');
        }
        ExprKind::Elvis { left, right } => {
            out.push('(');
            write_expr(out, left);
            out.push_str(" ?: ");
            write_expr(out, right);
            out.push(')');
        }
        ExprKind::Assign { target, value } => {
            out.push('(');
            write_expr(out, target);
            out.push_str(" = ");
            write_expr(out, value);
            out.push(')');
        }
        ExprKind::Selection {
            kind, predicate, ..
        } => {
            out.push_str(kind.opener());
            write_expr(out, predicate);
            out.push(']');
        }
        ExprKind::Projection { expr, .. } => {
            out.push_str("![");
            write_expr(out, expr);
            out.push(']');
        }
        ExprKind::InlineList(items) => {
            out.push('{');
            write_list(out, items);
            out.push('}');
        }
        ExprKind::InlineMap(entries) => {
            if entries.is_empty() {
                out.push_str("{:}");
                return;
            }
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, key);
                out.push(':');
                write_expr(out, value);
            }
            out.push('}');
        }
        ExprKind::Variable(name) => {
            out.push('#');
            out.push_str(name);
        }
        ExprKind::FunctionReference { name, args } => {
            out.push('#');
            out.push_str(name);
            write_args(out, args);
        }
        ExprKind::TypeReference { type_name } => {
            let _ = write!(out, "T({type_name})");
        }
        ExprKind::BeanReference { name } => {
            out.push('@');
            if is_plain_name(name) {
                out.push_str(name);
            } else {
                write_literal(out, &Literal::Str(name.clone()));
            }
        }
    }
}

fn write_compound(out: &mut String, parts: &[Expr]) {
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            // A leading unary would otherwise capture the whole chain on reparse.
            if matches!(part.kind, ExprKind::Unary { .. }) {
                out.push('(');
                write_expr(out, part);
                out.push(')');
            } else {
                write_expr(out, part);
            }
            continue;
        }
        match &part.kind {
            ExprKind::Indexer { null_safe, .. } => {
                if *null_safe {
                    out.push_str("?.");
                }
            }
            ExprKind::PropertyOrField { null_safe, .. }
            | ExprKind::MethodReference { null_safe, .. }
            | ExprKind::Selection { null_safe, .. }
            | ExprKind::Projection { null_safe, .. } => {
                out.push_str(if *null_safe { "?." } else { "." });
            }
            _ => out.push('.'),
        }
        write_expr(out, part);
    }
}

fn write_args(out: &mut String, args: &[Expr]) {
    out.push('(');
    write_list(out, args);
    out.push(')');
}

fn write_list(out: &mut String, items: &[Expr]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, item);
    }
}

fn write_literal(out: &mut String, lit: &Literal) {
    match lit {
        // Negative values only arise from wrapped hex literals; keep them hex
        // so they survive a reparse.
        Literal::Int(n) if *n < 0 => {
            let _ = write!(out, "0x{n:X}");
        }
        Literal::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Literal::Long(n) if *n < 0 => {
            let _ = write!(out, "0x{n:X}L");
        }
        Literal::Long(n) => {
            let _ = write!(out, "{n}L");
        }
        Literal::Float(f) => {
            let _ = write!(out, "{f:?}f");
        }
        Literal::Double(d) => {
            let _ = write!(out, "{d:?}");
        }
        Literal::Str(s) => {
            out.push('\'');
            out.push_str(&s.replace('\'', "''"));
            out.push('\'');
        }
        Literal::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Literal::Null => out.push_str("null"),
    }
}

/// Whether `name` lexes as a single identifier.
fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
