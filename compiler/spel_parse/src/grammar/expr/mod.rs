//! Expression precedence chain.
//!
//! Lowest to highest:
//! 1. assignment `=`, ternary `? :`, Elvis `?:` (all right-nested)
//! 2. `or` / `||`
//! 3. `and` / `&&`
//! 4. relational and equality, `instanceof`, `matches`, `between` (non-associative)
//! 5. `+ -`
//! 6. `* / %`
//! 7. unary `! - +`
//! 8. `^` (right-associative; the exponent may itself be signed)
//! 9. primary with postfix chaining

mod operators;
mod postfix;
mod primary;

use spel_diagnostic::SpelMessage;
use spel_ir::{BinaryOp, Expr, ExprKind, TokenKind, UnaryOp};
use spel_stack::ensure_sufficient_stack;

use crate::{ParseError, Parser};

impl Parser<'_> {
    /// Full expression, including assignment, ternary and Elvis.
    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_expr_inner())
    }

    fn parse_expr_inner(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_or()?;
        match self.cursor.current_kind() {
            TokenKind::Assign => {
                let op_span = self.cursor.advance().span;
                if !is_assignable(&lhs) {
                    return Err(ParseError::new(SpelMessage::NotAssignable, op_span)
                        .with_insert(lhs.kind.node_name()));
                }
                let value = self.parse_expr()?;
                let span = lhs.span.merge(value.span);
                Ok(Expr::new(
                    ExprKind::Assign {
                        target: Box::new(lhs),
                        value: Box::new(value),
                    },
                    span,
                ))
            }
            TokenKind::Elvis => {
                self.cursor.advance();
                let right = self.parse_expr()?;
                let span = lhs.span.merge(right.span);
                Ok(Expr::new(
                    ExprKind::Elvis {
                        left: Box::new(lhs),
                        right: Box::new(right),
                    },
                    span,
                ))
            }
            TokenKind::Question => {
                self.cursor.advance();
                let if_true = self.parse_expr()?;
                self.cursor.expect(&TokenKind::Colon)?;
                let if_false = self.parse_expr()?;
                let span = lhs.span.merge(if_false.span);
                Ok(Expr::new(
                    ExprKind::Ternary {
                        condition: Box::new(lhs),
                        if_true: Box::new(if_true),
                        if_false: Box::new(if_false),
                    },
                    span,
                ))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        while self.cursor.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_relational()?;
        while self.cursor.eat(&TokenKind::And) {
            let right = self.parse_relational()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_additive()?;
        let Some(op) = operators::relational_op(self.cursor.current_kind()) else {
            return Ok(left);
        };
        self.cursor.advance();
        let right = self.parse_additive()?;
        Ok(binary(op, left, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = operators::additive_op(self.cursor.current_kind()) {
            self.cursor.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while let Some(op) = operators::multiplicative_op(self.cursor.current_kind()) {
            self.cursor.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.cursor.current_kind() {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_power(),
        };
        let start = self.cursor.advance().span;
        let operand = ensure_sufficient_stack(|| self.parse_unary())?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_postfix()?;
        if self.cursor.eat(&TokenKind::Caret) {
            let exponent = ensure_sufficient_stack(|| self.parse_unary())?;
            return Ok(binary(BinaryOp::Power, base, exponent));
        }
        Ok(base)
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

/// Nodes that can appear on the left of `=`.
fn is_assignable(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::PropertyOrField { .. } | ExprKind::Indexer { .. } | ExprKind::Variable(_) => {
            true
        }
        ExprKind::Compound(parts) => parts.last().is_some_and(is_assignable),
        _ => false,
    }
}
