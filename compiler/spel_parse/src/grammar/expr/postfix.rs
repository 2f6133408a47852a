//! Postfix chains: `.name`, `?.name(args)`, `[index]`, `.?[..]`, `.![..]`.
//!
//! A start node followed by one or more steps becomes a single
//! `Compound` node; a lone start node is returned as-is.

use spel_diagnostic::SpelMessage;
use spel_ir::{Expr, ExprKind, SelectionKind, TokenKind};

use crate::{token_text, ParseError, Parser};

impl Parser<'_> {
    pub(super) fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let start = self.parse_start_node()?;
        let mut steps = Vec::new();
        while let Some(step) = self.parse_step()? {
            steps.push(step);
        }
        if steps.is_empty() {
            return Ok(start);
        }
        let span = steps
            .iter()
            .fold(start.span, |span, step| span.merge(step.span));
        steps.insert(0, start);
        Ok(Expr::new(ExprKind::Compound(steps), span))
    }

    fn parse_step(&mut self) -> Result<Option<Expr>, ParseError> {
        match self.cursor.current_kind() {
            TokenKind::Dot | TokenKind::SafeNav => {
                let null_safe = matches!(self.cursor.advance().kind, TokenKind::SafeNav);
                self.parse_dotted(null_safe).map(Some)
            }
            TokenKind::LBracket => self.parse_indexer(false).map(Some),
            _ => Ok(None),
        }
    }

    fn parse_dotted(&mut self, null_safe: bool) -> Result<Expr, ParseError> {
        match self.cursor.current_kind() {
            TokenKind::Ident(_) => self.parse_method_or_property(null_safe),
            TokenKind::Hash => self.parse_function_or_var(),
            TokenKind::SelectAll => self.parse_selection(SelectionKind::All, null_safe),
            TokenKind::SelectFirst => self.parse_selection(SelectionKind::First, null_safe),
            TokenKind::SelectLast => self.parse_selection(SelectionKind::Last, null_safe),
            TokenKind::Project => self.parse_projection(null_safe),
            TokenKind::LBracket if null_safe => self.parse_indexer(true),
            TokenKind::Eof => Err(ParseError::new(
                SpelMessage::Ood,
                self.cursor.current_span(),
            )),
            other => Err(
                ParseError::new(SpelMessage::UnexpectedDataAfterDot, self.cursor.current_span())
                    .with_insert(token_text(other)),
            ),
        }
    }

    /// `name` or `name(args)`.
    pub(super) fn parse_method_or_property(&mut self, null_safe: bool) -> Result<Expr, ParseError> {
        let (name, name_span) = self.cursor.expect_ident()?;
        if self.cursor.check(&TokenKind::LParen) {
            let (args, args_span) = self.parse_args()?;
            return Ok(Expr::new(
                ExprKind::MethodReference {
                    name,
                    null_safe,
                    args,
                },
                name_span.merge(args_span),
            ));
        }
        Ok(Expr::new(
            ExprKind::PropertyOrField { name, null_safe },
            name_span,
        ))
    }

    /// `[index]`; the cursor is on `[`.
    pub(super) fn parse_indexer(&mut self, null_safe: bool) -> Result<Expr, ParseError> {
        let open = self.cursor.expect(&TokenKind::LBracket)?;
        let index = self.parse_expr()?;
        let close = self.cursor.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::Indexer {
                index: Box::new(index),
                null_safe,
            },
            open.merge(close),
        ))
    }

    /// `?[pred]`, `^[pred]`, `$[pred]`; the cursor is on the opener.
    pub(super) fn parse_selection(
        &mut self,
        kind: SelectionKind,
        null_safe: bool,
    ) -> Result<Expr, ParseError> {
        let open = self.cursor.advance().span;
        if self.cursor.check(&TokenKind::RBracket) {
            return Err(ParseError::new(
                SpelMessage::MissingSelectionExpression,
                self.cursor.current_span(),
            ));
        }
        let predicate = self.parse_expr()?;
        let close = self.cursor.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::Selection {
                kind,
                predicate: Box::new(predicate),
                null_safe,
            },
            open.merge(close),
        ))
    }

    /// `![expr]`; the cursor is on the opener.
    pub(super) fn parse_projection(&mut self, null_safe: bool) -> Result<Expr, ParseError> {
        let open = self.cursor.advance().span;
        let expr = self.parse_expr()?;
        let close = self.cursor.expect(&TokenKind::RBracket)?;
        Ok(Expr::new(
            ExprKind::Projection {
                expr: Box::new(expr),
                null_safe,
            },
            open.merge(close),
        ))
    }

    /// Parenthesized argument list; the cursor is on `(`.
    pub(super) fn parse_args(&mut self) -> Result<(Vec<Expr>, spel_ir::Span), ParseError> {
        let open = self.cursor.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if let Some(close) = self.eat_span(&TokenKind::RParen) {
            return Ok((args, open.merge(close)));
        }
        loop {
            if self.cursor.is_at_end() {
                return Err(self.run_out_of_arguments());
            }
            args.push(self.parse_expr()?);
            match self.cursor.current_kind() {
                TokenKind::Comma => {
                    self.cursor.advance();
                }
                TokenKind::RParen => {
                    let close = self.cursor.advance().span;
                    return Ok((args, open.merge(close)));
                }
                TokenKind::Eof => return Err(self.run_out_of_arguments()),
                _ => return Err(self.cursor.unexpected(")")),
            }
        }
    }

    fn run_out_of_arguments(&self) -> ParseError {
        ParseError::new(SpelMessage::RunOutOfArguments, self.cursor.current_span())
    }

    pub(super) fn eat_span(&mut self, kind: &TokenKind) -> Option<spel_ir::Span> {
        if self.cursor.check(kind) {
            Some(self.cursor.advance().span)
        } else {
            None
        }
    }
}
