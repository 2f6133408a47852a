//! Start nodes: literals, parentheses, references and inline collections.

use spel_diagnostic::SpelMessage;
use spel_ir::{Expr, ExprKind, Literal, SelectionKind, Span, TokenKind};
use tracing::trace;

use crate::{ParseError, Parser};

impl Parser<'_> {
    pub(super) fn parse_start_node(&mut self) -> Result<Expr, ParseError> {
        let token = self.cursor.current();
        trace!(kind = %token.kind.display_name(), "parse_start_node");
        let literal = match &token.kind {
            TokenKind::Int(n) => Some(Literal::Int(*n)),
            TokenKind::Long(n) => Some(Literal::Long(*n)),
            TokenKind::Float(bits) => Some(Literal::Float(f32::from_bits(*bits))),
            TokenKind::Double(bits) => Some(Literal::Double(f64::from_bits(*bits))),
            TokenKind::Str(s) => Some(Literal::Str(s.clone())),
            TokenKind::True => Some(Literal::Bool(true)),
            TokenKind::False => Some(Literal::Bool(false)),
            TokenKind::Null => Some(Literal::Null),
            _ => None,
        };
        if let Some(literal) = literal {
            self.cursor.advance();
            return Ok(Expr::new(ExprKind::Literal(literal), token.span));
        }

        match &token.kind {
            TokenKind::LParen => self.parse_parenthesized(),
            TokenKind::Ident(name) if name == "T" && self.next_is_lparen() => {
                self.parse_type_reference()
            }
            TokenKind::Ident(_) => self.parse_method_or_property(false),
            TokenKind::New => self.parse_constructor(),
            TokenKind::Hash => self.parse_function_or_var(),
            TokenKind::At => self.parse_bean_reference(),
            TokenKind::LBrace => self.parse_inline_collection(),
            TokenKind::LBracket => self.parse_indexer(false),
            TokenKind::SelectAll => self.parse_selection(SelectionKind::All, false),
            TokenKind::SelectFirst => self.parse_selection(SelectionKind::First, false),
            TokenKind::SelectLast => self.parse_selection(SelectionKind::Last, false),
            TokenKind::Project => self.parse_projection(false),
            _ => Err(self.cursor.unexpected("expression")),
        }
    }

    fn next_is_lparen(&self) -> bool {
        matches!(self.cursor.peek_next_kind(), TokenKind::LParen)
    }

    fn parse_parenthesized(&mut self) -> Result<Expr, ParseError> {
        self.cursor.expect(&TokenKind::LParen)?;
        let inner = self.parse_expr()?;
        self.cursor.expect(&TokenKind::RParen)?;
        Ok(inner)
    }

    /// `T(a.b.C)`, with optional `[]` suffixes for array types.
    fn parse_type_reference(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.advance().span;
        self.cursor.expect(&TokenKind::LParen)?;
        let (mut type_name, _) = self.parse_qualified_name()?;
        while self.cursor.eat(&TokenKind::LBracket) {
            self.cursor.expect(&TokenKind::RBracket)?;
            type_name.push_str("[]");
        }
        let close = self.cursor.expect(&TokenKind::RParen)?;
        Ok(Expr::new(
            ExprKind::TypeReference { type_name },
            start.merge(close),
        ))
    }

    /// `new a.b.C(args)`
    fn parse_constructor(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.advance().span;
        let (type_name, name_span) = self.parse_qualified_name()?;
        if !self.cursor.check(&TokenKind::LParen) {
            return Err(ParseError::new(
                SpelMessage::MissingConstructorArgs,
                name_span,
            ));
        }
        let (args, args_span) = self.parse_args()?;
        Ok(Expr::new(
            ExprKind::ConstructorReference { type_name, args },
            start.merge(args_span),
        ))
    }

    /// `#name` or `#name(args)`; the cursor is on `#`.
    pub(super) fn parse_function_or_var(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.advance().span;
        let (name, name_span) = self.cursor.expect_ident()?;
        if self.cursor.check(&TokenKind::LParen) {
            let (args, args_span) = self.parse_args()?;
            return Ok(Expr::new(
                ExprKind::FunctionReference { name, args },
                start.merge(args_span),
            ));
        }
        Ok(Expr::new(ExprKind::Variable(name), start.merge(name_span)))
    }

    /// `@name` or `@'quoted.name'`.
    fn parse_bean_reference(&mut self) -> Result<Expr, ParseError> {
        let start = self.cursor.advance().span;
        let token = self.cursor.current();
        let name = match &token.kind {
            TokenKind::Ident(name) | TokenKind::Str(name) => name.clone(),
            _ => return Err(self.cursor.unexpected("bean name")),
        };
        self.cursor.advance();
        Ok(Expr::new(
            ExprKind::BeanReference { name },
            start.merge(token.span),
        ))
    }

    /// `{}`, `{:}`, `{a, b}` or `{k: v, ...}`.
    fn parse_inline_collection(&mut self) -> Result<Expr, ParseError> {
        let open = self.cursor.expect(&TokenKind::LBrace)?;
        if let Some(close) = self.eat_span(&TokenKind::RBrace) {
            return Ok(Expr::new(ExprKind::InlineList(Vec::new()), open.merge(close)));
        }
        if self.cursor.check(&TokenKind::Colon) {
            self.cursor.advance();
            let close = self.cursor.expect(&TokenKind::RBrace)?;
            return Ok(Expr::new(ExprKind::InlineMap(Vec::new()), open.merge(close)));
        }

        let first = self.parse_expr()?;
        if self.cursor.eat(&TokenKind::Colon) {
            let value = self.parse_expr()?;
            let mut entries = vec![(first, value)];
            while self.cursor.eat(&TokenKind::Comma) {
                let key = self.parse_expr()?;
                self.cursor.expect(&TokenKind::Colon)?;
                let value = self.parse_expr()?;
                entries.push((key, value));
            }
            let close = self.cursor.expect(&TokenKind::RBrace)?;
            return Ok(Expr::new(ExprKind::InlineMap(entries), open.merge(close)));
        }

        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            items.push(self.parse_expr()?);
        }
        let close = self.cursor.expect(&TokenKind::RBrace)?;
        Ok(Expr::new(ExprKind::InlineList(items), open.merge(close)))
    }

    /// `a.b.C` as one dotted string.
    fn parse_qualified_name(&mut self) -> Result<(String, Span), ParseError> {
        let (mut name, mut span) = self.cursor.expect_ident()?;
        while self.cursor.check(&TokenKind::Dot) {
            self.cursor.advance();
            let (part, part_span) = self.cursor.expect_ident()?;
            name.push('.');
            name.push_str(&part);
            span = span.merge(part_span);
        }
        Ok((name, span))
    }
}
