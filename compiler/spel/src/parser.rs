//! The parser entry point.

use spel_parse::{parse_expression, ParseError};
use tracing::debug;

use crate::config::SpelParserConfiguration;
use crate::expression::{Expression, SpelExpression};
use crate::template::{split, CompositeStringExpression, LiteralExpression, Part};
use crate::template::{TemplateError, TemplateParserContext};

/// Parses expression text into [`SpelExpression`]s sharing one
/// configuration.
#[derive(Clone, Debug, Default)]
pub struct SpelExpressionParser {
    config: SpelParserConfiguration,
}

impl SpelExpressionParser {
    pub fn new(config: SpelParserConfiguration) -> Self {
        SpelExpressionParser { config }
    }

    pub fn config(&self) -> &SpelParserConfiguration {
        &self.config
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub fn parse_expression(&self, text: &str) -> Result<SpelExpression, ParseError> {
        let expr = parse_expression(text, self.config.max_expression_length)?;
        Ok(SpelExpression::new(text, expr, self.config))
    }

    /// Parse a template: literal text with embedded expressions between the
    /// context's delimiters. A template holding a single part parses to
    /// that part alone.
    #[tracing::instrument(level = "debug", skip(self, context))]
    pub fn parse_template(
        &self,
        text: &str,
        context: &TemplateParserContext,
    ) -> Result<Box<dyn Expression>, TemplateError> {
        let mut parts: Vec<Box<dyn Expression>> = Vec::new();
        for part in split(text, context)? {
            match part {
                Part::Literal(literal) => parts.push(Box::new(LiteralExpression::new(literal))),
                Part::Expression(source, offset) => {
                    let expression = self
                        .parse_expression(source)
                        .map_err(|source| TemplateError::Expression { offset, source })?;
                    parts.push(Box::new(expression));
                }
            }
        }
        debug!(parts = parts.len(), "parsed template");
        if parts.len() > 1 {
            return Ok(Box::new(CompositeStringExpression::new(text, parts)));
        }
        Ok(parts
            .pop()
            .unwrap_or_else(|| Box::new(LiteralExpression::new(""))))
    }
}
