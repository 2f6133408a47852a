//! SpEL - an expression language engine.
//!
//! # Architecture
//!
//! - [`SpelExpressionParser`]: parses plain expressions into
//!   [`SpelExpression`]s and `#{...}` templates into
//!   [`LiteralExpression`]s or [`CompositeStringExpression`]s.
//! - [`SpelExpression`]: evaluation through the interpreter, switching to
//!   the compiled form as the configured [`CompilerMode`] dictates.
//! - [`SpelParserConfiguration`]: compiler mode and length limit, read from
//!   the environment by [`SpelParserConfiguration::from_env`].
//!
//! The pipeline underneath: `spel_lexer` → `spel_parse` (an `Expr` tree) →
//! `spel_eval` (node tree, interpreter, resolvers) → `spel_compile`.
//!
//! ```ignore
//! use spel::{Expression, SpelExpressionParser};
//!
//! let parser = SpelExpressionParser::default();
//! let expr = parser.parse_expression("'Hello' + ' ' + 'World'")?;
//! assert_eq!(expr.get_value_as::<String>()?, "Hello World");
//! ```

mod config;
mod expression;
mod parser;
mod template;

pub use config::{
    CompilerMode, ConfigError, SpelParserConfiguration, COMPILER_MODE_ENV,
    MAX_EXPRESSION_LENGTH_ENV,
};
pub use expression::{
    Expression, SpelExpression, FAILED_ATTEMPTS_THRESHOLD, INTERPRETED_COUNT_THRESHOLD,
};
pub use parser::SpelExpressionParser;
pub use template::{
    CompositeStringExpression, LiteralExpression, TemplateError, TemplateParserContext,
};

pub use spel_compile::{CompilationState, CompiledExpression};
pub use spel_diagnostic::{Diagnostic, SpelMessage};
pub use spel_eval::{
    EvalError, EvaluationContext, FromValue, StandardEvaluationContext, TypeBuilder,
    TypeDescriptor, TypeInfo, TypeRegistry, TypedValue, UserError, Value,
};
pub use spel_parse::ParseError;
