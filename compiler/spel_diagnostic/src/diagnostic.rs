use std::fmt;

use spel_ir::Span;

use crate::SpelMessage;

/// A positioned, formatted message.
///
/// Displays as `EL1044E: (pos 7): Unexpectedly ran out of input`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Diagnostic {
    pub message: SpelMessage,
    pub span: Span,
    pub inserts: Vec<String>,
}

impl Diagnostic {
    pub fn new(message: SpelMessage, span: Span) -> Self {
        Diagnostic {
            message,
            span,
            inserts: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_insert(mut self, insert: impl ToString) -> Self {
        self.inserts.push(insert.to_string());
        self
    }

    #[must_use]
    pub fn with_inserts<I, S>(mut self, inserts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.inserts
            .extend(inserts.into_iter().map(|insert| insert.to_string()));
        self
    }

    /// Message text without code or position.
    pub fn text(&self) -> String {
        self.message.format(&self.inserts)
    }

    #[inline]
    pub fn code(&self) -> &'static str {
        self.message.code()
    }

    #[inline]
    pub fn position(&self) -> u32 {
        self.span.start
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: (pos {}): {}",
            self.message.code(),
            self.span.start,
            self.text()
        )
    }
}

impl std::error::Error for Diagnostic {}
