//! Evaluation errors.
//!
//! Three layers:
//!
//! - [`UserError`]: raised by host code (a method body, a getter, a
//!   function). Its [`UserErrorKind`] decides whether the interpreter lets it
//!   through untouched or wraps it.
//! - [`AccessError`]: what resolvers, accessors and executors return. `Stale`
//!   and `Failed` are resolution outcomes; `User` means invoked code failed.
//! - [`EvalError`]: what callers of the interpreter see.

use spel_diagnostic::{Diagnostic, SpelMessage};
use spel_ir::Span;

use crate::TypedValue;

/// Result of evaluating a node.
pub type EvalResult = Result<TypedValue, EvalError>;

/// How a [`UserError`] travels out of the interpreter.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UserErrorKind {
    /// Propagated to the caller as-is ([`EvalError::User`]).
    System,
    /// Wrapped in [`EvalError::InvocationTarget`] with the failing call site.
    Application,
}

/// An error raised by host code invoked from an expression.
#[derive(Clone, Eq, PartialEq, Debug, thiserror::Error)]
#[error("{message}")]
pub struct UserError {
    kind: UserErrorKind,
    message: String,
}

impl UserError {
    pub fn system(message: impl Into<String>) -> Self {
        UserError {
            kind: UserErrorKind::System,
            message: message.into(),
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        UserError {
            kind: UserErrorKind::Application,
            message: message.into(),
        }
    }

    #[inline]
    pub fn kind(&self) -> UserErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn is_system(&self) -> bool {
        self.kind == UserErrorKind::System
    }
}

/// Resolver-facing failure.
#[derive(Clone, Debug, thiserror::Error)]
pub enum AccessError {
    /// A cached executor no longer applies to its call site.
    #[error("executor no longer applies")]
    Stale,
    /// The member could not be located or prepared.
    #[error("{0}")]
    Failed(String),
    /// Invoked host code failed.
    #[error(transparent)]
    User(UserError),
    /// A nested evaluation failure (type lookup, conversion) to pass through.
    #[error(transparent)]
    Eval(Box<EvalError>),
}

impl AccessError {
    pub fn failed(message: impl Into<String>) -> Self {
        AccessError::Failed(message.into())
    }
}

impl From<EvalError> for AccessError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::User(user) => AccessError::User(user),
            other => AccessError::Eval(Box::new(other)),
        }
    }
}

impl From<UserError> for AccessError {
    fn from(err: UserError) -> Self {
        AccessError::User(err)
    }
}

/// Evaluation failure, as seen by callers.
#[derive(Clone, Debug, thiserror::Error)]
pub enum EvalError {
    /// An engine error with its message code and position.
    #[error("{diagnostic}")]
    Spel {
        diagnostic: Diagnostic,
        #[source]
        cause: Option<Box<EvalError>>,
    },

    /// A system-level user error, rethrown unwrapped.
    #[error(transparent)]
    User(UserError),

    /// Invoked host code failed with an application-level error.
    #[error("{diagnostic}")]
    InvocationTarget {
        diagnostic: Diagnostic,
        #[source]
        cause: UserError,
    },
}

impl EvalError {
    /// An engine error at `span`. Add inserts with [`with_insert`](Self::with_insert).
    pub fn new(message: SpelMessage, span: Span) -> Self {
        EvalError::Spel {
            diagnostic: Diagnostic::new(message, span),
            cause: None,
        }
    }

    /// An engine error whose position the calling node fills in.
    pub fn unpositioned(message: SpelMessage) -> Self {
        EvalError::new(message, Span::DUMMY)
    }

    #[must_use]
    pub fn with_insert(mut self, insert: impl ToString) -> Self {
        if let Some(diagnostic) = self.diagnostic_mut() {
            diagnostic.inserts.push(insert.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_cause(self, cause: EvalError) -> Self {
        match self {
            EvalError::Spel { diagnostic, .. } => EvalError::Spel {
                diagnostic,
                cause: Some(Box::new(cause)),
            },
            other => other,
        }
    }

    /// Fill in the position of an error raised away from any node.
    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        if let Some(diagnostic) = self.diagnostic_mut() {
            if diagnostic.span == Span::DUMMY {
                diagnostic.span = span;
            }
        }
        self
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            EvalError::Spel { diagnostic, .. } | EvalError::InvocationTarget { diagnostic, .. } => {
                Some(diagnostic)
            }
            EvalError::User(_) => None,
        }
    }

    fn diagnostic_mut(&mut self) -> Option<&mut Diagnostic> {
        match self {
            EvalError::Spel { diagnostic, .. } | EvalError::InvocationTarget { diagnostic, .. } => {
                Some(diagnostic)
            }
            EvalError::User(_) => None,
        }
    }

    pub fn message(&self) -> Option<SpelMessage> {
        self.diagnostic().map(|d| d.message)
    }

    pub fn span(&self) -> Option<Span> {
        self.diagnostic().map(|d| d.span)
    }

    /// The engine error this one wraps, if any.
    pub fn cause(&self) -> Option<&EvalError> {
        match self {
            EvalError::Spel { cause, .. } => cause.as_deref(),
            _ => None,
        }
    }

    /// The host error behind this failure, if invoked code raised it.
    pub fn user_error(&self) -> Option<&UserError> {
        match self {
            EvalError::User(user) | EvalError::InvocationTarget { cause: user, .. } => Some(user),
            EvalError::Spel { cause, .. } => cause.as_deref().and_then(EvalError::user_error),
        }
    }

    /// Route a host error raised while invoking a member.
    ///
    /// System-level errors pass through unchanged; anything else is
    /// reported as `diagnostic` with the host error as its cause.
    pub fn from_user(err: UserError, diagnostic: Diagnostic) -> Self {
        if err.is_system() {
            EvalError::User(err)
        } else {
            EvalError::InvocationTarget {
                diagnostic,
                cause: err,
            }
        }
    }
}
