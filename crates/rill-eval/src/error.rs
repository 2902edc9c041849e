//! Errors raised by native built-ins.

use rill_types::{ErrorCode, RillError};
use thiserror::Error;

/// Failure inside a built-in. The evaluator attaches the call-site span.
#[derive(Debug, Error)]
pub enum BuiltinError {
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: usize, got: usize },
    #[error("expected {expected}, got {got}")]
    Type { expected: &'static str, got: String },
    #[error("{0} is not a proper list")]
    ImproperList(String),
    /// Division by zero, overflow and the like.
    #[error("{0}")]
    Failure(String),
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
    /// A nested evaluation (`eval`) failed; passed through unchanged.
    #[error(transparent)]
    Eval(Box<RillError>),
}

impl BuiltinError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Arity { .. } => ErrorCode::WRONG_ARG_COUNT,
            Self::ImproperList(_) => ErrorCode::IMPROPER_LIST,
            Self::Type { .. } | Self::Failure(_) | Self::Io(_) => ErrorCode::BUILTIN_FAILURE,
            Self::Eval(inner) => inner.code,
        }
    }
}

impl From<RillError> for BuiltinError {
    fn from(error: RillError) -> Self {
        Self::Eval(Box::new(error))
    }
}
