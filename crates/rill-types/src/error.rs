use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum number of errors the lexer and parser collect before giving up.
pub const MAX_ERRORS: usize = 20;

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Scope,
    Runtime,
    Type,
    Annotation,
}

/// Numeric error code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNCLOSED_PAREN: Self = Self(101);
    pub const INVALID_LITERAL: Self = Self(102);
    pub const INVALID_FORM: Self = Self(103);
    pub const RETURN_OUTSIDE_FUNCTION: Self = Self(104);
    pub const UNTERMINATED_STRING: Self = Self(105);

    // ── Scope errors (E200–E299) ──
    pub const UNDEFINED_SYMBOL: Self = Self(200);
    pub const SYMBOL_REDEFINED: Self = Self(201);
    pub const FUNCTION_REASSIGNED: Self = Self(202);

    // ── Runtime errors (E300–E399) ──
    pub const WRONG_ARG_COUNT: Self = Self(300);
    pub const NOT_CALLABLE: Self = Self(301);
    pub const NON_BOOLEAN_PREDICATE: Self = Self(302);
    pub const IMPROPER_LIST: Self = Self(303);
    pub const BUILTIN_FAILURE: Self = Self(304);
    pub const UNCAUGHT_RETURN: Self = Self(305);
    pub const CANCELLED: Self = Self(306);
    pub const STEP_LIMIT_EXCEEDED: Self = Self(307);
    pub const MALFORMED_LITERAL: Self = Self(308);

    // ── Type errors (E400–E499) ──
    pub const WRONG_ARG_TYPE: Self = Self(400);
    pub const WRONG_RETURN_TYPE: Self = Self(401);
    pub const NO_MATCHING_OVERLOAD: Self = Self(402);
    pub const INVALID_VARIADIC: Self = Self(403);
    pub const NOT_A_FUNCTION_TYPE: Self = Self(404);
    pub const CONDITION_NOT_BOOL: Self = Self(405);
    pub const TYPE_ARITY_MISMATCH: Self = Self(406);

    // ── Annotation errors (E500–E599) ──
    pub const UNKNOWN_TYPE_NAME: Self = Self(500);
    pub const EXPECTED_TOKEN: Self = Self(501);
    pub const MULTIPLE_ANNOTATIONS: Self = Self(502);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            200..=299 => ErrorCategory::Scope,
            300..=399 => ErrorCategory::Runtime,
            400..=499 => ErrorCategory::Type,
            500..=599 => ErrorCategory::Annotation,
            _ => ErrorCategory::Syntax,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Scope => write!(f, "scope"),
            Self::Runtime => write!(f, "runtime"),
            Self::Type => write!(f, "type"),
            Self::Annotation => write!(f, "annotation"),
        }
    }
}

/// A located Rill diagnostic.
///
/// Every failure produced by the lexer, parser, evaluator or type checker is
/// one of these. The engines stop at the first one; the front end collects up
/// to [`MAX_ERRORS`] of them in [`Diagnostics`].
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{file}:{span}: {code} [{category}] {message}")]
pub struct RillError {
    /// Source file name.
    pub file: String,
    /// Error code (e.g., E300).
    pub code: ErrorCode,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Source location of the originating token.
    #[serde(flatten)]
    pub span: Span,
    /// The source line for context, when the source text is at hand.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_line: String,
}

impl RillError {
    /// Create a new error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
        }
    }

    /// Create an error raised from an AST node, where no source text is kept.
    pub fn at(file: impl Into<String>, code: ErrorCode, message: impl Into<String>, span: Span) -> Self {
        Self::new(file, code, message, span, "")
    }
}

/// Errors collected by the front end, or the single error an engine stopped on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<RillError>,
    /// Errors seen, including those dropped past [`MAX_ERRORS`].
    pub total_errors: usize,
}

impl Diagnostics {
    /// Create an empty result (no errors).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Returns `true` once the error cap has been reached.
    pub fn is_full(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: RillError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Append everything collected by another stage.
    pub fn extend(&mut self, other: Diagnostics) {
        let dropped = other.total_errors.saturating_sub(other.errors.len());
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += dropped;
    }
}

impl From<RillError> for Diagnostics {
    fn from(error: RillError) -> Self {
        let mut diagnostics = Self::empty();
        diagnostics.push_error(error);
        diagnostics
    }
}
