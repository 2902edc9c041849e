//! Shared types for Rill.
//!
//! This crate defines the AST node types, source spans, diagnostics, and the
//! cancellable execution context used by the lexer, parser, evaluator and
//! type checker.

mod context;
mod error;
mod span;
mod stack;
pub mod ast;

pub use context::Context;
pub use error::{Diagnostics, ErrorCategory, ErrorCode, RillError, MAX_ERRORS};
pub use span::{SourceFile, Span};
pub use stack::ensure_sufficient_stack;
