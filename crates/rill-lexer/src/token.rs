//! Token types for the Rill lexer.
//!
//! Rill's surface syntax is s-expressions, so the token set is small:
//! parentheses, the quote mark, literals, and symbols.

use rill_types::Span;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the Rill lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the Rill language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `'`, shorthand for `(quote ...)`
    Quote,

    /// Base-10 integer literal, kept as text: `42`, `-7`
    Int(String),
    /// Base-10 float literal, kept as text: `3.14`, `-0.5`
    Float(String),
    /// String literal with escapes resolved.
    Str(String),
    /// `#t`
    True,
    /// `#f`
    False,

    /// Any other atom: `define`, `+`, `null?`, `set!`
    Symbol(String),

    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Quote => f.write_str("'"),
            TokenKind::Int(text) | TokenKind::Float(text) => f.write_str(text),
            TokenKind::Str(s) => write!(f, "\"{s}\""),
            TokenKind::True => f.write_str("#t"),
            TokenKind::False => f.write_str("#f"),
            TokenKind::Symbol(name) => f.write_str(name),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}
