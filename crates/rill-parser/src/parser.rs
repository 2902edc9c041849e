//! Core parser infrastructure: token cursor, error reporting, helpers.

use rill_lexer::token::{Token, TokenKind};
use rill_types::ast::{Ident, Node};
use rill_types::{Diagnostics, ErrorCode, RillError, SourceFile, Span};

/// The Rill parser.
///
/// Consumes a token stream produced by the lexer and builds one AST node per
/// top-level form. Collects errors and recovers at list boundaries.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// Collected errors.
    errors: Diagnostics,
    /// Current lambda nesting depth; `return!` needs at least one.
    pub(crate) lambda_depth: u32,
}

/// Result of parsing.
pub struct ParseResult {
    /// Top-level nodes, in source order.
    pub nodes: Vec<Node>,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::empty(),
            lambda_depth: 0,
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(Span::point(1, 1), |t| t.span)
    }

    /// Advance the cursor by one and return the consumed token's span.
    pub(crate) fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn at_close(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::RParen)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect the `)` closing a list opened at `open`.
    pub(crate) fn expect_close(&mut self, open: Span) -> Option<Span> {
        match self.peek_kind() {
            TokenKind::RParen => Some(self.advance()),
            TokenKind::Eof => {
                self.error_at(ErrorCode::UNCLOSED_PAREN, "unclosed '('", open);
                None
            }
            other => {
                let message = format!("expected ')', got '{other}'");
                self.error_at_current(ErrorCode::INVALID_FORM, message);
                None
            }
        }
    }

    /// Expect a symbol token. Returns it as an identifier.
    pub(crate) fn expect_symbol(&mut self, what: &str) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Symbol(name) => {
                let span = self.advance();
                Some(Ident::new(name, span))
            }
            other => {
                self.error_at_current(
                    ErrorCode::INVALID_FORM,
                    format!("expected {what}, got '{other}'"),
                );
                None
            }
        }
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let error = RillError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(error);
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Current cursor position, for [`Parser::skip_list_at`].
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    /// Skip the whole list whose `(` sits at token index `start`.
    ///
    /// Called after an error inside a list so the next form starts clean,
    /// whether or not the failing form already consumed its `)`.
    pub(crate) fn skip_list_at(&mut self, start: usize) {
        self.pos = start + 1;
        let mut depth = 0u32;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::LParen => depth += 1,
                TokenKind::RParen if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::RParen => depth -= 1,
                _ => {}
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into top-level nodes.
    pub fn parse(mut self) -> ParseResult {
        let mut nodes = Vec::new();
        while !self.at_end() && !self.errors.is_full() {
            if self.at_close() {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unexpected ')'");
                self.advance();
                continue;
            }
            if let Some(node) = self.parse_expr() {
                nodes.push(node);
            }
        }
        ParseResult {
            nodes,
            errors: self.errors,
        }
    }
}
