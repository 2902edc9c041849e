//! Core Rill lexer: converts source text to a token stream.
//!
//! Features:
//! - Parentheses, `'` quote shorthand, `;` line comments
//! - Base-10 integer and float literals (kept as text; the engines convert)
//! - String literals with `\"`, `\\`, `\n`, `\t` escapes
//! - `#t` / `#f` boolean literals
//! - Error recovery: collects up to 20 errors instead of stopping at the first

use rill_types::{Diagnostics, ErrorCode, RillError, SourceFile, Span};

use crate::token::{Token, TokenKind};

/// The Rill lexer.
pub struct Lexer<'src> {
    /// Source characters.
    chars: Vec<char>,
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current index into `chars`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    col: u32,
    /// Collected errors.
    errors: Diagnostics,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// Errors encountered during lexing.
    pub errors: Diagnostics,
}

/// Characters that end an atom.
fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '\'' | '"' | ';')
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            chars: source_file.source.chars().collect(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: Diagnostics::empty(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.is_full() {
                tokens.push(Token::new(TokenKind::Eof, self.current_span()));
                break;
            }
            let Some(token) = self.scan() else {
                continue;
            };
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = RillError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push_error(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    fn skip_trivia(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else if ch == ';' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token. Returns `None` when the input at the cursor was
    /// rejected and skipped.
    fn scan(&mut self) -> Option<Token> {
        self.skip_trivia();
        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.advance() else {
            return Some(Token::new(TokenKind::Eof, self.current_span()));
        };

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '\'' => TokenKind::Quote,
            '"' => return self.scan_string(start_line, start_col),
            _ => return self.scan_atom(ch, start_line, start_col),
        };
        Some(Token::new(kind, self.span_from(start_line, start_col)))
    }

    fn scan_string(&mut self, start_line: u32, start_col: u32) -> Option<Token> {
        let mut text = String::new();
        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "unterminated string literal",
                        span,
                    );
                    return None;
                }
                Some('"') => break,
                Some('\\') => {
                    let escape_line = self.line;
                    let escape_col = self.col - 1;
                    match self.advance() {
                        Some('"') => text.push('"'),
                        Some('\\') => text.push('\\'),
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(other) => {
                            let span = self.span_from(escape_line, escape_col);
                            self.emit_error(
                                ErrorCode::INVALID_LITERAL,
                                format!("unknown escape sequence '\\{other}'"),
                                span,
                            );
                            text.push(other);
                        }
                        None => continue,
                    }
                }
                Some(other) => text.push(other),
            }
        }
        Some(Token::new(
            TokenKind::Str(text),
            self.span_from(start_line, start_col),
        ))
    }

    fn scan_atom(&mut self, first: char, start_line: u32, start_col: u32) -> Option<Token> {
        let mut text = String::from(first);
        while let Some(ch) = self.peek() {
            if is_delimiter(ch) {
                break;
            }
            text.push(ch);
            self.advance();
        }
        let span = self.span_from(start_line, start_col);

        if let Some(rest) = text.strip_prefix('#') {
            return match rest {
                "t" => Some(Token::new(TokenKind::True, span)),
                "f" => Some(Token::new(TokenKind::False, span)),
                _ => {
                    self.emit_error(
                        ErrorCode::INVALID_LITERAL,
                        format!("unknown literal '{text}', expected #t or #f"),
                        span,
                    );
                    None
                }
            };
        }

        match classify_number(&text) {
            Numeric::Int => Some(Token::new(TokenKind::Int(text), span)),
            Numeric::Float => Some(Token::new(TokenKind::Float(text), span)),
            Numeric::Malformed => {
                self.emit_error(
                    ErrorCode::INVALID_LITERAL,
                    format!("malformed number literal '{text}'"),
                    span,
                );
                None
            }
            Numeric::NotANumber => Some(Token::new(TokenKind::Symbol(text), span)),
        }
    }
}

enum Numeric {
    Int,
    Float,
    Malformed,
    NotANumber,
}

/// `-?[0-9]+` is an int, `-?[0-9]+\.[0-9]+` a float. Anything else that
/// starts like a number is malformed; a lone `-` is the subtraction symbol.
fn classify_number(text: &str) -> Numeric {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return Numeric::NotANumber;
    }
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    match digits.split_once('.') {
        None if all_digits(digits) => Numeric::Int,
        Some((whole, frac)) if all_digits(whole) && all_digits(frac) => Numeric::Float,
        _ => Numeric::Malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_number() {
        assert!(matches!(classify_number("42"), Numeric::Int));
        assert!(matches!(classify_number("-42"), Numeric::Int));
        assert!(matches!(classify_number("3.25"), Numeric::Float));
        assert!(matches!(classify_number("1."), Numeric::Malformed));
        assert!(matches!(classify_number("12abc"), Numeric::Malformed));
        assert!(matches!(classify_number("-"), Numeric::NotANumber));
        assert!(matches!(classify_number("->int"), Numeric::NotANumber));
        assert!(matches!(classify_number("x1"), Numeric::NotANumber));
    }
}
