//! Expression and special-form parsing.
//!
//! ```text
//! Expr   = Atom | "'" Expr | "(" ")" | "(" Form ")" | "(" Expr Expr* ")"
//! Form   = "begin" Expr*
//!        | "if" Expr Expr Expr?
//!        | "cond" ("(" Expr Expr* ")")* ("(" "else" Expr* ")")?
//!        | "while" Expr Expr*
//!        | "define" Symbol Expr
//!        | "set!" Symbol Expr
//!        | "lambda" "(" Symbol* ")" String? Expr*
//!        | "quote" Expr
//!        | "return!" Expr?
//! ```
//!
//! Missing `else` branches become `()`. Bodies with several forms are wrapped
//! in a block.

use std::collections::HashSet;
use std::rc::Rc;

use rill_lexer::token::TokenKind;
use rill_types::ast::*;
use rill_types::{ensure_sufficient_stack, ErrorCode, Span};

use crate::parser::Parser;

/// Wrap a body into a single node: `()` when empty, the node itself when
/// alone, a block otherwise.
fn body_node(mut forms: Vec<Node>, span: Span) -> Node {
    match forms.len() {
        0 => Node::new(NodeKind::Unit, span),
        1 => forms.remove(0),
        _ => Node::new(NodeKind::Block(forms), span),
    }
}

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse one expression.
    pub(crate) fn parse_expr(&mut self) -> Option<Node> {
        ensure_sufficient_stack(|| self.parse_expr_inner())
    }

    fn parse_expr_inner(&mut self) -> Option<Node> {
        let span = self.current_span();
        let kind = match self.peek_kind().clone() {
            TokenKind::LParen => return self.parse_list(),
            TokenKind::Quote => {
                self.advance();
                let inner = self.parse_expr()?;
                let span = span.merge(inner.span);
                return Some(Node::new(NodeKind::Quote(Rc::new(inner)), span));
            }
            TokenKind::Int(text) => NodeKind::Int(text),
            TokenKind::Float(text) => NodeKind::Float64(text),
            TokenKind::Str(s) => NodeKind::String(s),
            TokenKind::True => NodeKind::True,
            TokenKind::False => NodeKind::False,
            TokenKind::Symbol(name) => NodeKind::Symbol(name),
            TokenKind::RParen => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unexpected ')'");
                return None;
            }
            TokenKind::Eof => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "unexpected end of file");
                return None;
            }
        };
        self.advance();
        Some(Node::new(kind, span))
    }

    /// Parse a parenthesised list. On failure the rest of the list is skipped.
    fn parse_list(&mut self) -> Option<Node> {
        let start = self.position();
        let open = self.advance();
        let node = self.parse_list_body(open);
        if node.is_none() {
            self.skip_list_at(start);
        }
        node
    }

    fn parse_list_body(&mut self, open: Span) -> Option<Node> {
        if self.at_close() {
            let close = self.advance();
            return Some(Node::new(NodeKind::Unit, open.merge(close)));
        }
        let form = match self.peek_kind() {
            TokenKind::Symbol(name) => Some(name.clone()),
            _ => None,
        };
        match form.as_deref() {
            Some("begin") => {
                self.advance();
                let (forms, close) = self.parse_forms_until_close(open)?;
                Some(Node::new(NodeKind::Block(forms), open.merge(close)))
            }
            Some("if") => {
                self.advance();
                self.parse_if(open)
            }
            Some("cond") => {
                self.advance();
                self.parse_cond(open)
            }
            Some("while") => {
                self.advance();
                self.parse_while(open)
            }
            Some("define") => {
                self.advance();
                self.parse_binding(open, false)
            }
            Some("set!") => {
                self.advance();
                self.parse_binding(open, true)
            }
            Some("lambda") => {
                self.advance();
                self.parse_lambda(open)
            }
            Some("quote") => {
                self.advance();
                let inner = self.parse_expr()?;
                let close = self.expect_close(open)?;
                Some(Node::new(NodeKind::Quote(Rc::new(inner)), open.merge(close)))
            }
            Some("return!") => {
                let keyword = self.advance();
                self.parse_return(open, keyword)
            }
            _ => self.parse_call(open),
        }
    }

    /// Parse expressions until the closing `)` of the list opened at `open`.
    fn parse_forms_until_close(&mut self, open: Span) -> Option<(Vec<Node>, Span)> {
        let mut forms = Vec::new();
        while !self.at_close() {
            if self.at_end() {
                self.error_at(ErrorCode::UNCLOSED_PAREN, "unclosed '('", open);
                return None;
            }
            forms.push(self.parse_expr()?);
        }
        let close = self.advance();
        Some((forms, close))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Forms
    // ══════════════════════════════════════════════════════════════════════════

    fn parse_call(&mut self, open: Span) -> Option<Node> {
        let callee = self.parse_expr()?;
        let (args, close) = self.parse_forms_until_close(open)?;
        Some(Node::new(
            NodeKind::Call {
                callee: Box::new(callee),
                args,
            },
            open.merge(close),
        ))
    }

    /// `(if p t e?)`
    fn parse_if(&mut self, open: Span) -> Option<Node> {
        let (mut parts, close) = self.parse_forms_until_close(open)?;
        let span = open.merge(close);
        if !(2..=3).contains(&parts.len()) {
            self.error_at(
                ErrorCode::INVALID_FORM,
                format!("'if' takes 2 or 3 expressions, got {}", parts.len()),
                span,
            );
            return None;
        }
        let otherwise = if parts.len() == 3 {
            parts.pop()?
        } else {
            Node::new(NodeKind::Unit, close)
        };
        let body = parts.pop()?;
        let predicate = parts.pop()?;
        Some(Node::new(
            NodeKind::Conditional {
                cases: vec![Case { predicate, body }],
                otherwise: Box::new(otherwise),
            },
            span,
        ))
    }

    /// `(cond (p e...)... (else e...)?)`
    fn parse_cond(&mut self, open: Span) -> Option<Node> {
        let mut cases = Vec::new();
        let mut otherwise = None;
        while !self.at_close() {
            if self.at_end() {
                self.error_at(ErrorCode::UNCLOSED_PAREN, "unclosed '('", open);
                return None;
            }
            if otherwise.is_some() {
                self.error_at_current(ErrorCode::INVALID_FORM, "'else' must be the last clause");
                return None;
            }
            if !matches!(self.peek_kind(), TokenKind::LParen) {
                self.error_at_current(
                    ErrorCode::INVALID_FORM,
                    format!("expected a cond clause, got '{}'", self.peek_kind()),
                );
                return None;
            }
            let clause_open = self.advance();
            if matches!(self.peek_kind(), TokenKind::Symbol(s) if s == "else") {
                self.advance();
                let (forms, close) = self.parse_forms_until_close(clause_open)?;
                otherwise = Some(body_node(forms, clause_open.merge(close)));
                continue;
            }
            let (mut forms, close) = self.parse_forms_until_close(clause_open)?;
            if forms.is_empty() {
                self.error_at(
                    ErrorCode::INVALID_FORM,
                    "empty cond clause",
                    clause_open.merge(close),
                );
                return None;
            }
            let predicate = forms.remove(0);
            let body = body_node(forms, clause_open.merge(close));
            cases.push(Case { predicate, body });
        }
        let close = self.advance();
        let span = open.merge(close);
        if cases.is_empty() {
            // `(cond (else e))` and `(cond)` have only the fallback.
            return Some(otherwise.unwrap_or_else(|| Node::new(NodeKind::Unit, span)));
        }
        Some(Node::new(
            NodeKind::Conditional {
                cases,
                otherwise: Box::new(otherwise.unwrap_or_else(|| Node::new(NodeKind::Unit, close))),
            },
            span,
        ))
    }

    /// `(while p body...)`
    fn parse_while(&mut self, open: Span) -> Option<Node> {
        let (mut forms, close) = self.parse_forms_until_close(open)?;
        let span = open.merge(close);
        if forms.is_empty() {
            self.error_at(ErrorCode::INVALID_FORM, "'while' needs a predicate", span);
            return None;
        }
        let predicate = forms.remove(0);
        let body = body_node(forms, span);
        Some(Node::new(
            NodeKind::While {
                predicate: Box::new(predicate),
                body: Box::new(body),
            },
            span,
        ))
    }

    /// `(define name value)` / `(set! name value)`
    fn parse_binding(&mut self, open: Span, is_set: bool) -> Option<Node> {
        let keyword = if is_set { "set!" } else { "define" };
        let name = self.expect_symbol(&format!("a symbol after '{keyword}'"))?;
        if self.at_close() {
            self.error_at_current(
                ErrorCode::INVALID_FORM,
                format!("'{keyword}' needs a value for '{}'", name.name),
            );
            return None;
        }
        let value = Box::new(self.parse_expr()?);
        let close = self.expect_close(open)?;
        let kind = if is_set {
            NodeKind::Set { name, value }
        } else {
            NodeKind::Define { name, value }
        };
        Some(Node::new(kind, open.merge(close)))
    }

    /// `(lambda (params...) "doc"? body...)`
    fn parse_lambda(&mut self, open: Span) -> Option<Node> {
        if !matches!(self.peek_kind(), TokenKind::LParen) {
            self.error_at_current(
                ErrorCode::INVALID_FORM,
                format!("expected parameter list, got '{}'", self.peek_kind()),
            );
            return None;
        }
        let params_open = self.advance();
        let mut params: Vec<Ident> = Vec::new();
        let mut seen = HashSet::new();
        while !self.at_close() {
            if self.at_end() {
                self.error_at(ErrorCode::UNCLOSED_PAREN, "unclosed '('", params_open);
                return None;
            }
            let param = self.expect_symbol("a parameter name")?;
            if !seen.insert(param.name.clone()) {
                self.error_at(
                    ErrorCode::INVALID_FORM,
                    format!("duplicate parameter '{}'", param.name),
                    param.span,
                );
                return None;
            }
            params.push(param);
        }
        self.advance();

        self.lambda_depth += 1;
        let body = self.parse_forms_until_close(open);
        self.lambda_depth -= 1;
        let (mut forms, close) = body?;
        let span = open.merge(close);

        // A leading string is a doc string only when something follows it.
        let doc = match forms.first().map(|n| &n.kind) {
            Some(NodeKind::String(doc)) if forms.len() > 1 => {
                let doc = doc.clone();
                forms.remove(0);
                Some(doc)
            }
            _ => None,
        };
        let body = body_node(forms, span);
        Some(Node::new(
            NodeKind::Lambda(Rc::new(LambdaExpr {
                params,
                doc,
                body,
                span,
            })),
            span,
        ))
    }

    /// `(return! e?)`
    fn parse_return(&mut self, open: Span, keyword: Span) -> Option<Node> {
        if self.lambda_depth == 0 {
            self.error_at(
                ErrorCode::RETURN_OUTSIDE_FUNCTION,
                "'return!' outside of a lambda body",
                keyword,
            );
            return None;
        }
        let (mut forms, close) = self.parse_forms_until_close(open)?;
        let span = open.merge(close);
        let value = match forms.len() {
            0 => Node::new(NodeKind::Unit, span),
            1 => forms.remove(0),
            n => {
                self.error_at(
                    ErrorCode::INVALID_FORM,
                    format!("'return!' takes one expression, got {n}"),
                    span,
                );
                return None;
            }
        };
        Some(Node::new(NodeKind::Return(Box::new(value)), span))
    }
}
