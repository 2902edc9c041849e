//! Rill Type Checker: walks AST nodes and computes their types.
//!
//! Entry point: [`TypeChecker::check`].
//!
//! Error codes emitted:
//! - E200: undefined symbol
//! - E201: symbol already defined in this scope
//! - E202: `set!` on a function
//! - E104: `return!` outside a function
//! - E306: cancelled
//! - E400–E406: call and condition type errors
//! - E500–E502: malformed signature in a lambda doc string

use std::rc::Rc;

use rill_types::ast::*;
use rill_types::{ensure_sufficient_stack, Context, ErrorCode, RillError, Span};
use tracing::{debug, trace};

use crate::annotation::parse_doc;
use crate::env::TypeScope;
use crate::ty::{Callable, Type};

// ══════════════════════════════════════════════════════════════════════════════
// TypeChecker
// ══════════════════════════════════════════════════════════════════════════════

/// Computes the type of nodes against a [`TypeScope`].
#[derive(Debug, Clone)]
pub struct TypeChecker {
    /// File name used in diagnostics.
    file: String,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    /// Create a new type checker.
    pub fn new() -> Self {
        Self {
            file: "<input>".to_string(),
        }
    }

    /// Set the file name reported in diagnostics.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> RillError {
        RillError::at(&self.file, code, message, span)
    }

    /// Type of `node`, with any definitions it makes added to `scope`.
    pub fn check(&self, ctx: &Context, scope: &TypeScope, node: &Node) -> Result<Type, RillError> {
        ensure_sufficient_stack(|| self.check_node(ctx, scope, node))
    }

    fn check_node(&self, ctx: &Context, scope: &TypeScope, node: &Node) -> Result<Type, RillError> {
        if ctx.is_cancelled() {
            return Err(self.error(ErrorCode::CANCELLED, "type check cancelled", node.span));
        }
        trace!(kind = node.kind.name(), at = %node.span, "check");
        match &node.kind {
            NodeKind::Unit => Ok(Type::Unit),
            NodeKind::True | NodeKind::False => Ok(Type::Bool),
            NodeKind::Int(_) => Ok(Type::Int),
            NodeKind::Float64(_) => Ok(Type::Float64),
            NodeKind::String(_) => Ok(Type::String),

            NodeKind::Symbol(name) => scope.lookup(name).ok_or_else(|| {
                self.error(
                    ErrorCode::UNDEFINED_SYMBOL,
                    format!("undefined symbol '{name}'"),
                    node.span,
                )
            }),

            NodeKind::Block(body) => {
                let inner = scope.child();
                let mut last = Type::Unit;
                for form in body {
                    last = self.check(ctx, &inner, form)?;
                }
                Ok(last)
            }

            NodeKind::Call { callee, args } => self.check_call(ctx, scope, callee, args, node.span),

            NodeKind::Conditional { cases, otherwise } => {
                let mut branches = Vec::with_capacity(cases.len() + 1);
                for case in cases {
                    self.check_condition(ctx, scope, &case.predicate)?;
                    branches.push(self.check(ctx, scope, &case.body)?);
                }
                branches.push(self.check(ctx, scope, otherwise)?);
                Ok(Type::union(branches))
            }

            NodeKind::While { predicate, body } => {
                self.check_condition(ctx, scope, predicate)?;
                self.check(ctx, scope, body)?;
                Ok(Type::Unit)
            }

            NodeKind::Define { name, value } => {
                let ty = match &value.kind {
                    NodeKind::Lambda(def) => self.check_lambda(ctx, scope, def, Some(&name.name))?,
                    _ => self.check(ctx, scope, value)?,
                };
                if !scope.define(&name.name, ty) {
                    return Err(self.error(
                        ErrorCode::SYMBOL_REDEFINED,
                        format!("'{}' is already defined in this scope", name.name),
                        name.span,
                    ));
                }
                Ok(Type::Unit)
            }

            NodeKind::Set { name, value } => {
                match scope.lookup(&name.name) {
                    None => {
                        return Err(self.error(
                            ErrorCode::UNDEFINED_SYMBOL,
                            format!("cannot set! undefined symbol '{}'", name.name),
                            name.span,
                        ))
                    }
                    Some(Type::Callable(current)) => {
                        return Err(self.error(
                            ErrorCode::FUNCTION_REASSIGNED,
                            format!("cannot set! function '{}' of type {current}", name.name),
                            name.span,
                        ))
                    }
                    Some(_) => {}
                }
                let ty = self.check(ctx, scope, value)?;
                scope.set(&name.name, ty);
                Ok(Type::Unit)
            }

            NodeKind::Lambda(def) => self.check_lambda(ctx, scope, def, None),

            NodeKind::Quote(_) => Ok(Type::Any),

            NodeKind::Return(value) => {
                let ty = self.check(ctx, scope, value)?;
                if !scope.record_return(ty.clone()) {
                    return Err(self.error(
                        ErrorCode::RETURN_OUTSIDE_FUNCTION,
                        "'return!' outside of a function",
                        node.span,
                    ));
                }
                Ok(ty)
            }
        }
    }

    fn check_condition(&self, ctx: &Context, scope: &TypeScope, predicate: &Node) -> Result<(), RillError> {
        let ty = self.check(ctx, scope, predicate)?;
        if !ty.is_condition() {
            return Err(self.error(
                ErrorCode::CONDITION_NOT_BOOL,
                format!("condition must be Bool, got {ty}"),
                predicate.span,
            ));
        }
        Ok(())
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    fn check_call(
        &self,
        ctx: &Context,
        scope: &TypeScope,
        callee: &Node,
        args: &[Node],
        span: Span,
    ) -> Result<Type, RillError> {
        let function = self.check(ctx, scope, callee)?;
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            arg_types.push(self.check(ctx, scope, arg)?);
        }
        match function {
            Type::Callable(callable) => callable
                .call(&arg_types)
                .map_err(|e| self.error(e.code(), format!("{callee}: {e}"), span)),
            Type::Any => Ok(Type::Any),
            other => Err(self.error(
                ErrorCode::NOT_A_FUNCTION_TYPE,
                format!("{callee} has type {other}, which is not callable"),
                span,
            )),
        }
    }

    // ── Lambdas ───────────────────────────────────────────────────────────

    /// Type of a lambda literal.
    ///
    /// Parameters are `Any` unless the doc string declares a signature. When
    /// `self_name` is given the lambda is being bound to that name, which is
    /// visible inside the body so recursive calls check.
    fn check_lambda(
        &self,
        ctx: &Context,
        scope: &TypeScope,
        def: &LambdaExpr,
        self_name: Option<&str>,
    ) -> Result<Type, RillError> {
        let declared = match def.doc.as_deref().map(parse_doc).transpose() {
            Ok(signature) => signature.flatten(),
            Err(e) => return Err(self.error(e.code(), e.to_string(), def.span)),
        };
        let (params, declared_ret) = match declared {
            Some(Type::Callable(signature)) => {
                if signature.params.len() != def.params.len() {
                    return Err(self.error(
                        ErrorCode::TYPE_ARITY_MISMATCH,
                        format!(
                            "signature {signature} declares {} parameter(s), lambda has {}",
                            signature.params.len(),
                            def.params.len()
                        ),
                        def.span,
                    ));
                }
                // Lambdas bind one value per parameter; there are no rest parameters.
                if let Some(variadic) = signature.params.iter().find(|p| matches!(p, Type::Variadic(_))) {
                    return Err(self.error(
                        ErrorCode::INVALID_VARIADIC,
                        format!("lambda parameters cannot be {variadic} in signature {signature}"),
                        def.span,
                    ));
                }
                (signature.params.clone(), Some(signature.ret.clone()))
            }
            _ => (vec![Type::Any; def.params.len()], None),
        };

        let outer = match self_name {
            Some(name) => {
                let outer = scope.child();
                let provisional = Type::callable(
                    params.clone(),
                    declared_ret.clone().unwrap_or(Type::Any),
                );
                outer.define(name, provisional);
                outer
            }
            None => scope.clone(),
        };

        let frame = outer.function_child();
        for (param, ty) in def.params.iter().zip(&params) {
            frame.define(&param.name, ty.clone());
        }
        let body = self.check(ctx, &frame, &def.body)?;
        let mut results = frame.take_returns();
        results.push(body);
        let inferred = Type::union(results);

        let ret = match declared_ret {
            Some(ret) => {
                if !inferred.same(&ret) {
                    return Err(self.error(
                        ErrorCode::WRONG_RETURN_TYPE,
                        format!("lambda declared to return {ret} produces {inferred}"),
                        def.span,
                    ));
                }
                ret
            }
            None => inferred,
        };
        debug!(params = params.len(), ret = %ret, "lambda checked");
        Ok(Type::Callable(Rc::new(Callable::declared(params, ret))))
    }
}
