//! Core node evaluator.

use crate::env::Scope;
use crate::error::BuiltinError;
use crate::value::{Closure, Value};
use rill_types::ast::*;
use rill_types::{ensure_sufficient_stack, Context, ErrorCode, RillError, Span};
use std::io::Write;
use std::rc::Rc;
use tracing::{debug, trace};

/// Default step budget: one step per evaluated node.
pub const DEFAULT_STEP_LIMIT: u64 = 10_000_000;

/// Outcome of evaluating one node.
///
/// `Return` carries the value of a `return!` up to the nearest call
/// boundary, where it becomes a normal result.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Return(Value),
}

/// Unwrap a normal outcome, or propagate an early return out of the caller.
macro_rules! normal {
    ($flow:expr) => {
        match $flow? {
            Flow::Normal(value) => value,
            Flow::Return(value) => return Ok(Flow::Return(value)),
        }
    };
}

/// The tree-walking evaluator.
pub struct Evaluator<'w> {
    /// Sink for `display` and `newline`.
    out: &'w mut dyn Write,
    /// File name used in diagnostics.
    file: String,
    /// Steps consumed so far.
    steps: u64,
    /// Step limit.
    step_limit: u64,
}

impl<'w> Evaluator<'w> {
    /// Create a new evaluator writing to `out` with the default step limit.
    pub fn new(out: &'w mut dyn Write) -> Self {
        Self::with_step_limit(out, DEFAULT_STEP_LIMIT)
    }

    /// Create a new evaluator with the given step limit.
    pub fn with_step_limit(out: &'w mut dyn Write, step_limit: u64) -> Self {
        Self {
            out,
            file: "<input>".to_string(),
            steps: 0,
            step_limit,
        }
    }

    /// Set the file name reported in diagnostics.
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Steps consumed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub(crate) fn output(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> RillError {
        RillError::at(&self.file, code, message, span)
    }

    /// Check cancellation and consume one step.
    fn tick(&mut self, ctx: &Context, span: Span) -> Result<(), RillError> {
        if ctx.is_cancelled() {
            return Err(self.error(ErrorCode::CANCELLED, "evaluation cancelled", span));
        }
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(self.error(
                ErrorCode::STEP_LIMIT_EXCEEDED,
                format!("step limit of {} exceeded", self.step_limit),
                span,
            ));
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Entry points
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate a top-level node.
    ///
    /// A `return!` that escapes every function is reported as an uncaught
    /// return.
    pub fn eval(&mut self, ctx: &Context, scope: &Scope, node: &Node) -> Result<Value, RillError> {
        match self.eval_flow(ctx, scope, node)? {
            Flow::Normal(value) => Ok(value),
            Flow::Return(value) => Err(self.error(
                ErrorCode::UNCAUGHT_RETURN,
                format!("return! of {value} escaped every function"),
                node.span,
            )),
        }
    }

    /// Evaluate a node, keeping early returns visible to the caller.
    pub fn eval_flow(&mut self, ctx: &Context, scope: &Scope, node: &Node) -> Result<Flow, RillError> {
        ensure_sufficient_stack(|| self.eval_node(ctx, scope, node))
    }

    fn eval_node(&mut self, ctx: &Context, scope: &Scope, node: &Node) -> Result<Flow, RillError> {
        self.tick(ctx, node.span)?;
        trace!(kind = node.kind.name(), at = %node.span, "eval");
        let value = match &node.kind {
            NodeKind::Unit => Value::Unit,
            NodeKind::True => Value::Bool(true),
            NodeKind::False => Value::Bool(false),
            NodeKind::Int(text) => self.eval_int(text, node.span)?,
            NodeKind::Float64(text) => self.eval_float(text, node.span)?,
            NodeKind::String(s) => Value::String(s.clone()),

            NodeKind::Symbol(name) => scope.lookup(name).ok_or_else(|| {
                self.error(
                    ErrorCode::UNDEFINED_SYMBOL,
                    format!("undefined symbol '{name}'"),
                    node.span,
                )
            })?,

            NodeKind::Block(body) => {
                let inner = scope.child();
                let mut last = Value::Unit;
                for form in body {
                    last = normal!(self.eval_flow(ctx, &inner, form));
                }
                last
            }

            NodeKind::Call { callee, args } => {
                let function = normal!(self.eval_flow(ctx, scope, callee));
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(normal!(self.eval_flow(ctx, scope, arg)));
                }
                self.apply(ctx, scope, &function, values, node.span)?
            }

            NodeKind::Conditional { cases, otherwise } => {
                for case in cases {
                    let predicate = normal!(self.eval_flow(ctx, scope, &case.predicate));
                    if self.truth(&predicate, case.predicate.span)? {
                        return self.eval_flow(ctx, scope, &case.body);
                    }
                }
                return self.eval_flow(ctx, scope, otherwise);
            }

            NodeKind::While { predicate, body } => {
                loop {
                    let test = normal!(self.eval_flow(ctx, scope, predicate));
                    if !self.truth(&test, predicate.span)? {
                        break;
                    }
                    normal!(self.eval_flow(ctx, scope, body));
                }
                Value::Unit
            }

            NodeKind::Define { name, value } => {
                let value = normal!(self.eval_flow(ctx, scope, value));
                if !scope.define(&name.name, value) {
                    return Err(self.error(
                        ErrorCode::SYMBOL_REDEFINED,
                        format!("'{}' is already defined in this scope", name.name),
                        name.span,
                    ));
                }
                Value::Unit
            }

            NodeKind::Set { name, value } => {
                let value = normal!(self.eval_flow(ctx, scope, value));
                if !scope.set(&name.name, value) {
                    return Err(self.error(
                        ErrorCode::UNDEFINED_SYMBOL,
                        format!("cannot set! undefined symbol '{}'", name.name),
                        name.span,
                    ));
                }
                Value::Unit
            }

            NodeKind::Lambda(def) => Value::Lambda(Rc::new(Closure {
                scope: scope.clone(),
                def: Rc::clone(def),
            })),

            NodeKind::Quote(inner) => Value::Quoted(Rc::clone(inner)),

            NodeKind::Return(value) => {
                if !scope.in_function() {
                    return Err(self.error(
                        ErrorCode::RETURN_OUTSIDE_FUNCTION,
                        "'return!' outside of a function",
                        node.span,
                    ));
                }
                let value = normal!(self.eval_flow(ctx, scope, value));
                return Ok(Flow::Return(value));
            }
        };
        Ok(Flow::Normal(value))
    }

    // ── Literals ──────────────────────────────────────────────────────────

    fn eval_int(&self, text: &str, span: Span) -> Result<Value, RillError> {
        text.parse::<i64>().map(Value::Int).map_err(|_| {
            self.error(
                ErrorCode::MALFORMED_LITERAL,
                format!("integer literal '{text}' is out of range"),
                span,
            )
        })
    }

    fn eval_float(&self, text: &str, span: Span) -> Result<Value, RillError> {
        match text.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Value::Float64(n)),
            _ => Err(self.error(
                ErrorCode::MALFORMED_LITERAL,
                format!("float literal '{text}' is not representable"),
                span,
            )),
        }
    }

    fn truth(&self, value: &Value, span: Span) -> Result<bool, RillError> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(self.error(
                ErrorCode::NON_BOOLEAN_PREDICATE,
                format!("predicate must be Bool, got {} {other}", other.type_name()),
                span,
            )),
        }
    }

    // ── Calls ─────────────────────────────────────────────────────────────

    /// Apply a function value to evaluated arguments.
    pub fn apply(
        &mut self,
        ctx: &Context,
        scope: &Scope,
        function: &Value,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RillError> {
        match function {
            Value::Lambda(closure) => {
                let params = &closure.def.params;
                if params.len() != args.len() {
                    return Err(self.error(
                        ErrorCode::WRONG_ARG_COUNT,
                        format!("{function} expects {} argument(s), got {}", params.len(), args.len()),
                        span,
                    ));
                }
                debug!(function = %function, args = args.len(), "call");
                let frame = closure.scope.function_child();
                for (param, arg) in params.iter().zip(args) {
                    frame.define(&param.name, arg);
                }
                match self.eval_flow(ctx, &frame, &closure.def.body)? {
                    Flow::Normal(value) | Flow::Return(value) => Ok(value),
                }
            }
            Value::BuiltIn(builtin) => {
                debug!(builtin = builtin.name, args = args.len(), "call");
                let frame = scope.function_child();
                (builtin.func)(self, ctx, &frame, args).map_err(|e| match e {
                    BuiltinError::Eval(inner) => *inner,
                    other => self.error(other.code(), format!("{}: {other}", builtin.name), span),
                })
            }
            other => Err(self.error(
                ErrorCode::NOT_CALLABLE,
                format!("{} {other} is not callable", other.type_name()),
                span,
            )),
        }
    }
}
