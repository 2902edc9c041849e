//! Runtime values.

use crate::builtins::NativeFn;
use crate::env::Scope;
use rill_types::ast::{write_escaped, LambdaExpr, Node};
use std::fmt;
use std::rc::Rc;

/// A runtime value. Values are immutable; the empty list is [`Value::Unit`].
#[derive(Debug, Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float64(f64),
    String(String),
    /// A user function together with the scope it was created in.
    Lambda(Rc<Closure>),
    /// A native function.
    BuiltIn(BuiltIn),
    /// An unevaluated AST node, produced by `quote`.
    Quoted(Rc<Node>),
    /// A cons cell.
    Pair(Rc<Value>, Rc<Value>),
}

/// A lambda closed over its defining scope.
#[derive(Debug)]
pub struct Closure {
    pub scope: Scope,
    pub def: Rc<LambdaExpr>,
}

/// A named native function.
#[derive(Clone, Copy)]
pub struct BuiltIn {
    pub name: &'static str,
    pub func: NativeFn,
}

impl fmt::Debug for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltIn({})", self.name)
    }
}

impl Value {
    /// Build a proper list from `items`.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        let items: Vec<Value> = items.into_iter().collect();
        items.into_iter().rev().fold(Value::Unit, |tail, head| {
            Value::Pair(Rc::new(head), Rc::new(tail))
        })
    }

    /// The elements of a proper list, or `None` if this is not one.
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        let mut current = self;
        loop {
            match current {
                Value::Unit => return Some(items),
                Value::Pair(car, cdr) => {
                    items.push(Value::clone(car));
                    current = cdr;
                }
                _ => return None,
            }
        }
    }

    /// Type name used in runtime error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "Unit",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float64(_) => "Float64",
            Value::String(_) => "String",
            Value::Lambda(_) => "Lambda",
            Value::BuiltIn(_) => "BuiltIn",
            Value::Quoted(_) => "Quoted",
            Value::Pair(..) => "Pair",
        }
    }
}

/// Structural equality; functions compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Lambda(a), Value::Lambda(b)) => Rc::ptr_eq(a, b),
            (Value::BuiltIn(a), Value::BuiltIn(b)) => a.name == b.name,
            (Value::Quoted(a), Value::Quoted(b)) => a.to_string() == b.to_string(),
            (Value::Pair(a1, d1), Value::Pair(a2, d2)) => a1 == a2 && d1 == d2,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("()"),
            Value::Bool(true) => f.write_str("#t"),
            Value::Bool(false) => f.write_str("#f"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float64(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{n:.1}"),
            Value::Float64(n) => write!(f, "{n}"),
            Value::String(s) => write_escaped(f, s),
            Value::Lambda(closure) => {
                let params: Vec<&str> = closure.def.param_names().collect();
                write!(f, "<lambda ({})>", params.join(" "))
            }
            Value::BuiltIn(builtin) => write!(f, "<builtin {}>", builtin.name),
            Value::Quoted(node) => write!(f, "'{node}"),
            Value::Pair(car, cdr) => {
                write!(f, "({car}")?;
                let mut rest = cdr;
                loop {
                    match &**rest {
                        Value::Unit => break,
                        Value::Pair(car, cdr) => {
                            write!(f, " {car}")?;
                            rest = cdr;
                        }
                        tail => {
                            write!(f, " . {tail}")?;
                            break;
                        }
                    }
                }
                f.write_str(")")
            }
        }
    }
}
