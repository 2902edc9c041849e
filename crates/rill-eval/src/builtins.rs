//! Native built-in functions and the global scope.

use crate::env::Scope;
use crate::error::BuiltinError;
use crate::evaluator::{Evaluator, Flow};
use crate::value::{BuiltIn, Value};
use rill_types::Context;
use std::rc::Rc;

/// Signature of a native built-in.
///
/// `scope` is the function frame opened for the call; its parent is the
/// caller's scope.
pub type NativeFn =
    fn(&mut Evaluator<'_>, &Context, &Scope, Vec<Value>) -> Result<Value, BuiltinError>;

type BuiltinResult = Result<Value, BuiltinError>;

/// Every built-in, in registration order.
const BUILTINS: &[(&str, NativeFn)] = &[
    ("+", add),
    ("-", sub),
    ("*", mul),
    ("/", div),
    ("<", lt),
    (">", gt),
    ("<=", le),
    (">=", ge),
    ("=", equal),
    ("not", not),
    ("display", display),
    ("newline", newline),
    ("cons", cons),
    ("car", car),
    ("cdr", cdr),
    ("list", list),
    ("length", length),
    ("append", append),
    ("reverse", reverse),
    ("null?", null),
    ("eval", eval),
];

/// Build the root scope holding `true`, `false` and every built-in.
pub fn global_scope() -> Scope {
    let scope = Scope::root();
    scope.define("true", Value::Bool(true));
    scope.define("false", Value::Bool(false));
    for &(name, func) in BUILTINS {
        scope.define(name, Value::BuiltIn(BuiltIn { name, func }));
    }
    scope
}

// ── Argument helpers ──────────────────────────────────────────────────────

fn exact<const N: usize>(args: Vec<Value>) -> Result<[Value; N], BuiltinError> {
    let got = args.len();
    args.try_into()
        .map_err(|_| BuiltinError::Arity { expected: N, got })
}

fn type_error(expected: &'static str, got: &Value) -> BuiltinError {
    BuiltinError::Type {
        expected,
        got: format!("{} {got}", got.type_name()),
    }
}

fn proper_list(value: &Value) -> Result<Vec<Value>, BuiltinError> {
    value
        .to_vec()
        .ok_or_else(|| BuiltinError::ImproperList(value.to_string()))
}

// ── Arithmetic ────────────────────────────────────────────────────────────

fn arith(
    args: Vec<Value>,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
    symbol: &str,
) -> BuiltinResult {
    match exact::<2>(args)? {
        [Value::Int(a), Value::Int(b)] => int_op(a, b)
            .map(Value::Int)
            .ok_or_else(|| BuiltinError::Failure(format!("integer overflow in {a} {symbol} {b}"))),
        [Value::Float64(a), Value::Float64(b)] => {
            let result = float_op(a, b);
            if result.is_finite() {
                Ok(Value::Float64(result))
            } else {
                Err(BuiltinError::Failure(format!("{a} {symbol} {b} is not finite")))
            }
        }
        [a, b] => Err(BuiltinError::Type {
            expected: "two Int or two Float64 arguments",
            got: format!("{} and {}", a.type_name(), b.type_name()),
        }),
    }
}

fn add(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    arith(args, i64::checked_add, |a, b| a + b, "+")
}

fn sub(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    arith(args, i64::checked_sub, |a, b| a - b, "-")
}

fn mul(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    arith(args, i64::checked_mul, |a, b| a * b, "*")
}

fn div(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    if matches!(args.get(1), Some(Value::Int(0))) {
        return Err(BuiltinError::Failure("division by zero".into()));
    }
    arith(args, i64::checked_div, |a, b| a / b, "/")
}

// ── Comparison ────────────────────────────────────────────────────────────

fn compare(args: Vec<Value>, accept: fn(std::cmp::Ordering) -> bool) -> BuiltinResult {
    let ordering = match exact::<2>(args)? {
        [Value::Int(a), Value::Int(b)] => a.cmp(&b),
        [Value::Float64(a), Value::Float64(b)] => a
            .partial_cmp(&b)
            .ok_or_else(|| BuiltinError::Failure(format!("cannot order {a} and {b}")))?,
        [Value::String(a), Value::String(b)] => a.cmp(&b),
        [a, b] => {
            return Err(BuiltinError::Type {
                expected: "two Int, Float64 or String arguments",
                got: format!("{} and {}", a.type_name(), b.type_name()),
            })
        }
    };
    Ok(Value::Bool(accept(ordering)))
}

fn lt(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    compare(args, |o| o.is_lt())
}

fn gt(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    compare(args, |o| o.is_gt())
}

fn le(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    compare(args, |o| o.is_le())
}

fn ge(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    compare(args, |o| o.is_ge())
}

fn equal(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    let [a, b] = exact::<2>(args)?;
    Ok(Value::Bool(a == b))
}

fn not(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    match exact::<1>(args)? {
        [Value::Bool(b)] => Ok(Value::Bool(!b)),
        [other] => Err(type_error("Bool", &other)),
    }
}

// ── Output ────────────────────────────────────────────────────────────────

/// Write arguments separated by spaces. Strings are written raw.
fn display(evaluator: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    let out = evaluator.output();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.write_all(b" ")?;
        }
        match arg {
            Value::String(s) => out.write_all(s.as_bytes())?,
            other => write!(out, "{other}")?,
        }
    }
    Ok(Value::Unit)
}

fn newline(evaluator: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    exact::<0>(args)?;
    evaluator.output().write_all(b"\n")?;
    Ok(Value::Unit)
}

// ── Lists ─────────────────────────────────────────────────────────────────

fn cons(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    let [car, cdr] = exact::<2>(args)?;
    Ok(Value::Pair(Rc::new(car), Rc::new(cdr)))
}

fn car(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    match exact::<1>(args)? {
        [Value::Pair(car, _)] => Ok(Value::clone(&car)),
        [other] => Err(type_error("Pair", &other)),
    }
}

fn cdr(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    match exact::<1>(args)? {
        [Value::Pair(_, cdr)] => Ok(Value::clone(&cdr)),
        [other] => Err(type_error("Pair", &other)),
    }
}

fn list(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    Ok(Value::list(args))
}

/// Element count of a list, or character count of a string.
fn length(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    let [value] = exact::<1>(args)?;
    let count = match &value {
        Value::String(s) => s.chars().count(),
        Value::Unit | Value::Pair(..) => proper_list(&value)?.len(),
        other => return Err(type_error("list or String", other)),
    };
    i64::try_from(count)
        .map(Value::Int)
        .map_err(|_| BuiltinError::Failure("length overflow".into()))
}

fn append(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    let mut items = Vec::new();
    for arg in &args {
        items.extend(proper_list(arg)?);
    }
    Ok(Value::list(items))
}

fn reverse(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    let [value] = exact::<1>(args)?;
    let mut items = proper_list(&value)?;
    items.reverse();
    Ok(Value::list(items))
}

fn null(_: &mut Evaluator<'_>, _: &Context, _: &Scope, args: Vec<Value>) -> BuiltinResult {
    let [value] = exact::<1>(args)?;
    Ok(Value::Bool(matches!(value, Value::Unit)))
}

// ── Reflection ────────────────────────────────────────────────────────────

/// Evaluate a quoted node in the caller's scope. Other values are returned
/// as they are.
fn eval(evaluator: &mut Evaluator<'_>, ctx: &Context, scope: &Scope, args: Vec<Value>) -> BuiltinResult {
    match exact::<1>(args)? {
        [Value::Quoted(node)] => {
            let caller = scope.parent().unwrap_or_else(|| scope.clone());
            match evaluator.eval_flow(ctx, &caller, &node)? {
                Flow::Normal(value) | Flow::Return(value) => Ok(value),
            }
        }
        [other] => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: Vec<Value>) -> BuiltinResult {
        let mut sink = Vec::new();
        let mut evaluator = Evaluator::new(&mut sink);
        let scope = global_scope();
        let func = BUILTINS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .unwrap();
        func(&mut evaluator, &Context::new(), &scope.function_child(), args)
    }

    #[test]
    fn test_arith_requires_matching_numbers() {
        assert_eq!(call("+", vec![Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
        assert_eq!(
            call("*", vec![Value::Float64(1.5), Value::Float64(2.0)]).unwrap(),
            Value::Float64(3.0)
        );
        let err = call("+", vec![Value::Int(1), Value::Float64(1.0)]).unwrap_err();
        assert_eq!(err.code(), rill_types::ErrorCode::BUILTIN_FAILURE);
    }

    #[test]
    fn test_overflow_and_division_by_zero() {
        assert!(call("+", vec![Value::Int(i64::MAX), Value::Int(1)]).is_err());
        assert!(call("/", vec![Value::Int(1), Value::Int(0)]).is_err());
        assert!(call("/", vec![Value::Float64(1.0), Value::Float64(0.0)]).is_err());
        assert_eq!(call("/", vec![Value::Int(7), Value::Int(2)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_arity_error_code() {
        let err = call("not", vec![]).unwrap_err();
        assert_eq!(err.code(), rill_types::ErrorCode::WRONG_ARG_COUNT);
        assert_eq!(err.to_string(), "expected 1 argument(s), got 0");
    }

    #[test]
    fn test_string_ordering() {
        assert_eq!(
            call("<", vec![Value::String("a".into()), Value::String("b".into())]).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_length_of_improper_list() {
        let pair = Value::Pair(Rc::new(Value::Int(1)), Rc::new(Value::Int(2)));
        let err = call("length", vec![pair]).unwrap_err();
        assert_eq!(err.code(), rill_types::ErrorCode::IMPROPER_LIST);
    }
}
