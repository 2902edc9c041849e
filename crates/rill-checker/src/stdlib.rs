//! Global type scope: built-in signatures and type-class instances.
//!
//! Built-in signatures are declared the way user code declares them, as a
//! `(Callable ...)` line in a documentation string.

use rill_types::{ErrorCode, RillError, Span};

use crate::annotation::parse_doc;
use crate::classes::{Num, Ord, Seq, TypeClass};
use crate::env::TypeScope;
use crate::ty::Type;

/// Pseudo file name for errors raised while building the global scope.
const BUILTINS_FILE: &str = "<builtins>";

/// Documentation of every built-in not covered by a type class.
const BUILTIN_DOCS: &[(&str, &str)] = &[
    ("=", "Structural equality.\n(Callable (Any Any) Bool)"),
    ("not", "Boolean negation.\n(Callable (Bool) Bool)"),
    (
        "display",
        "Write the arguments to the output, separated by spaces.\n(Callable ((Variadic Any)) Unit)",
    ),
    ("newline", "Write a line break.\n(Callable () Unit)"),
    ("cons", "Build a pair.\n(Callable (Any Any) Any)"),
    ("car", "First element of a pair.\n(Callable (Any) Any)"),
    ("cdr", "Rest of a pair.\n(Callable (Any) Any)"),
    ("list", "Build a proper list.\n(Callable ((Variadic Any)) Any)"),
    ("length", "Number of elements in a list.\n(Callable (Any) Int)"),
    ("append", "Concatenate lists.\n(Callable ((Variadic Any)) Any)"),
    ("reverse", "Reverse a list.\n(Callable (Any) Any)"),
    ("null?", "True for the empty list.\n(Callable (Any) Bool)"),
    ("eval", "Evaluate a quoted expression in the caller's scope.\n(Callable (Any) Any)"),
];

fn builtin_error(code: ErrorCode, message: String) -> RillError {
    RillError::at(BUILTINS_FILE, code, message, Span::default())
}

/// Build the root type scope.
///
/// Type classes are instantiated after the documented built-ins, so for a
/// name registered by both the class overload is tried first.
pub fn global_type_scope() -> Result<TypeScope, RillError> {
    let scope = TypeScope::root();
    scope.define("true", Type::Bool);
    scope.define("false", Type::Bool);

    for &(name, doc) in BUILTIN_DOCS {
        let signature = parse_doc(doc)
            .map_err(|e| builtin_error(e.code(), format!("{name}: {e}")))?
            .ok_or_else(|| {
                builtin_error(
                    ErrorCode::NOT_A_FUNCTION_TYPE,
                    format!("{name}: doc string declares no signature"),
                )
            })?;
        scope.define(name, signature);
    }

    let classes: [&dyn TypeClass; 6] = [
        &Num(Type::Int),
        &Num(Type::Float64),
        &Ord(Type::Int),
        &Ord(Type::Float64),
        &Ord(Type::String),
        &Seq(Type::String),
    ];
    for class in classes {
        class
            .instantiate(&scope)
            .map_err(|e| builtin_error(e.code(), e.to_string()))?;
    }
    Ok(scope)
}
