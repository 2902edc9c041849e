//! Rill type checker.
//!
//! Computes a structural type for each top-level node: unions for branching
//! code, variadic parameters, and overloaded functions resolved newest
//! first. Built-in signatures come from `(Callable ...)` annotations in
//! documentation strings.

pub mod annotation;
pub mod checker;
pub mod classes;
pub mod env;
pub mod stdlib;
pub mod ty;

pub use annotation::{parse_annotation, parse_doc, AnnotationError};
pub use checker::TypeChecker;
pub use classes::{Num, Ord, Seq, TypeClass};
pub use env::TypeScope;
pub use stdlib::global_type_scope;
pub use ty::{Callable, NativeBody, Type, TypeError};

use rill_types::{Context, Diagnostics};

/// Parse and type-check `source` in a fresh global type scope.
///
/// Returns one type per top-level form. Checking stops at the first type
/// error.
#[tracing::instrument(level = "debug", skip(source))]
pub fn type_check(source: &str, file: &str) -> Result<Vec<Type>, Diagnostics> {
    let nodes = rill_parser::parse_source(source, file)?;
    let ctx = Context::new();
    let scope = global_type_scope()?;
    let checker = TypeChecker::new().with_file(file);
    let mut types = Vec::with_capacity(nodes.len());
    for node in &nodes {
        types.push(checker.check(&ctx, &scope, node)?);
    }
    Ok(types)
}
