//! Rill tree-walking evaluator.
//!
//! Evaluates parsed Rill programs one top-level node at a time against a
//! chain of lexical scopes. Output from `display` goes to a writer supplied
//! by the caller.

mod builtins;
mod env;
mod error;
mod evaluator;
mod value;

pub use builtins::{global_scope, NativeFn};
pub use env::Scope;
pub use error::BuiltinError;
pub use evaluator::{Evaluator, Flow, DEFAULT_STEP_LIMIT};
pub use value::{BuiltIn, Closure, Value};

use rill_types::{Context, Diagnostics};
use std::io::Write;

/// Parse and evaluate `source` in a fresh global scope.
///
/// Returns one value per top-level form. Evaluation stops at the first
/// runtime error.
#[tracing::instrument(level = "debug", skip(source, out))]
pub fn run(source: &str, file: &str, out: &mut dyn Write) -> Result<Vec<Value>, Diagnostics> {
    let nodes = rill_parser::parse_source(source, file)?;
    let ctx = Context::new();
    let scope = global_scope();
    let mut evaluator = Evaluator::new(out).with_file(file);
    let mut values = Vec::with_capacity(nodes.len());
    for node in &nodes {
        values.push(evaluator.eval(&ctx, &scope, node)?);
    }
    tracing::debug!(steps = evaluator.steps(), "run finished");
    Ok(values)
}
