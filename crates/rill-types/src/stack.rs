//! Stack growth for the recursive walks.
//!
//! The parser, type checker and evaluator recurse once per nested form or
//! call, so a deep but valid program can exceed the thread's stack. Each
//! recursive entry point runs through [`ensure_sufficient_stack`], which moves
//! onto a fresh heap-allocated segment when the current one runs low.

/// Remaining stack below which a new segment is allocated (256KB).
const RED_ZONE: usize = 256 * 1024;

/// Size of each new segment (2MB).
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
