//! Cancellable execution context shared by the evaluator and type checker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cooperative cancellation flag.
///
/// Clones share the same flag, so a driver can keep one handle and cancel a
/// walk running elsewhere. The engines poll [`Context::is_cancelled`] once per
/// AST node; a native built-in that is already running is not interrupted.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// A fresh, not-yet-cancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_cancellation() {
        let ctx = Context::new();
        let handle = ctx.clone();
        assert!(!ctx.is_cancelled());
        handle.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let ctx = Context::new();
        let handle = ctx.clone();
        std::thread::spawn(move || handle.cancel()).join().unwrap();
        assert!(ctx.is_cancelled());
    }
}
