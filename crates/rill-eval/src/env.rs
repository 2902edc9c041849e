//! Scope chain for the Rill evaluator.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A single frame of bindings.
struct Frame {
    parent: Option<Scope>,
    /// Set on frames opened by a function call.
    is_function: bool,
    bindings: HashMap<String, Value>,
}

/// A shared handle to one frame of a scope chain.
///
/// Variables are looked up from the innermost frame outward.
/// `define` always creates in this frame and refuses to overwrite.
/// `set` updates the first frame where the variable exists.
///
/// Closures hold a handle to the frame they were created in, so a frame
/// lives as long as any closure or active call refers to it.
#[derive(Clone)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
    fn with_parent(parent: Option<Scope>, is_function: bool) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            parent,
            is_function,
            bindings: HashMap::new(),
        })))
    }

    /// Create a root scope with no parent.
    pub fn root() -> Self {
        Self::with_parent(None, false)
    }

    /// Push a plain child frame (for blocks).
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()), false)
    }

    /// Push a function frame (for calls).
    pub fn function_child(&self) -> Self {
        Self::with_parent(Some(self.clone()), true)
    }

    /// The enclosing frame, if any.
    pub fn parent(&self) -> Option<Scope> {
        self.0.borrow().parent.clone()
    }

    /// Look up a variable, searching from this frame outward.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let frame = scope.0.borrow();
            if let Some(value) = frame.bindings.get(name) {
                return Some(value.clone());
            }
            current = frame.parent.clone();
        }
        None
    }

    /// Define a variable in this frame.
    /// Returns `false` if the name is already bound here.
    pub fn define(&self, name: &str, value: Value) -> bool {
        let mut frame = self.0.borrow_mut();
        if frame.bindings.contains_key(name) {
            return false;
        }
        frame.bindings.insert(name.to_string(), value);
        true
    }

    /// Update a variable in the nearest frame where it exists.
    /// Returns `true` if found and updated, `false` if not found.
    pub fn set(&self, name: &str, value: Value) -> bool {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let mut frame = scope.0.borrow_mut();
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = value;
                return true;
            }
            current = frame.parent.clone();
        }
        false
    }

    /// `true` if this frame or any ancestor was opened by a call.
    pub fn in_function(&self) -> bool {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let frame = scope.0.borrow();
            if frame.is_function {
                return true;
            }
            current = frame.parent.clone();
        }
        false
    }
}

// Closures point back at their frames, so only the frame's own names are shown.
impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(frame) = self.0.try_borrow() else {
            return f.write_str("Scope(<borrowed>)");
        };
        let mut names: Vec<&str> = frame.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Scope")
            .field("function", &frame.is_function)
            .field("names", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_once_per_frame() {
        let root = Scope::root();
        assert!(root.define("x", Value::Int(1)));
        assert!(!root.define("x", Value::Int(2)));
        assert_eq!(root.lookup("x"), Some(Value::Int(1)));
    }

    #[test]
    fn test_child_shadows_without_touching_parent() {
        let root = Scope::root();
        root.define("x", Value::Int(1));
        let inner = root.child();
        assert!(inner.define("x", Value::Int(2)));
        assert_eq!(inner.lookup("x"), Some(Value::Int(2)));
        assert_eq!(root.lookup("x"), Some(Value::Int(1)));
    }

    #[test]
    fn test_set_updates_nearest_definition() {
        let root = Scope::root();
        root.define("x", Value::Int(1));
        let inner = root.child().child();
        assert!(inner.set("x", Value::Int(5)));
        assert_eq!(root.lookup("x"), Some(Value::Int(5)));
        assert!(!inner.set("missing", Value::Unit));
    }

    #[test]
    fn test_in_function_is_inherited() {
        let root = Scope::root();
        assert!(!root.in_function());
        let call = root.function_child();
        assert!(call.in_function());
        assert!(call.child().in_function());
        assert!(!root.child().in_function());
    }
}
