//! Type scope chain with overload linking and return accumulation.
//!
//! [`TypeScope`] mirrors the evaluator's scope chain, binding names to
//! [`Type`]s. Function frames additionally collect the type of every
//! `return!` reached inside them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ty::Type;

// ══════════════════════════════════════════════════════════════════════════════
// Frame
// ══════════════════════════════════════════════════════════════════════════════

struct TypeFrame {
    parent: Option<TypeScope>,
    /// `Some` on function frames: types passed to `return!` so far.
    returns: Option<Vec<Type>>,
    bindings: HashMap<String, Type>,
}

// ══════════════════════════════════════════════════════════════════════════════
// TypeScope
// ══════════════════════════════════════════════════════════════════════════════

/// A shared handle to one frame of a type scope chain.
#[derive(Clone)]
pub struct TypeScope(Rc<RefCell<TypeFrame>>);

impl TypeScope {
    fn with_parent(parent: Option<TypeScope>, returns: Option<Vec<Type>>) -> Self {
        Self(Rc::new(RefCell::new(TypeFrame {
            parent,
            returns,
            bindings: HashMap::new(),
        })))
    }

    /// Create a root scope with no parent.
    pub fn root() -> Self {
        Self::with_parent(None, None)
    }

    /// Push a plain child frame (for blocks).
    pub fn child(&self) -> Self {
        Self::with_parent(Some(self.clone()), None)
    }

    /// Push a function frame (for lambda bodies).
    pub fn function_child(&self) -> Self {
        Self::with_parent(Some(self.clone()), Some(Vec::new()))
    }

    /// Define a binding in this frame.
    ///
    /// A callable defined over a callable already in this frame becomes the
    /// newest overload of it. Returns `false` for any other redefinition in
    /// the same frame. Child frames shadow freely.
    pub fn define(&self, name: &str, ty: Type) -> bool {
        let mut frame = self.0.borrow_mut();
        let ty = match (frame.bindings.get(name).cloned(), ty) {
            (None, ty) => ty,
            (Some(Type::Callable(older)), Type::Callable(newer)) => {
                Type::Callable(Rc::new(newer.append(older)))
            }
            _ => return false,
        };
        frame.bindings.insert(name.to_string(), ty);
        true
    }

    /// Look up a binding, searching from this frame outward.
    pub fn lookup(&self, name: &str) -> Option<Type> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let frame = scope.0.borrow();
            if let Some(ty) = frame.bindings.get(name) {
                return Some(ty.clone());
            }
            current = frame.parent.clone();
        }
        None
    }

    /// Widen the nearest binding of `name` to include `ty`.
    /// Returns `false` if the name is not bound.
    pub fn set(&self, name: &str, ty: Type) -> bool {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let mut frame = scope.0.borrow_mut();
            if let Some(slot) = frame.bindings.get_mut(name) {
                *slot = Type::union([slot.clone(), ty]);
                return true;
            }
            current = frame.parent.clone();
        }
        false
    }

    /// Record a `return!` type in the nearest function frame.
    /// Returns `false` outside any function.
    pub fn record_return(&self, ty: Type) -> bool {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let mut frame = scope.0.borrow_mut();
            if let Some(returns) = frame.returns.as_mut() {
                returns.push(ty);
                return true;
            }
            current = frame.parent.clone();
        }
        false
    }

    /// Drain the `return!` types recorded directly in this function frame.
    pub fn take_returns(&self) -> Vec<Type> {
        self.0
            .borrow_mut()
            .returns
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }
}

impl fmt::Debug for TypeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(frame) = self.0.try_borrow() else {
            return f.write_str("TypeScope(<borrowed>)");
        };
        let mut bindings: Vec<(&str, String)> = frame
            .bindings
            .iter()
            .map(|(name, ty)| (name.as_str(), ty.to_string()))
            .collect();
        bindings.sort_unstable();
        f.debug_struct("TypeScope")
            .field("function", &frame.returns.is_some())
            .field("bindings", &bindings)
            .finish()
    }
}
