//! Type classes: bundles of overloads registered for one carrier type.
//!
//! Instantiating the same class for two carriers in one frame makes its
//! operators overloaded over both, newest carrier first.

use crate::env::TypeScope;
use crate::ty::{Type, TypeError};

/// Registers a family of operator signatures for a carrier type.
pub trait TypeClass {
    /// Class name, for logging.
    fn name(&self) -> &'static str;

    /// Carrier type the operators are registered for.
    fn carrier(&self) -> &Type;

    /// `(name, signature)` pairs to register.
    fn signatures(&self) -> Vec<(&'static str, Type)>;

    /// Define every signature in `scope`.
    fn instantiate(&self, scope: &TypeScope) -> Result<(), TypeError> {
        tracing::debug!(class = self.name(), carrier = %self.carrier(), "instantiate");
        for (op, signature) in self.signatures() {
            if !scope.define(op, signature) {
                return Err(TypeError::Redefined(op.to_string()));
            }
        }
        Ok(())
    }
}

/// `+ - * /` over the carrier.
#[derive(Debug, Clone)]
pub struct Num(pub Type);

/// `< > <= >=` over the carrier.
#[derive(Debug, Clone)]
pub struct Ord(pub Type);

/// `length` of the carrier.
#[derive(Debug, Clone)]
pub struct Seq(pub Type);

impl TypeClass for Num {
    fn name(&self) -> &'static str {
        "Num"
    }

    fn carrier(&self) -> &Type {
        &self.0
    }

    fn signatures(&self) -> Vec<(&'static str, Type)> {
        let t = &self.0;
        ["+", "-", "*", "/"]
            .into_iter()
            .map(|op| (op, Type::callable(vec![t.clone(), t.clone()], t.clone())))
            .collect()
    }
}

impl TypeClass for Ord {
    fn name(&self) -> &'static str {
        "Ord"
    }

    fn carrier(&self) -> &Type {
        &self.0
    }

    fn signatures(&self) -> Vec<(&'static str, Type)> {
        let t = &self.0;
        ["<", ">", "<=", ">="]
            .into_iter()
            .map(|op| (op, Type::callable(vec![t.clone(), t.clone()], Type::Bool)))
            .collect()
    }
}

impl TypeClass for Seq {
    fn name(&self) -> &'static str {
        "Seq"
    }

    fn carrier(&self) -> &Type {
        &self.0
    }

    fn signatures(&self) -> Vec<(&'static str, Type)> {
        vec![("length", Type::callable(vec![self.0.clone()], Type::Int))]
    }
}
