//! Type algebra for the Rill type checker.
//!
//! [`Type`] is the semantic type produced by checking a node. Equality is
//! structural; the textual form is used for display and as the key that
//! orders and de-duplicates union members.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rill_types::ErrorCode;
use thiserror::Error;
use tracing::debug;

// ══════════════════════════════════════════════════════════════════════════════
// Type
// ══════════════════════════════════════════════════════════════════════════════

/// A semantic type in Rill.
#[derive(Debug, Clone)]
pub enum Type {
    // ── Primitives ──
    Unit,
    Bool,
    Int,
    Float64,
    String,

    // ── Special ──
    /// Matches every type.
    Any,
    /// Placeholder for an unspecified tail; matches only itself or `Any`.
    Ellipsis,

    // ── Composites ──
    /// A function, possibly overloaded through [`Callable::previous`].
    Callable(Rc<Callable>),
    /// Members keyed by their textual form, so iteration is sorted.
    Union(BTreeMap<std::string::String, Type>),
    /// Zero or more arguments of the element type; last parameter only.
    Variadic(Box<Type>),
}

/// Native rule computing a call's result type from its argument types.
pub type NativeBody = Rc<dyn Fn(&[Type]) -> Result<Type, TypeError>>;

/// One function signature plus the older overloads it shadows.
#[derive(Clone)]
pub struct Callable {
    pub params: Vec<Type>,
    pub ret: Type,
    pub body: NativeBody,
    /// Next-older overload, tried when this one does not match.
    pub previous: Option<Rc<Callable>>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Errors
// ══════════════════════════════════════════════════════════════════════════════

/// A failed call or type-class registration.
#[derive(Debug, Clone, Error)]
pub enum TypeError {
    #[error("{signature} expects {expected} argument(s), got {got}")]
    Arity {
        signature: std::string::String,
        expected: std::string::String,
        got: usize,
    },
    #[error("{signature} argument {index}: expected {expected}, got {got}")]
    Argument {
        signature: std::string::String,
        index: usize,
        expected: Type,
        got: Type,
    },
    #[error("{0}: only the last parameter may be variadic")]
    Variadic(std::string::String),
    #[error("{signature} produced {got}, declared {expected}")]
    Return {
        signature: std::string::String,
        expected: Type,
        got: Type,
    },
    #[error("no overload matches ({args}): {reasons}")]
    NoMatch {
        args: std::string::String,
        reasons: std::string::String,
    },
    #[error("'{0}' is already defined in this scope")]
    Redefined(std::string::String),
}

impl TypeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Arity { .. } => ErrorCode::TYPE_ARITY_MISMATCH,
            Self::Argument { .. } => ErrorCode::WRONG_ARG_TYPE,
            Self::Variadic(_) => ErrorCode::INVALID_VARIADIC,
            Self::Return { .. } => ErrorCode::WRONG_RETURN_TYPE,
            Self::NoMatch { .. } => ErrorCode::NO_MATCHING_OVERLOAD,
            Self::Redefined(_) => ErrorCode::SYMBOL_REDEFINED,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Type operations
// ══════════════════════════════════════════════════════════════════════════════

impl Type {
    /// Wrap a signature whose result is always the declared return type.
    pub fn callable(params: Vec<Type>, ret: Type) -> Type {
        Type::Callable(Rc::new(Callable::declared(params, ret)))
    }

    /// Merge types into one: nested unions are flattened and duplicates
    /// collapse. No members gives `Unit`, one member gives that member,
    /// and any `Any` member absorbs the rest.
    pub fn union(members: impl IntoIterator<Item = Type>) -> Type {
        let mut merged = BTreeMap::new();
        for member in members {
            match member {
                Type::Any => return Type::Any,
                Type::Union(inner) => merged.extend(inner),
                other => {
                    merged.insert(other.to_string(), other);
                }
            }
        }
        match merged.len() {
            0 => Type::Unit,
            1 => merged.into_values().next().unwrap_or(Type::Unit),
            _ => Type::Union(merged),
        }
    }

    /// `true` if either side is `Any`, or both are structurally equal.
    pub fn same(&self, other: &Type) -> bool {
        matches!(self, Type::Any) || matches!(other, Type::Any) || self == other
    }

    /// `true` for types a condition may have.
    pub fn is_condition(&self) -> bool {
        matches!(self, Type::Bool | Type::Any)
    }
}

/// Structural equality. Callable bodies and overload links are ignored.
impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Unit, Type::Unit)
            | (Type::Bool, Type::Bool)
            | (Type::Int, Type::Int)
            | (Type::Float64, Type::Float64)
            | (Type::String, Type::String)
            | (Type::Any, Type::Any)
            | (Type::Ellipsis, Type::Ellipsis) => true,
            (Type::Callable(a), Type::Callable(b)) => a.params == b.params && a.ret == b.ret,
            (Type::Union(a), Type::Union(b)) => a == b,
            (Type::Variadic(a), Type::Variadic(b)) => a == b,
            _ => false,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Callable & overload resolution
// ══════════════════════════════════════════════════════════════════════════════

impl Callable {
    /// A signature whose body returns the declared return type.
    pub fn declared(params: Vec<Type>, ret: Type) -> Self {
        let result = ret.clone();
        Self {
            params,
            ret,
            body: Rc::new(move |_| Ok(result.clone())),
            previous: None,
        }
    }

    /// Copy of this overload chain with `older` linked behind its oldest entry.
    pub fn append(&self, older: Rc<Callable>) -> Callable {
        let previous = match &self.previous {
            None => older,
            Some(next) => Rc::new(next.append(older)),
        };
        Callable {
            params: self.params.clone(),
            ret: self.ret.clone(),
            body: Rc::clone(&self.body),
            previous: Some(previous),
        }
    }

    /// Iterate over this overload and every older one, newest first.
    pub fn overloads(&self) -> impl Iterator<Item = &Callable> {
        std::iter::successors(Some(self), |c| c.previous.as_deref())
    }

    /// Resolve a call against the overload chain and return the result type.
    ///
    /// The first candidate whose parameters match is invoked; a candidate
    /// that matches but produces the wrong type fails the call outright.
    pub fn call(&self, args: &[Type]) -> Result<Type, TypeError> {
        let mut failures = Vec::new();
        for candidate in self.overloads() {
            match candidate.matches(args) {
                Ok(()) => {
                    debug!(signature = %candidate, "overload selected");
                    return candidate.invoke(args);
                }
                Err(reason) => failures.push(reason),
            }
        }
        if failures.len() == 1 {
            if let Some(reason) = failures.pop() {
                return Err(reason);
            }
        }
        let args: Vec<std::string::String> = args.iter().map(ToString::to_string).collect();
        Err(TypeError::NoMatch {
            args: args.join(" "),
            reasons: failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        })
    }

    /// Parameter list with a trailing variadic expanded to `argc` slots.
    fn expanded_params(&self, argc: usize) -> Result<Vec<Type>, TypeError> {
        let fixed = self.params.len().saturating_sub(1);
        if self.params[..fixed]
            .iter()
            .any(|p| matches!(p, Type::Variadic(_)))
        {
            return Err(TypeError::Variadic(self.to_string()));
        }
        match self.params.last() {
            Some(Type::Variadic(element)) if argc >= fixed => {
                let mut params = self.params[..fixed].to_vec();
                params.extend(std::iter::repeat(Type::clone(element)).take(argc - fixed));
                Ok(params)
            }
            _ => Ok(self.params.clone()),
        }
    }

    fn matches(&self, args: &[Type]) -> Result<(), TypeError> {
        let params = self.expanded_params(args.len())?;
        if params.len() != args.len() {
            let expected = match self.params.last() {
                Some(Type::Variadic(_)) => format!("at least {}", self.params.len() - 1),
                _ => self.params.len().to_string(),
            };
            return Err(TypeError::Arity {
                signature: self.to_string(),
                expected,
                got: args.len(),
            });
        }
        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
            if !param.same(arg) {
                return Err(TypeError::Argument {
                    signature: self.to_string(),
                    index: index + 1,
                    expected: param.clone(),
                    got: arg.clone(),
                });
            }
        }
        Ok(())
    }

    fn invoke(&self, args: &[Type]) -> Result<Type, TypeError> {
        let result = (self.body)(args)?;
        if !result.same(&self.ret) {
            return Err(TypeError::Return {
                signature: self.to_string(),
                expected: self.ret.clone(),
                got: result,
            });
        }
        Ok(result)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Display
// ══════════════════════════════════════════════════════════════════════════════

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unit => write!(f, "Unit"),
            Type::Bool => write!(f, "Bool"),
            Type::Int => write!(f, "Int"),
            Type::Float64 => write!(f, "Float64"),
            Type::String => write!(f, "String"),
            Type::Any => write!(f, "Any"),
            Type::Ellipsis => write!(f, "..."),
            Type::Callable(callable) => write!(f, "{callable}"),
            Type::Union(members) => {
                write!(f, "(Union")?;
                for key in members.keys() {
                    write!(f, " {key}")?;
                }
                write!(f, ")")
            }
            Type::Variadic(element) => write!(f, "(Variadic {element})"),
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Callable (")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ") {})", self.ret)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")?;
        if let Some(previous) = &self.previous {
            write!(f, " <- {previous:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variadic(t: Type) -> Type {
        Type::Variadic(Box::new(t))
    }

    #[test]
    fn test_union_sorts_and_dedupes() {
        let u = Type::union([Type::Int, Type::Bool, Type::Float64, Type::Int]);
        assert_eq!(u.to_string(), "(Union Bool Float64 Int)");
    }

    #[test]
    fn test_union_flattens_nested() {
        let inner = Type::union([Type::Int, Type::String]);
        let u = Type::union([inner, Type::Bool, Type::String]);
        assert_eq!(u.to_string(), "(Union Bool Int String)");
    }

    #[test]
    fn test_union_degenerate_cases() {
        assert_eq!(Type::union([]), Type::Unit);
        assert_eq!(Type::union([Type::Int, Type::Int]), Type::Int);
        assert_eq!(Type::union([Type::Int, Type::Any]), Type::Any);
    }

    #[test]
    fn test_same_treats_any_as_wildcard() {
        assert!(Type::Any.same(&Type::Int));
        assert!(Type::Int.same(&Type::Any));
        assert!(!Type::Int.same(&Type::Float64));
        assert!(Type::Ellipsis.same(&Type::Ellipsis));
        assert!(!Type::Ellipsis.same(&Type::Unit));
    }

    #[test]
    fn test_callable_equality_ignores_overloads() {
        let a = Callable::declared(vec![Type::Int], Type::Int);
        let b = Callable::declared(vec![Type::Float64], Type::Float64);
        let chained = a.append(Rc::new(b));
        assert_eq!(
            Type::Callable(Rc::new(chained)),
            Type::callable(vec![Type::Int], Type::Int)
        );
    }

    #[test]
    fn test_variadic_accepts_zero_one_many() {
        let display = Callable::declared(vec![variadic(Type::Any)], Type::Unit);
        assert_eq!(display.call(&[]).unwrap(), Type::Unit);
        assert_eq!(display.call(&[Type::Int]).unwrap(), Type::Unit);
        assert_eq!(
            display.call(&[Type::Int, Type::String, Type::Bool]).unwrap(),
            Type::Unit
        );
    }

    #[test]
    fn test_variadic_after_fixed_params() {
        let f = Callable::declared(vec![Type::String, variadic(Type::Int)], Type::Unit);
        assert!(f.call(&[Type::String]).is_ok());
        assert!(f.call(&[Type::String, Type::Int, Type::Int]).is_ok());
        let err = f.call(&[]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TYPE_ARITY_MISMATCH);
        let err = f.call(&[Type::String, Type::Bool]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::WRONG_ARG_TYPE);
    }

    #[test]
    fn test_variadic_not_last_is_rejected() {
        let f = Callable::declared(vec![variadic(Type::Int), Type::Int], Type::Int);
        let err = f.call(&[Type::Int]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::INVALID_VARIADIC);
    }

    #[test]
    fn test_newest_overload_wins() {
        let older = Rc::new(Callable::declared(vec![Type::Any], Type::Int));
        let newer = Callable::declared(vec![Type::String], Type::String).append(older);
        assert_eq!(newer.call(&[Type::String]).unwrap(), Type::String);
        assert_eq!(newer.call(&[Type::Bool]).unwrap(), Type::Int);
    }

    #[test]
    fn test_no_overload_joins_reasons() {
        let older = Rc::new(Callable::declared(vec![Type::Int, Type::Int], Type::Int));
        let newer =
            Callable::declared(vec![Type::Float64, Type::Float64], Type::Float64).append(older);
        let err = newer.call(&[Type::Int, Type::Float64]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NO_MATCHING_OVERLOAD);
        let message = err.to_string();
        assert!(message.contains("(Callable (Float64 Float64) Float64)"));
        assert!(message.contains("(Callable (Int Int) Int)"));
    }

    #[test]
    fn test_body_result_checked_against_declared_return() {
        let lying = Callable {
            params: vec![],
            ret: Type::Int,
            body: Rc::new(|_| Ok(Type::String)),
            previous: None,
        };
        let err = lying.call(&[]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::WRONG_RETURN_TYPE);
    }
}
