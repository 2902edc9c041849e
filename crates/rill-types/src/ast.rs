//! AST node types for the Rill language.
//!
//! Every node carries a [`Span`] for error reporting. The node set is closed:
//! both the evaluator and the type checker match on [`NodeKind`] exhaustively.
//!
//! Lambda definitions and quoted nodes are held behind [`Rc`] so that runtime
//! closures and quoted values can share them without cloning subtrees.

use std::fmt;
use std::rc::Rc;

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Nodes
// ══════════════════════════════════════════════════════════════════════════════

/// A single AST node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every node shape the parser can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ── Literals ──
    /// `()`, also synthesized for a missing `else` branch.
    Unit,
    /// `#t`
    True,
    /// `#f`
    False,
    /// Integer literal, kept as source text: `42`, `-7`
    Int(String),
    /// Float literal, kept as source text: `3.14`
    Float64(String),
    /// String literal with escapes already resolved.
    String(String),

    /// A symbol reference: `x`, `+`, `null?`
    Symbol(String),

    /// `(begin e...)`, evaluated in a fresh child scope.
    Block(Vec<Node>),
    /// `(f args...)`
    Call { callee: Box<Node>, args: Vec<Node> },
    /// `(if p t e)` / `(cond (p e)... (else e))`
    Conditional {
        cases: Vec<Case>,
        otherwise: Box<Node>,
    },
    /// `(while p body)`
    While { predicate: Box<Node>, body: Box<Node> },
    /// `(define name value)`
    Define { name: Ident, value: Box<Node> },
    /// `(set! name value)`
    Set { name: Ident, value: Box<Node> },
    /// `(lambda (params...) "doc" body)`
    Lambda(Rc<LambdaExpr>),
    /// `(quote e)` / `'e`
    Quote(Rc<Node>),
    /// `(return! e)`
    Return(Box<Node>),
}

impl NodeKind {
    /// Short variant name, used in trace output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::True | Self::False => "bool",
            Self::Int(_) => "int",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Block(_) => "block",
            Self::Call { .. } => "call",
            Self::Conditional { .. } => "conditional",
            Self::While { .. } => "while",
            Self::Define { .. } => "define",
            Self::Set { .. } => "set",
            Self::Lambda(_) => "lambda",
            Self::Quote(_) => "quote",
            Self::Return(_) => "return",
        }
    }
}

/// One `predicate → expression` arm of a conditional.
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub predicate: Node,
    pub body: Node,
}

/// A lambda literal.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub params: Vec<Ident>,
    pub doc: Option<String>,
    /// Multi-form bodies arrive wrapped in a [`NodeKind::Block`].
    pub body: Node,
    pub span: Span,
}

impl LambdaExpr {
    /// Parameter names in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Display
// ══════════════════════════════════════════════════════════════════════════════

/// Write `s` as a double-quoted literal, escaping what the lexer unescapes.
pub fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str("\"")
}

fn write_list(f: &mut fmt::Formatter<'_>, head: &str, items: &[Node]) -> fmt::Result {
    write!(f, "({head}")?;
    for item in items {
        write!(f, " {item}")?;
    }
    f.write_str(")")
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Unit => f.write_str("()"),
            NodeKind::True => f.write_str("#t"),
            NodeKind::False => f.write_str("#f"),
            NodeKind::Int(text) | NodeKind::Float64(text) => f.write_str(text),
            NodeKind::String(s) => write_escaped(f, s),
            NodeKind::Symbol(name) => f.write_str(name),
            NodeKind::Block(body) => write_list(f, "begin", body),
            NodeKind::Call { callee, args } => {
                write!(f, "({callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            NodeKind::Conditional { cases, otherwise } => {
                if let [case] = cases.as_slice() {
                    return write!(f, "(if {} {} {})", case.predicate, case.body, otherwise);
                }
                f.write_str("(cond")?;
                for case in cases {
                    write!(f, " ({} {})", case.predicate, case.body)?;
                }
                write!(f, " (else {otherwise}))")
            }
            NodeKind::While { predicate, body } => write!(f, "(while {predicate} {body})"),
            NodeKind::Define { name, value } => write!(f, "(define {} {})", name.name, value),
            NodeKind::Set { name, value } => write!(f, "(set! {} {})", name.name, value),
            NodeKind::Lambda(lambda) => {
                f.write_str("(lambda (")?;
                for (i, name) in lambda.param_names().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    f.write_str(name)?;
                }
                f.write_str(")")?;
                if let Some(doc) = &lambda.doc {
                    f.write_str(" ")?;
                    write_escaped(f, doc)?;
                }
                write!(f, " {})", lambda.body)
            }
            NodeKind::Quote(inner) => write!(f, "(quote {inner})"),
            NodeKind::Return(value) => write!(f, "(return! {value})"),
        }
    }
}
