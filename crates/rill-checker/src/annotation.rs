//! Parser for type annotations in documentation strings.
//!
//! ```text
//! Callable = "(" "Callable" "(" Type* ")" Type ")"
//! Type     = Atom | Callable | Union | Variadic
//! Union    = "(" "Union" Type* ")"
//! Variadic = "(" "Variadic" Type ")"
//! Atom     = "Any" | "Bool" | "Float64" | "Int" | "String" | "Unit"
//! ```
//!
//! Positions in errors are 1-based character offsets into the annotation.

use rill_types::ErrorCode;
use thiserror::Error;

use crate::ty::Type;

/// A malformed annotation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    #[error("position {position}: unknown type name '{name}'")]
    UnknownType { position: usize, name: String },
    #[error("position {position}: expected {expected}, found {found}")]
    Expected {
        position: usize,
        expected: &'static str,
        found: String,
    },
    #[error("doc string has {0} type annotations, expected at most one")]
    Multiple(usize),
}

impl AnnotationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownType { .. } => ErrorCode::UNKNOWN_TYPE_NAME,
            Self::Expected { .. } => ErrorCode::EXPECTED_TOKEN,
            Self::Multiple(_) => ErrorCode::MULTIPLE_ANNOTATIONS,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Scanner
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Open,
    Close,
    Word(String),
    End,
}

fn describe(tok: &Tok) -> String {
    match tok {
        Tok::Open => "'('".to_string(),
        Tok::Close => "')'".to_string(),
        Tok::Word(word) => format!("'{word}'"),
        Tok::End => "end of annotation".to_string(),
    }
}

/// Split annotation text into tokens with their 1-based positions.
fn scan(text: &str) -> Vec<(Tok, usize)> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().enumerate().peekable();
    while let Some((i, ch)) = chars.next() {
        match ch {
            '(' => tokens.push((Tok::Open, i + 1)),
            ')' => tokens.push((Tok::Close, i + 1)),
            c if c.is_whitespace() => {}
            c => {
                let mut word = c.to_string();
                while let Some(&(_, next)) = chars.peek() {
                    if next == '(' || next == ')' || next.is_whitespace() {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push((Tok::Word(word), i + 1));
            }
        }
    }
    tokens.push((Tok::End, text.chars().count() + 1));
    tokens
}

// ══════════════════════════════════════════════════════════════════════════════
// Parser
// ══════════════════════════════════════════════════════════════════════════════

struct AnnotationParser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
}

impl AnnotationParser {
    fn peek(&self) -> &(Tok, usize) {
        // `scan` always ends with `End`, and `advance` never steps past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> (Tok, usize) {
        let tok = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Tok, expected: &'static str) -> Result<(), AnnotationError> {
        let (tok, position) = self.advance();
        if tok == want {
            Ok(())
        } else {
            Err(AnnotationError::Expected {
                position,
                expected,
                found: describe(&tok),
            })
        }
    }

    fn parse_type(&mut self) -> Result<Type, AnnotationError> {
        match self.advance() {
            (Tok::Word(name), position) => atom(&name, position),
            (Tok::Open, _) => self.parse_compound(),
            (tok, position) => Err(AnnotationError::Expected {
                position,
                expected: "a type",
                found: describe(&tok),
            }),
        }
    }

    /// Types up to and including the closing `)`.
    fn parse_types_until_close(&mut self) -> Result<Vec<Type>, AnnotationError> {
        let mut types = Vec::new();
        while self.peek().0 != Tok::Close {
            types.push(self.parse_type()?);
        }
        self.advance();
        Ok(types)
    }

    /// Everything after a `(` that opens a compound type.
    fn parse_compound(&mut self) -> Result<Type, AnnotationError> {
        let (head, position) = self.advance();
        let Tok::Word(head) = head else {
            return Err(AnnotationError::Expected {
                position,
                expected: "'Callable', 'Union' or 'Variadic'",
                found: describe(&head),
            });
        };
        match head.as_str() {
            "Callable" => {
                self.expect(Tok::Open, "'(' before parameter types")?;
                let params = self.parse_types_until_close()?;
                let ret = self.parse_type()?;
                self.expect(Tok::Close, "')' after return type")?;
                Ok(Type::callable(params, ret))
            }
            "Union" => Ok(Type::union(self.parse_types_until_close()?)),
            "Variadic" => {
                let element = self.parse_type()?;
                self.expect(Tok::Close, "')' after variadic element type")?;
                Ok(Type::Variadic(Box::new(element)))
            }
            _ => Err(AnnotationError::UnknownType {
                position,
                name: head,
            }),
        }
    }
}

fn atom(name: &str, position: usize) -> Result<Type, AnnotationError> {
    match name {
        "Any" => Ok(Type::Any),
        "Bool" => Ok(Type::Bool),
        "Float64" => Ok(Type::Float64),
        "Int" => Ok(Type::Int),
        "String" => Ok(Type::String),
        "Unit" => Ok(Type::Unit),
        _ => Err(AnnotationError::UnknownType {
            position,
            name: name.to_string(),
        }),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════════════════════

/// Parse exactly one type.
pub fn parse_annotation(text: &str) -> Result<Type, AnnotationError> {
    let mut parser = AnnotationParser {
        tokens: scan(text),
        pos: 0,
    };
    let ty = parser.parse_type()?;
    parser.expect(Tok::End, "end of annotation")?;
    Ok(ty)
}

/// Extract the signature from a documentation string.
///
/// The signature is the one line that starts with `(Callable`; a doc string
/// without one declares nothing.
pub fn parse_doc(doc: &str) -> Result<Option<Type>, AnnotationError> {
    let lines: Vec<&str> = doc
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("(Callable"))
        .collect();
    match lines.as_slice() {
        [] => Ok(None),
        [line] => parse_annotation(line).map(Some),
        many => Err(AnnotationError::Multiple(many.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round(text: &str) -> String {
        parse_annotation(text).unwrap().to_string()
    }

    #[test]
    fn test_atoms() {
        for name in ["Any", "Bool", "Float64", "Int", "String", "Unit"] {
            assert_eq!(round(name), name);
        }
    }

    #[test]
    fn test_callable_with_variadic() {
        assert_eq!(
            round("(Callable ((Variadic Any)) Unit)"),
            "(Callable ((Variadic Any)) Unit)"
        );
        assert_eq!(round("( Callable () Int )"), "(Callable () Int)");
    }

    #[test]
    fn test_union_is_simplified() {
        assert_eq!(round("(Union Int Bool Int)"), "(Union Bool Int)");
        assert_eq!(round("(Union Int)"), "Int");
        assert_eq!(round("(Union)"), "Unit");
    }

    #[test]
    fn test_nested_callable() {
        assert_eq!(
            round("(Callable ((Callable (Int) Bool) (Union String Int)) Any)"),
            "(Callable ((Callable (Int) Bool) (Union Int String)) Any)"
        );
    }

    #[test]
    fn test_unknown_type_name() {
        let err = parse_annotation("(Callable (Number) Int)").unwrap_err();
        assert_eq!(
            err,
            AnnotationError::UnknownType {
                position: 12,
                name: "Number".into()
            }
        );
        assert_eq!(err.code(), ErrorCode::UNKNOWN_TYPE_NAME);
    }

    #[test]
    fn test_expected_token() {
        let err = parse_annotation("(Callable Int Int)").unwrap_err();
        assert_eq!(err.code(), ErrorCode::EXPECTED_TOKEN);
        assert!(err.to_string().starts_with("position 11:"));

        let err = parse_annotation("(Variadic Int").unwrap_err();
        assert_eq!(err.code(), ErrorCode::EXPECTED_TOKEN);

        let err = parse_annotation("Int Int").unwrap_err();
        assert_eq!(err.code(), ErrorCode::EXPECTED_TOKEN);
    }

    #[test]
    fn test_doc_extraction() {
        assert_eq!(parse_doc("Adds things.").unwrap(), None);
        let ty = parse_doc("Adds things.\n  (Callable (Int Int) Int)\n").unwrap();
        assert_eq!(ty.unwrap().to_string(), "(Callable (Int Int) Int)");
    }

    #[test]
    fn test_doc_with_two_signatures() {
        let err = parse_doc("(Callable () Int)\n(Callable () Bool)").unwrap_err();
        assert_eq!(err, AnnotationError::Multiple(2));
        assert_eq!(err.code(), ErrorCode::MULTIPLE_ANNOTATIONS);
    }
}
