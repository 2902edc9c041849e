//! Rill parser: converts a token stream into AST nodes.

mod parse_expr;
mod parser;

pub use parser::{ParseResult, Parser};

use rill_lexer::Lexer;
use rill_types::ast::Node;
use rill_types::{Diagnostics, SourceFile};

/// Lex and parse `source`, returning the top-level nodes in order.
///
/// Lexer and parser errors are merged; any error fails the whole file, since
/// the engines must never see a partially parsed program.
#[tracing::instrument(level = "debug", skip(source))]
pub fn parse_source(source: &str, file: &str) -> Result<Vec<Node>, Diagnostics> {
    let source_file = SourceFile::new(file, source);
    let lexed = Lexer::new(&source_file).lex();
    let mut errors = lexed.errors;
    let parsed = Parser::new(lexed.tokens, &source_file).parse();
    errors.extend(parsed.errors);
    if errors.has_errors() {
        tracing::debug!(total = errors.total_errors, "parse failed");
        return Err(errors);
    }
    Ok(parsed.nodes)
}
