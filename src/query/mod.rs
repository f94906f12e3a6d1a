//! # Pattern Query Language
//!
//! `selectors : conditions` — comma-separated variable tokens, a colon, then
//! `&`-separated triple patterns. Parsing is a pure function; evaluation
//! reads the store and never mutates it.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod result;

use crate::Result;
use ast::Query;

/// Parse a query string into an AST.
pub fn parse(text: &str) -> Result<Query> {
    let tokens = lexer::tokenize(text)?;
    parser::parse_query(&tokens)
}
