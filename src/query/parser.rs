//! Recursive descent parser for the pattern query language.
//!
//! Grammar:
//!
//! ```text
//! query      := selectors ':' conditions EOF
//! selectors  := VARIABLE (',' VARIABLE)*
//! conditions := condition ('&' condition)*
//! condition  := term term term
//! term       := VARIABLE | IDENT | INTEGER
//! ```
//!
//! Malformed text is a parse failure reported before evaluation starts.

use super::ast::{Condition, Query, Term};
use super::lexer::{Token, TokenKind};
use crate::{Error, Result};

/// Parser state — wraps a token slice with cursor.
struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> &Token {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token> {
        let tok = self.peek();
        if tok.kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {:?}, got {:?} '{}'", kind, tok.kind, tok.text)))
        }
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, msg: String) -> Error {
        Error::Parse {
            position: self.peek().span.start,
            message: msg,
        }
    }
}

/// Parse a complete query from tokens.
pub fn parse_query(tokens: &[Token]) -> Result<Query> {
    let mut p = Parser::new(tokens);

    // Selectors
    let mut selectors = Vec::new();
    loop {
        if !p.at(TokenKind::Variable) {
            return Err(p.error("selectors must be variable tokens (e.g. ?x)".into()));
        }
        let text = p.advance().text.clone();
        selectors.push(text);
        if !p.eat(TokenKind::Comma) {
            break;
        }
    }

    p.expect(TokenKind::Colon)?;

    // Conditions
    let mut conditions = Vec::new();
    loop {
        let left = parse_term(&mut p)?;
        let middle = parse_term(&mut p)?;
        let right = parse_term(&mut p)?;
        conditions.push(Condition { left, middle, right });
        if !p.eat(TokenKind::Amp) {
            break;
        }
    }

    p.expect(TokenKind::Eof)?;

    Ok(Query { selectors, conditions })
}

fn parse_term(p: &mut Parser<'_>) -> Result<Term> {
    match p.peek_kind() {
        TokenKind::Variable => Ok(Term::Variable(p.advance().text.clone())),
        TokenKind::Ident => Ok(Term::Ident(p.advance().text.clone())),
        TokenKind::Integer => {
            let tok = p.advance();
            let text = tok.text.clone();
            let position = tok.span.start;
            let key = text.parse::<u64>().map_err(|_| Error::Parse {
                position,
                message: format!("key literal out of range: '{text}'"),
            })?;
            Ok(Term::Key(key))
        }
        kind => Err(p.error(format!("expected a pattern term, got {kind:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::lexer::tokenize;
    use pretty_assertions::assert_eq;

    fn parse(text: &str) -> Result<Query> {
        parse_query(&tokenize(text)?)
    }

    #[test]
    fn test_single_condition() {
        let q = parse("?x : a r ?x").unwrap();
        assert_eq!(q.selectors, vec!["?x"]);
        assert_eq!(q.conditions.len(), 1);
        assert_eq!(q.conditions[0].left, Term::Ident("a".into()));
        assert_eq!(q.conditions[0].middle, Term::Ident("r".into()));
        assert_eq!(q.conditions[0].right, Term::Variable("?x".into()));
    }

    #[test]
    fn test_multiple_selectors_and_conditions() {
        let q = parse("?x, ?y : ?x r ?y & ?y s ?x").unwrap();
        assert_eq!(q.selectors, vec!["?x", "?y"]);
        assert_eq!(q.conditions.len(), 2);
    }

    #[test]
    fn test_key_literal_term() {
        let q = parse("?x : 2 r ?x").unwrap();
        assert_eq!(q.conditions[0].left, Term::Key(2));
    }

    #[test]
    fn test_missing_colon_is_parse_error() {
        assert!(matches!(parse("?x a r ?x"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_non_variable_selector_is_parse_error() {
        assert!(matches!(parse("a : a r ?x"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_unbalanced_pattern_is_parse_error() {
        assert!(matches!(parse("?x : a r"), Err(Error::Parse { .. })));
        assert!(matches!(parse("?x : a r ?x ?y"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_round_trip_display() {
        let q = parse("?x, ?y : ?x r ?y & ?y s b").unwrap();
        assert_eq!(q.to_string(), "?x, ?y : ?x r ?y & ?y s b");
    }
}
