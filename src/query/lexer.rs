//! Query lexer — tokenizes a query string.

use crate::{Error, Result};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `?name`
    Variable,
    /// A bare identifier.
    Ident,
    /// An entry key literal.
    Integer,
    Comma,
    Colon,
    Amp,
    Eof,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Tokenize a query string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }

            // Variable: ?name
            '?' => {
                chars.next();
                let mut name = String::from('?');
                while let Some(&(_, c)) = chars.peek() {
                    if is_ident_char(c) {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.len() == 1 {
                    return Err(Error::Parse {
                        position: pos,
                        message: "expected a variable name after '?'".into(),
                    });
                }
                tokens.push(Token {
                    kind: TokenKind::Variable,
                    span: Span { start: pos, end: pos + name.len() },
                    text: name,
                });
            }

            // Entry key literals
            c if c.is_ascii_digit() => {
                let mut num = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Integer,
                    span: Span { start: pos, end: pos + num.len() },
                    text: num,
                });
            }

            // Identifiers
            c if is_ident_char(c) => {
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if is_ident_char(c) {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Ident,
                    span: Span { start: pos, end: pos + ident.len() },
                    text: ident,
                });
            }

            ',' => { chars.next(); tokens.push(punct(TokenKind::Comma, pos, ",")); }
            ':' => { chars.next(); tokens.push(punct(TokenKind::Colon, pos, ":")); }
            '&' => { chars.next(); tokens.push(punct(TokenKind::Amp, pos, "&")); }

            other => {
                return Err(Error::Parse {
                    position: pos,
                    message: format!("unexpected character: '{other}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len(), end: input.len() },
        text: String::new(),
    });

    Ok(tokens)
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span { start: pos, end: pos + text.len() },
        text: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_query() {
        let tokens = tokenize("?x : a r ?x").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            TokenKind::Variable,
            TokenKind::Colon,
            TokenKind::Ident,
            TokenKind::Ident,
            TokenKind::Variable,
            TokenKind::Eof,
        ]);
        assert_eq!(tokens[0].text, "?x");
    }

    #[test]
    fn test_conjunction_and_selectors() {
        let tokens = tokenize("?x, ?y : ?x r ?y & ?y s ?x").unwrap();
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Amp).count(), 1);
        assert_eq!(tokens.iter().filter(|t| t.kind == TokenKind::Comma).count(), 1);
    }

    #[test]
    fn test_key_literal() {
        let tokens = tokenize("?x : 3 r ?x").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Integer);
        assert_eq!(tokens[2].text, "3");
    }

    #[test]
    fn test_bare_question_mark_is_error() {
        assert!(tokenize("? : a r b").is_err());
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("?x : a % b").unwrap_err();
        assert!(matches!(err, Error::Parse { position: 7, .. }));
    }

    #[test]
    fn test_span() {
        let tokens = tokenize("  ?abc").unwrap();
        assert_eq!(tokens[0].span, Span { start: 2, end: 6 });
    }
}
