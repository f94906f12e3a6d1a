//! Query AST.
//!
//! A query is `selectors : conditions` — a comma-separated list of variable
//! tokens, a colon, then `&`-separated triple patterns.

/// One position of a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    /// `?X` — a query variable (name keeps the `?` prefix).
    Variable(String),
    /// A literal identifier.
    Ident(String),
    /// A literal entry key.
    Key(u64),
}

impl Term {
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Variable(name) => f.write_str(name),
            Term::Ident(id) => f.write_str(id),
            Term::Key(key) => write!(f, "{key}"),
        }
    }
}

/// A triple pattern `LEFT MIDDLE RIGHT`. Left and right range over subjects,
/// middle over relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub left: Term,
    pub middle: Term,
    pub right: Term,
}

/// A parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub selectors: Vec<String>,
    pub conditions: Vec<Condition>,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.left, self.middle, self.right)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : ", self.selectors.join(", "))?;
        for (i, cond) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " & ")?;
            }
            write!(f, "{cond}")?;
        }
        Ok(())
    }
}
