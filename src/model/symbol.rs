//! Identifier interning.
//!
//! Every subject and relation name is interned exactly once into a `Handle`.
//! Equality and hashing on handles replace string comparison everywhere past
//! the parsing boundary. A handle is never reused, even after the entry that
//! referenced it is removed.

use serde::{Deserialize, Serialize};

/// Canonical reference to an interned identifier string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub u32);

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Interning table: identifier string → stable handle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolTable {
    names: Vec<String>,
    index: hashbrown::HashMap<String, Handle>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning its canonical handle. Idempotent.
    pub fn intern(&mut self, name: &str) -> Handle {
        if let Some(&h) = self.index.get(name) {
            return h;
        }
        let h = Handle(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), h);
        h
    }

    /// Look a name up without interning it.
    pub fn lookup(&self, name: &str) -> Option<Handle> {
        self.index.get(name).copied()
    }

    /// The string this handle was interned from.
    pub fn resolve(&self, handle: Handle) -> &str {
        &self.names[handle.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
