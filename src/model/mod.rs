//! # Knowledge Base Model
//!
//! The data types that cross every boundary: store ↔ evaluator ↔ closure ↔ user.
//!
//! Design rule: this module is pure data — no I/O, no store access, no parsing.

pub mod datum;
pub mod entry;
pub mod relation;
pub mod symbol;

pub use datum::{DataKind, Datum};
pub use entry::{Entry, EntryKey};
pub use relation::{PropertyFlags, Relation, RelationProperty};
pub use symbol::{Handle, SymbolTable};
