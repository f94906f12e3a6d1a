//! # factbase — Embedded Knowledge Base
//!
//! A mutable store of subject–relation–value facts ("triples"), a declarative
//! pattern-matching query language over that store, and an engine that
//! enforces algebraic properties (reflexive, irreflexive, symmetric,
//! antisymmetric, asymmetric, transitive) on named relations by computing
//! closures.
//!
//! ## Design Principles
//!
//! 1. **Explicit state**: a [`KnowledgeBase`] owns one [`TripleStore`] — no
//!    globals, no singletons
//! 2. **Interned handles**: identifiers are interned once; every container
//!    keys on handles, never on strings or object identity
//! 3. **Parser owns nothing**: command/query text → AST is a pure function
//! 4. **One join algorithm**: the evaluator always does a full equality join
//!    across all matches, never a first-match pick
//!
//! ## Quick Start
//!
//! ```rust
//! use factbase::KnowledgeBase;
//!
//! # fn example() -> factbase::Result<()> {
//! let mut kb = KnowledgeBase::new();
//! kb.insert("socrates is-a man")?;
//! kb.update_relation_property("is-a is transitive")?;
//! kb.insert("man is-a mortal")?;
//!
//! let result = kb.query("?what : socrates is-a ?what")?;
//! assert_eq!(result.ids("?what"), vec!["man", "mortal"]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod closure;
pub mod command;
pub mod model;
pub mod query;
pub mod store;

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{DataKind, Datum, Entry, EntryKey, Handle, PropertyFlags, Relation, RelationProperty};

// ============================================================================
// Re-exports: Store and results
// ============================================================================

pub use closure::InsertOutcome;
pub use query::result::{QueryResult, ResultColumn, ResultValue};
pub use store::{Snapshot, TripleStore};

// ============================================================================
// Top-level KnowledgeBase handle
// ============================================================================

/// The primary entry point. One logical session owns one mutable store;
/// every operation runs to completion before returning, including the
/// closure fixpoint loops.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    store: TripleStore,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self { store: TripleStore::new() }
    }

    /// Insert `"<id> (<relation> <value>)*"`. A lone `<id>` creates an empty
    /// entry. Facts rejected by active relation properties are dropped while
    /// the rest of the insertion continues; the outcome reports both counts.
    pub fn insert(&mut self, text: &str) -> Result<InsertOutcome> {
        let cmd = command::parse_insert(text)?;
        closure::ingest(&mut self.store, &cmd, closure::Cascade::Run)
    }

    /// Run `"<selectors> : <conditions>"` against the store.
    pub fn query(&self, text: &str) -> Result<QueryResult> {
        let parsed = query::parse(text)?;
        let bindings = query::eval::evaluate(&self.store, &parsed)?;
        Ok(QueryResult::project(&self.store, &bindings, &parsed.selectors))
    }

    /// Apply `"<relation> (is|not) <property-name>"`. Activation enforces the
    /// flag-exclusion invariants and runs the property's closure; deactivation
    /// only clears the flag (derived facts stay).
    pub fn update_relation_property(&mut self, text: &str) -> Result<()> {
        let cmd = command::parse_property(text)?;
        closure::update_property(&mut self.store, &cmd)
    }

    /// Human-readable dump of all entries and their facts.
    pub fn show(&self) -> String {
        self.store.to_string()
    }

    /// Human-readable dump of all relations and the recognised properties.
    pub fn show_relations(&self) -> String {
        self.store.describe_relations()
    }

    /// Clear the store back to its initial state.
    pub fn reset(&mut self) {
        self.store.reset();
    }

    /// Drop the most recent entry, if it is the one the caller expects.
    pub fn remove_last(&mut self, expected_last: EntryKey) -> bool {
        self.store.remove_last(expected_last)
    }

    /// Lossless copy of the current state, for the external versioning layer.
    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Replace the whole state in one step.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.store.restore(snapshot);
    }

    /// Read access to the underlying store (for advanced use).
    pub fn store(&self) -> &TripleStore {
        &self.store
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// A [`KnowledgeBase`] behind one exclusive lock.
///
/// The core has no internal locking: hosts that share a session across
/// threads must serialize the whole operation surface, which is exactly what
/// this wrapper does.
#[derive(Debug, Clone, Default)]
pub struct SharedKnowledgeBase {
    inner: Arc<Mutex<KnowledgeBase>>,
}

impl SharedKnowledgeBase {
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(KnowledgeBase::new())) }
    }

    /// Exclusive access for the duration of the guard.
    pub fn lock(&self) -> MutexGuard<'_, KnowledgeBase> {
        self.inner.lock()
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed command or query text. The store is unchanged.
    #[error("syntax error at position {position}: {message}")]
    Parse { position: usize, message: String },

    /// An API that promises an entity was handed a key or handle without one.
    /// Normal absence inside evaluation is an empty result, not this error.
    #[error("not found: {0}")]
    NotFound(String),

    /// Snapshot serialization failure.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// I/O failure surfaced from a persistence collaborator.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
