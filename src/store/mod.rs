//! In-memory triple store.
//!
//! One `TripleStore` owns the symbol table, the entry table and the relation
//! registry. It is the only mutable state in the crate.
//!
//! ## Semantics
//!
//! - Entry keys auto-increment from 1 and are never reused, even across
//!   `remove_last` within the same store generation.
//! - Every identifier mentioned as an insertion value gets its own entry
//!   (auto-creation), so it is independently queryable.
//! - Normal absence is `None` / an empty slice, never an error.
//! - `restore` replaces the whole state in one step; no caller can observe a
//!   partially restored store.
//!
//! Property validation and closure derivation live in [`crate::closure`] —
//! this module stores facts, it does not judge them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Entry, EntryKey, Handle, Relation, RelationProperty, SymbolTable};
use crate::{Error, Result};

// ============================================================================
// TripleStore
// ============================================================================

/// The mutable store of subject–relation–value facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripleStore {
    symbols: SymbolTable,
    /// key → entry; BTreeMap so dumps and scans walk keys in order.
    entries: BTreeMap<EntryKey, Entry>,
    /// subject handle → its entry key.
    key_index: hashbrown::HashMap<Handle, EntryKey>,
    relations: BTreeMap<Handle, Relation>,
    next_key: u64,
}

impl Default for TripleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TripleStore {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            entries: BTreeMap::new(),
            key_index: hashbrown::HashMap::new(),
            relations: BTreeMap::new(),
            next_key: 1,
        }
    }

    // ========================================================================
    // Resolution (intern + create)
    // ========================================================================

    /// Entry key for `id`, creating the entry if this subject has none yet.
    pub fn resolve_entry(&mut self, id: &str) -> EntryKey {
        let handle = self.symbols.intern(id);
        if let Some(&key) = self.key_index.get(&handle) {
            return key;
        }
        let key = EntryKey(self.next_key);
        self.next_key += 1;
        self.entries.insert(key, Entry::new(key, handle));
        self.key_index.insert(handle, key);
        debug!(%key, id, "entry created");
        key
    }

    /// Relation handle for `id`, registering the relation (all flags off) if
    /// it is new.
    pub fn resolve_relation(&mut self, id: &str) -> Handle {
        let handle = self.symbols.intern(id);
        self.relations.entry(handle).or_insert_with(|| {
            debug!(id, "relation created");
            Relation::new(handle)
        });
        handle
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn find_key(&self, id: &str) -> Option<EntryKey> {
        let handle = self.symbols.lookup(id)?;
        self.key_of(handle)
    }

    pub fn key_of(&self, subject: Handle) -> Option<EntryKey> {
        self.key_index.get(&subject).copied()
    }

    pub fn entry_by_key(&self, key: EntryKey) -> Option<&Entry> {
        self.entries.get(&key)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = EntryKey> + '_ {
        self.entries.keys().copied()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Relation handle for `id`, if `id` names a registered relation.
    pub fn find_relation(&self, id: &str) -> Option<Handle> {
        let handle = self.symbols.lookup(id)?;
        self.relations.contains_key(&handle).then_some(handle)
    }

    pub fn relation(&self, handle: Handle) -> Option<&Relation> {
        self.relations.get(&handle)
    }

    pub fn relation_mut(&mut self, handle: Handle) -> Option<&mut Relation> {
        self.relations.get_mut(&handle)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add a raw fact. The subject entry must exist.
    /// Returns Ok(false) if the fact was already present (set semantics).
    pub fn add_fact(&mut self, key: EntryKey, relation: Handle, value: Handle) -> Result<bool> {
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| Error::NotFound(format!("entry {key}")))?;
        Ok(entry.add_value(relation, value))
    }

    /// Remove a raw fact. Returns Ok(false) if it was not present.
    pub fn remove_fact(&mut self, key: EntryKey, relation: Handle, value: Handle) -> Result<bool> {
        let entry = self
            .entries
            .get_mut(&key)
            .ok_or_else(|| Error::NotFound(format!("entry {key}")))?;
        Ok(entry.remove_value(relation, value))
    }

    /// Delete the entry at the highest key, but only if it is the one the
    /// caller expects. The key counter steps back so the next insertion
    /// reuses it. Not a general delete.
    pub fn remove_last(&mut self, expected_last: EntryKey) -> bool {
        if self.next_key <= 1 || EntryKey(self.next_key - 1) != expected_last {
            return false;
        }
        match self.entries.remove(&expected_last) {
            Some(entry) => {
                self.key_index.remove(&entry.id());
                self.next_key -= 1;
                true
            }
            None => false,
        }
    }

    /// Clear everything back to the initial state. The next entry gets the
    /// initial key again; interned handles from before the reset are gone
    /// with the symbol table.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // ========================================================================
    // Snapshot / restore (persistence collaborator contract)
    // ========================================================================

    pub fn snapshot(&self) -> Snapshot {
        Snapshot { state: self.clone() }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        *self = snapshot.state;
    }

    // ========================================================================
    // Dumps
    // ========================================================================

    /// Human-readable list of relations and the recognised property names.
    pub fn describe_relations(&self) -> String {
        let mut out = String::from("relations:\n");
        for relation in self.relations.values() {
            out.push_str("\t");
            out.push_str(self.symbols.resolve(relation.handle()));
            let active: Vec<&str> = relation.flags().active().map(|p| p.name()).collect();
            if !active.is_empty() {
                out.push_str(" [");
                out.push_str(&active.join(", "));
                out.push(']');
            }
            out.push('\n');
        }
        out.push_str("properties:\n");
        for property in RelationProperty::ALL {
            out.push('\t');
            out.push_str(property.name());
            out.push('\n');
        }
        out
    }
}

impl std::fmt::Display for TripleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.entries.is_empty() {
            return write!(f, "nothing is in the store");
        }
        for (key, entry) in &self.entries {
            write!(f, "index => {key} | id => {}", self.symbols.resolve(entry.id()))?;
            for relation in entry.relations() {
                let values = entry.values(relation);
                if values.is_empty() {
                    continue;
                }
                write!(f, " | {} => ", self.symbols.resolve(relation))?;
                if values.len() == 1 {
                    write!(f, "{}", self.symbols.resolve(values[0]))?;
                } else {
                    write!(f, "{{")?;
                    for value in values {
                        write!(f, " {}", self.symbols.resolve(*value))?;
                    }
                    write!(f, " }}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Opaque, lossless copy of a store's state.
///
/// The external versioning layer stacks these for undo/redo and ships them
/// for import/export. The core makes no assumption about file formats; JSON
/// helpers are provided for collaborators that want a byte representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    state: TripleStore,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
