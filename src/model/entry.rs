//! Per-subject entries: the relation → value-set mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Handle;

/// Auto-incremented entry key. Assigned once, monotonic, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryKey(pub u64);

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type ValueSet = SmallVec<[Handle; 4]>;

/// One entry per subject: its key, its identity handle, and its facts.
///
/// Values per relation keep insertion order but behave as a set — adding a
/// value that is already present is a no-op. The relation map is a `BTreeMap`
/// so iteration order is deterministic and observable (dumps, query results).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    key: EntryKey,
    id: Handle,
    relations: BTreeMap<Handle, ValueSet>,
}

impl Entry {
    pub fn new(key: EntryKey, id: Handle) -> Self {
        Self { key, id, relations: BTreeMap::new() }
    }

    pub fn key(&self) -> EntryKey {
        self.key
    }

    /// The subject handle this entry is the record of.
    pub fn id(&self) -> Handle {
        self.id
    }

    pub fn relations(&self) -> impl Iterator<Item = Handle> + '_ {
        self.relations.keys().copied()
    }

    pub fn has_relation(&self, relation: Handle) -> bool {
        self.relations.contains_key(&relation)
    }

    /// Value set under `relation`; empty slice if the relation is absent.
    pub fn values(&self, relation: Handle) -> &[Handle] {
        self.relations.get(&relation).map_or(&[], |v| v.as_slice())
    }

    pub fn contains(&self, relation: Handle, value: Handle) -> bool {
        self.values(relation).contains(&value)
    }

    /// Add `value` under `relation`. Returns false if it was already present.
    pub fn add_value(&mut self, relation: Handle, value: Handle) -> bool {
        let values = self.relations.entry(relation).or_default();
        if values.contains(&value) {
            return false;
        }
        values.push(value);
        true
    }

    /// Remove `value` under `relation`. Returns false if it was not present.
    /// An emptied value set keeps the relation registered on the entry.
    pub fn remove_value(&mut self, relation: Handle, value: Handle) -> bool {
        match self.relations.get_mut(&relation) {
            Some(values) => match values.iter().position(|v| *v == value) {
                Some(pos) => {
                    values.remove(pos);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Total number of facts on this entry.
    pub fn fact_count(&self) -> usize {
        self.relations.values().map(|v| v.len()).sum()
    }
}
