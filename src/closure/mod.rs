//! Relation-property enforcement.
//!
//! Two halves:
//!
//! - **Validation** — every fact is checked against its relation's active
//!   flags before it is stored. A rejected fact is dropped; the rest of the
//!   insertion continues.
//! - **Closure** — activating a property derives the facts it implies, by
//!   driving the query evaluator and the store to a fixpoint. Termination is
//!   measured on result cardinality, never on whether an insertion succeeded,
//!   so the loops end even when validation rejects every attempt.
//!
//! Closure-internal insertions carry [`Cascade::Suppress`] so they can never
//! re-enter closure application — the marker is a parameter threaded down the
//! call, not a flag on the store.

use tracing::{debug, trace};

use crate::command::{InsertCommand, PropertyCommand};
use crate::model::{EntryKey, Handle, RelationProperty};
use crate::query;
use crate::store::TripleStore;
use crate::{Error, Result};

// ============================================================================
// Cascade marker
// ============================================================================

/// Whether an insertion may trigger closure re-application on the relations
/// it touches. Closure loops insert with `Suppress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cascade {
    Run,
    Suppress,
}

/// What an insertion did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Key of the subject's entry (created by this call if `created`).
    pub key: EntryKey,
    pub created: bool,
    /// Facts added to the store.
    pub accepted: usize,
    /// Facts dropped by property validation.
    pub rejected: usize,
}

// ============================================================================
// Insertion
// ============================================================================

/// Apply a parsed insertion: resolve the subject entry, auto-create value
/// entries, validate each fact, store the valid ones, then re-apply active
/// closures on the touched relations (unless suppressed).
pub fn ingest(store: &mut TripleStore, command: &InsertCommand, cascade: Cascade) -> Result<InsertOutcome> {
    let created = store.find_key(&command.subject).is_none();
    let key = store.resolve_entry(&command.subject);

    let mut accepted = 0;
    let mut rejected = 0;
    let mut touched: Vec<Handle> = Vec::new();

    for (relation_id, value_id) in &command.facts {
        let relation = store.resolve_relation(relation_id);
        let value_key = store.resolve_entry(value_id);
        let value = match store.entry_by_key(value_key) {
            Some(entry) => entry.id(),
            None => return Err(Error::NotFound(format!("entry {value_key}"))),
        };

        match insert_fact(store, key, relation, value)? {
            FactStatus::Added | FactStatus::AlreadyPresent => accepted += 1,
            FactStatus::Rejected(property) => {
                debug!(
                    subject = %command.subject,
                    relation = %relation_id,
                    value = %value_id,
                    property = %property,
                    "fact rejected by property validation"
                );
                rejected += 1;
            }
        }
        if !touched.contains(&relation) {
            touched.push(relation);
        }
    }

    if cascade == Cascade::Run {
        for relation in touched {
            let closure_active = store
                .relation(relation)
                .is_some_and(|r| r.flags().any_closure_active());
            if closure_active {
                apply_active(store, relation)?;
            }
        }
    }

    Ok(InsertOutcome { key, created, accepted, rejected })
}

/// Fate of one fact at the validation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FactStatus {
    Added,
    AlreadyPresent,
    Rejected(RelationProperty),
}

/// Validate one fact against the relation's active flags and store it if it
/// passes.
fn insert_fact(
    store: &mut TripleStore,
    key: EntryKey,
    relation: Handle,
    value: Handle,
) -> Result<FactStatus> {
    if let Some(property) = validate(store, key, relation, value)? {
        return Ok(FactStatus::Rejected(property));
    }
    match store.add_fact(key, relation, value)? {
        true => Ok(FactStatus::Added),
        false => Ok(FactStatus::AlreadyPresent),
    }
}

/// Returns the violated property, if any.
fn validate(
    store: &TripleStore,
    key: EntryKey,
    relation: Handle,
    value: Handle,
) -> Result<Option<RelationProperty>> {
    let Some(rel) = store.relation(relation) else {
        return Err(Error::NotFound(format!("relation {relation}")));
    };
    let flags = *rel.flags();
    let subject = store
        .entry_by_key(key)
        .map(|e| e.id())
        .ok_or_else(|| Error::NotFound(format!("entry {key}")))?;

    if flags.reflexive && value != subject {
        return Ok(Some(RelationProperty::Reflexive));
    }
    if flags.irreflexive && value == subject {
        return Ok(Some(RelationProperty::Irreflexive));
    }

    // Reverse fact lookup for the symmetry-breaking properties.
    let reverse_holds = store
        .key_of(value)
        .and_then(|k| store.entry_by_key(k))
        .is_some_and(|e| e.contains(relation, subject));

    if flags.asymmetric && reverse_holds {
        return Ok(Some(RelationProperty::Asymmetric));
    }
    if flags.antisymmetric && value != subject && reverse_holds {
        return Ok(Some(RelationProperty::Antisymmetric));
    }

    Ok(None)
}

// ============================================================================
// Property updates
// ============================================================================

/// Apply a parsed `<relation> (is|not) <property>` command.
pub fn update_property(store: &mut TripleStore, command: &PropertyCommand) -> Result<()> {
    let relation = store.resolve_relation(&command.relation);
    {
        let Some(rel) = store.relation_mut(relation) else {
            return Err(Error::NotFound(format!("relation {}", command.relation)));
        };
        if command.enable {
            rel.activate(command.property);
        } else {
            // No retraction of already-derived facts: the flag changes,
            // the facts stay.
            rel.deactivate(command.property);
            return Ok(());
        }
    }
    apply_active(store, relation)
}

/// Run the closure procedure of every active property on `relation`, in
/// declaration order. Idempotent.
pub fn apply_active(store: &mut TripleStore, relation: Handle) -> Result<()> {
    let Some(flags) = store.relation(relation).map(|r| *r.flags()) else {
        return Err(Error::NotFound(format!("relation {relation}")));
    };
    if flags.reflexive {
        close_reflexive(store, relation)?;
    }
    if flags.irreflexive {
        purge_self_facts(store, relation)?;
    }
    if flags.symmetric {
        close_symmetric(store, relation)?;
    }
    if flags.transitive {
        close_transitive(store, relation)?;
    }
    Ok(())
}

/// Add (id, R, id) on every entry that has at least one fact under R.
fn close_reflexive(store: &mut TripleStore, relation: Handle) -> Result<()> {
    let targets: Vec<EntryKey> = store
        .entries()
        .filter(|e| !e.values(relation).is_empty())
        .map(|e| e.key())
        .collect();
    for key in targets {
        let Some(id) = store.entry_by_key(key).map(|e| e.id()) else { continue };
        insert_fact(store, key, relation, id)?;
    }
    Ok(())
}

/// Remove (id, R, id) wherever present.
fn purge_self_facts(store: &mut TripleStore, relation: Handle) -> Result<()> {
    let targets: Vec<(EntryKey, Handle)> = store
        .entries()
        .filter(|e| e.contains(relation, e.id()))
        .map(|e| (e.key(), e.id()))
        .collect();
    for (key, id) in targets {
        store.remove_fact(key, relation, id)?;
    }
    Ok(())
}

/// Fixpoint derivation driven by a two-variable query: run `query_text`,
/// insert `(right, R, left)`-style facts for every returned pair, and stop
/// when both variable domains keep their cardinality across an iteration.
fn fixpoint(
    store: &mut TripleStore,
    relation: Handle,
    query_text: &str,
    first: &str,
    second: &str,
    // maps a (first, second) pair to the (subject key, value handle) to insert
    orient: impl Fn(&TripleStore, Handle, Handle) -> Option<(EntryKey, Handle)>,
) -> Result<()> {
    let parsed = query::parse(query_text)?;
    let mut previous: Option<(usize, usize)> = None;
    loop {
        let bindings = query::eval::evaluate(store, &parsed)?;
        let cardinality = (bindings.domain_len(first), bindings.domain_len(second));
        trace!(relation = %relation, ?cardinality, "closure iteration");

        for (a, b) in bindings.pairs(first, second) {
            if let Some((key, value)) = orient(store, a.handle(), b.handle()) {
                insert_fact(store, key, relation, value)?;
            }
        }

        if previous == Some(cardinality) {
            return Ok(());
        }
        previous = Some(cardinality);
    }
}

/// For every (x, y) under R, derive (y, R, x).
fn close_symmetric(store: &mut TripleStore, relation: Handle) -> Result<()> {
    let name = store.symbols().resolve(relation).to_string();
    let text = format!("?x, ?y : ?x {name} ?y");
    fixpoint(store, relation, &text, "?x", "?y", |store, x, y| {
        store.key_of(y).map(|key| (key, x))
    })
}

/// For every (x, y), (y, z) under R, derive (x, R, z).
fn close_transitive(store: &mut TripleStore, relation: Handle) -> Result<()> {
    let name = store.symbols().resolve(relation).to_string();
    let text = format!("?x, ?z : ?x {name} ?y & ?y {name} ?z");
    fixpoint(store, relation, &text, "?x", "?z", |store, x, z| {
        store.key_of(x).map(|key| (key, z))
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command;
    use pretty_assertions::assert_eq;

    fn insert(store: &mut TripleStore, text: &str) -> InsertOutcome {
        let cmd = command::parse_insert(text).unwrap();
        ingest(store, &cmd, Cascade::Run).unwrap()
    }

    fn set_property(store: &mut TripleStore, text: &str) {
        let cmd = command::parse_property(text).unwrap();
        update_property(store, &cmd).unwrap();
    }

    fn holds(store: &TripleStore, subject: &str, relation: &str, value: &str) -> bool {
        let Some(key) = store.find_key(subject) else { return false };
        let Some(rel) = store.find_relation(relation) else { return false };
        let Some(value) = store.symbols().lookup(value) else { return false };
        store.entry_by_key(key).is_some_and(|e| e.contains(rel, value))
    }

    #[test]
    fn test_symmetric_closure_derives_reverse() {
        let mut store = TripleStore::new();
        set_property(&mut store, "r is symmetric");
        insert(&mut store, "a r b");
        assert!(holds(&store, "a", "r", "b"));
        assert!(holds(&store, "b", "r", "a"));
    }

    #[test]
    fn test_symmetric_activation_closes_existing_facts() {
        let mut store = TripleStore::new();
        insert(&mut store, "a r b");
        assert!(!holds(&store, "b", "r", "a"));
        set_property(&mut store, "r is symmetric");
        assert!(holds(&store, "b", "r", "a"));
    }

    #[test]
    fn test_transitive_closure_chains() {
        let mut store = TripleStore::new();
        set_property(&mut store, "r is transitive");
        insert(&mut store, "a r b");
        insert(&mut store, "b r c");
        assert!(holds(&store, "a", "r", "c"));
    }

    #[test]
    fn test_transitive_closure_long_chain() {
        let mut store = TripleStore::new();
        set_property(&mut store, "r is transitive");
        insert(&mut store, "a r b");
        insert(&mut store, "b r c");
        insert(&mut store, "c r d");
        assert!(holds(&store, "a", "r", "c"));
        assert!(holds(&store, "a", "r", "d"));
        assert!(holds(&store, "b", "r", "d"));
    }

    #[test]
    fn test_reflexive_activation_adds_self_facts() {
        let mut store = TripleStore::new();
        insert(&mut store, "a r b");
        set_property(&mut store, "r is reflexive");
        assert!(holds(&store, "a", "r", "a"));
        // value entries without facts under r get nothing
        assert!(!holds(&store, "b", "r", "b"));
    }

    #[test]
    fn test_reflexive_rejects_non_self_facts() {
        let mut store = TripleStore::new();
        set_property(&mut store, "r is reflexive");
        let outcome = insert(&mut store, "a r b");
        assert_eq!(outcome.rejected, 1);
        assert!(!holds(&store, "a", "r", "b"));
        // the value entry is still auto-created
        assert!(store.find_key("b").is_some());
    }

    #[test]
    fn test_irreflexive_activation_purges_self_facts() {
        let mut store = TripleStore::new();
        insert(&mut store, "a r a r b");
        assert!(holds(&store, "a", "r", "a"));
        set_property(&mut store, "r is irreflexive");
        assert!(!holds(&store, "a", "r", "a"));
        assert!(holds(&store, "a", "r", "b"));
        // and new self facts are rejected
        let outcome = insert(&mut store, "c r c");
        assert_eq!(outcome.rejected, 1);
    }

    #[test]
    fn test_antisymmetric_rejects_reverse() {
        let mut store = TripleStore::new();
        set_property(&mut store, "r is antisymmetric");
        insert(&mut store, "a r b");
        let outcome = insert(&mut store, "b r a");
        assert_eq!(outcome.rejected, 1);
        assert!(!holds(&store, "b", "r", "a"));
        // self facts are allowed under antisymmetry
        let outcome = insert(&mut store, "c r c");
        assert_eq!(outcome.rejected, 0);
    }

    #[test]
    fn test_asymmetric_rejects_reverse_and_self() {
        let mut store = TripleStore::new();
        set_property(&mut store, "r is asymmetric");
        insert(&mut store, "a r b");
        assert_eq!(insert(&mut store, "b r a").rejected, 1);
        assert_eq!(insert(&mut store, "c r c").rejected, 1);
    }

    #[test]
    fn test_asymmetric_activation_purges_self_facts() {
        let mut store = TripleStore::new();
        insert(&mut store, "a r a");
        set_property(&mut store, "r is asymmetric");
        assert!(!holds(&store, "a", "r", "a"));
    }

    #[test]
    fn test_symmetric_with_antisymmetric_terminates() {
        // every symmetric derivation is rejected by antisymmetry; the loop
        // must still reach its cardinality fixpoint
        let mut store = TripleStore::new();
        set_property(&mut store, "r is antisymmetric");
        insert(&mut store, "a r b");
        set_property(&mut store, "r is symmetric");
        assert!(holds(&store, "a", "r", "b"));
        assert!(!holds(&store, "b", "r", "a"));
    }

    #[test]
    fn test_deactivation_keeps_derived_facts() {
        let mut store = TripleStore::new();
        set_property(&mut store, "r is symmetric");
        insert(&mut store, "a r b");
        assert!(holds(&store, "b", "r", "a"));
        set_property(&mut store, "r not symmetric");
        assert!(holds(&store, "b", "r", "a"));
        // and no new derivation happens
        insert(&mut store, "c r d");
        assert!(!holds(&store, "d", "r", "c"));
    }

    #[test]
    fn test_property_update_creates_relation() {
        let mut store = TripleStore::new();
        set_property(&mut store, "fresh is transitive");
        let rel = store.find_relation("fresh").unwrap();
        assert!(store.relation(rel).unwrap().flags().transitive);
    }
}
