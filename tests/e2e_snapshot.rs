//! End-to-end tests for snapshots, restore, and the reset/remove_last
//! lifecycle the external versioning layer builds on.

use factbase::{EntryKey, KnowledgeBase};
use pretty_assertions::assert_eq;

#[test]
fn test_snapshot_restore_round_trip() {
    let mut kb = KnowledgeBase::new();
    kb.insert("a r b r c").unwrap();
    kb.update_relation_property("r is symmetric").unwrap();
    let snapshot = kb.snapshot();

    kb.insert("d s e").unwrap();
    kb.update_relation_property("r not symmetric").unwrap();

    kb.restore(snapshot);
    assert_eq!(kb.show(), {
        let mut fresh = KnowledgeBase::new();
        fresh.insert("a r b r c").unwrap();
        fresh.update_relation_property("r is symmetric").unwrap();
        fresh.show()
    });
    // flags travel with the snapshot
    kb.insert("x r y").unwrap();
    assert_eq!(kb.query("?v : y r ?v").unwrap().ids("?v"), vec!["x"]);
}

#[test]
fn test_snapshot_is_detached_from_live_state() {
    let mut kb = KnowledgeBase::new();
    kb.insert("a r b").unwrap();
    let before = kb.snapshot().to_json().unwrap();
    kb.insert("c r d").unwrap();
    // the earlier snapshot still deserializes to the earlier state
    let restored = factbase::Snapshot::from_json(&before).unwrap();
    kb.restore(restored);
    assert!(kb.store().find_key("c").is_none());
}

#[test]
fn test_json_round_trip_preserves_keys() {
    let mut kb = KnowledgeBase::new();
    kb.insert("a r b").unwrap();
    kb.insert("c").unwrap();
    let json = kb.snapshot().to_json().unwrap();

    let mut other = KnowledgeBase::new();
    other.restore(factbase::Snapshot::from_json(&json).unwrap());
    assert_eq!(other.store().find_key("a"), Some(EntryKey(1)));
    assert_eq!(other.store().find_key("b"), Some(EntryKey(2)));
    assert_eq!(other.store().find_key("c"), Some(EntryKey(3)));
    // the key counter restores too: the next entry continues the sequence
    let outcome = other.insert("d").unwrap();
    assert_eq!(outcome.key, EntryKey(4));
}

#[test]
fn test_restore_replaces_rather_than_merges() {
    let mut kb = KnowledgeBase::new();
    kb.insert("a r b").unwrap();
    let snapshot = kb.snapshot();

    let mut other = KnowledgeBase::new();
    other.insert("x s y").unwrap();
    other.restore(snapshot);
    assert!(other.store().find_key("x").is_none());
    assert!(other.store().find_relation("s").is_none());
    assert_eq!(other.store().find_key("a"), Some(EntryKey(1)));
}

#[test]
fn test_reset_forgets_symbols_and_keys() {
    let mut kb = KnowledgeBase::new();
    kb.insert("a r b").unwrap();
    kb.reset();
    assert!(kb.store().symbols().is_empty());
    assert_eq!(kb.insert("z").unwrap().key, EntryKey(1));
}

#[test]
fn test_remove_last_frees_the_key_for_reuse() {
    let mut kb = KnowledgeBase::new();
    kb.insert("a").unwrap();
    let last = kb.insert("b").unwrap().key;
    assert!(kb.remove_last(last));
    assert_eq!(kb.insert("c").unwrap().key, last);
}

#[test]
fn test_remove_last_rejects_stale_key() {
    let mut kb = KnowledgeBase::new();
    let first = kb.insert("a").unwrap().key;
    kb.insert("b").unwrap();
    assert!(!kb.remove_last(first));
    assert!(kb.store().find_key("b").is_some());
}
