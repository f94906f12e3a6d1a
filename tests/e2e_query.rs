//! End-to-end tests for the query surface.

use factbase::KnowledgeBase;
use pretty_assertions::assert_eq;

fn kb_with(facts: &[&str]) -> KnowledgeBase {
    let mut kb = KnowledgeBase::new();
    for fact in facts {
        kb.insert(fact).unwrap();
    }
    kb
}

#[test]
fn test_literal_condition_binds_variable() {
    let kb = kb_with(&["a r b", "a r c", "d r e"]);
    let result = kb.query("?y : a r ?y").unwrap();
    assert_eq!(result.ids("?y"), vec!["b", "c"]);
}

#[test]
fn test_unknown_literal_yields_empty_result() {
    let kb = kb_with(&["a r b"]);
    let result = kb.query("?x : nosuchid r ?x").unwrap();
    assert!(result.ids("?x").is_empty());
    let result = kb.query("?x : a nosuchrel ?x").unwrap();
    assert!(result.ids("?x").is_empty());
    let result = kb.query("?x : ?x r nosuchvalue").unwrap();
    assert!(result.ids("?x").is_empty());
}

#[test]
fn test_conjunction_restricts_earlier_variable() {
    let kb = kb_with(&["a r b", "c r d", "a s e"]);
    let result = kb.query("?x : ?x r ?y & ?x s ?z").unwrap();
    assert_eq!(result.ids("?x"), vec!["a"]);
}

#[test]
fn test_variable_relation_position() {
    let kb = kb_with(&["a r b", "a s b", "a t c"]);
    let result = kb.query("?m : a ?m b").unwrap();
    let mut ids: Vec<&str> = result.ids("?m");
    ids.sort();
    assert_eq!(ids, vec!["r", "s"]);
}

#[test]
fn test_associated_view_preserves_pairing() {
    // a r b, a r c; only b has an s fact — (c, *) must not appear, and
    // (b, d) must stay paired
    let kb = kb_with(&["a r b", "a r c", "b s d"]);
    let result = kb.query("?x, ?y : a r ?x & ?x s ?y").unwrap();
    assert!(result.is_associated());
    assert_eq!(result.paired_ids("?x", "?y"), vec![("b", "d")]);
}

#[test]
fn test_associated_view_never_cross_multiplies_joined_rows() {
    let kb = kb_with(&["a r b", "a r c", "b s d", "c s e"]);
    let result = kb.query("?x, ?y : a r ?x & ?x s ?y").unwrap();
    let pairs = result.paired_ids("?x", "?y");
    assert_eq!(pairs.len(), 2);
    assert!(pairs.contains(&("b", "d")));
    assert!(pairs.contains(&("c", "e")));
    // the mismatched combinations never appear
    assert!(!pairs.contains(&("b", "e")));
    assert!(!pairs.contains(&("c", "d")));
}

#[test]
fn test_unrelated_conditions_cross_product() {
    let kb = kb_with(&["a r b", "c s d"]);
    let result = kb.query("?x, ?y : a r ?x & c s ?y").unwrap();
    assert_eq!(result.paired_ids("?x", "?y"), vec![("b", "d")]);
}

#[test]
fn test_key_literals_in_subject_positions() {
    let kb = kb_with(&["a r b"]);
    // a is entry 1, b is entry 2
    let result = kb.query("?y : 1 r ?y").unwrap();
    assert_eq!(result.ids("?y"), vec!["b"]);
    let result = kb.query("?x : ?x r 2").unwrap();
    assert_eq!(result.ids("?x"), vec!["a"]);
    let result = kb.query("?y : 42 r ?y").unwrap();
    assert!(result.ids("?y").is_empty());
}

#[test]
fn test_selector_of_unbound_variable_is_empty() {
    let kb = kb_with(&["a r b"]);
    let result = kb.query("?ghost : a r ?y").unwrap();
    assert!(result.ids("?ghost").is_empty());
}

#[test]
fn test_malformed_query_is_parse_error() {
    let kb = kb_with(&["a r b"]);
    assert!(kb.query("?x a r ?x").is_err());
    assert!(kb.query("a : a r ?x").is_err());
    assert!(kb.query("?x : a r").is_err());
    assert!(kb.query("?x : a r ?x extra").is_err());
    assert!(kb.query("?x : ").is_err());
}

#[test]
fn test_three_condition_chain() {
    let kb = kb_with(&["a r b", "b r c", "c r d", "x r y"]);
    let result = kb.query("?a, ?d : ?a r ?b & ?b r ?c & ?c r ?d").unwrap();
    assert_eq!(result.paired_ids("?a", "?d"), vec![("a", "d")]);
}

#[test]
fn test_result_display() {
    let kb = kb_with(&["a r b"]);
    let text = kb.query("?y, ?m : a ?m ?y").unwrap().to_string();
    assert!(text.contains("?y"));
    assert!(text.contains("key : 2 => b"));
    assert!(text.contains("relation : r"));
}
