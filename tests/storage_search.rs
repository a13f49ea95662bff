//! Cross-list substring search.

mod common;

use common::fixtures::entry;
use common::{list_with, test_store};
use vocab_store::ListId;

#[test]
fn percent_sign_is_matched_literally() {
    let mut store = test_store();
    let list = list_with(
        &mut store,
        "numbers",
        &[
            entry("100%", "one hundred percent"),
            entry("1000 euros", "a thousand euros"),
            entry("100 años", "a hundred years"),
        ],
    );

    let hits = store.search_entries("100%").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].entry.phrase, "100%");
    assert_eq!(hits[0].list_id, list.id());
    assert_eq!(hits[0].position, 0);
}

#[test]
fn underscore_and_backslash_are_literal() {
    let mut store = test_store();
    list_with(
        &mut store,
        "symbols",
        &[entry("a_b", "x"), entry("axb", "y"), entry(r"c:\dir", "z")],
    );

    let underscore: Vec<_> = store
        .search_entries("a_b")
        .unwrap()
        .into_iter()
        .map(|h| h.entry.phrase)
        .collect();
    assert_eq!(underscore, ["a_b"]);
    assert_eq!(store.search_entries(r":\d").unwrap().len(), 1);
}

#[test]
fn matches_either_column_ignoring_case() {
    let mut store = test_store();
    list_with(
        &mut store,
        "mixed",
        &[entry("Hola", "hello"), entry("gato", "cat"), entry("hello kitty", "x")],
    );

    let phrases: Vec<_> = store
        .search_entries("HELLO")
        .unwrap()
        .into_iter()
        .map(|h| h.entry.phrase)
        .collect();
    assert_eq!(phrases, ["Hola", "hello kitty"]);
}

#[test]
fn empty_query_matches_everything_in_list_then_phrase_order() {
    let mut store = test_store();
    let first = list_with(&mut store, "one", &[entry("zeta", "z"), entry("alfa", "a")]).id();
    let second = list_with(&mut store, "two", &[entry("beta", "b")]).id();

    let hits: Vec<(ListId, String, usize)> = store
        .search_entries("")
        .unwrap()
        .into_iter()
        .map(|h| (h.list_id, h.entry.phrase, h.position))
        .collect();
    assert_eq!(
        hits,
        [
            (first, "alfa".to_string(), 1),
            (first, "zeta".to_string(), 0),
            (second, "beta".to_string(), 0),
        ]
    );
}

#[test]
fn no_match_is_empty() {
    let mut store = test_store();
    list_with(&mut store, "one", &[entry("hola", "hello")]);
    assert!(store.search_entries("adios").unwrap().is_empty());
}

#[test]
fn case_is_ignored_beyond_ascii() {
    let mut store = test_store();
    let list = list_with(
        &mut store,
        "accents",
        &[entry("Árbol", "tree"), entry("ÑANDÚ", "rhea"), entry("őrület", "madness")],
    );

    for (query, phrase) in [("árbol", "Árbol"), ("ñandú", "ÑANDÚ"), ("ŐRÜLET", "őrület")] {
        let hits = store.search_entries(query).unwrap();
        assert_eq!(hits.len(), 1, "{query}");
        assert_eq!(hits[0].entry.phrase, phrase);
        assert_eq!(hits[0].list_id, list.id());
    }
    assert!(store.search_entries("arbol").unwrap().is_empty());
}
