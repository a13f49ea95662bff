//! List registry: identity cache, catalog, metadata and deletion notices.

mod common;

use chrono::NaiveDate;
use common::fixtures::{entry, numbers};
use common::{list_with, test_store, test_store_with_dir};
use std::cell::RefCell;
use std::rc::Rc;
use vocab_store::{ListId, ListInfo, Store, VocabError};

#[test]
fn live_lists_are_shared() {
    let mut store = test_store();
    let created = list_with(&mut store, "nums", &numbers());
    let id = created.id();

    let again = store.get_list(id).unwrap();
    assert!(Rc::ptr_eq(&created, &again));

    again.add(entry("seis", "six")).unwrap();
    assert_eq!(created.len(), 6);
    assert_eq!(store.live_list_count(), 1);
}

#[test]
fn released_lists_reload_with_same_content() {
    let mut store = test_store();
    let list = list_with(&mut store, "nums", &numbers());
    let id = list.id();
    let content = list.entries();
    drop(list);
    assert_eq!(store.live_list_count(), 0);

    let reloaded = store.get_list(id).unwrap();
    assert_eq!(reloaded.entries(), content);
    assert_eq!(reloaded.name(), "nums");
    assert!(!reloaded.can_undo());
}

#[test]
fn reopened_file_keeps_lists() {
    let (mut store, dir) = test_store_with_dir();
    let id = list_with(&mut store, "nums", &numbers()).id();
    drop(store);

    let mut reopened = Store::open(&common::db_path(&dir)).unwrap();
    let list = reopened.get_list(id).unwrap();
    assert_eq!(list.entries(), numbers());
    common::assert_in_sync(&list);
}

#[test]
fn unknown_ids_are_not_found() {
    let mut store = test_store();
    assert!(matches!(
        store.get_list(ListId(99)),
        Err(VocabError::ListNotFound { id: ListId(99) })
    ));
    assert!(matches!(
        store.delete_list(ListId(99)),
        Err(VocabError::ListNotFound { .. })
    ));
    assert!(matches!(
        store.update_list_info(ListId(99), ListInfo::named("x")),
        Err(VocabError::ListNotFound { .. })
    ));
    assert!(matches!(
        store.list_properties(ListId(99)),
        Err(VocabError::ListNotFound { .. })
    ));
}

#[test]
fn blank_names_are_rejected() {
    let mut store = test_store();
    assert!(matches!(
        store.create_list(ListInfo::named("   ")),
        Err(VocabError::InvalidArgument { .. })
    ));
    assert!(store.get_all_lists().unwrap().is_empty());
}

#[test]
fn catalog_counts_entries_without_loading() {
    let mut store = test_store();
    let first = list_with(&mut store, "first", &numbers()).id();
    let second = list_with(&mut store, "second", &numbers()[..1]).id();
    let empty = list_with(&mut store, "empty", &[]).id();

    let catalog = store.get_all_lists().unwrap();
    let counts: Vec<_> = catalog
        .iter()
        .map(|s| (s.id, s.info.name.as_str(), s.entry_count))
        .collect();
    assert_eq!(
        counts,
        [(first, "first", 5), (second, "second", 1), (empty, "empty", 0)]
    );
}

#[test]
fn metadata_updates_reach_live_lists() {
    let mut store = test_store();
    let list = list_with(&mut store, "draft", &[]);

    let info = ListInfo {
        name: "Final".into(),
        author: Some("B".into()),
        language: Some("de".into()),
        url: Some("https://example.org/list".into()),
        created: NaiveDate::from_ymd_opt(2026, 3, 1),
    };
    store.update_list_info(list.id(), info.clone()).unwrap();
    assert_eq!(list.info(), info);
    assert!(!list.can_undo());

    let id = list.id();
    drop(list);
    assert_eq!(store.get_list(id).unwrap().info(), info);
}

#[test]
fn deletion_notifies_store_and_live_list() {
    let mut store = test_store();
    let list = list_with(&mut store, "doomed", &numbers());
    let other = list_with(&mut store, "kept", &numbers()).id();
    let id = list.id();

    let events = Rc::new(RefCell::new(Vec::new()));
    let store_events = Rc::clone(&events);
    store.on_list_deleted(move |deleted| store_events.borrow_mut().push(("store", deleted)));
    let list_events = Rc::clone(&events);
    list.on_deleted(move |deleted| list_events.borrow_mut().push(("list", deleted)));

    store.delete_list(id).unwrap();

    assert_eq!(*events.borrow(), [("store", id), ("list", id)]);
    assert!(list.is_deleted());
    assert!(matches!(
        list.add(entry("x", "y")),
        Err(VocabError::ListDeleted { .. })
    ));
    assert!(matches!(list.undo(), Err(VocabError::ListDeleted { .. })));
    assert!(matches!(
        store.get_list(id),
        Err(VocabError::ListNotFound { .. })
    ));

    let catalog = store.get_all_lists().unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].id, other);
    assert!(store.search_entries("uno").unwrap().iter().all(|hit| hit.list_id == other));
}

#[test]
fn deleting_an_unloaded_list_notifies_only_the_store() {
    let mut store = test_store();
    let id = list_with(&mut store, "cold", &numbers()).id();

    let count = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&count);
    store.on_list_deleted(move |_| *seen.borrow_mut() += 1);

    store.delete_list(id).unwrap();
    assert_eq!(*count.borrow(), 1);
}

#[test]
fn list_properties_round_trip() {
    let mut store = test_store();
    let id = list_with(&mut store, "props", &[]).id();

    store.set_list_property(id, "level", Some("A1")).unwrap();
    store.set_list_property(id, "drill", Some("daily")).unwrap();
    store.set_list_property(id, "level", Some("A2")).unwrap();
    assert_eq!(
        store.get_list_property(id, "level").unwrap().as_deref(),
        Some("A2")
    );

    let all = store.list_properties(id).unwrap();
    let keys: Vec<_> = all.keys().map(String::as_str).collect();
    assert_eq!(keys, ["drill", "level"]);

    store.set_list_property(id, "drill", None).unwrap();
    assert_eq!(store.get_list_property(id, "drill").unwrap(), None);
    assert!(matches!(
        store.set_list_property(id, " ", Some("x")),
        Err(VocabError::InvalidArgument { .. })
    ));

    store.delete_list(id).unwrap();
    let id2 = list_with(&mut store, "fresh", &[]).id();
    assert!(store.list_properties(id2).unwrap().is_empty());
}
