#![allow(dead_code)]

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Once;
use tempfile::TempDir;
use vocab_store::{Entry, ListInfo, Store, WordList};

pub mod fixtures;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        vocab_store::logging::init_test_logging();
    });
}

pub fn test_store() -> Store {
    init_test_logging();
    Store::open_memory().expect("Failed to create test store")
}

pub fn test_store_with_dir() -> (Store, TempDir) {
    init_test_logging();
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Store::open(&db_path(&dir)).expect("Failed to create test store");
    (store, dir)
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("vocab.db")
}

/// A list pre-filled with `entries`, appended in order.
pub fn list_with(store: &mut Store, name: &str, entries: &[Entry]) -> Rc<WordList> {
    let list = store
        .create_list(ListInfo::named(name))
        .expect("create list");
    for entry in entries {
        list.add(entry.clone()).expect("add entry");
    }
    list.clear_history().expect("clear history");
    list
}

/// Positions stored for a list, straight from the database.
pub fn stored_positions(list: &WordList) -> Vec<i64> {
    list.table().positions().expect("read positions")
}

/// Asserts the database holds exactly what the in-memory list shows, at 0..len.
pub fn assert_in_sync(list: &WordList) {
    let len = i64::try_from(list.len()).expect("length fits");
    let expected: Vec<i64> = (0..len).collect();
    assert_eq!(stored_positions(list), expected, "positions not contiguous");
    assert_eq!(
        list.table().load_all().expect("load entries"),
        list.entries(),
        "table and mirror differ"
    );
}
