//! Position contiguity and all-or-nothing writes.

mod common;

use common::fixtures::{entry, numbers};
use common::{
    assert_in_sync, db_path, init_test_logging, list_with, test_store, test_store_with_dir,
};
use proptest::prelude::*;
use rusqlite::Connection;
use vocab_store::{Entry, ErrorCode, PropertyValue, Store, StoreConfig, VocabError};

#[derive(Debug, Clone)]
enum Op {
    Insert { at: usize, batch: usize },
    Remove { at: usize },
    RemoveSet { picks: Vec<usize> },
    Undo,
    Redo,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0usize..64, 1usize..4).prop_map(|(at, batch)| Op::Insert { at, batch }),
        2 => (0usize..64).prop_map(|at| Op::Remove { at }),
        1 => prop::collection::vec(0usize..64, 1..4).prop_map(|picks| Op::RemoveSet { picks }),
        1 => Just(Op::Undo),
        1 => Just(Op::Redo),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn positions_stay_contiguous(ops in prop::collection::vec(op(), 1..40)) {
        let mut store = test_store();
        let list = list_with(&mut store, "prop", &[]);
        let mut counter = 0u32;

        for op in ops {
            let len = list.len();
            match op {
                Op::Insert { at, batch } => {
                    let at = at % (len + 1);
                    let entries: Vec<Entry> = (0..batch)
                        .map(|_| {
                            counter += 1;
                            entry(&format!("p{counter}"), &format!("t{counter}"))
                        })
                        .collect();
                    if batch == 1 {
                        list.insert(at, entries[0].clone()).unwrap();
                    } else {
                        list.insert_many(at, entries).unwrap();
                    }
                }
                Op::Remove { at } if len > 0 => list.remove_at(at % len).unwrap(),
                Op::RemoveSet { mut picks } if len > 0 => {
                    for pick in &mut picks {
                        *pick %= len;
                    }
                    picks.sort_unstable();
                    picks.dedup();
                    list.remove_indices(&picks).unwrap();
                }
                Op::Undo => {
                    list.undo().unwrap();
                }
                Op::Redo => {
                    list.redo().unwrap();
                }
                Op::Remove { .. } | Op::RemoveSet { .. } => {}
            }
            assert_in_sync(&list);
        }

        while list.undo().unwrap() {
            assert_in_sync(&list);
        }
        prop_assert!(list.is_empty());
    }
}

#[test]
fn failed_insert_rolls_back_the_shift() {
    let (mut store, dir) = test_store_with_dir();
    let list = list_with(&mut store, "nums", &numbers());

    let side = Connection::open(db_path(&dir)).unwrap();
    side.execute_batch(
        "CREATE TRIGGER refuse_boom BEFORE INSERT ON VocabItems
         WHEN NEW.Phrase = 'boom'
         BEGIN SELECT RAISE(ABORT, 'boom refused'); END;",
    )
    .unwrap();

    let err = list.insert(1, entry("boom", "x")).unwrap_err();
    assert!(matches!(err, VocabError::Storage(_)), "{err}");
    assert_eq!(err.code(), ErrorCode::Storage);

    assert_eq!(list.entries(), numbers());
    assert!(!list.can_undo());
    assert_in_sync(&list);
}

#[test]
fn failed_batch_leaves_nothing_behind() {
    let (mut store, dir) = test_store_with_dir();
    let list = list_with(&mut store, "nums", &numbers()[..2]);

    Connection::open(db_path(&dir))
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER refuse_boom BEFORE INSERT ON VocabItems
             WHEN NEW.Phrase = 'boom'
             BEGIN SELECT RAISE(ABORT, 'boom refused'); END;",
        )
        .unwrap();

    let batch = vec![entry("fine", "ok"), entry("boom", "x"), entry("also fine", "ok")];
    assert!(list.insert_many(1, batch).is_err());
    assert_eq!(list.entries(), numbers()[..2].to_vec());
    assert_in_sync(&list);
}

#[test]
fn failed_undo_keeps_the_step() {
    let (mut store, dir) = test_store_with_dir();
    let list = list_with(&mut store, "nums", &numbers()[..1]);
    list.add(entry("sticky", "x")).unwrap();

    let side = Connection::open(db_path(&dir)).unwrap();
    side.execute_batch(
        "CREATE TRIGGER keep_sticky BEFORE DELETE ON VocabItems
         WHEN OLD.Phrase = 'sticky'
         BEGIN SELECT RAISE(ABORT, 'sticky'); END;",
    )
    .unwrap();

    assert!(list.undo().is_err());
    assert_eq!(list.len(), 2);
    assert!(list.can_undo());
    assert!(!list.can_redo());
    assert_in_sync(&list);

    side.execute_batch("DROP TRIGGER keep_sticky;").unwrap();
    assert!(list.undo().unwrap());
    assert_eq!(list.entries(), numbers()[..1].to_vec());
    assert_in_sync(&list);
}

#[test]
fn failed_property_write_leaves_mirror_alone() {
    let (mut store, dir) = test_store_with_dir();
    let list = list_with(&mut store, "nums", &numbers()[..1]);

    Connection::open(db_path(&dir))
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER cap_tries BEFORE UPDATE OF TimesTried ON VocabItems
             WHEN NEW.TimesTried > 10
             BEGIN SELECT RAISE(ABORT, 'too many'); END;",
        )
        .unwrap();

    list.set_property(0, PropertyValue::TimesTried(3)).unwrap();
    assert!(list.set_property(0, PropertyValue::TimesTried(11)).is_err());
    assert_eq!(list.get(0).unwrap().times_tried, 3);
    assert_in_sync(&list);

    list.undo().unwrap();
    assert_eq!(list.get(0).unwrap().times_tried, 0);
}

#[test]
fn lists_do_not_disturb_each_other() {
    let mut store = test_store();
    let first = list_with(&mut store, "first", &numbers());
    let second = list_with(&mut store, "second", &numbers());

    first.remove_indices(&[0, 2, 4]).unwrap();
    second.insert(0, entry("cero", "zero")).unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 6);
    assert_in_sync(&first);
    assert_in_sync(&second);
    assert_eq!(
        first.table().get_entries(&[1, 0]).unwrap(),
        vec![entry("dos", "two"), entry("cuatro", "four")]
    );
}

#[test]
fn bad_positions_are_rejected_without_taking_the_write_lock() {
    init_test_logging();
    let dir = tempfile::TempDir::new().unwrap();
    let config = StoreConfig {
        busy_timeout_ms: 50,
        ..StoreConfig::default()
    };
    let mut store = Store::open_with_config(&db_path(&dir), config).unwrap();
    let list = list_with(&mut store, "nums", &numbers()[..2]);

    let writer = Connection::open(db_path(&dir)).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE").unwrap();

    assert!(matches!(
        list.insert(3, entry("x", "y")),
        Err(VocabError::InvalidArgument { .. })
    ));
    assert!(matches!(
        list.insert_many(9, vec![entry("x", "y")]),
        Err(VocabError::InvalidArgument { .. })
    ));
    assert!(matches!(
        list.remove_indices(&[0, 5]),
        Err(VocabError::InvalidArgument { .. })
    ));
    assert!(!list.can_undo());

    writer.execute_batch("ROLLBACK").unwrap();
    list.insert(2, entry("tres", "three")).unwrap();
    assert_in_sync(&list);
}
