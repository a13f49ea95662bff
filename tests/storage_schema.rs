//! Schema lifecycle of on-disk stores and integrity of what they hold.

mod common;

use common::{db_path, init_test_logging};
use rusqlite::Connection;
use tempfile::TempDir;
use vocab_store::storage::schema::CURRENT_SCHEMA_VERSION;
use vocab_store::{ErrorCode, ListId, Store, VocabError};

fn seed(dir: &TempDir, sql: &str) {
    let conn = Connection::open(db_path(dir)).expect("open seed db");
    conn.execute_batch(sql).expect("seed db");
}

const LOOSE_V2: &str = "
    CREATE TABLE Info (Name TEXT PRIMARY KEY, Value TEXT);
    INSERT INTO Info VALUES ('Version', '2');
    CREATE TABLE Sets (id INTEGER PRIMARY KEY, Name TEXT, Author TEXT,
                       Language TEXT, Url TEXT, Created DATE);
    CREATE TABLE VocabItems (id INTEGER PRIMARY KEY, Phrase TEXT, Translation TEXT,
                             SetID INTEGER, ListPosition INTEGER,
                             TimesTried INTEGER, TimesFailed INTEGER);
    CREATE TABLE SetProperties (SetID INTEGER NOT NULL, Property TEXT NOT NULL,
                                Value TEXT, PRIMARY KEY (SetID, Property));
    CREATE TABLE SetMemberships (ChildID INTEGER NOT NULL, ParentID INTEGER NOT NULL);
";

#[test]
fn fresh_file_is_at_current_version() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let store = Store::open(&db_path(&dir)).unwrap();
    assert_eq!(store.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    assert!(store.get_all_lists().unwrap().is_empty());
    assert_eq!(store.path(), Some(db_path(&dir).as_path()));
}

#[test]
fn newer_file_is_refused_and_left_untouched() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        "CREATE TABLE Info (Name TEXT PRIMARY KEY, Value TEXT);
         INSERT INTO Info VALUES ('Version', '3');",
    );
    let before = std::fs::read(db_path(&dir)).unwrap();

    let err = Store::open(&db_path(&dir)).unwrap_err();
    assert!(matches!(
        err,
        VocabError::VersionConflict {
            stored: 3,
            supported: CURRENT_SCHEMA_VERSION
        }
    ));
    assert_eq!(err.code(), ErrorCode::VersionConflict);

    assert_eq!(std::fs::read(db_path(&dir)).unwrap(), before);
    let conn = Connection::open(db_path(&dir)).unwrap();
    let tables: i64 = conn
        .query_row("SELECT count(*) FROM sqlite_master WHERE type = 'table'", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(tables, 1);
}

#[test]
fn version_one_file_is_upgraded_with_data_intact() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        "CREATE TABLE Info (Name TEXT PRIMARY KEY, Value TEXT);
         INSERT INTO Info VALUES ('Version', '1');
         CREATE TABLE Sets (id INTEGER PRIMARY KEY AUTOINCREMENT, Name TEXT NOT NULL,
                            Author TEXT, Language TEXT, Url TEXT, Created DATE);
         CREATE TABLE VocabItems (id INTEGER PRIMARY KEY AUTOINCREMENT,
                                  Phrase TEXT NOT NULL, Translation TEXT NOT NULL,
                                  SetID INTEGER NOT NULL, ListPosition INTEGER NOT NULL,
                                  TimesTried INTEGER NOT NULL, TimesFailed INTEGER NOT NULL);
         INSERT INTO Sets (id, Name, Language, Created) VALUES (7, 'old', 'fr', '2019-05-04');
         INSERT INTO VocabItems (Phrase, Translation, SetID, ListPosition, TimesTried, TimesFailed)
             VALUES ('chat', 'cat', 7, 0, 3, 1), ('chien', 'dog', 7, 1, 0, 0);",
    );

    let mut store = Store::open(&db_path(&dir)).unwrap();
    assert_eq!(store.schema_version().unwrap(), CURRENT_SCHEMA_VERSION);

    let list = store.get_list(ListId(7)).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(0).unwrap().times_tried, 3);
    assert_eq!(list.info().language.as_deref(), Some("fr"));

    store.set_list_property(ListId(7), "level", Some("B1")).unwrap();
}

#[test]
fn null_required_column_is_a_data_integrity_error() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        &format!(
            "{LOOSE_V2}
             INSERT INTO Sets (id, Name) VALUES (1, 'broken');
             INSERT INTO VocabItems (Phrase, Translation, SetID, ListPosition, TimesTried, TimesFailed)
                 VALUES ('ok', 'ok', 1, 0, 0, 0), (NULL, 'no phrase', 1, 1, 0, 0);"
        ),
    );

    let mut store = Store::open(&db_path(&dir)).unwrap();
    let err = store.get_list(ListId(1)).unwrap_err();
    assert!(matches!(err, VocabError::DataIntegrity { .. }), "{err}");
    assert_eq!(err.code().exit_code(), 4);
    assert!(matches!(
        store.search_entries("no phrase"),
        Err(VocabError::DataIntegrity { .. })
    ));
}

#[test]
fn null_list_name_is_a_data_integrity_error() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    seed(&dir, &format!("{LOOSE_V2} INSERT INTO Sets (id, Name) VALUES (1, NULL);"));

    let mut store = Store::open(&db_path(&dir)).unwrap();
    assert!(matches!(
        store.get_all_lists(),
        Err(VocabError::DataIntegrity { .. })
    ));
    assert!(matches!(
        store.get_list(ListId(1)),
        Err(VocabError::DataIntegrity { .. })
    ));
}

#[test]
fn gap_in_positions_is_a_data_integrity_error() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        &format!(
            "{LOOSE_V2}
             INSERT INTO Sets (id, Name) VALUES (1, 'gappy');
             INSERT INTO VocabItems (Phrase, Translation, SetID, ListPosition, TimesTried, TimesFailed)
                 VALUES ('a', 'A', 1, 0, 0, 0), ('c', 'C', 1, 2, 0, 0);"
        ),
    );

    let mut store = Store::open(&db_path(&dir)).unwrap();
    assert!(matches!(
        store.get_list(ListId(1)),
        Err(VocabError::DataIntegrity { .. })
    ));
}

#[test]
fn garbage_version_is_a_data_integrity_error() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    seed(
        &dir,
        "CREATE TABLE Info (Name TEXT PRIMARY KEY, Value TEXT);
         INSERT INTO Info VALUES ('Version', 'two');",
    );
    assert!(matches!(
        Store::open(&db_path(&dir)),
        Err(VocabError::DataIntegrity { .. })
    ));
}
