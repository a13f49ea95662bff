//! Database schema definitions and version upgrade logic.
//!
//! The schema version lives in the `Info` table under the `Version` key.
//! Upgrades are an ordered list of steps; each step runs in its own
//! transaction and records the version it reaches. A brand new file is
//! initialized in a single transaction.

use crate::error::{Result, VocabError};
use crate::storage::db::Database;
use rusqlite::{Connection, OptionalExtension, Transaction};
use tracing::{debug, info};

/// Schema version this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

const VERSION_KEY: &str = "Version";

/// One incremental upgrade step, taking the schema from `version - 1` to `version`.
struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "list and entry tables",
        sql: r"
            CREATE TABLE IF NOT EXISTS Info (
                Name TEXT PRIMARY KEY,
                Value TEXT
            );

            CREATE TABLE IF NOT EXISTS Sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                Name TEXT NOT NULL,
                Author TEXT,
                Language TEXT,
                Url TEXT,
                Created DATE
            );

            CREATE TABLE IF NOT EXISTS VocabItems (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                Phrase TEXT NOT NULL,
                Translation TEXT NOT NULL,
                SetID INTEGER NOT NULL,
                ListPosition INTEGER NOT NULL,
                TimesTried INTEGER NOT NULL,
                TimesFailed INTEGER NOT NULL
            );
        ",
    },
    Migration {
        version: 2,
        description: "entry indexes, list properties and memberships",
        sql: r"
            CREATE INDEX IF NOT EXISTS idx_vocabitems_phrase ON VocabItems(Phrase);
            CREATE INDEX IF NOT EXISTS idx_vocabitems_translation ON VocabItems(Translation);
            CREATE INDEX IF NOT EXISTS idx_vocabitems_set ON VocabItems(SetID);
            CREATE INDEX IF NOT EXISTS idx_vocabitems_set_position ON VocabItems(SetID, ListPosition);

            CREATE TABLE IF NOT EXISTS SetProperties (
                SetID INTEGER NOT NULL,
                Property TEXT NOT NULL,
                Value TEXT,
                PRIMARY KEY (SetID, Property)
            );

            CREATE TABLE IF NOT EXISTS SetMemberships (
                ChildID INTEGER NOT NULL,
                ParentID INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_setmemberships_child ON SetMemberships(ChildID);
            CREATE INDEX IF NOT EXISTS idx_setmemberships_parent ON SetMemberships(ParentID);
        ",
    },
];

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    Ok(stmt.exists([table])?)
}

/// Read the stored schema version. A file without an `Info` table or
/// without a version row is version 0.
///
/// # Errors
///
/// Returns `DataIntegrity` if the stored value is not an integer, or a
/// storage error if the query fails.
pub fn stored_version(conn: &Connection) -> Result<i64> {
    if !table_exists(conn, "Info")? {
        return Ok(0);
    }

    let value: Option<Option<String>> = conn
        .query_row(
            "SELECT Value FROM Info WHERE Name = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value.flatten() {
        None => Ok(0),
        Some(text) => text.trim().parse::<i64>().map_err(|_| {
            VocabError::integrity("Info.Version", format!("'{text}' is not a schema version"))
        }),
    }
}

fn record_version(tx: &Transaction<'_>, version: i64) -> Result<()> {
    tx.execute(
        "INSERT INTO Info (Name, Value) VALUES (?1, ?2)
         ON CONFLICT(Name) DO UPDATE SET Value = excluded.Value",
        rusqlite::params![VERSION_KEY, version.to_string()],
    )?;
    Ok(())
}

/// Bring the schema up to [`CURRENT_SCHEMA_VERSION`].
///
/// Returns the version found before upgrading.
///
/// # Errors
///
/// Returns `VersionConflict` without touching the file if the stored version
/// is newer than this build supports; otherwise any storage error raised by an
/// upgrade step (that step is rolled back, earlier steps stay committed).
pub fn upgrade(db: &Database) -> Result<i64> {
    let stored = db.read(stored_version)?;

    if stored > CURRENT_SCHEMA_VERSION {
        return Err(VocabError::VersionConflict {
            stored,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if stored == CURRENT_SCHEMA_VERSION {
        debug!(version = stored, "schema is current");
        return Ok(stored);
    }

    if stored == 0 {
        db.mutate("schema_init", |tx| {
            for step in MIGRATIONS {
                tx.execute_batch(step.sql)?;
            }
            record_version(tx, CURRENT_SCHEMA_VERSION)
        })?;
        info!(version = CURRENT_SCHEMA_VERSION, "initialized new store");
        return Ok(stored);
    }

    for step in MIGRATIONS.iter().filter(|step| step.version > stored) {
        db.mutate("schema_upgrade", |tx| {
            tx.execute_batch(step.sql)?;
            record_version(tx, step.version)
        })?;
        info!(
            from = step.version - 1,
            to = step.version,
            step = step.description,
            "upgraded schema"
        );
    }

    Ok(stored)
}
