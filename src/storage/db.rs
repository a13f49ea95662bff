//! Shared `SQLite` connection and the transaction primitive every write goes through.

use crate::config::StoreConfig;
use crate::error::Result;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// The single connection behind a [`crate::Store`] and all of its lists.
///
/// Shared as `Rc<Database>`; the connection sits in a `RefCell` because
/// rusqlite needs `&mut Connection` to open a transaction. Readers borrow it
/// immutably for the duration of one query, writers borrow it mutably for the
/// duration of one [`Database::mutate`] call. Neither nests.
#[derive(Debug)]
pub struct Database {
    conn: RefCell<Connection>,
}

impl Database {
    /// Open (creating if absent) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the busy timeout cannot be set.
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn, config)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established.
    pub fn open_memory(config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, config)
    }

    fn from_connection(conn: Connection, config: &StoreConfig) -> Result<Self> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        register_functions(&conn)?;
        Ok(Self {
            conn: RefCell::new(conn),
        })
    }

    /// Apply connection pragmas. Called only after the schema version check
    /// has passed, so a store we refuse to open is left byte-for-byte alone.
    ///
    /// # Errors
    ///
    /// Returns an error if a pragma cannot be applied.
    pub fn apply_pragmas(&self) -> Result<()> {
        let conn = self.conn.borrow();
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        Ok(())
    }

    /// Run `f` inside one `IMMEDIATE` transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is dropped
    /// uncommitted, which rolls it back; the error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or the storage error from begin/commit.
    pub fn mutate<F, R>(&self, op: &str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R>,
    {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        match f(&tx) {
            Ok(result) => {
                tx.commit()?;
                debug!(op, "transaction committed");
                Ok(result)
            }
            Err(err) => {
                warn!(op, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    /// Run a read-only closure against the connection.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn read<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self.conn.borrow();
        f(&conn)
    }
}

/// SQL function that lowercases text with full Unicode rules.
/// `LIKE` on its own only folds ASCII letters.
const CASEFOLD_FN: &str = "casefold";

/// Install the connection-local SQL functions queries rely on.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        CASEFOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )?;
    Ok(())
}
