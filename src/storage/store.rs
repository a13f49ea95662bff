//! The list registry: schema lifecycle, list metadata and the identity cache.

use crate::config::StoreConfig;
use crate::error::{Result, VocabError};
use crate::list::WordList;
use crate::model::{ListId, ListInfo, ListSummary, SearchHit};
use crate::storage::db::Database;
use crate::storage::schema;
use crate::storage::table::{OrderedEntryTable, decode_row, raw_row};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_INFO_SQL: &str = "SELECT Name, Author, Language, Url, Created FROM Sets WHERE id = ?1";

const SELECT_SUMMARIES_SQL: &str = "SELECT s.id, s.Name, s.Author, s.Language, s.Url, s.Created,
            (SELECT count(*) FROM VocabItems v WHERE v.SetID = s.id)
     FROM Sets s ORDER BY s.id";

const SEARCH_SQL: &str = r"SELECT ListPosition, Phrase, Translation, TimesTried, TimesFailed, SetID
     FROM VocabItems
     WHERE casefold(Phrase) LIKE casefold(?1) ESCAPE '\'
        OR casefold(Translation) LIKE casefold(?1) ESCAPE '\'
     ORDER BY SetID, Phrase, ListPosition";

type StoreListener = Box<dyn Fn(ListId)>;

/// Name, Author, Language, Url, Created as read from `Sets`.
type InfoColumns = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

/// Owner of the database and registry of live [`WordList`]s.
///
/// Callers receive `Rc<WordList>` handles. The store keeps only a weak
/// reference per list id, so a list is reclaimed when the last handle drops
/// and reloaded from the database on the next [`Store::get_list`].
pub struct Store {
    db: Rc<Database>,
    config: StoreConfig,
    path: Option<PathBuf>,
    live: HashMap<ListId, Weak<WordList>>,
    listeners: Vec<StoreListener>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("live", &self.live.len())
            .finish_non_exhaustive()
    }
}

/// Escape `LIKE` wildcards so `query` matches literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn parse_created(value: Option<String>) -> Result<Option<NaiveDate>> {
    value
        .filter(|text| !text.trim().is_empty())
        .map(|text| {
            NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| {
                VocabError::integrity("Sets.Created", format!("'{text}' is not a date"))
            })
        })
        .transpose()
}

fn format_created(created: Option<NaiveDate>) -> Option<String> {
    created.map(|date| date.format(DATE_FORMAT).to_string())
}

fn info_from_columns(
    name: Option<String>,
    author: Option<String>,
    language: Option<String>,
    url: Option<String>,
    created: Option<String>,
) -> Result<ListInfo> {
    Ok(ListInfo {
        name: name.ok_or_else(|| VocabError::integrity("Sets.Name", "required value is NULL"))?,
        author,
        language,
        url,
        created: parse_created(created)?,
    })
}

fn list_exists(conn: &Connection, id: ListId) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM Sets WHERE id = ?1")?;
    Ok(stmt.exists([id.0])?)
}

fn require_list(conn: &Connection, id: ListId) -> Result<()> {
    if list_exists(conn, id)? {
        Ok(())
    } else {
        Err(VocabError::ListNotFound { id })
    }
}

fn delete_list_rows(tx: &Transaction<'_>, id: ListId) -> Result<usize> {
    require_list(tx, id)?;
    let entries = tx.execute("DELETE FROM VocabItems WHERE SetID = ?1", [id.0])?;
    tx.execute("DELETE FROM SetProperties WHERE SetID = ?1", [id.0])?;
    tx.execute(
        "DELETE FROM SetMemberships WHERE ChildID = ?1 OR ParentID = ?1",
        [id.0],
    )?;
    tx.execute("DELETE FROM Sets WHERE id = ?1", [id.0])?;
    Ok(entries)
}

impl Store {
    /// Open (creating if absent) the store at `path` with default settings.
    ///
    /// # Errors
    ///
    /// Returns `VersionConflict` if the file was written by a newer build,
    /// or a storage error if it cannot be opened or upgraded.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_config(path, StoreConfig::default())
    }

    /// Open (creating if absent) the store at `path`.
    ///
    /// # Errors
    ///
    /// Same as [`Store::open`].
    pub fn open_with_config(path: &Path, config: StoreConfig) -> Result<Self> {
        let db = Database::open(path, &config)?;
        let store = Self::init(db, config, Some(path.to_path_buf()))?;
        info!(path = %path.display(), "opened store");
        Ok(store)
    }

    /// Open a private in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        Self::open_memory_with_config(StoreConfig::default())
    }

    /// Open a private in-memory store with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn open_memory_with_config(config: StoreConfig) -> Result<Self> {
        let db = Database::open_memory(&config)?;
        Self::init(db, config, None)
    }

    fn init(db: Database, config: StoreConfig, path: Option<PathBuf>) -> Result<Self> {
        schema::upgrade(&db)?;
        db.apply_pragmas()?;
        Ok(Self {
            db: Rc::new(db),
            config,
            path,
            live: HashMap::new(),
            listeners: Vec::new(),
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The stored schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i64> {
        self.db.read(schema::stored_version)
    }

    // ------------------------------------------------------------------
    // Identity cache
    // ------------------------------------------------------------------

    fn cached(&self, id: ListId) -> Option<Rc<WordList>> {
        self.live.get(&id).and_then(Weak::upgrade)
    }

    fn register(&mut self, list: &Rc<WordList>) {
        self.live.retain(|_, slot| slot.strong_count() > 0);
        self.live.insert(list.id(), Rc::downgrade(list));
    }

    fn construct(&self, id: ListId, info: ListInfo) -> Result<Rc<WordList>> {
        let table = OrderedEntryTable::new(Rc::clone(&self.db), id);
        Ok(Rc::new(WordList::load(table, info, &self.config)?))
    }

    /// Number of lists currently alive in memory.
    #[must_use]
    pub fn live_list_count(&self) -> usize {
        self.live
            .values()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }

    // ------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------

    /// Persist a new list and return its live handle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank name, or a storage error.
    pub fn create_list(&mut self, info: ListInfo) -> Result<Rc<WordList>> {
        info.validate()?;

        let id = self.db.mutate("create_list", |tx| {
            tx.execute(
                "INSERT INTO Sets (Name, Author, Language, Url, Created) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    info.name,
                    info.author,
                    info.language,
                    info.url,
                    format_created(info.created),
                ],
            )?;
            Ok(ListId(tx.last_insert_rowid()))
        })?;

        info!(list = %id, name = %info.name, "created list");
        let list = self.construct(id, info)?;
        self.register(&list);
        Ok(list)
    }

    /// Return the live list for `id`, loading it if no handle is alive.
    ///
    /// # Errors
    ///
    /// Returns `ListNotFound` for an unknown id, or `DataIntegrity` if the
    /// stored list is malformed.
    pub fn get_list(&mut self, id: ListId) -> Result<Rc<WordList>> {
        if let Some(list) = self.cached(id) {
            return Ok(list);
        }

        let info = self.db.read(|conn| {
            let raw: InfoColumns = conn
                .prepare_cached(SELECT_INFO_SQL)?
                .query_row([id.0], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                })
                .optional()?
                .ok_or(VocabError::ListNotFound { id })?;
            info_from_columns(raw.0, raw.1, raw.2, raw.3, raw.4)
        })?;

        debug!(list = %id, "loading list into cache");
        let list = self.construct(id, info)?;
        self.register(&list);
        Ok(list)
    }

    /// Catalog of every list, by id ascending, without loading entries.
    ///
    /// # Errors
    ///
    /// Returns `DataIntegrity` for malformed metadata, or a storage error.
    pub fn get_all_lists(&self) -> Result<Vec<ListSummary>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare_cached(SELECT_SUMMARIES_SQL)?;
            let rows = stmt
                .query_map([], |row| {
                    let columns: InfoColumns =
                        (row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?);
                    Ok((row.get::<_, i64>(0)?, columns, row.get::<_, i64>(6)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(id, (name, author, language, url, created), count)| {
                    Ok(ListSummary {
                        id: ListId(id),
                        info: info_from_columns(name, author, language, url, created)?,
                        entry_count: usize::try_from(count).unwrap_or(0),
                    })
                })
                .collect()
        })
    }

    /// Replace a list's metadata. Not recorded in the list's undo history.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank name or `ListNotFound`.
    pub fn update_list_info(&mut self, id: ListId, info: ListInfo) -> Result<()> {
        info.validate()?;

        self.db.mutate("update_list_info", |tx| {
            let updated = tx.execute(
                "UPDATE Sets SET Name = ?2, Author = ?3, Language = ?4, Url = ?5, Created = ?6
                 WHERE id = ?1",
                params![
                    id.0,
                    info.name,
                    info.author,
                    info.language,
                    info.url,
                    format_created(info.created),
                ],
            )?;
            if updated == 0 {
                return Err(VocabError::ListNotFound { id });
            }
            Ok(())
        })?;

        if let Some(list) = self.cached(id) {
            list.set_info(info);
        }
        Ok(())
    }

    /// Delete a list with all of its entries, properties and membership links.
    ///
    /// Store listeners are notified first, then the live list (if any).
    ///
    /// # Errors
    ///
    /// Returns `ListNotFound` for an unknown id; nothing is notified then.
    pub fn delete_list(&mut self, id: ListId) -> Result<()> {
        let entries = self.db.mutate("delete_list", |tx| delete_list_rows(tx, id))?;
        info!(list = %id, entries, "deleted list");

        let live = self.live.remove(&id).and_then(|slot| slot.upgrade());

        for listener in &self.listeners {
            listener(id);
        }
        if let Some(list) = live {
            list.mark_deleted();
        }
        Ok(())
    }

    /// Register a callback run with the id of every list deleted through this store.
    pub fn on_list_deleted(&mut self, listener: impl Fn(ListId) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ------------------------------------------------------------------
    // List properties
    // ------------------------------------------------------------------

    /// Read one free-form property of a list.
    ///
    /// # Errors
    ///
    /// Returns `ListNotFound` for an unknown id.
    pub fn get_list_property(&self, id: ListId, key: &str) -> Result<Option<String>> {
        self.db.read(|conn| {
            require_list(conn, id)?;
            let value: Option<Option<String>> = conn
                .prepare_cached("SELECT Value FROM SetProperties WHERE SetID = ?1 AND Property = ?2")?
                .query_row(params![id.0, key], |row| row.get(0))
                .optional()?;
            Ok(value.flatten())
        })
    }

    /// Set (or with `None`, remove) a free-form property of a list.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a blank key or `ListNotFound`.
    pub fn set_list_property(&mut self, id: ListId, key: &str, value: Option<&str>) -> Result<()> {
        if key.trim().is_empty() {
            return Err(VocabError::invalid("property", "property key cannot be empty"));
        }

        self.db.mutate("set_list_property", |tx| {
            require_list(tx, id)?;
            match value {
                Some(value) => {
                    tx.execute(
                        "INSERT INTO SetProperties (SetID, Property, Value) VALUES (?1, ?2, ?3)
                         ON CONFLICT(SetID, Property) DO UPDATE SET Value = excluded.Value",
                        params![id.0, key, value],
                    )?;
                }
                None => {
                    tx.execute(
                        "DELETE FROM SetProperties WHERE SetID = ?1 AND Property = ?2",
                        params![id.0, key],
                    )?;
                }
            }
            Ok(())
        })
    }

    /// All free-form properties of a list, sorted by key.
    ///
    /// # Errors
    ///
    /// Returns `ListNotFound` for an unknown id.
    pub fn list_properties(&self, id: ListId) -> Result<BTreeMap<String, String>> {
        self.db.read(|conn| {
            require_list(conn, id)?;
            let mut stmt = conn.prepare_cached(
                "SELECT Property, Value FROM SetProperties WHERE SetID = ?1 AND Value IS NOT NULL",
            )?;
            let properties = stmt
                .query_map([id.0], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<std::result::Result<BTreeMap<String, String>, _>>()?;
            Ok(properties)
        })
    }

    // ------------------------------------------------------------------
    // Search
    // ------------------------------------------------------------------

    /// Case-insensitive literal substring search over every entry's phrase
    /// and translation. Case is folded with Unicode rules on both sides, so
    /// `árbol` finds `Árbol`. An empty query matches every entry.
    ///
    /// # Errors
    ///
    /// Returns `DataIntegrity` for malformed rows, or a storage error.
    pub fn search_entries(&self, query: &str) -> Result<Vec<SearchHit>> {
        let pattern = like_pattern(query);
        self.db.read(|conn| {
            let mut stmt = conn.prepare_cached(SEARCH_SQL)?;
            let rows = stmt
                .query_map([pattern.as_str()], |row| {
                    Ok((raw_row(row)?, row.get::<_, Option<i64>>(5)?))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            rows.into_iter()
                .map(|(raw, set_id)| {
                    let (position, entry) = decode_row(raw)?;
                    let list_id = set_id.ok_or_else(|| {
                        VocabError::integrity("VocabItems.SetID", "required value is NULL")
                    })?;
                    Ok(SearchHit {
                        list_id: ListId(list_id),
                        position,
                        entry,
                    })
                })
                .collect()
        })
    }
}
