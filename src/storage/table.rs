//! Position-consistent storage of one list's entries.
//!
//! Every entry row carries its `ListPosition`. All writes keep the positions
//! of a list contiguous (`0..count`) by shifting the tail of the list in the
//! same transaction as the insert or delete that opened or closed the gap.

use crate::error::{Result, VocabError};
use crate::model::{Entry, EntryProperty, ListId, PropertyValue};
use crate::storage::db::Database;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::BTreeSet;
use std::rc::Rc;
use tracing::debug;

const COUNT_SQL: &str = "SELECT count(*) FROM VocabItems WHERE SetID = ?1";

const SHIFT_SQL: &str = "UPDATE VocabItems SET ListPosition = ListPosition + ?3
     WHERE SetID = ?1 AND ListPosition >= ?2";

const INSERT_SQL: &str = "INSERT INTO VocabItems
     (Phrase, Translation, SetID, ListPosition, TimesTried, TimesFailed)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const DELETE_RANGE_SQL: &str = "DELETE FROM VocabItems
     WHERE SetID = ?1 AND ListPosition >= ?2 AND ListPosition < ?3";

const SELECT_ALL_SQL: &str = "SELECT ListPosition, Phrase, Translation, TimesTried, TimesFailed
     FROM VocabItems WHERE SetID = ?1 ORDER BY ListPosition";

const SELECT_AT_SQL: &str = "SELECT ListPosition, Phrase, Translation, TimesTried, TimesFailed
     FROM VocabItems WHERE SetID = ?1 AND ListPosition = ?2";

const REPLACE_SQL: &str = "UPDATE VocabItems
     SET Phrase = ?3, Translation = ?4, TimesTried = ?5, TimesFailed = ?6
     WHERE SetID = ?1 AND ListPosition = ?2";

const POSITIONS_SQL: &str =
    "SELECT ListPosition FROM VocabItems WHERE SetID = ?1 ORDER BY ListPosition";

/// Static statements for the per-property read and write paths.
const fn select_property_sql(property: EntryProperty) -> &'static str {
    match property {
        EntryProperty::Phrase => {
            "SELECT Phrase FROM VocabItems WHERE SetID = ?1 AND ListPosition = ?2"
        }
        EntryProperty::Translation => {
            "SELECT Translation FROM VocabItems WHERE SetID = ?1 AND ListPosition = ?2"
        }
        EntryProperty::TimesTried => {
            "SELECT TimesTried FROM VocabItems WHERE SetID = ?1 AND ListPosition = ?2"
        }
        EntryProperty::TimesFailed => {
            "SELECT TimesFailed FROM VocabItems WHERE SetID = ?1 AND ListPosition = ?2"
        }
    }
}

const fn update_property_sql(property: EntryProperty) -> &'static str {
    match property {
        EntryProperty::Phrase => {
            "UPDATE VocabItems SET Phrase = ?3 WHERE SetID = ?1 AND ListPosition = ?2"
        }
        EntryProperty::Translation => {
            "UPDATE VocabItems SET Translation = ?3 WHERE SetID = ?1 AND ListPosition = ?2"
        }
        EntryProperty::TimesTried => {
            "UPDATE VocabItems SET TimesTried = ?3 WHERE SetID = ?1 AND ListPosition = ?2"
        }
        EntryProperty::TimesFailed => {
            "UPDATE VocabItems SET TimesFailed = ?3 WHERE SetID = ?1 AND ListPosition = ?2"
        }
    }
}

/// A row as read from `VocabItems`, before the NOT NULL contract is checked.
pub(crate) type RawRow = (
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<i64>,
    Option<i64>,
);

pub(crate) fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T> {
    value.ok_or_else(|| VocabError::integrity(field, "required value is NULL"))
}

fn counter(value: Option<i64>, field: &str) -> Result<u32> {
    let value = required(value, field)?;
    u32::try_from(value)
        .map_err(|_| VocabError::integrity(field, format!("{value} is not a valid count")))
}

pub(crate) fn stored_position(value: Option<i64>) -> Result<usize> {
    let value = required(value, "VocabItems.ListPosition")?;
    usize::try_from(value).map_err(|_| {
        VocabError::integrity("VocabItems.ListPosition", format!("negative position {value}"))
    })
}

/// Check the NOT NULL contract and convert a raw row into `(position, entry)`.
pub(crate) fn decode_row(raw: RawRow) -> Result<(usize, Entry)> {
    let (position, phrase, translation, tried, failed) = raw;
    let entry = Entry {
        phrase: required(phrase, "VocabItems.Phrase")?,
        translation: required(translation, "VocabItems.Translation")?,
        times_tried: counter(tried, "VocabItems.TimesTried")?,
        times_failed: counter(failed, "VocabItems.TimesFailed")?,
    };
    Ok((stored_position(position)?, entry))
}

fn to_sql_position(position: usize) -> Result<i64> {
    i64::try_from(position)
        .map_err(|_| VocabError::invalid("position", format!("{position} is too large")))
}

/// Ordered-list operations for one list, each mapped onto a single transaction.
///
/// Reads are public. Writes are crate-internal and only reached through
/// [`crate::WordList`], which rejects bad positions and index sets before
/// the database is touched.
#[derive(Debug, Clone)]
pub struct OrderedEntryTable {
    db: Rc<Database>,
    list_id: ListId,
}

impl OrderedEntryTable {
    #[must_use]
    pub(crate) const fn new(db: Rc<Database>, list_id: ListId) -> Self {
        Self { db, list_id }
    }

    #[must_use]
    pub const fn list_id(&self) -> ListId {
        self.list_id
    }

    // ------------------------------------------------------------------
    // Statement helpers. All take a connection (or a transaction, via deref)
    // so they compose inside one `mutate` call.
    // ------------------------------------------------------------------

    fn count_in(&self, conn: &Connection) -> Result<usize> {
        let count: i64 = conn
            .prepare_cached(COUNT_SQL)?
            .query_row([self.list_id.0], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn shift_in(&self, conn: &Connection, from: usize, delta: i64) -> Result<()> {
        conn.prepare_cached(SHIFT_SQL)?
            .execute(params![self.list_id.0, to_sql_position(from)?, delta])?;
        Ok(())
    }

    fn insert_row_in(&self, conn: &Connection, position: usize, entry: &Entry) -> Result<()> {
        conn.prepare_cached(INSERT_SQL)?.execute(params![
            entry.phrase,
            entry.translation,
            self.list_id.0,
            to_sql_position(position)?,
            entry.times_tried,
            entry.times_failed,
        ])?;
        Ok(())
    }

    fn delete_range_in(&self, conn: &Connection, start: usize, end: usize) -> Result<usize> {
        let deleted = conn.prepare_cached(DELETE_RANGE_SQL)?.execute(params![
            self.list_id.0,
            to_sql_position(start)?,
            to_sql_position(end)?,
        ])?;
        Ok(deleted)
    }

    fn entry_at_in(&self, conn: &Connection, position: usize) -> Result<Entry> {
        let raw = conn
            .prepare_cached(SELECT_AT_SQL)?
            .query_row(params![self.list_id.0, to_sql_position(position)?], raw_row)
            .optional()?
            .ok_or_else(|| {
                VocabError::invalid("position", format!("no entry at position {position}"))
            })?;
        Ok(decode_row(raw)?.1)
    }

    fn property_at_in(
        &self,
        conn: &Connection,
        position: usize,
        property: EntryProperty,
    ) -> Result<PropertyValue> {
        let field = format!("VocabItems.{property}");
        let at = to_sql_position(position)?;
        let mut stmt = conn.prepare_cached(select_property_sql(property))?;
        let args = params![self.list_id.0, at];
        let missing =
            || VocabError::invalid("position", format!("no entry at position {position}"));

        let value = match property {
            EntryProperty::Phrase | EntryProperty::Translation => {
                let text: Option<String> = stmt
                    .query_row(args, |row| row.get(0))
                    .optional()?
                    .ok_or_else(missing)?;
                let text = required(text, &field)?;
                if property == EntryProperty::Phrase {
                    PropertyValue::Phrase(text)
                } else {
                    PropertyValue::Translation(text)
                }
            }
            EntryProperty::TimesTried | EntryProperty::TimesFailed => {
                let number: Option<i64> = stmt
                    .query_row(args, |row| row.get(0))
                    .optional()?
                    .ok_or_else(missing)?;
                let number = counter(number, &field)?;
                if property == EntryProperty::TimesTried {
                    PropertyValue::TimesTried(number)
                } else {
                    PropertyValue::TimesFailed(number)
                }
            }
        };
        Ok(value)
    }

    fn check_insert_position(position: usize, count: usize) -> Result<()> {
        if position > count {
            return Err(VocabError::invalid(
                "position",
                format!("{position} is past the end of a list of {count}"),
            ));
        }
        Ok(())
    }

    fn check_existing_position(position: usize, count: usize) -> Result<()> {
        if position >= count {
            return Err(VocabError::invalid(
                "position",
                format!("{position} is out of range for a list of {count}"),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Number of entries in the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self) -> Result<usize> {
        self.db.read(|conn| self.count_in(conn))
    }

    /// Load every entry, in position order.
    ///
    /// # Errors
    ///
    /// Returns `DataIntegrity` if a required column is NULL or the stored
    /// positions are not exactly `0..count`.
    pub fn load_all(&self) -> Result<Vec<Entry>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare_cached(SELECT_ALL_SQL)?;
            let raw = stmt
                .query_map([self.list_id.0], raw_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut entries = Vec::with_capacity(raw.len());
            for (expected, row) in raw.into_iter().enumerate() {
                let (position, entry) = decode_row(row)?;
                if position != expected {
                    return Err(VocabError::integrity(
                        "VocabItems.ListPosition",
                        format!(
                            "list {} has position {position} where {expected} was expected",
                            self.list_id
                        ),
                    ));
                }
                entries.push(entry);
            }
            Ok(entries)
        })
    }

    /// Batch point reads. The result is ordered by position ascending,
    /// whatever the order of `indices`; duplicates are read once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a position with no entry and
    /// `DataIntegrity` if a required column is NULL.
    pub fn get_entries(&self, indices: &[usize]) -> Result<Vec<Entry>> {
        let wanted: BTreeSet<usize> = indices.iter().copied().collect();
        self.db.read(|conn| {
            wanted
                .iter()
                .map(|&position| self.entry_at_in(conn, position))
                .collect()
        })
    }

    /// Read one property of the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a position with no entry and
    /// `DataIntegrity` if the column is NULL.
    pub fn get_property(&self, position: usize, property: EntryProperty) -> Result<PropertyValue> {
        self.db
            .read(|conn| self.property_at_in(conn, position, property))
    }

    /// Raw stored positions, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn positions(&self) -> Result<Vec<i64>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare_cached(POSITIONS_SQL)?;
            let positions = stmt
                .query_map([self.list_id.0], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(positions)
        })
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Insert `entry` at `position`, moving everything at or after it up by one.
    /// `position == count` appends.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `position > count`; storage errors roll back.
    pub(crate) fn insert(&self, position: usize, entry: &Entry) -> Result<()> {
        self.db.mutate("insert_entry", |tx| {
            Self::check_insert_position(position, self.count_in(tx)?)?;
            self.shift_in(tx, position, 1)?;
            self.insert_row_in(tx, position, entry)
        })?;
        debug!(list = %self.list_id, position, "inserted entry");
        Ok(())
    }

    /// Insert `entries` at consecutive positions starting at `position`,
    /// shifting the tail once.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty batch or `position > count`.
    pub(crate) fn insert_batch(&self, position: usize, entries: &[Entry]) -> Result<()> {
        if entries.is_empty() {
            return Err(VocabError::invalid("entries", "batch insert needs at least one entry"));
        }
        let width = i64::try_from(entries.len())
            .map_err(|_| VocabError::invalid("entries", "batch is too large"))?;

        self.db.mutate("insert_batch", |tx| {
            Self::check_insert_position(position, self.count_in(tx)?)?;
            self.shift_in(tx, position, width)?;
            for (offset, entry) in entries.iter().enumerate() {
                self.insert_row_in(tx, position + offset, entry)?;
            }
            Ok(())
        })?;
        debug!(list = %self.list_id, position, count = entries.len(), "inserted batch");
        Ok(())
    }

    /// Remove the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no entry at `position`.
    pub(crate) fn remove_at(&self, position: usize) -> Result<()> {
        self.remove_range(position, 1)
    }

    /// Remove `len` entries starting at `position`, closing the gap.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty or out-of-range span.
    pub(crate) fn remove_range(&self, position: usize, len: usize) -> Result<()> {
        if len == 0 {
            return Err(VocabError::invalid("count", "range removal needs at least one entry"));
        }
        let end = position
            .checked_add(len)
            .ok_or_else(|| VocabError::invalid("count", "range overflows"))?;
        let width = i64::try_from(len).map_err(|_| VocabError::invalid("count", "range is too large"))?;

        self.db.mutate("remove_range", |tx| {
            let count = self.count_in(tx)?;
            if end > count {
                return Err(VocabError::invalid(
                    "count",
                    format!("range {position}..{end} is out of range for a list of {count}"),
                ));
            }
            self.delete_range_in(tx, position, end)?;
            self.shift_in(tx, end, -width)
        })?;
        debug!(list = %self.list_id, position, len, "removed range");
        Ok(())
    }

    /// Remove an arbitrary set of positions and return the removed entries,
    /// ascending by their original position.
    ///
    /// Rows are deleted from the highest position to the lowest: deleting a
    /// lower one first would shift the higher ones out from under their indices.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty set, duplicates, or a position
    /// with no entry.
    pub(crate) fn remove_indices(&self, indices: &[usize]) -> Result<Vec<(usize, Entry)>> {
        let descending = normalize_indices(indices)?;

        let mut removed = self.db.mutate("remove_indices", |tx| {
            let count = self.count_in(tx)?;
            let mut removed = Vec::with_capacity(descending.len());
            for &position in &descending {
                Self::check_existing_position(position, count)?;
                let entry = self.entry_at_in(tx, position)?;
                self.delete_range_in(tx, position, position + 1)?;
                self.shift_in(tx, position + 1, -1)?;
                removed.push((position, entry));
            }
            Ok(removed)
        })?;
        removed.reverse();
        debug!(list = %self.list_id, count = removed.len(), "removed entries");
        Ok(removed)
    }

    /// Put previously removed entries back at their original positions.
    /// Inserts ascending, so each entry lands exactly where it was taken from.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if a position would open a gap.
    pub(crate) fn restore(&self, entries: &[(usize, Entry)]) -> Result<()> {
        let mut ordered: Vec<&(usize, Entry)> = entries.iter().collect();
        ordered.sort_by_key(|(position, _)| *position);

        self.db.mutate("restore_entries", |tx| {
            let mut count = self.count_in(tx)?;
            for (position, entry) in ordered {
                Self::check_insert_position(*position, count)?;
                self.shift_in(tx, *position, 1)?;
                self.insert_row_in(tx, *position, entry)?;
                count += 1;
            }
            Ok(())
        })?;
        debug!(list = %self.list_id, count = entries.len(), "restored entries");
        Ok(())
    }

    /// Overwrite the whole entry at `position` and return what was there.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no entry at `position`.
    pub(crate) fn replace(&self, position: usize, entry: &Entry) -> Result<Entry> {
        self.db.mutate("replace_entry", |tx| {
            let previous = self.entry_at_in(tx, position)?;
            tx.prepare_cached(REPLACE_SQL)?.execute(params![
                self.list_id.0,
                to_sql_position(position)?,
                entry.phrase,
                entry.translation,
                entry.times_tried,
                entry.times_failed,
            ])?;
            Ok(previous)
        })
    }

    /// Write one property of the entry at `position` and return its previous value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no entry at `position`.
    pub(crate) fn set_property(&self, position: usize, value: &PropertyValue) -> Result<PropertyValue> {
        let property = value.property();
        self.db.mutate("set_property", |tx| {
            let previous = self.property_at_in(tx, position, property)?;
            let mut stmt = tx.prepare_cached(update_property_sql(property))?;
            let at = to_sql_position(position)?;
            match value {
                PropertyValue::Phrase(text) | PropertyValue::Translation(text) => {
                    stmt.execute(params![self.list_id.0, at, text])?;
                }
                PropertyValue::TimesTried(number) | PropertyValue::TimesFailed(number) => {
                    stmt.execute(params![self.list_id.0, at, number])?;
                }
            }
            Ok(previous)
        })
    }
}

/// Validate an index set and return it sorted descending.
///
/// # Errors
///
/// Returns `InvalidArgument` for an empty set or duplicate indices.
pub fn normalize_indices(indices: &[usize]) -> Result<Vec<usize>> {
    if indices.is_empty() {
        return Err(VocabError::invalid("indices", "index set is empty"));
    }
    let unique: BTreeSet<usize> = indices.iter().copied().collect();
    if unique.len() != indices.len() {
        return Err(VocabError::invalid("indices", "index set contains duplicates"));
    }
    Ok(unique.into_iter().rev().collect())
}
