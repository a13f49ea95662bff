//! In-memory word lists backed by an ordered entry table.
//!
//! A [`WordList`] loads every entry when it is constructed and then serves
//! reads from that mirror. Every mutation is a [`Command`] run through the
//! list's [`CommandStack`], so each one can be undone and redone.
//!
//! # Submodules
//!
//! - [`command`] - Reversible mutations
//! - [`history`] - Undo/redo stacks

pub mod command;
pub mod history;

pub use command::Command;
pub use history::CommandStack;

use crate::config::StoreConfig;
use crate::error::{Result, VocabError};
use crate::model::{Entry, EntryProperty, ListId, ListInfo, PropertyValue};
use crate::storage::OrderedEntryTable;
use crate::storage::table::normalize_indices;
use std::cell::{Cell, RefCell, RefMut};
use std::fmt;
use tracing::{debug, info};

type DeletionListener = Box<dyn Fn(ListId)>;

struct ListState {
    entries: Vec<Entry>,
    history: CommandStack,
}

/// A live, ordered, undoable vocabulary list.
///
/// Obtained from [`crate::Store`] as an `Rc<WordList>`; the store guarantees
/// at most one live instance per list id.
pub struct WordList {
    id: ListId,
    table: OrderedEntryTable,
    info: RefCell<ListInfo>,
    state: RefCell<ListState>,
    deleted: Cell<bool>,
    listeners: RefCell<Vec<DeletionListener>>,
}

impl fmt::Debug for WordList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordList")
            .field("id", &self.id)
            .field("name", &self.info.borrow().name)
            .field("len", &self.len())
            .field("deleted", &self.deleted.get())
            .finish_non_exhaustive()
    }
}

impl WordList {
    /// Build a list and eagerly load all of its entries.
    ///
    /// # Errors
    ///
    /// Returns `DataIntegrity` if the stored entries are malformed.
    pub(crate) fn load(table: OrderedEntryTable, info: ListInfo, config: &StoreConfig) -> Result<Self> {
        let entries = table.load_all()?;
        debug!(list = %table.list_id(), count = entries.len(), "loaded list");
        Ok(Self {
            id: table.list_id(),
            table,
            info: RefCell::new(info),
            state: RefCell::new(ListState {
                entries,
                history: CommandStack::new(config.history_limit, config.coalesce_edits),
            }),
            deleted: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
        })
    }

    #[must_use]
    pub const fn id(&self) -> ListId {
        self.id
    }

    #[must_use]
    pub fn info(&self) -> ListInfo {
        self.info.borrow().clone()
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.info.borrow().name.clone()
    }

    pub(crate) fn set_info(&self, info: ListInfo) {
        *self.info.borrow_mut() = info;
    }

    // ------------------------------------------------------------------
    // Deletion notification
    // ------------------------------------------------------------------

    /// Whether the list was deleted from the store while this object was alive.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    /// Register a callback run once if this list is deleted from the store.
    pub fn on_deleted(&self, listener: impl Fn(ListId) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    pub(crate) fn mark_deleted(&self) {
        if self.deleted.replace(true) {
            return;
        }
        // Undo and redo are refused from here on, so a history that is
        // borrowed right now can stay as it is.
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.history.clear();
        }
        info!(list = %self.id, "live list notified of deletion");

        let listeners = std::mem::take(&mut *self.listeners.borrow_mut());
        for listener in &listeners {
            listener(self.id);
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.deleted.get() {
            return Err(VocabError::ListDeleted { id: self.id });
        }
        Ok(())
    }

    /// Exclusive access to entries and history, for mutations.
    fn state_mut(&self) -> Result<RefMut<'_, ListState>> {
        self.ensure_live()?;
        self.state.try_borrow_mut().map_err(|_| {
            VocabError::invalid("list", "cannot be changed while its entries are borrowed")
        })
    }

    // ------------------------------------------------------------------
    // Reads (mirror only)
    // ------------------------------------------------------------------

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<Entry> {
        self.state.borrow().entries.get(position).cloned()
    }

    #[must_use]
    pub fn contains(&self, entry: &Entry) -> bool {
        self.state.borrow().entries.contains(entry)
    }

    #[must_use]
    pub fn index_of(&self, entry: &Entry) -> Option<usize> {
        self.state.borrow().entries.iter().position(|e| e == entry)
    }

    /// Snapshot of all entries in order.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.state.borrow().entries.clone()
    }

    /// Borrow the entries without cloning them.
    ///
    /// Mutating the list from inside `f` fails with `InvalidArgument`.
    pub fn with_entries<R>(&self, f: impl FnOnce(&[Entry]) -> R) -> R {
        f(&self.state.borrow().entries)
    }

    /// Copy every entry into `target`, starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the entries don't fit.
    pub fn copy_to(&self, target: &mut [Entry], offset: usize) -> Result<()> {
        let state = self.state.borrow();
        let len = state.entries.len();
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= target.len())
            .ok_or_else(|| {
                VocabError::invalid(
                    "target",
                    format!(
                        "{len} entries do not fit at offset {offset} of a slice of {}",
                        target.len()
                    ),
                )
            })?;
        target[offset..end].clone_from_slice(&state.entries);
        Ok(())
    }

    /// Read one property of the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no entry at `position`.
    pub fn get_property(&self, position: usize, property: EntryProperty) -> Result<PropertyValue> {
        self.state
            .borrow()
            .entries
            .get(position)
            .map(|entry| entry.property(property))
            .ok_or_else(|| self.out_of_range(position))
    }

    fn out_of_range(&self, position: usize) -> VocabError {
        VocabError::invalid(
            "position",
            format!("{position} is out of range for list {} of {}", self.id, self.len()),
        )
    }

    // ------------------------------------------------------------------
    // Mutations (all through the command stack)
    // ------------------------------------------------------------------

    fn execute(&self, command: Command) -> Result<()> {
        let mut state = self.state_mut()?;
        let ListState {
            entries, history, ..
        } = &mut *state;
        history.execute(command, &self.table, entries)
    }

    /// Append `entry`, returning its position.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is deleted or the write fails.
    pub fn add(&self, entry: Entry) -> Result<usize> {
        let position = self.len();
        self.execute(Command::insertion(position, entry))?;
        Ok(position)
    }

    /// Insert `entry` at `position` (`position == len` appends).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `position > len`.
    pub fn insert(&self, position: usize, entry: Entry) -> Result<()> {
        if position > self.len() {
            return Err(self.out_of_range(position));
        }
        self.execute(Command::insertion(position, entry))
    }

    /// Insert several entries at consecutive positions as one undo step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty batch or `position > len`.
    pub fn insert_many(&self, position: usize, entries: Vec<Entry>) -> Result<()> {
        if entries.is_empty() {
            return Err(VocabError::invalid("entries", "nothing to insert"));
        }
        if position > self.len() {
            return Err(self.out_of_range(position));
        }
        self.execute(Command::batch_insertion(position, entries))
    }

    /// Remove the first entry equal to `entry`. Returns `false` if none matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is deleted or the write fails.
    pub fn remove(&self, entry: &Entry) -> Result<bool> {
        match self.index_of(entry) {
            Some(position) => {
                self.remove_at(position)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no entry at `position`.
    pub fn remove_at(&self, position: usize) -> Result<()> {
        if position >= self.len() {
            return Err(self.out_of_range(position));
        }
        self.execute(Command::deletion(vec![position]))
    }

    /// Remove an arbitrary set of positions as one undo step.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an empty set, duplicates, or an index out of range.
    pub fn remove_indices(&self, indices: &[usize]) -> Result<()> {
        let descending = normalize_indices(indices)?;
        if let Some(&highest) = descending.first() {
            if highest >= self.len() {
                return Err(self.out_of_range(highest));
            }
        }
        self.execute(Command::deletion(descending))
    }

    /// Remove every entry as one undo step. Clearing an empty list does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is deleted or the write fails.
    pub fn clear(&self) -> Result<()> {
        self.ensure_live()?;
        let len = self.len();
        if len == 0 {
            return Ok(());
        }
        self.execute(Command::deletion((0..len).rev().collect()))
    }

    /// Replace the whole entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no entry at `position`.
    pub fn set(&self, position: usize, entry: Entry) -> Result<()> {
        if position >= self.len() {
            return Err(self.out_of_range(position));
        }
        self.execute(Command::set_item(position, entry))
    }

    /// Write one property of the entry at `position`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if there is no entry at `position`.
    pub fn set_property(&self, position: usize, value: PropertyValue) -> Result<()> {
        if position >= self.len() {
            return Err(self.out_of_range(position));
        }
        self.execute(Command::set_value(position, value))
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Undo the most recent mutation. Returns `false` if there was nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is deleted or the write fails.
    pub fn undo(&self) -> Result<bool> {
        let mut state = self.state_mut()?;
        let ListState {
            entries, history, ..
        } = &mut *state;
        history.undo(&self.table, entries)
    }

    /// Redo the most recently undone mutation. Returns `false` if there was nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is deleted or the write fails.
    pub fn redo(&self) -> Result<bool> {
        let mut state = self.state_mut()?;
        let ListState {
            entries, history, ..
        } = &mut *state;
        history.redo(&self.table, entries)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.state.borrow().history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.state.borrow().history.can_redo()
    }

    #[must_use]
    pub fn undo_description(&self) -> Option<String> {
        self.state.borrow().history.undo_description()
    }

    #[must_use]
    pub fn redo_description(&self) -> Option<String> {
        self.state.borrow().history.redo_description()
    }

    /// Forget all undo and redo steps.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when called from inside [`WordList::with_entries`].
    pub fn clear_history(&self) -> Result<()> {
        self.state
            .try_borrow_mut()
            .map_err(|_| VocabError::invalid("list", "history is borrowed"))?
            .history
            .clear();
        Ok(())
    }

    /// The table behind this list; reads here go to the database.
    #[must_use]
    pub const fn table(&self) -> &OrderedEntryTable {
        &self.table
    }
}
