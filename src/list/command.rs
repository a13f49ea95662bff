//! Reversible list mutations.
//!
//! Each command changes the persisted table first and the in-memory mirror
//! second. When the table write fails the mirror is never touched, so the two
//! copies stay identical whichever way a command runs.

use crate::error::{Result, VocabError};
use crate::model::{Entry, PropertyValue};
use crate::storage::OrderedEntryTable;

/// One undoable mutation of a word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Insertion {
        position: usize,
        entry: Entry,
    },
    BatchInsertion {
        position: usize,
        entries: Vec<Entry>,
    },
    /// `removed` is filled in when the command runs, never before.
    Deletion {
        indices: Vec<usize>,
        removed: Vec<(usize, Entry)>,
    },
    SetItem {
        position: usize,
        entry: Entry,
        previous: Option<Entry>,
    },
    SetValue {
        position: usize,
        old: Option<PropertyValue>,
        new: PropertyValue,
    },
}

fn mirror_slot(mirror: &mut [Entry], position: usize) -> Result<&mut Entry> {
    let len = mirror.len();
    mirror.get_mut(position).ok_or_else(|| {
        VocabError::integrity(
            "mirror",
            format!("position {position} missing from in-memory list of {len}"),
        )
    })
}

fn mirror_insert(mirror: &mut Vec<Entry>, position: usize, entry: Entry) -> Result<()> {
    if position > mirror.len() {
        return Err(VocabError::integrity(
            "mirror",
            format!("cannot insert at {position} into in-memory list of {}", mirror.len()),
        ));
    }
    mirror.insert(position, entry);
    Ok(())
}

fn mirror_remove(mirror: &mut Vec<Entry>, position: usize) -> Result<Entry> {
    if position >= mirror.len() {
        return Err(VocabError::integrity(
            "mirror",
            format!("cannot remove {position} from in-memory list of {}", mirror.len()),
        ));
    }
    Ok(mirror.remove(position))
}

fn never_ran() -> VocabError {
    VocabError::integrity("history", "undo requested for a command that never ran")
}

impl Command {
    #[must_use]
    pub const fn insertion(position: usize, entry: Entry) -> Self {
        Self::Insertion { position, entry }
    }

    #[must_use]
    pub const fn batch_insertion(position: usize, entries: Vec<Entry>) -> Self {
        Self::BatchInsertion { position, entries }
    }

    #[must_use]
    pub const fn deletion(indices: Vec<usize>) -> Self {
        Self::Deletion {
            indices,
            removed: Vec::new(),
        }
    }

    #[must_use]
    pub const fn set_item(position: usize, entry: Entry) -> Self {
        Self::SetItem {
            position,
            entry,
            previous: None,
        }
    }

    #[must_use]
    pub const fn set_value(position: usize, new: PropertyValue) -> Self {
        Self::SetValue {
            position,
            old: None,
            new,
        }
    }

    /// Apply the command for the first time.
    ///
    /// # Errors
    ///
    /// Returns the table error unchanged; the mirror is untouched in that case.
    pub(crate) fn apply(&mut self, table: &OrderedEntryTable, mirror: &mut Vec<Entry>) -> Result<()> {
        match self {
            Self::Insertion { position, entry } => {
                table.insert(*position, entry)?;
                mirror_insert(mirror, *position, entry.clone())
            }
            Self::BatchInsertion { position, entries } => {
                table.insert_batch(*position, entries)?;
                for (offset, entry) in entries.iter().enumerate() {
                    mirror_insert(mirror, *position + offset, entry.clone())?;
                }
                Ok(())
            }
            Self::Deletion { indices, removed } => {
                let taken = table.remove_indices(indices)?;
                for (position, _) in taken.iter().rev() {
                    mirror_remove(mirror, *position)?;
                }
                *removed = taken;
                Ok(())
            }
            Self::SetItem {
                position,
                entry,
                previous,
            } => {
                let old = table.replace(*position, entry)?;
                *mirror_slot(mirror, *position)? = entry.clone();
                *previous = Some(old);
                Ok(())
            }
            Self::SetValue { position, old, new } => {
                let prior = table.set_property(*position, new)?;
                mirror_slot(mirror, *position)?.apply(new);
                // A coalesced command keeps the value from before its first edit.
                if old.is_none() {
                    *old = Some(prior);
                }
                Ok(())
            }
        }
    }

    /// Reapply after an undo.
    ///
    /// # Errors
    ///
    /// Same as [`Command::apply`].
    pub(crate) fn redo(&mut self, table: &OrderedEntryTable, mirror: &mut Vec<Entry>) -> Result<()> {
        self.apply(table, mirror)
    }

    /// Exact inverse of [`Command::apply`].
    ///
    /// # Errors
    ///
    /// Returns the table error unchanged; the mirror is untouched in that case.
    pub(crate) fn undo(&mut self, table: &OrderedEntryTable, mirror: &mut Vec<Entry>) -> Result<()> {
        match self {
            Self::Insertion { position, .. } => {
                table.remove_at(*position)?;
                mirror_remove(mirror, *position)?;
                Ok(())
            }
            Self::BatchInsertion { position, entries } => {
                table.remove_range(*position, entries.len())?;
                let end = *position + entries.len();
                if end > mirror.len() {
                    return Err(VocabError::integrity(
                        "mirror",
                        format!("range {position}..{end} missing from in-memory list"),
                    ));
                }
                mirror.drain(*position..end);
                Ok(())
            }
            Self::Deletion { removed, .. } => {
                if removed.is_empty() {
                    return Err(never_ran());
                }
                table.restore(removed)?;
                for (position, entry) in removed.iter() {
                    mirror_insert(mirror, *position, entry.clone())?;
                }
                Ok(())
            }
            Self::SetItem {
                position, previous, ..
            } => {
                let previous = previous.as_ref().ok_or_else(never_ran)?;
                table.replace(*position, previous)?;
                *mirror_slot(mirror, *position)? = previous.clone();
                Ok(())
            }
            Self::SetValue { position, old, .. } => {
                let old = old.as_ref().ok_or_else(never_ran)?;
                table.set_property(*position, old)?;
                mirror_slot(mirror, *position)?.apply(old);
                Ok(())
            }
        }
    }

    /// Try to fold `next` into this command so both undo as one step.
    ///
    /// Only edits of the same property of the same entry merge; the merged
    /// command keeps this command's old value and takes `next`'s new value.
    pub fn coalesce(&mut self, next: &Self) -> bool {
        match (self, next) {
            (
                Self::SetValue { position, new, .. },
                Self::SetValue {
                    position: next_position,
                    new: next_new,
                    ..
                },
            ) if *position == *next_position && new.property() == next_new.property() => {
                new.clone_from(next_new);
                true
            }
            _ => false,
        }
    }

    /// Human-readable label for undo/redo menus.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Insertion { position, entry } => {
                format!("Insert \"{}\" at {position}", entry.phrase)
            }
            Self::BatchInsertion { position, entries } => {
                format!("Insert {} entries at {position}", entries.len())
            }
            Self::Deletion { indices, .. } if indices.len() == 1 => {
                format!("Delete entry at {}", indices[0])
            }
            Self::Deletion { indices, .. } => format!("Delete {} entries", indices.len()),
            Self::SetItem { position, .. } => format!("Replace entry at {position}"),
            Self::SetValue { position, new, .. } => {
                format!("Set {} of entry {position}", new.property())
            }
        }
    }
}
