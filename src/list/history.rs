//! Undo/redo stacks for one word list.

use crate::error::Result;
use crate::list::command::Command;
use crate::model::Entry;
use crate::storage::OrderedEntryTable;
use std::collections::VecDeque;
use tracing::debug;

/// Executed commands available for undo, and undone commands available for redo.
#[derive(Debug, Clone)]
pub struct CommandStack {
    undo: VecDeque<Command>,
    redo: Vec<Command>,
    limit: usize,
    coalesce: bool,
}

impl CommandStack {
    /// `limit` caps the undo depth (at least one step is always kept).
    #[must_use]
    pub fn new(limit: usize, coalesce: bool) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
            coalesce,
        }
    }

    /// Run `command` and record it.
    ///
    /// The command is pushed only after it applied successfully; a failed
    /// command leaves both stacks as they were.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Command::apply`].
    pub(crate) fn execute(
        &mut self,
        mut command: Command,
        table: &OrderedEntryTable,
        mirror: &mut Vec<Entry>,
    ) -> Result<()> {
        command.apply(table, mirror)?;
        debug!(list = %table.list_id(), command = %command.description(), "applied");
        self.push(command);
        Ok(())
    }

    fn push(&mut self, command: Command) {
        self.redo.clear();

        if self.coalesce {
            if let Some(top) = self.undo.back_mut() {
                if top.coalesce(&command) {
                    return;
                }
            }
        }

        self.undo.push_back(command);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Undo the most recent command. Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Command::undo`]; the command stays on the undo stack.
    pub(crate) fn undo(&mut self, table: &OrderedEntryTable, mirror: &mut Vec<Entry>) -> Result<bool> {
        let Some(mut command) = self.undo.pop_back() else {
            return Ok(false);
        };

        if let Err(err) = command.undo(table, mirror) {
            self.undo.push_back(command);
            return Err(err);
        }

        debug!(list = %table.list_id(), command = %command.description(), "undone");
        self.redo.push(command);
        Ok(true)
    }

    /// Redo the most recently undone command. Returns `false` when there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns the error from [`Command::redo`]; the command stays on the redo stack.
    pub(crate) fn redo(&mut self, table: &OrderedEntryTable, mirror: &mut Vec<Entry>) -> Result<bool> {
        let Some(mut command) = self.redo.pop() else {
            return Ok(false);
        };

        if let Err(err) = command.redo(table, mirror) {
            self.redo.push(command);
            return Err(err);
        }

        debug!(list = %table.list_id(), command = %command.description(), "redone");
        self.undo.push_back(command);
        Ok(true)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_description(&self) -> Option<String> {
        self.undo.back().map(Command::description)
    }

    #[must_use]
    pub fn redo_description(&self) -> Option<String> {
        self.redo.last().map(Command::description)
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
