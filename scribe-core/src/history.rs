//! Grouped undo/redo history.
//!
//! Commands are recorded into groups; undo and redo always move a whole
//! group. Groups may nest (a stroke processed inside a user action), in
//! which case only the outermost `end_group` closes the group.

use crate::command::{CommandOutcome, EditCommand};
use crate::document::{Cursor, Document};
use crate::error::ScribeResult;

/// An undo or redo that moved a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStep {
    /// Where the first edit of the group happened, for cursor placement.
    /// `None` when the group only touched metadata.
    pub cursor: Option<Cursor>,
}

/// Commands undone and redone together.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandGroup {
    label: String,
    commands: Vec<EditCommand>,
}

impl CommandGroup {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    /// Description shown for undo/redo.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of commands in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the group recorded nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn revert(&mut self, document: &mut Document) -> ScribeResult<Option<Cursor>> {
        let mut cursor = None;
        for command in self.commands.iter_mut().rev() {
            cursor = command.undo_cursor().or(cursor);
            command.revert(document)?;
        }
        Ok(cursor)
    }

    fn reapply(&mut self, document: &mut Document) -> ScribeResult<Option<Cursor>> {
        let mut cursor = None;
        for command in &mut self.commands {
            command.apply(document)?;
            cursor = command.redo_cursor().or(cursor);
        }
        Ok(cursor)
    }
}

/// Linear undo stack of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditHistory {
    undo: Vec<CommandGroup>,
    redo: Vec<CommandGroup>,
    open: Option<CommandGroup>,
    depth: usize,
    limit: Option<usize>,
}

impl EditHistory {
    /// Create an unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history keeping at most `limit` groups.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Start a group. Nested calls join the outer group.
    pub fn begin_group(&mut self, label: impl Into<String>) {
        if self.depth == 0 {
            self.open = Some(CommandGroup::new(label));
        }
        self.depth += 1;
    }

    /// Close a group. Empty groups are discarded.
    pub fn end_group(&mut self) {
        if self.depth == 0 {
            tracing::warn!("end_group called without an open group");
            return;
        }
        self.depth -= 1;
        if self.depth == 0 {
            if let Some(group) = self.open.take() {
                self.push(group);
            }
        }
    }

    /// Revert everything recorded in the open group and discard it.
    ///
    /// Used when a command inside the group fails so the group applies
    /// all-or-nothing.
    pub fn abort_group(&mut self, document: &mut Document) {
        if let Some(mut group) = self.open.take() {
            if let Err(e) = group.revert(document) {
                tracing::error!("Failed to roll back '{}': {e}", group.label);
            }
        }
        self.depth = 0;
    }

    /// Whether a group is open.
    #[must_use]
    pub fn in_group(&self) -> bool {
        self.depth > 0
    }

    /// Apply `command` and record it.
    ///
    /// Outside a group the command forms a group of its own.
    ///
    /// # Errors
    ///
    /// Returns the command's error; a failed command is not recorded.
    pub fn execute(
        &mut self,
        document: &mut Document,
        command: impl Into<EditCommand>,
    ) -> ScribeResult<CommandOutcome> {
        let mut command = command.into();
        let outcome = command.apply(document)?;
        tracing::trace!(command = command.label(), ?outcome, "Applied command");
        match self.open.as_mut() {
            Some(group) => group.commands.push(command),
            None => {
                let mut group = CommandGroup::new(command.label());
                group.commands.push(command);
                self.push(group);
            }
        }
        Ok(outcome)
    }

    /// Undo the most recent group. Returns `None` when there is nothing to undo.
    ///
    /// The step's cursor is where the group's first edit began.
    pub fn undo(&mut self, document: &mut Document) -> Option<HistoryStep> {
        if self.in_group() {
            tracing::warn!("undo requested while a group is open");
            return None;
        }
        let mut group = self.undo.pop()?;
        let cursor = group.revert(document).unwrap_or_else(|e| {
            tracing::error!("Failed to undo '{}': {e}", group.label);
            None
        });
        tracing::debug!(label = %group.label, ?cursor, "Undo");
        self.redo.push(group);
        Some(HistoryStep { cursor })
    }

    /// Redo the most recently undone group. Returns `None` when there is
    /// nothing to redo.
    ///
    /// The step's cursor is just past the group's last edit.
    pub fn redo(&mut self, document: &mut Document) -> Option<HistoryStep> {
        if self.in_group() {
            tracing::warn!("redo requested while a group is open");
            return None;
        }
        let mut group = self.redo.pop()?;
        let cursor = group.reapply(document).unwrap_or_else(|e| {
            tracing::error!("Failed to redo '{}': {e}", group.label);
            None
        });
        tracing::debug!(label = %group.label, ?cursor, "Redo");
        self.undo.push(group);
        Some(HistoryStep { cursor })
    }

    /// Number of groups that can be undone.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Number of groups that can be redone.
    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Label of the group `undo` would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<&str> {
        self.undo.last().map(CommandGroup::label)
    }

    /// Label of the group `redo` would reapply.
    #[must_use]
    pub fn redo_label(&self) -> Option<&str> {
        self.redo.last().map(CommandGroup::label)
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open = None;
        self.depth = 0;
    }

    fn push(&mut self, group: CommandGroup) {
        if group.is_empty() {
            return;
        }
        self.redo.clear();
        self.undo.push(group);
        if let Some(limit) = self.limit {
            if self.undo.len() > limit {
                let excess = self.undo.len() - limit;
                self.undo.drain(..excess);
            }
        }
    }
}
