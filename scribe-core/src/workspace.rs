//! Several open transcripts, one of them active.
//!
//! Each open transcript keeps its own editor, so switching swaps which undo
//! stack receives edits and nothing is shared between documents.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editor::TranscriptEditor;

/// Identifier of an open transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Create a new random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an ID from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Open transcripts keyed by [`DocumentId`].
#[derive(Debug, Default)]
pub struct Workspace {
    editors: HashMap<DocumentId, TranscriptEditor>,
    order: Vec<DocumentId>,
    active: Option<DocumentId>,
}

impl Workspace {
    /// Create an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an editor and make it active.
    pub fn open(&mut self, editor: TranscriptEditor) -> DocumentId {
        let id = DocumentId::new();
        self.editors.insert(id, editor);
        self.order.push(id);
        self.active = Some(id);
        tracing::info!(%id, "Opened transcript");
        id
    }

    /// Make `id` the active transcript. Returns `false` for an unknown ID.
    pub fn switch(&mut self, id: DocumentId) -> bool {
        if !self.editors.contains_key(&id) {
            return false;
        }
        self.active = Some(id);
        tracing::info!(%id, "Switched transcript");
        true
    }

    /// ID of the active transcript.
    #[must_use]
    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    /// The active editor.
    #[must_use]
    pub fn active(&self) -> Option<&TranscriptEditor> {
        self.active.and_then(|id| self.editors.get(&id))
    }

    /// The active editor, mutably.
    pub fn active_mut(&mut self) -> Option<&mut TranscriptEditor> {
        self.active.and_then(|id| self.editors.get_mut(&id))
    }

    /// An editor by ID.
    #[must_use]
    pub fn get(&self, id: DocumentId) -> Option<&TranscriptEditor> {
        self.editors.get(&id)
    }

    /// Close a transcript and hand its editor back.
    ///
    /// Closing the active transcript activates the most recently opened
    /// remaining one.
    pub fn close(&mut self, id: DocumentId) -> Option<TranscriptEditor> {
        let editor = self.editors.remove(&id)?;
        self.order.retain(|open| *open != id);
        if self.active == Some(id) {
            self.active = self.order.last().copied();
        }
        tracing::info!(%id, "Closed transcript");
        Some(editor)
    }

    /// IDs in the order they were opened.
    #[must_use]
    pub fn ids(&self) -> &[DocumentId] {
        &self.order
    }

    /// Number of open transcripts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
