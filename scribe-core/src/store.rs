//! Transcript storage.
//!
//! Provides a thread-safe [`TranscriptStore`] holding finalized snapshots in
//! memory and, when created with a data directory, mirroring them to disk as
//! `<name>.transcript` (paragraphs) and `<name>.meta.json` (styles, fields
//! and index catalog).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::document::{Document, TranscriptSnapshot};
use crate::schema::{self, MetaDocument, TranscriptDocument};

/// Extension of paragraph files.
pub const TRANSCRIPT_EXTENSION: &str = "transcript";

/// Suffix of catalog files.
const META_SUFFIX: &str = ".meta.json";

/// Extension of tape files written next to a transcript.
pub const TAPE_EXTENSION: &str = "tape";

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested transcript does not exist.
    #[error("Transcript not found: {0}")]
    NotFound(String),
    /// The operation needs a data directory and the store has none.
    #[error("No data directory configured")]
    NoDataDir,
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Thread-safe transcript storage.
///
/// # Example
///
/// ```
/// use scribe_core::store::TranscriptStore;
/// use scribe_core::Document;
///
/// let store = TranscriptStore::new();
/// store.save("hearing", &Document::new().snapshot()).expect("save");
/// assert_eq!(store.list().expect("list"), ["hearing"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    transcripts: Arc<RwLock<HashMap<String, TranscriptSnapshot>>>,
    /// Optional data directory for filesystem persistence.
    data_dir: Option<PathBuf>,
}

impl TranscriptStore {
    /// Create an in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with filesystem persistence.
    ///
    /// The directory is created if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Transcript store at {}", data_dir.display());
        Ok(Self {
            transcripts: Arc::default(),
            data_dir: Some(data_dir),
        })
    }

    /// The data directory, if any.
    #[must_use]
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Where the paragraphs of `name` are written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoDataDir`] for an in-memory store.
    pub fn transcript_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        self.file_path(name, &format!(".{TRANSCRIPT_EXTENSION}"))
    }

    /// Where the catalogs of `name` are written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoDataDir`] for an in-memory store.
    pub fn meta_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        self.file_path(name, META_SUFFIX)
    }

    /// Where the tape of `name` belongs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoDataDir`] for an in-memory store.
    pub fn tape_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        self.file_path(name, &format!(".{TAPE_EXTENSION}"))
    }

    fn file_path(&self, name: &str, suffix: &str) -> Result<PathBuf, StoreError> {
        let data_dir = self.data_dir.as_ref().ok_or(StoreError::NoDataDir)?;
        Ok(data_dir.join(format!("{}{suffix}", sanitize_filename(name))))
    }

    /// Store a snapshot under `name`, writing it to disk when persistent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] or [`StoreError::Serialization`] if the
    /// files cannot be written; the in-memory copy is kept either way.
    pub fn save(&self, name: &str, snapshot: &TranscriptSnapshot) -> Result<(), StoreError> {
        {
            let mut transcripts = self
                .transcripts
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            transcripts.insert(name.to_string(), snapshot.clone());
        }
        if self.data_dir.is_some() {
            self.persist(name, snapshot)?;
        }
        Ok(())
    }

    fn persist(&self, name: &str, snapshot: &TranscriptSnapshot) -> Result<(), StoreError> {
        let transcript = TranscriptDocument::from_paragraphs(&snapshot.paragraphs);
        let meta = MetaDocument {
            styles: snapshot.styles.clone(),
            fields: snapshot.fields.clone(),
            indices: snapshot.indices.clone(),
        };
        let path = self.transcript_path(name)?;
        std::fs::write(&path, serde_json::to_string_pretty(&transcript)?)?;
        std::fs::write(self.meta_path(name)?, serde_json::to_string_pretty(&meta)?)?;
        tracing::info!(
            paragraphs = snapshot.paragraphs.len(),
            "Saved transcript {name} to {}",
            path.display()
        );
        Ok(())
    }

    /// Open a transcript for editing.
    ///
    /// The in-memory copy wins over the files; a transcript only found on
    /// disk is cached after loading. Dangling style, field and index
    /// references are repaired on the way in.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if neither memory nor disk has the
    /// transcript, and [`StoreError::Io`] or [`StoreError::Serialization`]
    /// for unreadable files.
    pub fn load(&self, name: &str) -> Result<Document, StoreError> {
        if let Some(snapshot) = self.get(name) {
            return Ok(snapshot.into_document());
        }
        if self.data_dir.is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let document = self.load_from_disk(name)?;
        let mut transcripts = self
            .transcripts
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        transcripts.insert(name.to_string(), document.snapshot());
        Ok(document)
    }

    fn load_from_disk(&self, name: &str) -> Result<Document, StoreError> {
        let path = self.transcript_path(name)?;
        if !path.exists() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        let transcript: TranscriptDocument =
            serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        let meta_path = self.meta_path(name)?;
        let meta = if meta_path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&meta_path)?)?
        } else {
            tracing::warn!("No catalog file for {name}, using defaults");
            MetaDocument::default()
        };
        tracing::info!(
            paragraphs = transcript.paragraphs.len(),
            "Loaded transcript {name} from {}",
            path.display()
        );
        Ok(schema::assemble(transcript, meta))
    }

    /// Get the stored snapshot of `name`, if it is in memory.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<TranscriptSnapshot> {
        let transcripts = self
            .transcripts
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        transcripts.get(name).cloned()
    }

    /// Names of all transcripts in memory or on disk, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the data directory can't be read.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = {
            let transcripts = self
                .transcripts
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            transcripts.keys().cloned().collect()
        };
        if let Some(data_dir) = &self.data_dir {
            for entry in std::fs::read_dir(data_dir)? {
                let path = entry?.path();
                if path.extension().is_some_and(|ext| ext == TRANSCRIPT_EXTENSION) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Forget a transcript and remove its files.
    ///
    /// Returns whether anything was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if an existing file cannot be removed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let mut deleted = {
            let mut transcripts = self
                .transcripts
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            transcripts.remove(name).is_some()
        };
        if self.data_dir.is_some() {
            for path in [self.transcript_path(name)?, self.meta_path(name)?] {
                if path.exists() {
                    std::fs::remove_file(&path)?;
                    deleted = true;
                }
            }
        }
        if deleted {
            tracing::info!("Deleted transcript {name}");
        }
        Ok(deleted)
    }
}

/// Sanitize a transcript name for use as a filename.
///
/// Replaces any character that is not alphanumeric, `-`, or `_` with `_`.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn sample_document() -> Document {
        let mut document = Document::new();
        let paragraph = document.paragraph_mut(0).expect("first paragraph");
        paragraph
            .elements
            .push(Element::stroke("KAT", " cat", "2024-05-01T10:00:00.000", None));
        document
    }

    #[test]
    fn test_memory_save_and_load() {
        let store = TranscriptStore::new();
        store.save("hearing", &sample_document().snapshot()).expect("save");
        let loaded = store.load("hearing").expect("load");
        assert_eq!(loaded.text(), " cat");
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let store = TranscriptStore::new();
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TranscriptStore::with_data_dir(dir.path()).expect("store");
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_paths_need_data_dir() {
        let store = TranscriptStore::new();
        assert!(matches!(
            store.transcript_path("x"),
            Err(StoreError::NoDataDir)
        ));
    }

    #[test]
    fn test_persistence_across_stores() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TranscriptStore::with_data_dir(dir.path()).expect("store");
        let document = sample_document();
        store.save("day one", &document.snapshot()).expect("save");
        assert!(dir.path().join("day_one.transcript").exists());
        assert!(dir.path().join("day_one.meta.json").exists());

        let reopened = TranscriptStore::with_data_dir(dir.path()).expect("store2");
        let loaded = reopened.load("day one").expect("load");
        assert_eq!(loaded.paragraphs(), document.paragraphs());
        assert_eq!(loaded.styles, document.styles);
    }

    #[test]
    fn test_list_and_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = TranscriptStore::with_data_dir(dir.path()).expect("store");
        store.save("b", &Document::new().snapshot()).expect("save b");
        store.save("a", &Document::new().snapshot()).expect("save a");
        assert_eq!(store.list().expect("list"), ["a", "b"]);

        assert!(store.delete("a").expect("delete"));
        assert!(!store.delete("a").expect("delete again"));
        assert_eq!(store.list().expect("list"), ["b"]);
        assert!(!dir.path().join("a.transcript").exists());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("day one/part 2"), "day_one_part_2");
        assert_eq!(sanitize_filename("ok-name_1"), "ok-name_1");
    }
}
