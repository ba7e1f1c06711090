//! # Scribe Core
//!
//! Document model and editing engine for real-time stenographic
//! transcription.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 scribe-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Document Model   │  Editing                │
//! │  - Elements       │  - Invertible commands  │
//! │  - Collections    │  - Grouped undo/redo    │
//! │  - Paragraphs     │  - Stroke synthesizer   │
//! ├─────────────────────────────────────────────┤
//! │  Persistence      │  Session                │
//! │  - Schema         │  - Editor facade        │
//! │  - Store          │  - Tape log, workspace  │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod collection;
pub mod command;
pub mod config;
pub mod document;
pub mod editor;
pub mod element;
pub mod error;
pub mod event;
pub mod history;
pub mod paragraph;
pub mod schema;
pub mod store;
pub mod style;
pub mod synth;
pub mod tape;
pub mod time;
pub mod workspace;

pub use collection::{Backtrack, ElementCollection, ElementSlice, Insertion, Removal};
pub use command::{
    CommandOutcome, EditCommand, InsertText, MergeParagraphs, RemoveText, SetProperty, SetStyle,
    SplitParagraph, UpdateFieldValues, UpdateIndexEntries, UpdateStyleDefinition,
};
pub use config::{AffixPolicy, EditorConfig, SpacePlacement};
pub use document::{
    Cursor, Document, FieldValues, IndexCatalog, IndexDefinition, TranscriptSnapshot,
};
pub use editor::{Selection, TranscriptEditor};
pub use element::{Bias, Element, ElementError, ElementKind, Space};
pub use error::{ScribeError, ScribeResult};
pub use event::{StrokeEvent, StrokeKind};
pub use history::{CommandGroup, EditHistory, HistoryStep};
pub use paragraph::{Paragraph, ParagraphMeta, ParagraphProperty};
pub use schema::{ElementRecord, MetaDocument, ParagraphRecord, TranscriptDocument};
pub use store::{StoreError, TranscriptStore};
pub use style::{Affix, Style, StyleSheet};
pub use synth::{StrokeOutcome, StrokeSynthesizer};
pub use tape::{StenoLayout, TapeLine, TapeWriter};
pub use workspace::{DocumentId, Workspace};

/// Scribe core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
