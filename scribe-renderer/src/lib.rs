//! # Scribe Renderer
//!
//! Line layout for transcripts: wraps paragraphs to a column width and
//! stamps each output line with the time it was written.
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐
//! │ TranscriptSnapshot   │────▶│ render_snapshot_lines│
//! └──────────────────────┘     └──────────┬───────────┘
//!                                         │
//!                              ┌──────────▼───────────┐
//!                              │ TranscriptExporter   │
//!                              │ (text / JSON)        │
//!                              └──────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod lines;

pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, TranscriptExporter};
pub use lines::{
    render_paragraph_lines, render_snapshot_lines, ParagraphLines, RenderedLine, StyleRules,
    TAB_STOP,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
