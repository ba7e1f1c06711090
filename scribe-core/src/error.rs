//! Error types for transcript operations.

use thiserror::Error;

use crate::element::ElementError;

/// Result type for transcript operations.
pub type ScribeResult<T> = Result<T, ScribeError>;

/// Errors that can occur while editing a transcript.
#[derive(Debug, Error)]
pub enum ScribeError {
    /// Paragraph index outside the document.
    #[error("Paragraph not found: {0}")]
    ParagraphNotFound(usize),

    /// Character offset outside the paragraph.
    #[error("Offset {offset} out of range for paragraph {paragraph} (length {length})")]
    OffsetOutOfRange {
        /// Paragraph index.
        paragraph: usize,
        /// Requested character offset.
        offset: usize,
        /// Character length of the paragraph.
        length: usize,
    },

    /// Selection spans more than one paragraph.
    #[error("{0}")]
    CrossParagraph(String),

    /// Element combination refused.
    #[error(transparent)]
    Element(#[from] ElementError),

    /// Style name not present in the style sheet.
    #[error("Style not found: {0}")]
    StyleNotFound(String),

    /// Invalid operation on the document.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Tape or configuration file I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScribeError {
    /// Build the error reported for selections crossing a paragraph break.
    #[must_use]
    pub fn cross_paragraph(action: &str) -> Self {
        Self::CrossParagraph(format!(
            "Cannot {action} across paragraphs; select text within a single paragraph"
        ))
    }
}
