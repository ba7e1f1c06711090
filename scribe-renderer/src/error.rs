//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while laying out or exporting lines.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The line width leaves no room after the indent.
    #[error("Line width {width} leaves no room after an indent of {indent}")]
    InvalidWidth {
        /// Requested maximum width.
        width: usize,
        /// Largest indent of the paragraph style.
        indent: usize,
    },

    /// Writing exported lines failed.
    #[error("Export failed: {0}")]
    Io(#[from] std::io::Error),
}
