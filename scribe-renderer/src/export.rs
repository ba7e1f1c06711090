//! Transcript export to line-numbered text or JSON.
//!
//! Lays a [`TranscriptSnapshot`] out with [`render_snapshot_lines`] and
//! writes the result to any [`std::io::Write`] sink.

use std::io::Write;

use scribe_core::TranscriptSnapshot;

use crate::error::RenderResult;
use crate::lines::{render_snapshot_lines, ParagraphLines};

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Plain text, one rendered line per output line.
    #[default]
    Text,
    /// Pretty JSON array of paragraphs with their lines.
    Json,
}

/// Configuration for transcript export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Maximum line width in columns (default: 60).
    pub width: usize,
    /// Prefix each line with its number.
    pub numbered: bool,
    /// Prefix each line with the time of its first element.
    pub timestamps: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 60,
            numbered: true,
            timestamps: false,
        }
    }
}

/// Exports a [`TranscriptSnapshot`] to text or JSON.
pub struct TranscriptExporter {
    config: ExportConfig,
}

impl TranscriptExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// The exporter's configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Write a snapshot to `out` in the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured width is too narrow for a
    /// paragraph style or if writing fails.
    pub fn export(
        &self,
        snapshot: &TranscriptSnapshot,
        format: ExportFormat,
        out: &mut impl Write,
    ) -> RenderResult<()> {
        let paragraphs = render_snapshot_lines(snapshot, self.config.width)?;
        match format {
            ExportFormat::Text => self.write_text(&paragraphs, out)?,
            ExportFormat::Json => {
                serde_json::to_writer_pretty(&mut *out, &paragraphs)
                    .map_err(std::io::Error::from)?;
                writeln!(out)?;
            }
        }
        tracing::info!(
            ?format,
            paragraphs = paragraphs.len(),
            "Exported transcript"
        );
        Ok(())
    }

    /// Render a snapshot to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured width is too narrow for a
    /// paragraph style.
    pub fn export_to_string(
        &self,
        snapshot: &TranscriptSnapshot,
        format: ExportFormat,
    ) -> RenderResult<String> {
        let mut buffer = Vec::new();
        self.export(snapshot, format, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn write_text(&self, paragraphs: &[ParagraphLines], out: &mut impl Write) -> RenderResult<()> {
        let digits = paragraphs
            .iter()
            .flat_map(|p| p.lines.last())
            .map(|line| line.number.to_string().len())
            .max()
            .unwrap_or(1);
        for line in paragraphs.iter().flat_map(|p| &p.lines) {
            if self.config.numbered {
                write!(out, "{:>digits$} ", line.number)?;
            }
            if self.config.timestamps {
                write!(out, "[{}] ", line.time.as_deref().unwrap_or("-"))?;
            }
            writeln!(out, "{}", line.text.trim_end())?;
        }
        Ok(())
    }
}
