//! # Scribe CLI
//!
//! Replays recorded stroke streams into transcripts and prints saved
//! transcripts as numbered lines.
//!
//! ## Usage
//!
//! ```bash
//! scribe --data-dir ./transcripts replay --events hearing.jsonl --name hearing --width 60
//! scribe --data-dir ./transcripts show --name hearing --timestamps
//! ```
//!
//! Each events line is one JSON stroke event:
//!
//! ```text
//! {"outline":"KAT","text":" cat","backspaces":0,"media_time":"00:00:03.250"}
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use scribe_core::{
    EditorConfig, StoreError, StrokeEvent, TapeWriter, TranscriptEditor, TranscriptSnapshot,
    TranscriptStore,
};
use scribe_renderer::{ExportConfig, ExportFormat, TranscriptExporter};

/// Command-line arguments for `scribe`.
#[derive(Debug, Clone, Parser)]
#[command(name = "scribe")]
#[command(about = "Stenographic transcript replay and display")]
#[command(version)]
pub struct CliArgs {
    /// Editor configuration file (JSON)
    #[arg(long, global = true, env = "SCRIBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding transcripts and tapes
    #[arg(long, global = true, env = "SCRIBE_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Feed a stroke event stream into a transcript and save it
    Replay {
        /// JSON lines file of stroke events
        #[arg(long)]
        events: PathBuf,
        /// Transcript name
        #[arg(long)]
        name: String,
        /// Print the transcript wrapped to this width afterwards
        #[arg(long)]
        width: Option<usize>,
        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print a saved transcript
    Show {
        /// Transcript name
        #[arg(long)]
        name: String,
        /// Line width
        #[arg(long, default_value = "60")]
        width: usize,
        /// Output options
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Printing options shared by subcommands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Prefix lines with the time of their first element
    #[arg(long)]
    pub timestamps: bool,
    /// Omit line numbers
    #[arg(long)]
    pub no_numbers: bool,
}

/// Printed output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Numbered text lines
    #[default]
    Text,
    /// JSON paragraphs with line spans
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
        }
    }
}

/// Run a parsed command, returning what should be printed.
///
/// # Errors
///
/// Returns an error if the configuration, events, or transcript cannot be
/// read, or if the transcript cannot be saved or rendered.
pub fn run(args: &CliArgs) -> anyhow::Result<String> {
    let config = match &args.config {
        Some(path) => EditorConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };
    let store = TranscriptStore::with_data_dir(&args.data_dir)
        .with_context(|| format!("Failed to open data dir {}", args.data_dir.display()))?;

    match &args.command {
        Command::Replay {
            events,
            name,
            width,
            output,
        } => {
            let snapshot = replay(&store, config, events, name)?;
            match width {
                Some(width) => render(&snapshot, *width, output),
                None => Ok(String::new()),
            }
        }
        Command::Show {
            name,
            width,
            output,
        } => {
            let document = store
                .load(name)
                .with_context(|| format!("Failed to load transcript '{name}'"))?;
            render(&document.snapshot(), *width, output)
        }
    }
}

/// Replay an events file into transcript `name`, saving it and its tape.
///
/// An existing transcript is continued from its end.
///
/// # Errors
///
/// Returns an error naming the offending line if an event is malformed or
/// cannot be applied.
pub fn replay(
    store: &TranscriptStore,
    config: EditorConfig,
    events: &Path,
    name: &str,
) -> anyhow::Result<TranscriptSnapshot> {
    let file = std::fs::File::open(events)
        .with_context(|| format!("Failed to open events {}", events.display()))?;
    let tape_path = store.tape_path(name)?;
    let tape = TapeWriter::open(&tape_path, config.steno_layout.clone())
        .with_context(|| format!("Failed to open tape {}", tape_path.display()))?;

    let mut editor = match store.load(name) {
        Ok(document) => {
            tracing::info!("Continuing transcript '{}'", name);
            TranscriptEditor::with_document(document, config)
        }
        Err(StoreError::NotFound(_)) => TranscriptEditor::new(config),
        Err(e) => return Err(e).context(format!("Failed to load transcript '{name}'")),
    }
    .with_tape(tape);

    let mut applied = 0usize;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let number = index + 1;
        let line = line.with_context(|| format!("Failed to read events line {number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let event: StrokeEvent = serde_json::from_str(&line)
            .with_context(|| format!("Invalid stroke event on line {number}"))?;
        editor
            .on_stroke(&event)
            .with_context(|| format!("Failed to apply stroke on line {number}"))?;
        applied += 1;
    }

    let snapshot = editor.snapshot();
    store
        .save(name, &snapshot)
        .with_context(|| format!("Failed to save transcript '{name}'"))?;
    tracing::info!(
        strokes = applied,
        paragraphs = snapshot.paragraphs.len(),
        "Replayed events into '{}'",
        name
    );
    Ok(snapshot)
}

/// Render a snapshot for printing.
///
/// # Errors
///
/// Returns an error if `width` is too narrow for a paragraph style.
pub fn render(
    snapshot: &TranscriptSnapshot,
    width: usize,
    output: &OutputArgs,
) -> anyhow::Result<String> {
    let exporter = TranscriptExporter::new(ExportConfig {
        width,
        numbered: !output.no_numbers,
        timestamps: output.timestamps,
    });
    exporter
        .export_to_string(snapshot, output.format.into())
        .context("Failed to render transcript")
}
