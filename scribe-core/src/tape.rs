//! Stroke tape log.
//!
//! Each incoming stroke appends one line:
//!
//! ```text
//! <strokeTimestamp>|<audioTimestamp>|(<paragraph>,<charOffset>)|<grid>
//! ```
//!
//! The grid shows every key of the steno layout in order, with released
//! keys as spaces, so strokes line up in columns.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScribeResult;

const ENGLISH_KEYS: [&str; 23] = [
    "#", "S-", "T-", "K-", "P-", "W-", "H-", "R-", "A-", "O-", "*", "-E", "-U", "-F", "-R", "-P",
    "-B", "-L", "-G", "-T", "-S", "-D", "-Z",
];

const ENGLISH_NUMBERS: [(&str, &str); 10] = [
    ("1", "S-"),
    ("2", "T-"),
    ("3", "P-"),
    ("4", "H-"),
    ("5", "A-"),
    ("0", "O-"),
    ("6", "-F"),
    ("7", "-P"),
    ("8", "-L"),
    ("9", "-T"),
];

/// Key order of a steno keyboard.
///
/// Left-bank keys end with `-`, right-bank keys start with `-`. Keys
/// without a hyphen (`#`, `*`) sit between banks or before them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StenoLayout {
    /// Keys in steno order.
    pub keys: Vec<String>,
    /// Digits typed with the number bar and the key each stands for.
    #[serde(default)]
    pub numbers: BTreeMap<String, String>,
}

impl Default for StenoLayout {
    fn default() -> Self {
        Self::english()
    }
}

impl StenoLayout {
    /// Standard English stenotype.
    #[must_use]
    pub fn english() -> Self {
        Self {
            keys: ENGLISH_KEYS.iter().map(ToString::to_string).collect(),
            numbers: ENGLISH_NUMBERS
                .iter()
                .map(|(digit, key)| ((*digit).to_string(), (*key).to_string()))
                .collect(),
        }
    }

    /// Which keys of the layout a raw outline presses.
    ///
    /// Multi-stroke outlines report their last stroke. Characters that do
    /// not fit the layout are skipped.
    #[must_use]
    pub fn pressed(&self, outline: &str) -> Vec<bool> {
        let mut pressed = vec![false; self.keys.len()];
        let stroke = outline.rsplit('/').next().unwrap_or_default();
        let right_bank = self
            .keys
            .iter()
            .position(|k| k.starts_with('-'))
            .unwrap_or(self.keys.len());
        let number_key = self.keys.iter().position(|k| k == "#");

        let mut cursor = 0;
        for c in stroke.chars() {
            if c == '-' {
                cursor = cursor.max(right_bank);
                continue;
            }
            let mut buf = [0; 4];
            let digit: &str = c.encode_utf8(&mut buf);
            let found = match self.numbers.get(digit) {
                Some(key) => {
                    if let Some(bar) = number_key {
                        pressed[bar] = true;
                    }
                    self.keys.iter().position(|k| k == key)
                }
                None => {
                    let c = c.to_ascii_uppercase();
                    self.keys
                        .iter()
                        .skip(cursor)
                        .position(|k| key_letter(k) == Some(c))
                        .map(|i| i + cursor)
                }
            };
            match found {
                Some(index) => {
                    pressed[index] = true;
                    cursor = cursor.max(index + 1);
                }
                None => tracing::debug!(outline, key = %c, "Key not in steno layout"),
            }
        }
        pressed
    }

    /// Fixed-width key grid for a raw outline.
    #[must_use]
    pub fn grid(&self, outline: &str) -> String {
        self.keys
            .iter()
            .zip(self.pressed(outline))
            .map(|(key, down)| {
                if down {
                    key_letter(key).unwrap_or(' ')
                } else {
                    ' '
                }
            })
            .collect()
    }
}

/// The letter printed for a key, without its bank hyphen.
fn key_letter(key: &str) -> Option<char> {
    key.chars().find(|&c| c != '-')
}

/// One line of the tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeLine {
    /// When the stroke arrived.
    pub stroke_time: String,
    /// Media position when the stroke arrived.
    pub audio_time: Option<String>,
    /// Paragraph holding the cursor after the stroke.
    pub paragraph: usize,
    /// Character offset of the cursor after the stroke.
    pub offset: usize,
    /// Key grid.
    pub grid: String,
}

impl fmt::Display for TapeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|({},{})|{}",
            self.stroke_time,
            self.audio_time.as_deref().unwrap_or_default(),
            self.paragraph,
            self.offset,
            self.grid
        )
    }
}

/// Appends tape lines to a sink, flushing after every stroke.
pub struct TapeWriter {
    sink: Box<dyn Write + Send>,
    layout: StenoLayout,
}

impl fmt::Debug for TapeWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapeWriter")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl TapeWriter {
    /// Open (or create) a tape file for appending.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScribeError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, layout: StenoLayout) -> ScribeResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing::info!("Writing tape to {}", path.display());
        Ok(Self::from_writer(BufWriter::new(file), layout))
    }

    /// Write tape lines to an arbitrary sink.
    #[must_use]
    pub fn from_writer(sink: impl Write + Send + 'static, layout: StenoLayout) -> Self {
        Self {
            sink: Box::new(sink),
            layout,
        }
    }

    /// The layout used for grids.
    #[must_use]
    pub fn layout(&self) -> &StenoLayout {
        &self.layout
    }

    /// Build the line for a stroke.
    #[must_use]
    pub fn line_for(
        &self,
        outline: &str,
        stroke_time: String,
        audio_time: Option<String>,
        paragraph: usize,
        offset: usize,
    ) -> TapeLine {
        TapeLine {
            stroke_time,
            audio_time,
            paragraph,
            offset,
            grid: self.layout.grid(outline),
        }
    }

    /// Append one line.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScribeError::Io`] if writing or flushing fails.
    pub fn record(&mut self, line: &TapeLine) -> ScribeResult<()> {
        writeln!(self.sink, "{line}")?;
        self.sink.flush()?;
        Ok(())
    }
}
