//! Stroke events delivered by the steno engine.

use serde::{Deserialize, Serialize};

/// One stroke as reported by the steno engine.
///
/// The engine describes its output as "erase `backspaces` characters, then
/// type `text`". Newlines in `text` are paragraph breaks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrokeEvent {
    /// Raw outline of the stroke, e.g. `KAT` or `-G`.
    pub outline: String,
    /// Text the engine produced.
    #[serde(default)]
    pub text: String,
    /// Number of units the engine erased before typing.
    #[serde(default)]
    pub backspaces: usize,
    /// Media position when the stroke arrived, if media is playing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_time: Option<String>,
    /// Wall-clock time of the stroke; stamped on arrival when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_time: Option<String>,
}

/// What a stroke asks the editor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeKind {
    /// Nothing to erase and nothing to type.
    Empty,
    /// Type text on one line.
    Insert,
    /// Erase only.
    Delete,
    /// Erase, then type text on one line.
    Replace,
    /// Text contains paragraph breaks.
    MultiLine,
}

impl StrokeEvent {
    /// Create an event with no media position.
    #[must_use]
    pub fn new(outline: impl Into<String>, text: impl Into<String>, backspaces: usize) -> Self {
        Self {
            outline: outline.into(),
            text: text.into(),
            backspaces,
            media_time: None,
            stroke_time: None,
        }
    }

    /// Attach the media position.
    #[must_use]
    pub fn with_media_time(mut self, media_time: impl Into<String>) -> Self {
        self.media_time = Some(media_time.into());
        self
    }

    /// Attach the wall-clock time.
    #[must_use]
    pub fn with_stroke_time(mut self, stroke_time: impl Into<String>) -> Self {
        self.stroke_time = Some(stroke_time.into());
        self
    }

    /// Classify the event.
    #[must_use]
    pub fn kind(&self) -> StrokeKind {
        match (self.backspaces > 0, self.text.is_empty()) {
            _ if self.text.contains('\n') => StrokeKind::MultiLine,
            (false, true) => StrokeKind::Empty,
            (false, false) => StrokeKind::Insert,
            (true, true) => StrokeKind::Delete,
            (true, false) => StrokeKind::Replace,
        }
    }

    /// Whether the stroke is the engine's undo stroke.
    #[must_use]
    pub fn is_undo_stroke(&self) -> bool {
        self.outline == "*"
    }

    /// Number of units the produced text occupies.
    #[must_use]
    pub fn produced_units(&self) -> usize {
        self.text.chars().count()
    }
}
