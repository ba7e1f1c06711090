//! Paragraphs: one element collection plus metadata.

use crate::collection::ElementCollection;
use crate::time;

/// Metadata tracked alongside a paragraph's content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParagraphMeta {
    /// Style name; empty until a style is assigned.
    pub style: String,
    /// When the paragraph was created.
    pub creation_time: String,
    /// When the paragraph's content last changed.
    pub edit_time: String,
    /// Media position where the paragraph starts.
    pub audio_start: Option<String>,
    /// Media position where the paragraph ends.
    pub audio_end: Option<String>,
    /// Free-text note.
    pub notes: String,
}

/// A single editable property of a paragraph.
///
/// Applying a property returns the value it replaced, so the same type
/// serves as the undo payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParagraphProperty {
    /// Free-text note.
    Notes(String),
    /// Media start position.
    AudioStart(Option<String>),
    /// Media end position.
    AudioEnd(Option<String>),
}

/// One paragraph of a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Metadata.
    pub meta: ParagraphMeta,
    /// Content.
    pub elements: ElementCollection,
}

impl Paragraph {
    /// Create an empty paragraph with the given style, stamped now.
    #[must_use]
    pub fn new(style: impl Into<String>) -> Self {
        let now = time::now();
        Self {
            meta: ParagraphMeta {
                style: style.into(),
                creation_time: now.clone(),
                edit_time: now,
                ..ParagraphMeta::default()
            },
            elements: ElementCollection::new(),
        }
    }

    /// Create a paragraph from existing parts.
    #[must_use]
    pub fn from_parts(meta: ParagraphMeta, elements: ElementCollection) -> Self {
        Self { meta, elements }
    }

    /// Displayed text.
    #[must_use]
    pub fn text(&self) -> String {
        self.elements.render()
    }

    /// Character length of the displayed text.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.elements.char_len()
    }

    /// Record an edit now.
    pub fn touch(&mut self) {
        self.meta.edit_time = time::now();
    }

    /// Apply a property, returning the value it replaced.
    pub fn swap_property(&mut self, property: ParagraphProperty) -> ParagraphProperty {
        match property {
            ParagraphProperty::Notes(notes) => {
                ParagraphProperty::Notes(std::mem::replace(&mut self.meta.notes, notes))
            }
            ParagraphProperty::AudioStart(value) => {
                ParagraphProperty::AudioStart(std::mem::replace(&mut self.meta.audio_start, value))
            }
            ParagraphProperty::AudioEnd(value) => {
                ParagraphProperty::AudioEnd(std::mem::replace(&mut self.meta.audio_end, value))
            }
        }
    }
}
