//! Transcript elements - the building blocks of paragraphs.
//!
//! Every element renders to some text and reports two lengths: its
//! character length (what the reader sees) and its unit length (how many
//! backspaces it takes to erase it). The two differ for automatic affixes,
//! whose prefix and suffix are not typed, and for atomic elements (fields,
//! images, index entries) which always count as a single unit.

use std::borrow::Cow;

use thiserror::Error;

/// Rendered text of an image element.
pub const IMAGE_PLACEHOLDER: &str = "\u{FFFC}";

/// Separator placed between an index entry's prefix and its text.
const INDEX_SEPARATOR: char = '\u{00A0}';

/// Coordinate space of a paragraph position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Space {
    /// Rendered characters.
    Chars,
    /// Backspace units.
    Units,
}

/// Direction in which an offset that cannot be cut is moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Move towards the start of the element.
    Start,
    /// Move towards the end of the element.
    End,
}

/// Errors raised when combining elements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    /// The element kind never combines.
    #[error("Combining {0} elements is not supported")]
    NotCombinable(&'static str),

    /// A word-boundary space sits at the combination point.
    #[error("Cannot combine elements across a word-boundary space")]
    SpaceBoundary,
}

/// The kind-specific part of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Plain text with no steno attribution.
    Text,

    /// Text produced by a stroke.
    Stroke {
        /// Slash-joined steno outline.
        outline: String,
        /// Media position when the stroke arrived.
        audio_time: Option<String>,
    },

    /// Text wrapped in style-driven affixes.
    Automatic {
        /// Text rendered before the inner text.
        prefix: String,
        /// Text rendered after the inner text.
        suffix: String,
    },

    /// A reference to a named user field.
    Field {
        /// Field name.
        name: String,
    },

    /// An embedded image.
    Image {
        /// Asset path.
        path: String,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// A marker registering a location in a named index.
    IndexEntry {
        /// Name of the index.
        index_name: String,
        /// Text rendered before the entry.
        prefix: String,
        /// Whether the entry is hidden from exported indices.
        hidden: bool,
        /// Free-text description.
        description: String,
    },
}

impl ElementKind {
    /// Discriminator used in persisted documents.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Stroke { .. } => "stroke",
            Self::Automatic { .. } => "automatic",
            Self::Field { .. } => "field",
            Self::Image { .. } => "image",
            Self::IndexEntry { .. } => "index",
        }
    }
}

/// One piece of paragraph content.
///
/// `data` holds the element's own text: the produced text for text and
/// stroke elements, the inner text of an automatic element, the current
/// value of a field, the placeholder glyph of an image and the entry text of
/// an index marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Kind-specific attributes.
    pub kind: ElementKind,
    /// Text payload.
    pub data: String,
    /// Creation timestamp.
    pub time: String,
}

impl Element {
    /// Create a plain text element.
    #[must_use]
    pub fn text(data: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Text,
            data: data.into(),
            time: time.into(),
        }
    }

    /// Create a stroke element.
    #[must_use]
    pub fn stroke(
        outline: impl Into<String>,
        data: impl Into<String>,
        time: impl Into<String>,
        audio_time: Option<String>,
    ) -> Self {
        Self {
            kind: ElementKind::Stroke {
                outline: outline.into(),
                audio_time,
            },
            data: data.into(),
            time: time.into(),
        }
    }

    /// Create an automatic element around `data`.
    #[must_use]
    pub fn automatic(
        prefix: impl Into<String>,
        data: impl Into<String>,
        suffix: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            kind: ElementKind::Automatic {
                prefix: prefix.into(),
                suffix: suffix.into(),
            },
            data: data.into(),
            time: time.into(),
        }
    }

    /// Create a field element showing `value`.
    ///
    /// An empty value renders as `{name}` so the field stays visible.
    #[must_use]
    pub fn field(name: impl Into<String>, value: &str, time: impl Into<String>) -> Self {
        let name = name.into();
        let data = field_display(&name, value);
        Self {
            kind: ElementKind::Field { name },
            data,
            time: time.into(),
        }
    }

    /// Create an image element.
    #[must_use]
    pub fn image(path: impl Into<String>, width: u32, height: u32, time: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Image {
                path: path.into(),
                width,
                height,
            },
            data: IMAGE_PLACEHOLDER.to_string(),
            time: time.into(),
        }
    }

    /// Create an index marker.
    #[must_use]
    pub fn index_entry(
        index_name: impl Into<String>,
        prefix: impl Into<String>,
        data: impl Into<String>,
        hidden: bool,
        description: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            kind: ElementKind::IndexEntry {
                index_name: index_name.into(),
                prefix: prefix.into(),
                hidden,
                description: description.into(),
            },
            data: data.into(),
            time: time.into(),
        }
    }

    /// Discriminator used in persisted documents.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Outline of a stroke element.
    #[must_use]
    pub fn outline(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Stroke { outline, .. } => Some(outline),
            _ => None,
        }
    }

    /// Whether the element always counts as a single unit.
    #[must_use]
    pub const fn is_atomic(&self) -> bool {
        matches!(
            self.kind,
            ElementKind::Field { .. } | ElementKind::Image { .. } | ElementKind::IndexEntry { .. }
        )
    }

    /// Whether the element may combine with a neighbour.
    #[must_use]
    pub const fn is_combinable(&self) -> bool {
        matches!(self.kind, ElementKind::Text | ElementKind::Stroke { .. })
    }

    /// Rendered text.
    #[must_use]
    pub fn render(&self) -> Cow<'_, str> {
        match &self.kind {
            ElementKind::Text
            | ElementKind::Stroke { .. }
            | ElementKind::Field { .. }
            | ElementKind::Image { .. } => Cow::Borrowed(self.data.as_str()),
            ElementKind::Automatic { prefix, suffix } => {
                Cow::Owned(format!("{prefix}{}{suffix}", self.data))
            }
            ElementKind::IndexEntry { prefix, .. } => {
                if prefix.is_empty() {
                    Cow::Borrowed(self.data.as_str())
                } else {
                    Cow::Owned(format!("{prefix}{INDEX_SEPARATOR}{}", self.data))
                }
            }
        }
    }

    /// Number of rendered characters.
    #[must_use]
    pub fn char_len(&self) -> usize {
        match &self.kind {
            ElementKind::Automatic { prefix, suffix } => {
                prefix.chars().count() + self.data.chars().count() + suffix.chars().count()
            }
            ElementKind::IndexEntry { prefix, .. } if !prefix.is_empty() => {
                prefix.chars().count() + 1 + self.data.chars().count()
            }
            _ => self.data.chars().count(),
        }
    }

    /// Number of backspace units.
    #[must_use]
    pub fn unit_len(&self) -> usize {
        match &self.kind {
            ElementKind::Text | ElementKind::Stroke { .. } | ElementKind::Automatic { .. } => {
                self.data.chars().count()
            }
            ElementKind::Field { .. } | ElementKind::Image { .. } | ElementKind::IndexEntry { .. } => {
                1
            }
        }
    }

    /// Whether the element renders nothing and can be dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.char_len() == 0
    }

    /// Map an offset inside this element from one space to another.
    ///
    /// The result is clamped to the element's length in `to`, so every
    /// rendered character of an atomic element maps to the same unit.
    #[must_use]
    pub fn rescale(&self, from: Space, to: Space, offset: usize) -> usize {
        if from == to {
            return offset;
        }
        let prefix_len = self.prefix_len();
        match to {
            Space::Units => offset.saturating_sub(prefix_len).min(self.unit_len()),
            Space::Chars => {
                if self.is_atomic() {
                    if offset == 0 {
                        0
                    } else {
                        self.char_len()
                    }
                } else {
                    (prefix_len + offset).min(self.char_len())
                }
            }
        }
    }

    /// Move `offset` to the nearest position where this element can be cut.
    ///
    /// Text and stroke elements can be cut anywhere. Atomic elements can
    /// only be cut at their edges. Automatic elements can be cut strictly
    /// inside their inner text; a cut at the inner text's edges takes the
    /// prefix or suffix with it.
    #[must_use]
    pub fn snap(&self, offset: usize, bias: Bias) -> usize {
        let len = self.char_len();
        if offset == 0 || offset >= len {
            return offset.min(len);
        }
        match &self.kind {
            ElementKind::Text | ElementKind::Stroke { .. } => offset,
            ElementKind::Field { .. } | ElementKind::Image { .. } | ElementKind::IndexEntry { .. } => {
                match bias {
                    Bias::Start => 0,
                    Bias::End => len,
                }
            }
            ElementKind::Automatic { prefix, .. } => {
                let prefix_len = prefix.chars().count();
                let inner_len = self.data.chars().count();
                if inner_len < 2 {
                    return match bias {
                        Bias::Start => 0,
                        Bias::End => len,
                    };
                }
                let first = prefix_len + 1;
                let last = prefix_len + inner_len - 1;
                match bias {
                    Bias::Start if offset < first => 0,
                    Bias::Start => offset.min(last),
                    Bias::End if offset > last => len,
                    Bias::End => offset.max(first),
                }
            }
        }
    }

    /// Split at an interior cut position produced by [`Element::snap`].
    ///
    /// Returns `None` when `offset` is not an interior cut of this element.
    /// The two halves render back to the original text and rejoin into the
    /// original element with [`Element::rejoin`].
    #[must_use]
    pub fn split_at(&self, offset: usize) -> Option<(Self, Self)> {
        if offset == 0 || offset >= self.char_len() || self.snap(offset, Bias::Start) != offset {
            return None;
        }
        match &self.kind {
            ElementKind::Text | ElementKind::Stroke { .. } => {
                let (left, right) = split_chars(&self.data, offset);
                Some((self.with_data(left), self.with_data(right)))
            }
            ElementKind::Automatic { prefix, suffix } => {
                let inner = offset - prefix.chars().count();
                let (left, right) = split_chars(&self.data, inner);
                Some((
                    Self::automatic(prefix.clone(), left, "", self.time.clone()),
                    Self::automatic("", right, suffix.clone(), self.time.clone()),
                ))
            }
            ElementKind::Field { .. } | ElementKind::Image { .. } | ElementKind::IndexEntry { .. } => {
                None
            }
        }
    }

    /// Whether `right` is the other half of a split that produced `self`.
    #[must_use]
    pub fn can_rejoin(&self, right: &Self) -> bool {
        if self.time != right.time {
            return false;
        }
        match (&self.kind, &right.kind) {
            (ElementKind::Text, ElementKind::Text) => true,
            (
                ElementKind::Stroke {
                    outline: a,
                    audio_time: at,
                },
                ElementKind::Stroke {
                    outline: b,
                    audio_time: bt,
                },
            ) => a == b && at == bt,
            (
                ElementKind::Automatic { suffix, .. },
                ElementKind::Automatic { prefix, .. },
            ) => suffix.is_empty() && prefix.is_empty(),
            _ => false,
        }
    }

    /// Undo a split, returning the original element.
    #[must_use]
    pub fn rejoin(&self, right: &Self) -> Option<Self> {
        if !self.can_rejoin(right) {
            return None;
        }
        let data = format!("{}{}", self.data, right.data);
        match (&self.kind, &right.kind) {
            (ElementKind::Automatic { prefix, .. }, ElementKind::Automatic { suffix, .. }) => Some(
                Self::automatic(prefix.clone(), data, suffix.clone(), self.time.clone()),
            ),
            _ => Some(self.with_data(data)),
        }
    }

    /// Combine with the element that follows.
    ///
    /// Only text and stroke elements combine. The result keeps this
    /// element's timestamp; stroke outlines are slash-joined.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::NotCombinable`] if either side is not text or
    /// stroke, and [`ElementError::SpaceBoundary`] if this element ends or
    /// `other` begins with a space.
    pub fn combine(&self, other: &Self) -> Result<Self, ElementError> {
        if !self.is_combinable() {
            return Err(ElementError::NotCombinable(self.kind_name()));
        }
        if !other.is_combinable() {
            return Err(ElementError::NotCombinable(other.kind_name()));
        }
        if self.data.ends_with(' ') || other.data.starts_with(' ') {
            return Err(ElementError::SpaceBoundary);
        }
        let data = format!("{}{}", self.data, other.data);
        let kind = match (&self.kind, &other.kind) {
            (
                ElementKind::Stroke {
                    outline: a,
                    audio_time,
                },
                ElementKind::Stroke {
                    outline: b,
                    audio_time: other_audio,
                },
            ) => ElementKind::Stroke {
                outline: join_outlines(a, b),
                audio_time: audio_time.clone().or_else(|| other_audio.clone()),
            },
            (stroke @ ElementKind::Stroke { .. }, ElementKind::Text)
            | (ElementKind::Text, stroke @ ElementKind::Stroke { .. }) => stroke.clone(),
            _ => ElementKind::Text,
        };
        Ok(Self {
            kind,
            data,
            time: self.time.clone(),
        })
    }

    fn with_data(&self, data: impl Into<String>) -> Self {
        Self {
            kind: self.kind.clone(),
            data: data.into(),
            time: self.time.clone(),
        }
    }

    fn prefix_len(&self) -> usize {
        match &self.kind {
            ElementKind::Automatic { prefix, .. } => prefix.chars().count(),
            _ => 0,
        }
    }
}

/// Join two outlines with a stroke separator, skipping empty sides.
#[must_use]
pub fn join_outlines(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{a}/{b}"),
    }
}

/// Display text of a field holding `value`.
#[must_use]
pub fn field_display(name: &str, value: &str) -> String {
    if value.is_empty() {
        format!("{{{name}}}")
    } else {
        value.to_string()
    }
}

/// Split a string at a character (not byte) offset.
pub(crate) fn split_chars(s: &str, offset: usize) -> (&str, &str) {
    let byte = s.char_indices().nth(offset).map_or(s.len(), |(i, _)| i);
    s.split_at(byte)
}
