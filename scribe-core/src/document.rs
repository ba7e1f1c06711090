//! The transcript document: paragraphs plus the catalogs their elements
//! refer to.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::{field_display, Element, ElementKind};
use crate::error::{ScribeError, ScribeResult};
use crate::paragraph::Paragraph;
use crate::style::StyleSheet;
use crate::time;

/// User field values by field name.
pub type FieldValues = BTreeMap<String, String>;

/// One named index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    /// Text rendered before each entry of this index.
    #[serde(default)]
    pub prefix: String,
    /// Whether entries are hidden from exported indices.
    #[serde(default)]
    pub hidden: bool,
    /// Entry text to description.
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

/// Index definitions by index name.
pub type IndexCatalog = BTreeMap<String, IndexDefinition>;

/// A caret position: paragraph index and character offset within it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    /// Paragraph index.
    pub paragraph: usize,
    /// Character offset.
    pub offset: usize,
}

impl Cursor {
    /// Create a cursor.
    #[must_use]
    pub const fn new(paragraph: usize, offset: usize) -> Self {
        Self { paragraph, offset }
    }
}

/// A transcript being edited.
///
/// A document always holds at least one paragraph.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
    /// Paragraph styles.
    pub styles: StyleSheet,
    /// User field values.
    pub fields: FieldValues,
    /// Index catalog.
    pub indices: IndexCatalog,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with the default style sheet and one empty paragraph.
    #[must_use]
    pub fn new() -> Self {
        Self::with_styles(StyleSheet::default())
    }

    /// Create a document with one empty paragraph in the sheet's default style.
    #[must_use]
    pub fn with_styles(styles: StyleSheet) -> Self {
        let style = styles
            .default_style()
            .map(|s| s.name.clone())
            .unwrap_or_default();
        Self {
            paragraphs: vec![Paragraph::new(style)],
            styles,
            fields: FieldValues::new(),
            indices: IndexCatalog::new(),
        }
    }

    /// Assemble a document from loaded parts, repairing dangling references.
    #[must_use]
    pub fn from_parts(
        paragraphs: Vec<Paragraph>,
        styles: StyleSheet,
        fields: FieldValues,
        indices: IndexCatalog,
    ) -> Self {
        let mut document = Self {
            paragraphs,
            styles,
            fields,
            indices,
        };
        if document.paragraphs.is_empty() {
            document.paragraphs.push(Paragraph::new(""));
        }
        let repaired = document.normalize();
        if repaired > 0 {
            tracing::warn!("Repaired {repaired} dangling references while loading document");
        }
        document
    }

    /// All paragraphs in order.
    #[must_use]
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Number of paragraphs.
    #[must_use]
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Paragraph at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::ParagraphNotFound`] if `index` is out of range.
    pub fn paragraph(&self, index: usize) -> ScribeResult<&Paragraph> {
        self.paragraphs
            .get(index)
            .ok_or(ScribeError::ParagraphNotFound(index))
    }

    /// Mutable paragraph at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::ParagraphNotFound`] if `index` is out of range.
    pub fn paragraph_mut(&mut self, index: usize) -> ScribeResult<&mut Paragraph> {
        self.paragraphs
            .get_mut(index)
            .ok_or(ScribeError::ParagraphNotFound(index))
    }

    /// Insert a paragraph before `index` (or at the end).
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::ParagraphNotFound`] if `index` is past the end.
    pub fn insert_paragraph(&mut self, index: usize, paragraph: Paragraph) -> ScribeResult<()> {
        if index > self.paragraphs.len() {
            return Err(ScribeError::ParagraphNotFound(index));
        }
        self.paragraphs.insert(index, paragraph);
        Ok(())
    }

    /// Remove the paragraph at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::ParagraphNotFound`] if `index` is out of range
    /// and [`ScribeError::InvalidOperation`] for the last remaining paragraph.
    pub fn remove_paragraph(&mut self, index: usize) -> ScribeResult<Paragraph> {
        if index >= self.paragraphs.len() {
            return Err(ScribeError::ParagraphNotFound(index));
        }
        if self.paragraphs.len() == 1 {
            return Err(ScribeError::InvalidOperation(
                "a document keeps at least one paragraph".into(),
            ));
        }
        Ok(self.paragraphs.remove(index))
    }

    /// Paragraph texts joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Move `cursor` onto the nearest position inside the document.
    #[must_use]
    pub fn clamp_cursor(&self, cursor: Cursor) -> Cursor {
        let paragraph = cursor.paragraph.min(self.paragraphs.len().saturating_sub(1));
        let length = self.paragraphs.get(paragraph).map_or(0, Paragraph::char_len);
        Cursor::new(paragraph, cursor.offset.min(length))
    }

    /// Backspace units between the start of the document and `cursor`.
    ///
    /// Each paragraph break counts as one unit. A `paragraph_end` marker
    /// closing an earlier paragraph belongs to its break and adds nothing.
    #[must_use]
    pub fn units_before(&self, cursor: Cursor, paragraph_end: Option<&str>) -> usize {
        let cursor = self.clamp_cursor(cursor);
        let preceding: usize = self.paragraphs[..cursor.paragraph]
            .iter()
            .map(|p| {
                let marker = p
                    .elements
                    .elements()
                    .last()
                    .filter(|e| {
                        e.kind == ElementKind::Text && Some(e.data.as_str()) == paragraph_end
                    })
                    .map_or(0, Element::unit_len);
                p.elements.unit_len() - marker + 1
            })
            .sum();
        preceding + self.paragraphs[cursor.paragraph].elements.char_to_unit(cursor.offset)
    }

    /// Name of the style used when a paragraph has none or an unknown one.
    #[must_use]
    pub fn default_style_name(&self) -> String {
        self.styles
            .default_style()
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Catalog propagation
    // -----------------------------------------------------------------------

    /// Re-render every field element from the current field values.
    ///
    /// Returns the number of elements whose text changed.
    pub fn rerender_fields(&mut self) -> usize {
        let fields = &self.fields;
        self.paragraphs
            .iter_mut()
            .map(|p| {
                p.elements.update_each(|element| {
                    let ElementKind::Field { name } = &element.kind else {
                        return false;
                    };
                    let value = fields.get(name).map(String::as_str).unwrap_or_default();
                    let display = field_display(name, value);
                    if element.data == display {
                        false
                    } else {
                        element.data = display;
                        true
                    }
                })
            })
            .sum()
    }

    /// Re-render every entry of index `name` from its catalog definition.
    ///
    /// Returns the number of elements that changed.
    pub fn rerender_index(&mut self, name: &str) -> usize {
        let Some(definition) = self.indices.get(name).cloned() else {
            return 0;
        };
        self.paragraphs
            .iter_mut()
            .map(|p| {
                p.elements.update_each(|element| {
                    let ElementKind::IndexEntry {
                        index_name,
                        prefix,
                        hidden,
                        description,
                    } = &mut element.kind
                    else {
                        return false;
                    };
                    if index_name.as_str() != name {
                        return false;
                    }
                    let new_description = definition
                        .entries
                        .get(&element.data)
                        .unwrap_or(&*description)
                        .clone();
                    let changed = *prefix != definition.prefix
                        || *hidden != definition.hidden
                        || *description != new_description;
                    prefix.clone_from(&definition.prefix);
                    *hidden = definition.hidden;
                    *description = new_description;
                    changed
                })
            })
            .sum()
    }

    /// Repair references that point at nothing.
    ///
    /// Unknown styles fall back to the default style, missing fields are
    /// registered with the text their elements show, and unknown index
    /// entries are registered from the element's own attributes. Returns
    /// the number of repairs.
    pub fn normalize(&mut self) -> usize {
        let default_style = self.default_style_name();
        let mut repairs = 0;
        for (number, paragraph) in self.paragraphs.iter_mut().enumerate() {
            let style = &paragraph.meta.style;
            if !style.is_empty() && !self.styles.contains(style) {
                tracing::warn!(paragraph = number, style = %style, "Unknown style, using {default_style}");
                paragraph.meta.style.clone_from(&default_style);
                repairs += 1;
            }
            for element in paragraph.elements.elements() {
                match &element.kind {
                    ElementKind::Field { name } if !self.fields.contains_key(name) => {
                        let value = if element.data == field_display(name, "") {
                            String::new()
                        } else {
                            element.data.clone()
                        };
                        tracing::warn!(field = %name, "Registering unknown field");
                        self.fields.insert(name.clone(), value);
                        repairs += 1;
                    }
                    ElementKind::IndexEntry {
                        index_name,
                        prefix,
                        hidden,
                        description,
                    } => {
                        let definition =
                            self.indices.entry(index_name.clone()).or_insert_with(|| {
                                tracing::warn!(index = %index_name, "Registering unknown index");
                                repairs += 1;
                                IndexDefinition {
                                    prefix: prefix.clone(),
                                    hidden: *hidden,
                                    entries: BTreeMap::new(),
                                }
                            });
                        if !definition.entries.contains_key(&element.data) {
                            definition
                                .entries
                                .insert(element.data.clone(), description.clone());
                            repairs += 1;
                        }
                    }
                    _ => {}
                }
            }
        }
        repairs
    }

    /// Deep copy of the current content for export.
    #[must_use]
    pub fn snapshot(&self) -> TranscriptSnapshot {
        TranscriptSnapshot {
            paragraphs: self.paragraphs.clone(),
            styles: self.styles.clone(),
            fields: self.fields.clone(),
            indices: self.indices.clone(),
            taken_at: time::now(),
        }
    }
}

/// A finalized, detached copy of a document.
///
/// Snapshots own all their data, so export can run on another thread while
/// editing continues.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptSnapshot {
    /// Paragraphs in order.
    pub paragraphs: Vec<Paragraph>,
    /// Paragraph styles.
    pub styles: StyleSheet,
    /// User field values.
    pub fields: FieldValues,
    /// Index catalog.
    pub indices: IndexCatalog,
    /// When the snapshot was taken.
    pub taken_at: String,
}

impl TranscriptSnapshot {
    /// Paragraph texts joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rebuild an editable document from the snapshot.
    #[must_use]
    pub fn into_document(self) -> Document {
        Document::from_parts(self.paragraphs, self.styles, self.fields, self.indices)
    }
}
