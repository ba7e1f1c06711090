//! Invertible edit commands.
//!
//! Every change to a document goes through an [`EditCommand`]. Applying a
//! command captures exactly the state it needs to put the document back, and
//! reverting consumes that state, so `apply` followed by `revert` leaves the
//! document structurally identical: same elements, same boundaries, same
//! metadata.
//!
//! Commands receive their configuration when they are built; nothing is read
//! from global settings while applying.

use crate::collection::{ElementCollection, ElementSlice, Insertion, Removal};
use crate::config::SpacePlacement;
use crate::document::{Cursor, Document, FieldValues, IndexDefinition};
use crate::element::{Element, ElementKind};
use crate::error::{ScribeError, ScribeResult};
use crate::paragraph::{Paragraph, ParagraphMeta, ParagraphProperty};
use crate::style::Style;
use crate::time;

/// What applying a command did, in terms callers use to move the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Elements were inserted.
    Inserted(Insertion),
    /// Characters `start..end` (after boundary snapping) were removed.
    Removed {
        /// First removed character.
        start: usize,
        /// One past the last removed character.
        end: usize,
    },
    /// A paragraph was split; `paragraph` is the index of the new second half.
    Split {
        /// Index of the new paragraph.
        paragraph: usize,
    },
    /// The following paragraph was merged into `paragraph`.
    Merged {
        /// Index of the surviving paragraph.
        paragraph: usize,
        /// Character offset where the merged-in text begins.
        join: usize,
    },
    /// Metadata or catalogs changed.
    Updated,
}

fn check_offset(paragraph: usize, offset: usize, target: &Paragraph) -> ScribeResult<()> {
    let length = target.char_len();
    if offset > length {
        return Err(ScribeError::OffsetOutOfRange {
            paragraph,
            offset,
            length,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Insert / remove
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct InsertUndo {
    insertion: Insertion,
    edit_time: String,
    style: Option<String>,
}

/// Insert elements at a character offset.
///
/// An unstyled paragraph receives the configured default style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertText {
    paragraph: usize,
    position: usize,
    slice: ElementSlice,
    default_style: String,
    undo: Option<InsertUndo>,
}

impl InsertText {
    /// Build an insert of `elements` at `position` in `paragraph`.
    #[must_use]
    pub fn new(
        paragraph: usize,
        position: usize,
        elements: impl Into<ElementSlice>,
        default_style: impl Into<String>,
    ) -> Self {
        let mut slice = elements.into();
        slice.cut_start = false;
        slice.cut_end = false;
        Self {
            paragraph,
            position,
            slice,
            default_style: default_style.into(),
            undo: None,
        }
    }

    fn apply(&mut self, document: &mut Document) -> ScribeResult<CommandOutcome> {
        let target = document.paragraph_mut(self.paragraph)?;
        check_offset(self.paragraph, self.position, target)?;
        let edit_time = target.meta.edit_time.clone();
        let insertion = target
            .elements
            .insert(self.position, std::mem::take(&mut self.slice));
        target.touch();
        let style = target
            .meta
            .style
            .is_empty()
            .then(|| std::mem::replace(&mut target.meta.style, self.default_style.clone()));
        self.undo = Some(InsertUndo {
            insertion,
            edit_time,
            style,
        });
        Ok(CommandOutcome::Inserted(insertion))
    }

    fn revert(&mut self, document: &mut Document) -> ScribeResult<()> {
        let Some(undo) = self.undo.take() else {
            return Ok(());
        };
        let target = document.paragraph_mut(self.paragraph)?;
        let removal = target
            .elements
            .remove(undo.insertion.start, undo.insertion.end);
        if undo.insertion.split {
            target.elements.heal(undo.insertion.start);
        }
        self.slice = removal.slice;
        target.meta.edit_time = undo.edit_time;
        if let Some(style) = undo.style {
            target.meta.style = style;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RemoveUndo {
    removal: Removal,
    edit_time: String,
}

/// Remove the characters `start..end` of a paragraph.
///
/// The range widens to whole atomic elements and whole affixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveText {
    paragraph: usize,
    start: usize,
    end: usize,
    undo: Option<RemoveUndo>,
}

impl RemoveText {
    /// Build a removal of `start..end` in `paragraph`.
    #[must_use]
    pub fn new(paragraph: usize, start: usize, end: usize) -> Self {
        Self {
            paragraph,
            start,
            end,
            undo: None,
        }
    }

    fn apply(&mut self, document: &mut Document) -> ScribeResult<CommandOutcome> {
        let target = document.paragraph_mut(self.paragraph)?;
        check_offset(self.paragraph, self.end, target)?;
        check_offset(self.paragraph, self.start, target)?;
        let edit_time = target.meta.edit_time.clone();
        let removal = target.elements.remove(self.start, self.end);
        target.touch();
        let outcome = CommandOutcome::Removed {
            start: removal.start,
            end: removal.start + removal.slice.char_len(),
        };
        self.undo = Some(RemoveUndo { removal, edit_time });
        Ok(outcome)
    }

    fn revert(&mut self, document: &mut Document) -> ScribeResult<()> {
        let Some(undo) = self.undo.take() else {
            return Ok(());
        };
        let target = document.paragraph_mut(self.paragraph)?;
        target
            .elements
            .insert(undo.removal.start, undo.removal.slice);
        target.meta.edit_time = undo.edit_time;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Split / merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
struct SplitUndo {
    meta: ParagraphMeta,
    kept: usize,
    tail: Vec<Element>,
}

/// Break a paragraph in two at a character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitParagraph {
    paragraph: usize,
    position: usize,
    new_style: Option<String>,
    media_time: Option<String>,
    space_placement: SpacePlacement,
    paragraph_end: Option<String>,
    undo: Option<SplitUndo>,
}

impl SplitParagraph {
    /// Build a split of `paragraph` at `position`.
    ///
    /// The new paragraph inherits the old one's style unless `new_style` is
    /// given.
    #[must_use]
    pub fn new(paragraph: usize, position: usize, new_style: Option<String>) -> Self {
        Self {
            paragraph,
            position,
            new_style,
            media_time: None,
            space_placement: SpacePlacement::default(),
            paragraph_end: None,
            undo: None,
        }
    }

    /// Record the media position at the break as the first paragraph's end
    /// and the second paragraph's start.
    #[must_use]
    pub fn with_media_time(mut self, media_time: Option<String>) -> Self {
        self.media_time = media_time;
        self
    }

    /// Choose which side of the break loses its boundary space.
    #[must_use]
    pub fn with_space_placement(mut self, placement: SpacePlacement) -> Self {
        self.space_placement = placement;
        self
    }

    /// Append `marker` to the first paragraph.
    #[must_use]
    pub fn with_paragraph_end(mut self, marker: Option<String>) -> Self {
        self.paragraph_end = marker;
        self
    }

    fn apply(&mut self, document: &mut Document) -> ScribeResult<CommandOutcome> {
        let first = document.paragraph_mut(self.paragraph)?;
        check_offset(self.paragraph, self.position, first)?;
        let meta = first.meta.clone();

        let (mut tail, split) = first.elements.split_off(self.position);
        let mut kept = first.elements.element_count() - usize::from(split);
        let mut original_tail = Vec::with_capacity(tail.element_count() + 1);
        let mut rest = tail.elements();
        if split {
            if let (Some(left), Some(right)) = (first.elements.elements().last(), rest.first()) {
                if let Some(seam) = left.rejoin(right) {
                    original_tail.push(seam);
                    rest = &rest[1..];
                } else {
                    original_tail.push(left.clone());
                }
            }
        }
        original_tail.extend(rest.iter().cloned());

        match self.space_placement {
            SpacePlacement::Before => trim_leading_space(&mut tail),
            SpacePlacement::After => {
                if let Some(untrimmed) = trim_trailing_space(&mut first.elements) {
                    if !split {
                        kept -= 1;
                        original_tail.insert(0, untrimmed);
                    }
                }
            }
        }
        if let Some(marker) = &self.paragraph_end {
            first.elements.push(Element::text(marker.clone(), time::now()));
        }

        let now = time::now();
        let mut second_meta = ParagraphMeta {
            style: self.new_style.clone().unwrap_or_else(|| meta.style.clone()),
            creation_time: now.clone(),
            edit_time: now,
            audio_start: None,
            audio_end: first.meta.audio_end.take(),
            notes: String::new(),
        };
        if let Some(media_time) = &self.media_time {
            first.meta.audio_end = Some(media_time.clone());
            second_meta.audio_start = Some(media_time.clone());
        }

        document.insert_paragraph(self.paragraph + 1, Paragraph::from_parts(second_meta, tail))?;
        self.undo = Some(SplitUndo {
            meta,
            kept,
            tail: original_tail,
        });
        Ok(CommandOutcome::Split {
            paragraph: self.paragraph + 1,
        })
    }

    fn revert(&mut self, document: &mut Document) -> ScribeResult<()> {
        let Some(undo) = self.undo.take() else {
            return Ok(());
        };
        document.remove_paragraph(self.paragraph + 1)?;
        let first = document.paragraph_mut(self.paragraph)?;
        first.elements.truncate(undo.kept);
        first.elements.extend(undo.tail);
        first.meta = undo.meta;
        Ok(())
    }
}

/// Drop one leading space from the first element if it is plain or stroke text.
fn trim_leading_space(elements: &mut ElementCollection) {
    let Some(first) = elements.get(0) else {
        return;
    };
    if !first.is_combinable() {
        return;
    }
    let Some(rest) = first.data.strip_prefix(' ') else {
        return;
    };
    if rest.is_empty() {
        elements.pop_front();
    } else {
        let mut trimmed = first.clone();
        trimmed.data = rest.to_string();
        elements.replace(0, trimmed);
    }
}

/// Drop one trailing space from the last element if it is plain or stroke text.
///
/// Returns the element as it was before trimming.
fn trim_trailing_space(elements: &mut ElementCollection) -> Option<Element> {
    let index = elements.element_count().checked_sub(1)?;
    let last = elements.get(index)?;
    if !last.is_combinable() {
        return None;
    }
    let rest = last.data.strip_suffix(' ')?;
    if rest.is_empty() {
        elements.pop()
    } else {
        let mut trimmed = last.clone();
        trimmed.data = rest.to_string();
        elements.replace(index, trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MergeUndo {
    meta: ParagraphMeta,
    second_meta: ParagraphMeta,
    base: usize,
    stripped: Vec<Element>,
    second_head: Option<(Element, bool)>,
    join: usize,
}

/// Join a paragraph with the one that follows it.
///
/// The first paragraph loses its paragraph-end marker and the suffix of a
/// trailing automatic element; the second loses the prefix of a leading
/// automatic element. The first paragraph takes over the second's media end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeParagraphs {
    paragraph: usize,
    join_space: bool,
    paragraph_end: Option<String>,
    undo: Option<MergeUndo>,
}

impl MergeParagraphs {
    /// Build a merge of `paragraph` with `paragraph + 1`.
    #[must_use]
    pub fn new(paragraph: usize) -> Self {
        Self {
            paragraph,
            join_space: false,
            paragraph_end: None,
            undo: None,
        }
    }

    /// Insert a space at the join when neither side has one.
    #[must_use]
    pub fn with_join_space(mut self, join_space: bool) -> Self {
        self.join_space = join_space;
        self
    }

    /// Strip `marker` from the end of the first paragraph.
    #[must_use]
    pub fn with_paragraph_end(mut self, marker: Option<String>) -> Self {
        self.paragraph_end = marker;
        self
    }

    fn apply(&mut self, document: &mut Document) -> ScribeResult<CommandOutcome> {
        if self.paragraph + 1 >= document.paragraph_count() {
            return Err(ScribeError::InvalidOperation(format!(
                "paragraph {} has no following paragraph to merge",
                self.paragraph
            )));
        }
        let Paragraph {
            meta: second_meta,
            elements: mut second,
        } = document.remove_paragraph(self.paragraph + 1)?;
        let second_head = strip_leading_affix(&mut second);

        let first = document.paragraph_mut(self.paragraph)?;
        let meta = first.meta.clone();
        let mut stripped = Vec::new();
        if let Some(marker) = &self.paragraph_end {
            let is_marker = first
                .elements
                .elements()
                .last()
                .is_some_and(|e| e.kind == ElementKind::Text && &e.data == marker);
            if is_marker {
                stripped.extend(first.elements.pop());
            }
        }
        let replacement = first.elements.elements().last().and_then(|last| match &last.kind {
            ElementKind::Automatic { prefix, suffix } if !suffix.is_empty() => Some(
                Element::automatic(prefix.clone(), last.data.clone(), "", last.time.clone()),
            ),
            _ => None,
        });
        if replacement.is_some() {
            stripped.extend(first.elements.pop());
        }
        stripped.reverse();
        let base = first.elements.element_count();
        if let Some(element) = replacement.filter(|e| !e.is_empty()) {
            first.elements.push(element);
        }

        let first_text = first.text();
        let second_text = second.render();
        let spaced = self.join_space
            && !first_text.is_empty()
            && !second_text.is_empty()
            && !first_text.ends_with(char::is_whitespace)
            && !second_text.starts_with(char::is_whitespace);
        if spaced {
            first.elements.push(Element::text(" ", time::now()));
        }
        let join = first.elements.char_len();
        let seam_combinable = first
            .elements
            .elements()
            .last()
            .is_some_and(Element::is_combinable);
        first.elements.extend(second.truncate(0));
        if !spaced && seam_combinable {
            first.elements.heal(join);
        }
        if first.meta.audio_end != second_meta.audio_end {
            first.meta.audio_end.clone_from(&second_meta.audio_end);
        }

        self.undo = Some(MergeUndo {
            meta,
            second_meta,
            base,
            stripped,
            second_head,
            join,
        });
        Ok(CommandOutcome::Merged {
            paragraph: self.paragraph,
            join,
        })
    }

    fn revert(&mut self, document: &mut Document) -> ScribeResult<()> {
        let Some(undo) = self.undo.take() else {
            return Ok(());
        };
        let first = document.paragraph_mut(self.paragraph)?;
        let (mut tail, _) = first.elements.split_off(undo.join);
        if let Some((original, replaced)) = undo.second_head {
            if replaced {
                tail.pop_front();
            }
            tail.push_front(original);
        }
        first.elements.truncate(undo.base);
        first.elements.extend(undo.stripped);
        first.meta = undo.meta;
        document.insert_paragraph(
            self.paragraph + 1,
            Paragraph::from_parts(undo.second_meta, tail),
        )
    }
}

/// Remove the prefix of a leading automatic element.
///
/// Returns the original element and whether a prefix-less copy took its place.
fn strip_leading_affix(elements: &mut ElementCollection) -> Option<(Element, bool)> {
    let head = elements.get(0)?;
    let ElementKind::Automatic { prefix, suffix } = &head.kind else {
        return None;
    };
    if prefix.is_empty() {
        return None;
    }
    let original = head.clone();
    let stripped = Element::automatic("", head.data.clone(), suffix.clone(), head.time.clone());
    if stripped.is_empty() {
        elements.pop_front();
        Some((original, false))
    } else {
        elements.replace(0, stripped);
        Some((original, true))
    }
}

// ---------------------------------------------------------------------------
// Metadata and catalogs
// ---------------------------------------------------------------------------

/// Change a paragraph's style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetStyle {
    paragraph: usize,
    style: String,
    previous: Option<String>,
}

impl SetStyle {
    /// Build a style change.
    #[must_use]
    pub fn new(paragraph: usize, style: impl Into<String>) -> Self {
        Self {
            paragraph,
            style: style.into(),
            previous: None,
        }
    }
}

/// Change one paragraph property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetProperty {
    paragraph: usize,
    property: ParagraphProperty,
    previous: Option<ParagraphProperty>,
}

impl SetProperty {
    /// Build a property change.
    #[must_use]
    pub fn new(paragraph: usize, property: ParagraphProperty) -> Self {
        Self {
            paragraph,
            property,
            previous: None,
        }
    }
}

/// Add or replace a style definition.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStyleDefinition {
    style: Style,
    previous: Option<Option<Style>>,
}

impl UpdateStyleDefinition {
    /// Build a style definition update.
    #[must_use]
    pub fn new(style: Style) -> Self {
        Self {
            style,
            previous: None,
        }
    }
}

/// Replace the field values and re-render every field element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFieldValues {
    values: FieldValues,
    previous: Option<FieldValues>,
}

impl UpdateFieldValues {
    /// Build a field value update.
    #[must_use]
    pub fn new(values: FieldValues) -> Self {
        Self {
            values,
            previous: None,
        }
    }
}

/// Add or replace an index definition and re-render its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIndexEntries {
    index_name: String,
    definition: IndexDefinition,
    previous: Option<Option<IndexDefinition>>,
    entries: Vec<(usize, usize, Element)>,
}

impl UpdateIndexEntries {
    /// Build an index update.
    #[must_use]
    pub fn new(index_name: impl Into<String>, definition: IndexDefinition) -> Self {
        Self {
            index_name: index_name.into(),
            definition,
            previous: None,
            entries: Vec::new(),
        }
    }

    /// Every entry element of this index with its paragraph and position.
    fn capture_entries(&self, document: &Document) -> Vec<(usize, usize, Element)> {
        let mut entries = Vec::new();
        for (p, paragraph) in document.paragraphs().iter().enumerate() {
            for (i, element) in paragraph.elements.elements().iter().enumerate() {
                let ElementKind::IndexEntry { index_name, .. } = &element.kind else {
                    continue;
                };
                if *index_name == self.index_name {
                    entries.push((p, i, element.clone()));
                }
            }
        }
        entries
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Any edit the history can record.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// Insert elements.
    Insert(InsertText),
    /// Remove a character range.
    Remove(RemoveText),
    /// Split a paragraph.
    Split(SplitParagraph),
    /// Merge two paragraphs.
    Merge(MergeParagraphs),
    /// Change a paragraph's style.
    SetStyle(SetStyle),
    /// Change a paragraph property.
    SetProperty(SetProperty),
    /// Add or replace a style definition.
    UpdateStyle(UpdateStyleDefinition),
    /// Replace field values.
    UpdateFields(UpdateFieldValues),
    /// Add or replace an index definition.
    UpdateIndex(UpdateIndexEntries),
}

impl EditCommand {
    /// Short description used in logs and undo labels.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Remove(_) => "remove",
            Self::Split(_) => "split paragraph",
            Self::Merge(_) => "merge paragraphs",
            Self::SetStyle(_) => "set style",
            Self::SetProperty(_) => "set property",
            Self::UpdateStyle(_) => "update style",
            Self::UpdateFields(_) => "update fields",
            Self::UpdateIndex(_) => "update index",
        }
    }

    /// Apply the command, capturing what `revert` needs.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::ParagraphNotFound`] or
    /// [`ScribeError::OffsetOutOfRange`] for targets outside the document and
    /// [`ScribeError::InvalidOperation`] when merging the last paragraph. A
    /// failed command leaves the document untouched.
    pub fn apply(&mut self, document: &mut Document) -> ScribeResult<CommandOutcome> {
        match self {
            Self::Insert(cmd) => cmd.apply(document),
            Self::Remove(cmd) => cmd.apply(document),
            Self::Split(cmd) => cmd.apply(document),
            Self::Merge(cmd) => cmd.apply(document),
            Self::SetStyle(cmd) => {
                let target = document.paragraph_mut(cmd.paragraph)?;
                cmd.previous = Some(std::mem::replace(
                    &mut target.meta.style,
                    cmd.style.clone(),
                ));
                Ok(CommandOutcome::Updated)
            }
            Self::SetProperty(cmd) => {
                let target = document.paragraph_mut(cmd.paragraph)?;
                cmd.previous = Some(target.swap_property(cmd.property.clone()));
                Ok(CommandOutcome::Updated)
            }
            Self::UpdateStyle(cmd) => {
                cmd.previous = Some(document.styles.upsert(cmd.style.clone()));
                Ok(CommandOutcome::Updated)
            }
            Self::UpdateFields(cmd) => {
                cmd.previous = Some(std::mem::replace(&mut document.fields, cmd.values.clone()));
                let changed = document.rerender_fields();
                tracing::debug!(changed, "Re-rendered field elements");
                Ok(CommandOutcome::Updated)
            }
            Self::UpdateIndex(cmd) => {
                cmd.entries = cmd.capture_entries(document);
                cmd.previous = Some(
                    document
                        .indices
                        .insert(cmd.index_name.clone(), cmd.definition.clone()),
                );
                let changed = document.rerender_index(&cmd.index_name);
                tracing::debug!(index = %cmd.index_name, changed, "Re-rendered index entries");
                Ok(CommandOutcome::Updated)
            }
        }
    }

    /// Put the document back the way it was before `apply`.
    ///
    /// Reverting a command that was never applied does nothing.
    ///
    /// # Errors
    ///
    /// Fails only if the document was changed behind the history's back.
    pub fn revert(&mut self, document: &mut Document) -> ScribeResult<()> {
        match self {
            Self::Insert(cmd) => cmd.revert(document),
            Self::Remove(cmd) => cmd.revert(document),
            Self::Split(cmd) => cmd.revert(document),
            Self::Merge(cmd) => cmd.revert(document),
            Self::SetStyle(cmd) => {
                if let Some(previous) = cmd.previous.take() {
                    document.paragraph_mut(cmd.paragraph)?.meta.style = previous;
                }
                Ok(())
            }
            Self::SetProperty(cmd) => {
                if let Some(previous) = cmd.previous.take() {
                    document.paragraph_mut(cmd.paragraph)?.swap_property(previous);
                }
                Ok(())
            }
            Self::UpdateStyle(cmd) => {
                match cmd.previous.take() {
                    Some(Some(previous)) => {
                        document.styles.upsert(previous);
                    }
                    Some(None) => {
                        document.styles.remove(&cmd.style.name);
                    }
                    None => {}
                }
                Ok(())
            }
            Self::UpdateFields(cmd) => {
                if let Some(previous) = cmd.previous.take() {
                    document.fields = previous;
                    document.rerender_fields();
                }
                Ok(())
            }
            Self::UpdateIndex(cmd) => {
                match cmd.previous.take() {
                    Some(Some(previous)) => {
                        document.indices.insert(cmd.index_name.clone(), previous);
                    }
                    Some(None) => {
                        document.indices.remove(&cmd.index_name);
                    }
                    None => return Ok(()),
                }
                for (paragraph, index, element) in std::mem::take(&mut cmd.entries) {
                    document
                        .paragraph_mut(paragraph)?
                        .elements
                        .replace(index, element)
                        .ok_or_else(|| {
                            ScribeError::InvalidOperation(format!(
                                "index entry {index} of paragraph {paragraph} is gone"
                            ))
                        })?;
                }
                Ok(())
            }
        }
    }

    /// Where the cursor belongs once this command is reverted.
    ///
    /// Read it before `revert`, while the captured state is still held.
    /// Metadata commands have no position.
    #[must_use]
    pub fn undo_cursor(&self) -> Option<Cursor> {
        match self {
            Self::Insert(cmd) => cmd
                .undo
                .as_ref()
                .map(|undo| Cursor::new(cmd.paragraph, undo.insertion.start)),
            Self::Remove(cmd) => cmd.undo.as_ref().map(|undo| {
                Cursor::new(
                    cmd.paragraph,
                    undo.removal.start + undo.removal.slice.char_len(),
                )
            }),
            Self::Split(cmd) => cmd
                .undo
                .as_ref()
                .map(|_| Cursor::new(cmd.paragraph, cmd.position)),
            Self::Merge(cmd) => cmd
                .undo
                .as_ref()
                .map(|_| Cursor::new(cmd.paragraph + 1, 0)),
            _ => None,
        }
    }

    /// Where the cursor belongs once this command is applied.
    #[must_use]
    pub fn redo_cursor(&self) -> Option<Cursor> {
        match self {
            Self::Insert(cmd) => cmd
                .undo
                .as_ref()
                .map(|undo| Cursor::new(cmd.paragraph, undo.insertion.end)),
            Self::Remove(cmd) => cmd
                .undo
                .as_ref()
                .map(|undo| Cursor::new(cmd.paragraph, undo.removal.start)),
            Self::Split(cmd) => cmd
                .undo
                .as_ref()
                .map(|_| Cursor::new(cmd.paragraph + 1, 0)),
            Self::Merge(cmd) => cmd
                .undo
                .as_ref()
                .map(|undo| Cursor::new(cmd.paragraph, undo.join)),
            _ => None,
        }
    }
}

macro_rules! impl_from_command {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for EditCommand {
                fn from(cmd: $ty) -> Self {
                    Self::$variant(cmd)
                }
            }
        )*
    };
}

impl_from_command!(
    Insert(InsertText),
    Remove(RemoveText),
    Split(SplitParagraph),
    Merge(MergeParagraphs),
    SetStyle(SetStyle),
    SetProperty(SetProperty),
    UpdateStyle(UpdateStyleDefinition),
    UpdateFields(UpdateFieldValues),
    UpdateIndex(UpdateIndexEntries),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleSheet;

    fn stroke(outline: &str, data: &str) -> Element {
        Element::stroke(outline, data, "t0", None)
    }

    fn document_with(paragraphs: Vec<Vec<Element>>) -> Document {
        let paragraphs = paragraphs
            .into_iter()
            .map(|elements| {
                Paragraph::from_parts(
                    ParagraphMeta {
                        style: "Normal".into(),
                        creation_time: "c0".into(),
                        edit_time: "e0".into(),
                        ..ParagraphMeta::default()
                    },
                    ElementCollection::from_elements(elements),
                )
            })
            .collect();
        Document::from_parts(
            paragraphs,
            StyleSheet::default(),
            FieldValues::new(),
            crate::document::IndexCatalog::new(),
        )
    }

    fn round_trip(document: &Document, command: impl Into<EditCommand>) -> Document {
        let mut edited = document.clone();
        let mut command = command.into();
        command.apply(&mut edited).expect("apply");
        let after = edited.clone();
        command.revert(&mut edited).expect("revert");
        assert_eq!(&edited, document, "revert restores the document");
        after
    }

    #[test]
    fn test_insert_inside_stroke_reverts_to_one_element() {
        let document = document_with(vec![vec![stroke("ABGD", "ABCDEF")]]);
        let after = round_trip(
            &document,
            InsertText::new(0, 3, vec![Element::text("X", "t1")], "Normal"),
        );
        assert_eq!(after.text(), "ABCXDEF");
    }

    #[test]
    fn test_insert_assigns_default_style_and_reverts_it() {
        let mut document = document_with(vec![vec![]]);
        document.paragraph_mut(0).expect("paragraph").meta.style = String::new();
        let after = round_trip(
            &document,
            InsertText::new(0, 0, vec![Element::text("Hi", "t1")], "Question"),
        );
        assert_eq!(after.paragraphs()[0].meta.style, "Question");
    }

    #[test]
    fn test_insert_out_of_range_fails_cleanly() {
        let mut document = document_with(vec![vec![stroke("KAT", "cat")]]);
        let before = document.clone();
        let mut command = EditCommand::from(InsertText::new(0, 9, vec![], "Normal"));
        assert!(matches!(
            command.apply(&mut document),
            Err(ScribeError::OffsetOutOfRange { length: 3, .. })
        ));
        assert_eq!(document, before);
    }

    #[test]
    fn test_remove_reverts_exactly() {
        let document = document_with(vec![vec![
            Element::automatic("Q.\t", "Did", "", "t0"),
            stroke("KAT", " you"),
            Element::field("WITNESS", "Smith", "t1"),
        ]]);
        let after = round_trip(&document, RemoveText::new(0, 4, 11));
        assert_eq!(after.text(), "Q.\tD");
    }

    #[test]
    fn test_split_single_element_reverts_to_one_element() {
        let document = document_with(vec![vec![stroke("ABGD", "ABCDEF")]]);
        let after = round_trip(&document, SplitParagraph::new(0, 3, None));
        assert_eq!(after.paragraph_count(), 2);
        assert_eq!(after.paragraphs()[0].text(), "ABC");
        assert_eq!(after.paragraphs()[1].text(), "DEF");
        assert_eq!(document.paragraphs()[0].elements.element_count(), 1);
    }

    #[test]
    fn test_split_trims_boundary_space() {
        let document = document_with(vec![vec![stroke("ABC", "ABC"), stroke("DEF", " DEF")]]);
        let after = round_trip(&document, SplitParagraph::new(0, 3, None));
        assert_eq!(after.paragraphs()[1].text(), "DEF");

        let after = round_trip(
            &document,
            SplitParagraph::new(0, 4, None).with_space_placement(SpacePlacement::After),
        );
        assert_eq!(after.paragraphs()[0].text(), "ABC");
        assert_eq!(after.paragraphs()[1].text(), "DEF");
    }

    #[test]
    fn test_split_after_placement_at_boundary_restores_space() {
        let document = document_with(vec![vec![stroke("KWRES", "Yes. "), stroke("TPHO", "No")]]);
        let after = round_trip(
            &document,
            SplitParagraph::new(0, 5, None).with_space_placement(SpacePlacement::After),
        );
        assert_eq!(after.paragraphs()[0].text(), "Yes.");
        assert_eq!(after.paragraphs()[1].text(), "No");

        let document = document_with(vec![vec![stroke("KWRES", "Yes."), Element::text(" ", "t1")]]);
        let after = round_trip(
            &document,
            SplitParagraph::new(0, 5, None).with_space_placement(SpacePlacement::After),
        );
        assert_eq!(after.paragraphs()[0].elements.element_count(), 1);
        assert_eq!(after.paragraphs()[1].text(), "");
    }

    #[test]
    fn test_split_moves_media_end_and_appends_marker() {
        let mut document = document_with(vec![vec![stroke("ABC", "ABC DEF")]]);
        document.paragraph_mut(0).expect("paragraph").meta.audio_end = Some("00:10".into());
        let after = round_trip(
            &document,
            SplitParagraph::new(0, 3, Some("Answer".into()))
                .with_media_time(Some("00:05".into()))
                .with_paragraph_end(Some("\u{b6}".into())),
        );
        let first = &after.paragraphs()[0];
        let second = &after.paragraphs()[1];
        assert_eq!(first.text(), "ABC\u{b6}");
        assert_eq!(first.meta.audio_end.as_deref(), Some("00:05"));
        assert_eq!(second.meta.audio_start.as_deref(), Some("00:05"));
        assert_eq!(second.meta.audio_end.as_deref(), Some("00:10"));
        assert_eq!(second.meta.style, "Answer");
    }

    #[test]
    fn test_merge_with_join_space_reverts_exactly() {
        let document = document_with(vec![vec![stroke("ABC", "ABC")], vec![stroke("DEF", "DEF")]]);
        let after = round_trip(&document, MergeParagraphs::new(0).with_join_space(true));
        assert_eq!(after.paragraph_count(), 1);
        assert_eq!(after.text(), "ABC DEF");
    }

    #[test]
    fn test_merge_strips_affixes_and_marker() {
        let document = document_with(vec![
            vec![
                Element::automatic("Q.\t", "Yes", "?", "t0"),
                Element::text("\u{b6}", "t1"),
            ],
            vec![Element::automatic("A.\t", "No", "", "t2")],
        ]);
        let after = round_trip(
            &document,
            MergeParagraphs::new(0).with_paragraph_end(Some("\u{b6}".into())),
        );
        assert_eq!(after.text(), "Q.\tYesNo");
    }

    #[test]
    fn test_split_then_merge_restores_paragraph() {
        let mut document = document_with(vec![vec![stroke("ABGD", "ABCDEF")]]);
        let original = document.clone();
        let mut split = EditCommand::from(SplitParagraph::new(0, 3, None));
        split.apply(&mut document).expect("split");
        let mut merge = EditCommand::from(MergeParagraphs::new(0));
        merge.apply(&mut document).expect("merge");
        assert_eq!(document, original);
    }

    #[test]
    fn test_merge_last_paragraph_is_rejected() {
        let mut document = document_with(vec![vec![stroke("KAT", "cat")]]);
        let mut merge = EditCommand::from(MergeParagraphs::new(0));
        assert!(matches!(
            merge.apply(&mut document),
            Err(ScribeError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_metadata_commands_revert() {
        let document = document_with(vec![vec![Element::field("NAME", "Smith", "t0")]]);
        round_trip(&document, SetStyle::new(0, "Question"));
        round_trip(
            &document,
            SetProperty::new(0, ParagraphProperty::Notes("verify".into())),
        );
        round_trip(
            &document,
            UpdateStyleDefinition::new(Style::new("Colloquy")),
        );
        round_trip(
            &document,
            UpdateStyleDefinition::new(Style::new("Normal").with_indents(3, 0)),
        );
        let after = round_trip(
            &document,
            UpdateFieldValues::new(FieldValues::from([("NAME".to_string(), "Jones".to_string())])),
        );
        assert_eq!(after.text(), "Jones");
    }

    #[test]
    fn test_update_index_rerenders_entries() {
        let document = document_with(vec![vec![Element::index_entry(
            "Exhibits", "Exhibit", "1", false, "", "t0",
        )]]);
        let after = round_trip(
            &document,
            UpdateIndexEntries::new(
                "Exhibits",
                IndexDefinition {
                    prefix: "Ex.".into(),
                    hidden: true,
                    entries: [("1".to_string(), "Contract".to_string())].into(),
                },
            ),
        );
        assert_eq!(after.text(), "Ex.\u{a0}1");
    }

    #[test]
    fn test_first_index_definition_reverts_entry_attributes() {
        let mut document = document_with(vec![vec![]]);
        document.paragraph_mut(0).expect("paragraph").elements.push(Element::index_entry(
            "Exhibits", "Exhibit", "1", false, "Lease", "t0",
        ));
        assert!(document.indices.get("Exhibits").is_none());

        let after = round_trip(
            &document,
            UpdateIndexEntries::new(
                "Exhibits",
                IndexDefinition {
                    prefix: "Ex.".into(),
                    hidden: true,
                    entries: [("1".to_string(), "Contract".to_string())].into(),
                },
            ),
        );
        assert_eq!(after.text(), "Ex.\u{a0}1");
    }
}
