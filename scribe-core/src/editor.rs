//! The editing facade: one document with its history, cursor and stroke
//! state.
//!
//! Every public mutation is recorded as exactly one undo group.

use crate::collection::ElementSlice;
use crate::command::{
    CommandOutcome, EditCommand, InsertText, MergeParagraphs, RemoveText, SetProperty, SetStyle,
    SplitParagraph, UpdateFieldValues, UpdateIndexEntries, UpdateStyleDefinition,
};
use crate::config::EditorConfig;
use crate::document::{Cursor, Document, FieldValues, IndexDefinition, TranscriptSnapshot};
use crate::element::Element;
use crate::error::{ScribeError, ScribeResult};
use crate::event::StrokeEvent;
use crate::history::EditHistory;
use crate::paragraph::ParagraphProperty;
use crate::style::Style;
use crate::synth::{StrokeOutcome, StrokeSynthesizer};
use crate::tape::TapeWriter;
use crate::time;

/// A range of text between two cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Where the selection starts.
    pub start: Cursor,
    /// Where the selection ends.
    pub end: Cursor,
}

impl Selection {
    /// Select `start..end` within one paragraph.
    #[must_use]
    pub const fn within(paragraph: usize, start: usize, end: usize) -> Self {
        Self {
            start: Cursor::new(paragraph, start),
            end: Cursor::new(paragraph, end),
        }
    }

    /// The paragraph and ordered offsets, if the selection stays in one paragraph.
    fn single_paragraph(self) -> Option<(usize, usize, usize)> {
        (self.start.paragraph == self.end.paragraph).then(|| {
            (
                self.start.paragraph,
                self.start.offset.min(self.end.offset),
                self.start.offset.max(self.end.offset),
            )
        })
    }
}

/// An open transcript.
#[derive(Debug)]
pub struct TranscriptEditor {
    document: Document,
    history: EditHistory,
    config: EditorConfig,
    cursor: Cursor,
    synth: StrokeSynthesizer,
    tape: Option<TapeWriter>,
}

impl Default for TranscriptEditor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl TranscriptEditor {
    /// Create an editor on a new, empty document.
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    /// Create an editor on an existing document, with the cursor at its end.
    #[must_use]
    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        let last = document.paragraph_count().saturating_sub(1);
        let cursor = document.clamp_cursor(Cursor::new(last, usize::MAX));
        Self {
            history: EditHistory::with_limit(config.undo_limit),
            document,
            config,
            cursor,
            synth: StrokeSynthesizer::new(),
            tape: None,
        }
    }

    /// Log every stroke to `tape`.
    #[must_use]
    pub fn with_tape(mut self, tape: TapeWriter) -> Self {
        self.tape = Some(tape);
        self
    }

    /// The document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// The cursor.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Move the cursor. Stroke accumulation restarts at the new position.
    pub fn move_cursor(&mut self, cursor: Cursor) {
        self.cursor = self.document.clamp_cursor(cursor);
        self.synth.reset();
    }

    /// Deep copy of the document for export.
    #[must_use]
    pub fn snapshot(&self) -> TranscriptSnapshot {
        self.document.snapshot()
    }

    /// Give up the document.
    #[must_use]
    pub fn into_document(self) -> Document {
        self.document
    }

    // -----------------------------------------------------------------------
    // Engine events
    // -----------------------------------------------------------------------

    /// Apply one stroke from the steno engine at the cursor.
    ///
    /// # Errors
    ///
    /// Returns the error of a failed command; the stroke is then rolled back.
    pub fn on_stroke(&mut self, event: &StrokeEvent) -> ScribeResult<StrokeOutcome> {
        let outcome = self.synth.process(
            &mut self.document,
            &mut self.history,
            &self.config,
            &mut self.cursor,
            event,
        )?;
        if let Some(tape) = self.tape.as_mut() {
            let line = tape.line_for(
                &event.outline,
                event.stroke_time.clone().unwrap_or_else(time::now),
                event.media_time.clone(),
                self.cursor.paragraph,
                self.cursor.offset,
            );
            if let Err(e) = tape.record(&line) {
                tracing::warn!("Failed to write tape line: {e}");
            }
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Content edits
    // -----------------------------------------------------------------------

    /// Type plain text at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::OffsetOutOfRange`] if the cursor is stale.
    pub fn insert_text(&mut self, text: &str) -> ScribeResult<()> {
        self.insert_at_cursor(vec![Element::text(text, time::now())])
    }

    /// Insert a field showing its current value at the cursor.
    ///
    /// An unknown field name is registered with an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::OffsetOutOfRange`] if the cursor is stale.
    pub fn insert_field(&mut self, name: &str) -> ScribeResult<()> {
        let value = self.document.fields.get(name).cloned();
        let element = Element::field(name, value.as_deref().unwrap_or_default(), time::now());
        let register = value.is_none().then(|| {
            let mut fields = self.document.fields.clone();
            fields.insert(name.to_string(), String::new());
            UpdateFieldValues::new(fields)
        });

        self.history.begin_group("insert field");
        let result = self.register_and_insert(register, element);
        self.close_group(result)
    }

    /// Insert an image at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::OffsetOutOfRange`] if the cursor is stale.
    pub fn insert_image(&mut self, path: &str, width: u32, height: u32) -> ScribeResult<()> {
        self.insert_at_cursor(vec![Element::image(path, width, height, time::now())])
    }

    /// Insert an index marker at the cursor, registering the entry in the
    /// catalog if it is new.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::OffsetOutOfRange`] if the cursor is stale.
    pub fn insert_index_entry(
        &mut self,
        index_name: &str,
        entry: &str,
        description: &str,
    ) -> ScribeResult<()> {
        let mut definition = self
            .document
            .indices
            .get(index_name)
            .cloned()
            .unwrap_or_default();
        let register = definition.entries.get(entry).map(String::as_str) != Some(description);
        definition
            .entries
            .insert(entry.to_string(), description.to_string());
        let element = Element::index_entry(
            index_name,
            definition.prefix.clone(),
            entry,
            definition.hidden,
            description,
            time::now(),
        );

        self.history.begin_group("insert index entry");
        let register = register.then(|| UpdateIndexEntries::new(index_name, definition));
        let result = self.register_and_insert(register, element);
        self.close_group(result)
    }

    /// Record a catalog update, then insert `element` at the cursor.
    fn register_and_insert(
        &mut self,
        register: Option<impl Into<EditCommand>>,
        element: Element,
    ) -> ScribeResult<()> {
        if let Some(command) = register {
            self.history.execute(&mut self.document, command)?;
        }
        self.insert_at_cursor(vec![element])
    }

    /// Remove `start..end` of a paragraph.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::ParagraphNotFound`] or
    /// [`ScribeError::OffsetOutOfRange`] for a range outside the document.
    pub fn delete_range(&mut self, paragraph: usize, start: usize, end: usize) -> ScribeResult<()> {
        let outcome = self.history.execute(
            &mut self.document,
            RemoveText::new(paragraph, start.min(end), start.max(end)),
        )?;
        if let CommandOutcome::Removed { start, .. } = outcome {
            self.place_cursor(Cursor::new(paragraph, start));
        }
        Ok(())
    }

    /// Copy a single-paragraph selection.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::CrossParagraph`] if the selection spans a
    /// paragraph break and [`ScribeError::ParagraphNotFound`] for a missing
    /// paragraph.
    pub fn copy(&self, selection: Selection) -> ScribeResult<ElementSlice> {
        let (paragraph, start, end) = selection
            .single_paragraph()
            .ok_or_else(|| ScribeError::cross_paragraph("copy"))?;
        let slice = self
            .document
            .paragraph(paragraph)?
            .elements
            .extract(start, end);
        Ok(ElementSlice::new(slice.elements))
    }

    /// Cut a single-paragraph selection.
    ///
    /// # Errors
    ///
    /// Same as [`TranscriptEditor::copy`].
    pub fn cut(&mut self, selection: Selection) -> ScribeResult<ElementSlice> {
        let (paragraph, start, end) = selection
            .single_paragraph()
            .ok_or_else(|| ScribeError::cross_paragraph("cut"))?;
        let slice = self.copy(selection)?;
        self.delete_range(paragraph, start, end)?;
        Ok(slice)
    }

    /// Paste copied elements at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::OffsetOutOfRange`] if the cursor is stale.
    pub fn paste(&mut self, slice: ElementSlice) -> ScribeResult<()> {
        self.insert_at_cursor(slice.elements)
    }

    // -----------------------------------------------------------------------
    // Paragraph edits
    // -----------------------------------------------------------------------

    /// Break the cursor's paragraph at the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::OffsetOutOfRange`] if the cursor is stale.
    pub fn split_paragraph(&mut self) -> ScribeResult<()> {
        let split = SplitParagraph::new(self.cursor.paragraph, self.cursor.offset, None)
            .with_space_placement(self.config.space_placement)
            .with_paragraph_end(self.config.paragraph_end.clone());
        if let CommandOutcome::Split { paragraph } = self.history.execute(&mut self.document, split)? {
            self.place_cursor(Cursor::new(paragraph, 0));
        }
        Ok(())
    }

    /// Join `paragraph` with the paragraph after it.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::InvalidOperation`] for the last paragraph.
    pub fn merge_with_next(&mut self, paragraph: usize) -> ScribeResult<()> {
        let merge = MergeParagraphs::new(paragraph)
            .with_join_space(self.config.merge_join_space)
            .with_paragraph_end(self.config.paragraph_end.clone());
        if let CommandOutcome::Merged { paragraph, join } =
            self.history.execute(&mut self.document, merge)?
        {
            self.place_cursor(Cursor::new(paragraph, join));
        }
        Ok(())
    }

    /// Change a paragraph's style.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::StyleNotFound`] for a style missing from the
    /// sheet and [`ScribeError::ParagraphNotFound`] for a missing paragraph.
    pub fn set_style(&mut self, paragraph: usize, style: &str) -> ScribeResult<()> {
        if !self.document.styles.contains(style) {
            return Err(ScribeError::StyleNotFound(style.to_string()));
        }
        self.history
            .execute(&mut self.document, SetStyle::new(paragraph, style))?;
        Ok(())
    }

    /// Change one paragraph property.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::ParagraphNotFound`] for a missing paragraph.
    pub fn set_property(&mut self, paragraph: usize, property: ParagraphProperty) -> ScribeResult<()> {
        self.history
            .execute(&mut self.document, SetProperty::new(paragraph, property))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Catalogs
    // -----------------------------------------------------------------------

    /// Add or replace a style definition.
    ///
    /// # Errors
    ///
    /// Infallible today; returns `Result` like every other edit.
    pub fn update_style(&mut self, style: Style) -> ScribeResult<()> {
        self.history
            .execute(&mut self.document, UpdateStyleDefinition::new(style))?;
        Ok(())
    }

    /// Replace all field values and re-render field elements.
    ///
    /// # Errors
    ///
    /// Infallible today; returns `Result` like every other edit.
    pub fn update_fields(&mut self, values: FieldValues) -> ScribeResult<()> {
        self.history
            .execute(&mut self.document, UpdateFieldValues::new(values))?;
        self.cursor = self.document.clamp_cursor(self.cursor);
        Ok(())
    }

    /// Add or replace an index definition and re-render its entries.
    ///
    /// # Errors
    ///
    /// Infallible today; returns `Result` like every other edit.
    pub fn update_index(&mut self, index_name: &str, definition: IndexDefinition) -> ScribeResult<()> {
        self.history.execute(
            &mut self.document,
            UpdateIndexEntries::new(index_name, definition),
        )?;
        self.cursor = self.document.clamp_cursor(self.cursor);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Undo the last edit group. Returns `false` when there is nothing to undo.
    ///
    /// The cursor moves to where the undone edit began.
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.history.undo(&mut self.document) else {
            return false;
        };
        self.place_cursor(step.cursor.unwrap_or(self.cursor));
        true
    }

    /// Redo the last undone group. Returns `false` when there is nothing to redo.
    ///
    /// The cursor moves just past the redone edit.
    pub fn redo(&mut self) -> bool {
        let Some(step) = self.history.redo(&mut self.document) else {
            return false;
        };
        self.place_cursor(step.cursor.unwrap_or(self.cursor));
        true
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn place_cursor(&mut self, cursor: Cursor) {
        self.cursor = self.document.clamp_cursor(cursor);
        self.synth.reset();
    }

    fn insert_at_cursor(&mut self, elements: Vec<Element>) -> ScribeResult<()> {
        let command = InsertText::new(
            self.cursor.paragraph,
            self.cursor.offset,
            elements,
            self.config.default_style.clone(),
        );
        if let CommandOutcome::Inserted(insertion) = self.history.execute(&mut self.document, command)? {
            self.place_cursor(Cursor::new(self.cursor.paragraph, insertion.end));
        }
        Ok(())
    }

    fn close_group(&mut self, result: ScribeResult<()>) -> ScribeResult<()> {
        match result {
            Ok(()) => {
                self.history.end_group();
                Ok(())
            }
            Err(e) => {
                self.history.abort_group(&mut self.document);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with(text: &str) -> TranscriptEditor {
        let mut editor = TranscriptEditor::default();
        editor.insert_text(text).expect("insert");
        editor
    }

    #[test]
    fn test_insert_moves_cursor() {
        let editor = editor_with("hello");
        assert_eq!(editor.cursor(), Cursor::new(0, 5));
        assert_eq!(editor.document().text(), "hello");
    }

    #[test]
    fn test_split_and_merge_restore_text() {
        let mut editor = editor_with("ABC DEF");
        editor.move_cursor(Cursor::new(0, 3));
        editor.split_paragraph().expect("split");
        assert_eq!(editor.document().text(), "ABC\nDEF");
        assert_eq!(editor.cursor(), Cursor::new(1, 0));

        editor.merge_with_next(0).expect("merge");
        assert_eq!(editor.document().text(), "ABC DEF");
        assert_eq!(editor.cursor(), Cursor::new(0, 4));

        assert!(editor.undo());
        assert_eq!(editor.document().text(), "ABC\nDEF");
        assert!(editor.undo());
        assert_eq!(editor.document().text(), "ABC DEF");
        assert_eq!(editor.document().paragraphs()[0].elements.element_count(), 1);
    }

    #[test]
    fn test_undo_and_redo_move_cursor_to_the_edit() {
        let mut editor = editor_with("ABC DEF");
        editor.move_cursor(Cursor::new(0, 3));
        editor.split_paragraph().expect("split");
        editor.move_cursor(Cursor::new(1, 3));

        assert!(editor.undo());
        assert_eq!(editor.document().text(), "ABC DEF");
        assert_eq!(editor.cursor(), Cursor::new(0, 3));
        assert!(editor.redo());
        assert_eq!(editor.cursor(), Cursor::new(1, 0));

        editor.move_cursor(Cursor::new(0, 0));
        editor.merge_with_next(0).expect("merge");
        assert_eq!(editor.cursor(), Cursor::new(0, 4));
        assert!(editor.undo());
        assert_eq!(editor.cursor(), Cursor::new(1, 0));
        assert!(editor.redo());
        assert_eq!(editor.cursor(), Cursor::new(0, 4));
    }

    #[test]
    fn test_cross_paragraph_copy_is_rejected() {
        let mut editor = editor_with("ABC DEF");
        editor.move_cursor(Cursor::new(0, 3));
        editor.split_paragraph().expect("split");
        let selection = Selection {
            start: Cursor::new(0, 1),
            end: Cursor::new(1, 2),
        };
        let err = editor.copy(selection).expect_err("cross-paragraph copy");
        assert!(matches!(err, ScribeError::CrossParagraph(_)));
        assert!(err.to_string().contains("single paragraph"));
        assert!(editor.cut(selection).is_err());
        assert_eq!(editor.document().text(), "ABC\nDEF");
    }

    #[test]
    fn test_cut_and_paste() {
        let mut editor = editor_with("one two three");
        let slice = editor.cut(Selection::within(0, 3, 7)).expect("cut");
        assert_eq!(slice.render(), " two");
        assert!(!slice.cut_start && !slice.cut_end);
        assert_eq!(editor.document().text(), "one three");
        assert_eq!(editor.cursor(), Cursor::new(0, 3));

        editor.move_cursor(Cursor::new(0, 9));
        editor.paste(slice).expect("paste");
        assert_eq!(editor.document().text(), "one three two");
    }

    #[test]
    fn test_set_style_validates_name() {
        let mut editor = editor_with("text");
        assert!(matches!(
            editor.set_style(0, "Missing"),
            Err(ScribeError::StyleNotFound(_))
        ));
        editor.set_style(0, "Answer").expect("known style");
        assert_eq!(editor.document().paragraphs()[0].meta.style, "Answer");
        assert!(editor.undo());
        assert_eq!(editor.document().paragraphs()[0].meta.style, "Normal");
    }

    #[test]
    fn test_fields_and_index_entries() {
        let mut editor = TranscriptEditor::default();
        editor.insert_field("WITNESS").expect("field");
        assert_eq!(editor.document().text(), "{WITNESS}");
        editor
            .update_fields(FieldValues::from([("WITNESS".to_string(), "Smith".to_string())]))
            .expect("update fields");
        assert_eq!(editor.document().text(), "Smith");

        editor.move_cursor(Cursor::new(0, 5));
        editor
            .insert_index_entry("Exhibits", "1", "Contract")
            .expect("index entry");
        assert_eq!(editor.document().text(), "Smith1");
        assert_eq!(
            editor.document().indices["Exhibits"].entries["1"],
            "Contract"
        );
        assert_eq!(editor.history().undo_depth(), 3);

        assert!(editor.undo());
        assert!(!editor.document().indices.contains_key("Exhibits"));
        assert_eq!(editor.document().text(), "Smith");
    }

    #[test]
    fn test_stroke_then_undo_redo() {
        let mut editor = TranscriptEditor::default();
        editor
            .on_stroke(&StrokeEvent::new("KAT", " cat", 0))
            .expect("stroke");
        assert_eq!(editor.document().text(), " cat");
        assert!(editor.undo());
        assert_eq!(editor.document().text(), "");
        assert!(editor.redo());
        assert_eq!(editor.document().text(), " cat");
        assert!(!editor.redo());
    }

    #[test]
    fn test_stroke_writes_tape() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("session.tape");
        let tape = TapeWriter::open(&path, crate::tape::StenoLayout::english()).expect("open tape");
        let mut editor = TranscriptEditor::default().with_tape(tape);
        editor
            .on_stroke(
                &StrokeEvent::new("KAT", " cat", 0)
                    .with_stroke_time("2024-05-01T10:00:00.000")
                    .with_media_time("00:00:03.250"),
            )
            .expect("stroke");
        drop(editor);
        let contents = std::fs::read_to_string(&path).expect("read tape");
        assert_eq!(
            contents,
            "2024-05-01T10:00:00.000|00:00:03.250|(0,4)|   K    A          T   \n"
        );
    }
}
