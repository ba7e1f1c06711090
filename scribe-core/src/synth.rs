//! Turns the engine's stroke stream into edit commands.
//!
//! Each stroke becomes one undo group: first the erase (removals, and
//! merges when the erase runs past the start of a paragraph), then the
//! typed text (inserts, with a split for every newline).
//!
//! The synthesizer also keeps a short history of recent strokes so that an
//! element records the full outline that produced it. Two situations
//! accumulate outlines:
//!
//! * The engine erases exactly the output of the last `k` strokes and types
//!   a retranslation. The new element's outline is the `k` old outlines
//!   followed by the new one.
//! * The engine types text without a leading space right where the previous
//!   stroke ended (a suffix, or a correction inside the previous word). The
//!   new text is combined into the previous stroke element.

use std::collections::VecDeque;

use crate::collection::Backtrack;
use crate::command::{CommandOutcome, InsertText, MergeParagraphs, RemoveText, SplitParagraph};
use crate::config::{AffixPolicy, EditorConfig};
use crate::document::{Cursor, Document};
use crate::element::{join_outlines, Element};
use crate::error::{ScribeError, ScribeResult};
use crate::event::{StrokeEvent, StrokeKind};
use crate::history::EditHistory;
use crate::time;

/// What happened to a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeOutcome {
    /// The stroke was applied; the cursor now sits here.
    Applied(Cursor),
    /// The stroke erased more than the document holds and was ignored.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StrokeRecord {
    outline: String,
    produced: usize,
    paragraph: usize,
    end: usize,
}

/// Stroke-stream state of one editor.
#[derive(Debug, Clone, Default)]
pub struct StrokeSynthesizer {
    records: VecDeque<StrokeRecord>,
    fresh_paragraph: Option<usize>,
}

/// Everything a stroke edits.
struct Target<'a> {
    document: &'a mut Document,
    history: &'a mut EditHistory,
    config: &'a EditorConfig,
    cursor: &'a mut Cursor,
}

impl Target<'_> {
    fn remove(&mut self, start: usize, end: usize) -> ScribeResult<()> {
        let command = RemoveText::new(self.cursor.paragraph, start, end);
        if let CommandOutcome::Removed { start, .. } = self.history.execute(self.document, command)? {
            self.cursor.offset = start;
        }
        Ok(())
    }

    fn insert(&mut self, element: Element) -> ScribeResult<()> {
        let command = InsertText::new(
            self.cursor.paragraph,
            self.cursor.offset,
            vec![element],
            self.config.default_style.clone(),
        );
        if let CommandOutcome::Inserted(insertion) = self.history.execute(self.document, command)? {
            self.cursor.offset = insertion.end;
        }
        Ok(())
    }
}

impl StrokeSynthesizer {
    /// Create a synthesizer with no stroke history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget recent strokes, e.g. after the cursor was moved by hand.
    pub fn reset(&mut self) {
        self.records.clear();
        self.fresh_paragraph = None;
    }

    /// Apply one stroke at `cursor` as a single undo group.
    ///
    /// A stroke that erases more units than precede the cursor in the whole
    /// document is dropped without touching anything.
    ///
    /// # Errors
    ///
    /// Returns the error of the first command that fails; everything the
    /// stroke had already applied is rolled back and the cursor restored.
    pub fn process(
        &mut self,
        document: &mut Document,
        history: &mut EditHistory,
        config: &EditorConfig,
        cursor: &mut Cursor,
        event: &StrokeEvent,
    ) -> ScribeResult<StrokeOutcome> {
        let kind = event.kind();
        *cursor = document.clamp_cursor(*cursor);
        tracing::debug!(
            outline = %event.outline,
            ?kind,
            backspaces = event.backspaces,
            paragraph = cursor.paragraph,
            offset = cursor.offset,
            "Stroke"
        );
        if kind == StrokeKind::Empty {
            return Ok(StrokeOutcome::Applied(*cursor));
        }
        let available = document.units_before(*cursor, config.paragraph_end.as_deref());
        if event.backspaces > available {
            tracing::warn!(
                backspaces = event.backspaces,
                available,
                "Dropping stroke that erases past the start of the document"
            );
            return Ok(StrokeOutcome::Dropped);
        }

        let saved = *cursor;
        history.begin_group(format!("stroke {}", event.outline));
        let mut target = Target {
            document,
            history,
            config,
            cursor,
        };
        match self.apply(&mut target, event) {
            Ok(records) => {
                target.history.end_group();
                self.records = records;
                Ok(StrokeOutcome::Applied(*target.cursor))
            }
            Err(e) => {
                target.history.abort_group(target.document);
                *target.cursor = saved;
                Err(e)
            }
        }
    }

    /// Apply the stroke and return the updated stroke history.
    fn apply(
        &mut self,
        target: &mut Target<'_>,
        event: &StrokeEvent,
    ) -> ScribeResult<VecDeque<StrokeRecord>> {
        let mut records = self.records.clone();
        let before = *target.cursor;
        let accumulates = !event.text.is_empty() && !event.is_undo_stroke();

        let mut outline = event.outline.clone();
        let mut replaced = 0;
        if accumulates && event.backspaces > 0 {
            if let Some(count) = Self::replaced_strokes(&records, event.backspaces) {
                let start = records.len() - count;
                let previous = records
                    .drain(start..)
                    .fold(String::new(), |acc, record| join_outlines(&acc, &record.outline));
                outline = join_outlines(&previous, &event.outline);
                replaced = count;
            }
        }

        if event.backspaces > 0 {
            Self::erase(target, event.backspaces)?;
        }
        if event.text.is_empty() {
            Self::account_erase(&mut records, before, *target.cursor, event.backspaces);
            return Ok(records);
        }

        let attach_to = records.back().filter(|last| {
            accumulates
                && !event.text.starts_with(char::is_whitespace)
                && !event.text.contains('\n')
                && if replaced > 0 {
                    last.paragraph == target.cursor.paragraph && last.end == target.cursor.offset
                } else {
                    last.paragraph == before.paragraph
                        && last.end == before.offset
                        && event.backspaces < last.produced
                }
        });
        let erased_from_last = if replaced > 0 { 0 } else { event.backspaces };
        if let Some(last) = attach_to.cloned() {
            if let Some(combined) = self.attach(target, &outline, event)? {
                records.pop_back();
                records.push_back(StrokeRecord {
                    outline: combined,
                    produced: last.produced - erased_from_last + event.produced_units(),
                    paragraph: target.cursor.paragraph,
                    end: target.cursor.offset,
                });
                Self::trim(&mut records, target.config.history_window);
                return Ok(records);
            }
        }

        if replaced == 0 && event.backspaces > 0 {
            Self::account_erase(&mut records, before, *target.cursor, event.backspaces);
        }
        self.write(target, &outline, event)?;
        records.push_back(StrokeRecord {
            outline,
            produced: event.produced_units(),
            paragraph: target.cursor.paragraph,
            end: target.cursor.offset,
        });
        Self::trim(&mut records, target.config.history_window);
        Ok(records)
    }

    /// Number of most recent strokes whose output is exactly `units` long.
    fn replaced_strokes(records: &VecDeque<StrokeRecord>, units: usize) -> Option<usize> {
        let mut total = 0;
        for (i, record) in records.iter().rev().enumerate() {
            total += record.produced;
            if total == units {
                return Some(i + 1);
            }
            if total > units {
                break;
            }
        }
        None
    }

    /// Update the stroke history after a pure erase.
    fn account_erase(
        records: &mut VecDeque<StrokeRecord>,
        before: Cursor,
        after: Cursor,
        units: usize,
    ) {
        if let Some(count) = Self::replaced_strokes(records, units) {
            let start = records.len() - count;
            records.drain(start..);
            return;
        }
        match records.back_mut() {
            Some(last)
                if last.paragraph == before.paragraph
                    && last.end == before.offset
                    && units < last.produced =>
            {
                last.produced -= units;
                last.end = after.offset;
            }
            _ => records.clear(),
        }
    }

    fn trim(records: &mut VecDeque<StrokeRecord>, window: usize) {
        while records.len() > window {
            records.pop_front();
        }
    }

    /// Erase `units` backspaces before the cursor, merging paragraphs when
    /// the erase crosses a paragraph break.
    fn erase(target: &mut Target<'_>, units: usize) -> ScribeResult<()> {
        let mut remaining = units;
        while remaining > 0 {
            let paragraph = target.document.paragraph(target.cursor.paragraph)?;
            match paragraph.elements.backtrack(target.cursor.offset, remaining) {
                Backtrack::Within(start) => {
                    target.remove(start, target.cursor.offset)?;
                    remaining = 0;
                }
                Backtrack::Overflow(rest) => {
                    if target.cursor.offset > 0 {
                        target.remove(0, target.cursor.offset)?;
                    }
                    if target.cursor.paragraph == 0 {
                        return Err(ScribeError::InvalidOperation(format!(
                            "erase ran {rest} units past the start of the document"
                        )));
                    }
                    let merge = MergeParagraphs::new(target.cursor.paragraph - 1)
                        .with_paragraph_end(target.config.paragraph_end.clone());
                    if let CommandOutcome::Merged { paragraph, join } =
                        target.history.execute(target.document, merge)?
                    {
                        *target.cursor = Cursor::new(paragraph, join);
                    }
                    remaining = rest - 1;
                }
            }
        }
        Ok(())
    }

    /// Combine the stroke into the stroke element ending at the cursor.
    ///
    /// Returns the combined outline, or `None` if the previous element
    /// cannot take the text.
    fn attach(
        &mut self,
        target: &mut Target<'_>,
        outline: &str,
        event: &StrokeEvent,
    ) -> ScribeResult<Option<String>> {
        let paragraph = target.document.paragraph(target.cursor.paragraph)?;
        let Some(index) = paragraph.elements.element_ending_at(target.cursor.offset) else {
            return Ok(None);
        };
        let Some(previous) = paragraph.elements.get(index) else {
            return Ok(None);
        };
        if previous.outline().is_none() {
            return Ok(None);
        }
        let incoming = Element::stroke(
            outline,
            event.text.clone(),
            stroke_time(event),
            event.media_time.clone(),
        );
        let combined = match previous.combine(&incoming) {
            Ok(combined) => combined,
            Err(e) => {
                tracing::debug!("Not combining stroke: {e}");
                return Ok(None);
            }
        };
        let start = paragraph.elements.char_table()[index];
        let combined_outline = combined.outline().unwrap_or(outline).to_string();

        target.remove(start, target.cursor.offset)?;
        target.insert(combined)?;
        self.fresh_paragraph = None;
        Ok(Some(combined_outline))
    }

    /// Type the stroke's text, splitting at every newline.
    fn write(&mut self, target: &mut Target<'_>, outline: &str, event: &StrokeEvent) -> ScribeResult<()> {
        let segments: Vec<&str> = event.text.split('\n').collect();
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            if !segment.is_empty() {
                let segment_outline = if i == 0 { outline } else { "" };
                self.write_segment(target, segment_outline, segment, event)?;
            }
            if i < last {
                self.break_paragraph(target, event)?;
            }
        }
        Ok(())
    }

    fn write_segment(
        &mut self,
        target: &mut Target<'_>,
        outline: &str,
        text: &str,
        event: &StrokeEvent,
    ) -> ScribeResult<()> {
        let paragraph = target.document.paragraph(target.cursor.paragraph)?;
        let wrap = match target.config.affix_policy {
            AffixPolicy::Disabled => false,
            AffixPolicy::EmptyParagraph => paragraph.elements.is_empty(),
            AffixPolicy::NewParagraph => {
                self.fresh_paragraph == Some(target.cursor.paragraph) && paragraph.elements.is_empty()
            }
        };
        let affix = if wrap {
            target
                .document
                .styles
                .resolve(&paragraph.meta.style)
                .and_then(|style| style.affix.clone())
        } else {
            None
        };
        let now = stroke_time(event);
        let element = match affix {
            Some(affix) => Element::automatic(affix.prefix, text, affix.suffix, now),
            None => Element::stroke(outline, text, now, event.media_time.clone()),
        };
        target.insert(element)?;
        self.fresh_paragraph = None;
        Ok(())
    }

    fn break_paragraph(&mut self, target: &mut Target<'_>, event: &StrokeEvent) -> ScribeResult<()> {
        let paragraph = target.document.paragraph(target.cursor.paragraph)?;
        let style = if paragraph.meta.style.is_empty() {
            target.config.default_style.as_str()
        } else {
            paragraph.meta.style.as_str()
        };
        let next_style = target.document.styles.next_of(style);
        let split = SplitParagraph::new(target.cursor.paragraph, target.cursor.offset, Some(next_style))
            .with_media_time(event.media_time.clone())
            .with_space_placement(target.config.space_placement)
            .with_paragraph_end(target.config.paragraph_end.clone());
        if let CommandOutcome::Split { paragraph } = target.history.execute(target.document, split)? {
            *target.cursor = Cursor::new(paragraph, 0);
            self.fresh_paragraph = Some(paragraph);
        }
        Ok(())
    }
}

/// Timestamp for elements created by `event`.
fn stroke_time(event: &StrokeEvent) -> String {
    event.stroke_time.clone().unwrap_or_else(time::now)
}
