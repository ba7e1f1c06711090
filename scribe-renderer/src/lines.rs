//! Paragraph line layout.
//!
//! A paragraph's rendered text is wrapped greedily on spaces, then every
//! wrapped line is located again in the source text so it can be stamped
//! with the time of the element it starts in. Tabs are expanded to
//! [`TAB_STOP`] columns before wrapping.

use serde::Serialize;
use unicode_width::UnicodeWidthChar;

use scribe_core::{ElementCollection, Style, StyleSheet, TranscriptSnapshot};

use crate::error::{RenderError, RenderResult};

/// Column multiple tabs expand to.
pub const TAB_STOP: usize = 5;

/// Indents applied when laying out a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StyleRules {
    /// Indent of the first line in columns.
    pub first_line_indent: usize,
    /// Indent of every other line in columns.
    pub left_indent: usize,
}

impl From<&Style> for StyleRules {
    fn from(style: &Style) -> Self {
        Self {
            first_line_indent: style.first_line_indent,
            left_indent: style.left_indent,
        }
    }
}

impl StyleRules {
    /// Rules of style `name`, falling back to the sheet's default style.
    #[must_use]
    pub fn for_style(styles: &StyleSheet, name: &str) -> Self {
        styles.resolve(name).map(Self::from).unwrap_or_default()
    }

    fn indent(&self, first: bool) -> usize {
        if first {
            self.first_line_indent
        } else {
            self.left_indent
        }
    }
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    /// Line number.
    pub number: usize,
    /// Indented line text.
    pub text: String,
    /// Time of the element holding the line's first character.
    pub time: Option<String>,
    /// First source character of the line.
    pub start: usize,
    /// One past the last source character of the line.
    pub end: usize,
    /// The span was estimated because the line could not be found in the
    /// source text.
    pub estimated: bool,
}

/// The lines of one paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParagraphLines {
    /// Paragraph index.
    pub paragraph: usize,
    /// Style name.
    pub style: String,
    /// Lines in order.
    pub lines: Vec<RenderedLine>,
}

/// Lay out one paragraph, numbering lines from `start_line`.
///
/// An empty paragraph yields a single empty line.
///
/// # Errors
///
/// Returns [`RenderError::InvalidWidth`] if `max_width` does not exceed the
/// style's indents.
pub fn render_paragraph_lines(
    collection: &ElementCollection,
    rules: &StyleRules,
    max_width: usize,
    start_line: usize,
) -> RenderResult<Vec<RenderedLine>> {
    let indent = rules.first_line_indent.max(rules.left_indent);
    if max_width <= indent {
        return Err(RenderError::InvalidWidth {
            width: max_width,
            indent,
        });
    }
    let source = collection.render();
    let (expanded, origin) = expand_tabs(&source, rules.first_line_indent);
    let segments = wrap(
        &expanded,
        max_width - rules.first_line_indent,
        max_width - rules.left_indent,
    );
    let spans = locate_segments(&expanded, &segments);

    let lines = segments
        .into_iter()
        .zip(spans)
        .enumerate()
        .map(|(i, (segment, span))| {
            let start = origin[span.start];
            let end = origin[span.end];
            let time = collection
                .element_index_at(start)
                .or_else(|| collection.element_count().checked_sub(1))
                .and_then(|index| collection.get(index))
                .map(|element| element.time.clone());
            RenderedLine {
                number: start_line + i,
                text: format!("{}{segment}", " ".repeat(rules.indent(i == 0))),
                time,
                start,
                end,
                estimated: span.estimated,
            }
        })
        .collect();
    Ok(lines)
}

/// Lay out every paragraph of a snapshot, numbering lines from 1.
///
/// # Errors
///
/// Returns [`RenderError::InvalidWidth`] if `max_width` does not exceed the
/// indents of some paragraph's style.
pub fn render_snapshot_lines(
    snapshot: &TranscriptSnapshot,
    max_width: usize,
) -> RenderResult<Vec<ParagraphLines>> {
    let mut next_line = 1;
    let mut paragraphs = Vec::with_capacity(snapshot.paragraphs.len());
    for (index, paragraph) in snapshot.paragraphs.iter().enumerate() {
        let rules = StyleRules::for_style(&snapshot.styles, &paragraph.meta.style);
        let lines = render_paragraph_lines(&paragraph.elements, &rules, max_width, next_line)?;
        next_line += lines.len();
        paragraphs.push(ParagraphLines {
            paragraph: index,
            style: paragraph.meta.style.clone(),
            lines,
        });
    }
    tracing::debug!(
        paragraphs = paragraphs.len(),
        lines = next_line - 1,
        "Rendered snapshot"
    );
    Ok(paragraphs)
}

// ---------------------------------------------------------------------------
// Wrapping
// ---------------------------------------------------------------------------

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(1)
}

fn str_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Replace tabs with spaces up to the next tab stop.
///
/// Returns the expanded text and, for every expanded character position
/// (plus the end), the source character it came from.
fn expand_tabs(source: &str, first_column: usize) -> (String, Vec<usize>) {
    let mut expanded = String::with_capacity(source.len());
    let mut origin = Vec::with_capacity(source.len() + 1);
    let mut column = first_column;
    let mut count = 0;
    for (index, c) in source.chars().enumerate() {
        if c == '\t' {
            let spaces = TAB_STOP - column % TAB_STOP;
            for _ in 0..spaces {
                expanded.push(' ');
                origin.push(index);
            }
            column += spaces;
        } else {
            expanded.push(c);
            origin.push(index);
            column += char_width(c);
        }
        count = index + 1;
    }
    origin.push(count);
    (expanded, origin)
}

/// Split `s` after at most `width` columns, taking at least one character.
fn split_at_width(s: &str, width: usize) -> (&str, &str) {
    let mut used = 0;
    for (offset, c) in s.char_indices() {
        let w = char_width(c);
        if offset > 0 && used + w > width {
            return s.split_at(offset);
        }
        used += w;
    }
    (s, "")
}

/// Greedy word wrap. The space at each soft break is dropped; words wider
/// than a line are hard-broken.
fn wrap(text: &str, first_width: usize, rest_width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;
    let mut started = false;

    for word in text.split(' ') {
        let width = if lines.is_empty() { first_width } else { rest_width };
        let word_width = str_width(word);
        let needed = if started {
            line_width + 1 + word_width
        } else {
            word_width
        };
        if needed <= width {
            if started {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(word);
            line_width += word_width;
            started = true;
            continue;
        }
        if word.is_empty() {
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        line_width = 0;
        let mut rest = word;
        loop {
            let width = if lines.is_empty() { first_width } else { rest_width };
            if str_width(rest) <= width {
                line.push_str(rest);
                line_width = str_width(rest);
                started = true;
                break;
            }
            let (head, tail) = split_at_width(rest, width);
            lines.push(head.to_string());
            rest = tail;
        }
    }
    lines.push(line);
    lines
}

// ---------------------------------------------------------------------------
// Re-synchronization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    estimated: bool,
}

/// Find the character span of every wrapped line in `text`.
///
/// A line matches where it next occurs after the previous line, skipping
/// only whitespace. A line that cannot be matched is assumed to start at
/// the previous end and run for its own length.
fn locate_segments(text: &str, segments: &[String]) -> Vec<Span> {
    let total = text.chars().count();
    let mut spans = Vec::with_capacity(segments.len());
    let mut byte = 0;
    let mut char_pos = 0;

    for segment in segments {
        let length = segment.chars().count();
        let rest = &text[byte..];
        let found = rest.find(segment.as_str()).filter(|&offset| {
            !segment.is_empty() && rest[..offset].chars().all(char::is_whitespace)
        });
        let span = match found {
            Some(offset) => {
                let start = char_pos + rest[..offset].chars().count();
                byte += offset + segment.len();
                Span {
                    start,
                    end: start + length,
                    estimated: false,
                }
            }
            None if segment.is_empty() => Span {
                start: char_pos,
                end: char_pos,
                estimated: false,
            },
            None => {
                tracing::warn!(line = %segment, "Wrapped line not found in source, estimating span");
                let start = char_pos.min(total);
                let end = (start + length).min(total);
                byte += rest
                    .char_indices()
                    .nth(end - start)
                    .map_or(rest.len(), |(offset, _)| offset);
                Span {
                    start,
                    end,
                    estimated: true,
                }
            }
        };
        char_pos = span.end;
        spans.push(span);
    }
    spans
}
