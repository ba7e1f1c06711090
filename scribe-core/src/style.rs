//! Paragraph styles.
//!
//! Styles carry the affixes automatically wrapped around paragraph text, the
//! style that follows a paragraph break, and the layout rules exporters use
//! when wrapping lines. Formatting details the engine does not interpret
//! (fonts, spacing) live in `attributes`.

use serde::{Deserialize, Serialize};

/// Text automatically placed around a paragraph's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affix {
    /// Rendered before the paragraph's text.
    #[serde(default)]
    pub prefix: String,
    /// Rendered after the paragraph's text.
    #[serde(default)]
    pub suffix: String,
}

/// A named paragraph style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Style name.
    pub name: String,
    /// Style assigned to the paragraph created by a break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_style: Option<String>,
    /// Automatic affix, if the style has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affix: Option<Affix>,
    /// Indent of the first line in characters.
    #[serde(default)]
    pub first_line_indent: usize,
    /// Indent of every other line in characters.
    #[serde(default)]
    pub left_indent: usize,
    /// Formatting passed through to exporters untouched.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl Style {
    /// Create a style with no affix and no indents.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next_style: None,
            affix: None,
            first_line_indent: 0,
            left_indent: 0,
            attributes: serde_json::Map::new(),
        }
    }

    /// Set the style that follows a paragraph break.
    #[must_use]
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next_style = Some(next.into());
        self
    }

    /// Set the automatic affix.
    #[must_use]
    pub fn with_affix(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.affix = Some(Affix {
            prefix: prefix.into(),
            suffix: suffix.into(),
        });
        self
    }

    /// Set the line indents.
    #[must_use]
    pub fn with_indents(mut self, first_line: usize, left: usize) -> Self {
        self.first_line_indent = first_line;
        self.left_indent = left;
        self
    }
}

/// Ordered collection of styles; the first style is the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    styles: Vec<Style>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            styles: vec![
                Style::new("Normal"),
                Style::new("Question")
                    .with_affix("Q.\t", "")
                    .with_next("Answer")
                    .with_indents(5, 0),
                Style::new("Answer")
                    .with_affix("A.\t", "")
                    .with_next("Question")
                    .with_indents(5, 0),
            ],
        }
    }
}

impl StyleSheet {
    /// Build a sheet from styles in order.
    #[must_use]
    pub fn new(styles: Vec<Style>) -> Self {
        Self { styles }
    }

    /// All styles in order.
    #[must_use]
    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    /// Look up a style by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name == name)
    }

    /// Whether a style with `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The first style, if any.
    #[must_use]
    pub fn default_style(&self) -> Option<&Style> {
        self.styles.first()
    }

    /// Resolve `name`, falling back to the default style for unknown names.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Style> {
        self.get(name).or_else(|| self.default_style())
    }

    /// Name of the style following a paragraph of style `name`.
    ///
    /// Styles without a configured successor continue themselves.
    #[must_use]
    pub fn next_of(&self, name: &str) -> String {
        self.get(name)
            .and_then(|s| s.next_style.clone())
            .unwrap_or_else(|| name.to_string())
    }

    /// Insert or replace a style, returning the previous definition.
    pub fn upsert(&mut self, style: Style) -> Option<Style> {
        if let Some(slot) = self.styles.iter_mut().find(|s| s.name == style.name) {
            Some(std::mem::replace(slot, style))
        } else {
            self.styles.push(style);
            None
        }
    }

    /// Remove a style by name.
    pub fn remove(&mut self, name: &str) -> Option<Style> {
        let index = self.styles.iter().position(|s| s.name == name)?;
        Some(self.styles.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sheet() {
        let sheet = StyleSheet::default();
        assert_eq!(sheet.default_style().map(|s| s.name.as_str()), Some("Normal"));
        assert_eq!(sheet.next_of("Question"), "Answer");
        assert_eq!(sheet.next_of("Normal"), "Normal");
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let sheet = StyleSheet::default();
        let style = sheet.resolve("Colloquy").expect("default exists");
        assert_eq!(style.name, "Normal");
    }

    #[test]
    fn test_upsert_and_remove() {
        let mut sheet = StyleSheet::default();
        assert!(sheet.upsert(Style::new("Colloquy")).is_none());
        let old = sheet.upsert(Style::new("Colloquy").with_indents(2, 0));
        assert_eq!(old, Some(Style::new("Colloquy")));
        assert!(sheet.remove("Colloquy").is_some());
        assert!(!sheet.contains("Colloquy"));
    }

    #[test]
    fn test_style_json_omits_empty_fields() {
        let json = serde_json::to_string(&Style::new("Normal")).expect("serialize");
        assert_eq!(
            json,
            r#"{"name":"Normal","first_line_indent":0,"left_indent":0}"#
        );
    }
}
