//! Editor configuration.
//!
//! Every value is passed into the commands that need it when they are
//! constructed, so a command replays identically regardless of later
//! configuration changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScribeResult;
use crate::tape::StenoLayout;

/// Side of a paragraph break that keeps the word-boundary space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpacePlacement {
    /// Spaces are emitted before words; a break drops the new paragraph's leading space.
    #[default]
    Before,
    /// Spaces are emitted after words; a break drops the old paragraph's trailing space.
    After,
}

/// When stroke text is wrapped in the paragraph style's automatic affix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixPolicy {
    /// Never.
    #[default]
    Disabled,
    /// The first text written into any empty paragraph.
    EmptyParagraph,
    /// The first text written into a paragraph created by a stroke break.
    NewParagraph,
}

/// Settings for one editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Which side of a break keeps the boundary space.
    pub space_placement: SpacePlacement,
    /// Text appended to a paragraph when it is split, if any.
    pub paragraph_end: Option<String>,
    /// Style assigned to unstyled paragraphs on first insert.
    pub default_style: String,
    /// Whether a user-level merge inserts a space at the join.
    pub merge_join_space: bool,
    /// Automatic affix policy.
    pub affix_policy: AffixPolicy,
    /// Number of recent strokes considered for outline accumulation.
    pub history_window: usize,
    /// Maximum number of undo groups kept; `None` keeps everything.
    pub undo_limit: Option<usize>,
    /// Steno keyboard used for the tape grid.
    pub steno_layout: StenoLayout,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            space_placement: SpacePlacement::Before,
            paragraph_end: None,
            default_style: "Normal".to_string(),
            merge_join_space: true,
            affix_policy: AffixPolicy::Disabled,
            history_window: 10,
            undo_limit: None,
            steno_layout: StenoLayout::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScribeError::Serialization`] for malformed JSON.
    pub fn from_json(json: &str) -> ScribeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ScribeError::Io`] if the file cannot be read and
    /// [`crate::ScribeError::Serialization`] if it is not valid JSON.
    pub fn from_json_file(path: impl AsRef<Path>) -> ScribeResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json(&contents)?;
        tracing::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.space_placement, SpacePlacement::Before);
        assert_eq!(config.default_style, "Normal");
        assert_eq!(config.history_window, 10);
        assert!(config.merge_join_space);
        assert!(config.paragraph_end.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EditorConfig::from_json(
            r#"{"space_placement":"after","affix_policy":"new_paragraph","paragraph_end":"¶"}"#,
        )
        .expect("valid config");
        assert_eq!(config.space_placement, SpacePlacement::After);
        assert_eq!(config.affix_policy, AffixPolicy::NewParagraph);
        assert_eq!(config.paragraph_end.as_deref(), Some("\u{b6}"));
        assert_eq!(config.history_window, 10);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("scribe.json");
        std::fs::write(&path, r#"{"default_style":"Question","undo_limit":50}"#)
            .expect("write config");
        let config = EditorConfig::from_json_file(&path).expect("load config");
        assert_eq!(config.default_style, "Question");
        assert_eq!(config.undo_limit, Some(50));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(EditorConfig::from_json("{not json").is_err());
    }
}
