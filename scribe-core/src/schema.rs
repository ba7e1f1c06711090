//! Canonical serialized representation of transcripts.
//!
//! A transcript file is a JSON object mapping decimal paragraph numbers to
//! paragraph records:
//!
//! ```json
//! {"0": {"style": "Question", "creationtime": "...", "edittime": "...",
//!        "notes": "", "strokes": [{"element": "stroke", "data": " cat",
//!        "time": "...", "stroke": "KAT"}]}}
//! ```
//!
//! Styles, field values and the index catalog live in a separate
//! [`MetaDocument`]. Serializing an unmodified paragraph reproduces its
//! elements byte for byte.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::collection::ElementCollection;
use crate::document::{Document, FieldValues, IndexCatalog};
use crate::element::{Element, ElementKind};
use crate::paragraph::{Paragraph, ParagraphMeta};
use crate::style::StyleSheet;

/// One serialized element. The `element` tag comes first, then `data` and
/// `time`, then the kind-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum ElementRecord {
    /// Plain text.
    Text {
        /// Text.
        data: String,
        /// Creation timestamp.
        #[serde(default)]
        time: String,
    },
    /// Stroke output.
    Stroke {
        /// Produced text.
        data: String,
        /// Creation timestamp.
        #[serde(default)]
        time: String,
        /// Steno outline.
        #[serde(default)]
        stroke: String,
        /// Media position.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audiotime: Option<String>,
    },
    /// Affix-wrapped text.
    Automatic {
        /// Inner text.
        data: String,
        /// Creation timestamp.
        #[serde(default)]
        time: String,
        /// Rendered before the text.
        #[serde(default)]
        prefix: String,
        /// Rendered after the text.
        #[serde(default)]
        suffix: String,
    },
    /// User field.
    Field {
        /// Displayed value.
        data: String,
        /// Creation timestamp.
        #[serde(default)]
        time: String,
        /// Field name.
        name: String,
    },
    /// Embedded image.
    Image {
        /// Placeholder text.
        data: String,
        /// Creation timestamp.
        #[serde(default)]
        time: String,
        /// Asset path.
        path: String,
        /// Width in pixels.
        #[serde(default)]
        width: u32,
        /// Height in pixels.
        #[serde(default)]
        height: u32,
    },
    /// Index marker.
    Index {
        /// Entry text.
        data: String,
        /// Creation timestamp.
        #[serde(default)]
        time: String,
        /// Index name.
        indexname: String,
        /// Rendered before the entry.
        #[serde(default)]
        prefix: String,
        /// Hidden from exported indices.
        #[serde(default)]
        hidden: bool,
        /// Entry description.
        #[serde(default)]
        description: String,
    },
}

impl From<&Element> for ElementRecord {
    fn from(element: &Element) -> Self {
        let data = element.data.clone();
        let time = element.time.clone();
        match &element.kind {
            ElementKind::Text => Self::Text { data, time },
            ElementKind::Stroke {
                outline,
                audio_time,
            } => Self::Stroke {
                data,
                time,
                stroke: outline.clone(),
                audiotime: audio_time.clone(),
            },
            ElementKind::Automatic { prefix, suffix } => Self::Automatic {
                data,
                time,
                prefix: prefix.clone(),
                suffix: suffix.clone(),
            },
            ElementKind::Field { name } => Self::Field {
                data,
                time,
                name: name.clone(),
            },
            ElementKind::Image {
                path,
                width,
                height,
            } => Self::Image {
                data,
                time,
                path: path.clone(),
                width: *width,
                height: *height,
            },
            ElementKind::IndexEntry {
                index_name,
                prefix,
                hidden,
                description,
            } => Self::Index {
                data,
                time,
                indexname: index_name.clone(),
                prefix: prefix.clone(),
                hidden: *hidden,
                description: description.clone(),
            },
        }
    }
}

impl From<ElementRecord> for Element {
    fn from(record: ElementRecord) -> Self {
        let (kind, data, time) = match record {
            ElementRecord::Text { data, time } => (ElementKind::Text, data, time),
            ElementRecord::Stroke {
                data,
                time,
                stroke,
                audiotime,
            } => (
                ElementKind::Stroke {
                    outline: stroke,
                    audio_time: audiotime,
                },
                data,
                time,
            ),
            ElementRecord::Automatic {
                data,
                time,
                prefix,
                suffix,
            } => (ElementKind::Automatic { prefix, suffix }, data, time),
            ElementRecord::Field { data, time, name } => (ElementKind::Field { name }, data, time),
            ElementRecord::Image {
                data,
                time,
                path,
                width,
                height,
            } => (
                ElementKind::Image {
                    path,
                    width,
                    height,
                },
                data,
                time,
            ),
            ElementRecord::Index {
                data,
                time,
                indexname,
                prefix,
                hidden,
                description,
            } => (
                ElementKind::IndexEntry {
                    index_name: indexname,
                    prefix,
                    hidden,
                    description,
                },
                data,
                time,
            ),
        };
        Self { kind, data, time }
    }
}

/// One serialized paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphRecord {
    /// Style name.
    #[serde(default)]
    pub style: String,
    /// Creation timestamp.
    #[serde(default)]
    pub creationtime: String,
    /// Last edit timestamp.
    #[serde(default)]
    pub edittime: String,
    /// Media start position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audiostarttime: Option<String>,
    /// Media end position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audioendtime: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub notes: String,
    /// Elements in order.
    #[serde(default)]
    pub strokes: Vec<ElementRecord>,
}

impl From<&Paragraph> for ParagraphRecord {
    fn from(paragraph: &Paragraph) -> Self {
        let meta = &paragraph.meta;
        Self {
            style: meta.style.clone(),
            creationtime: meta.creation_time.clone(),
            edittime: meta.edit_time.clone(),
            audiostarttime: meta.audio_start.clone(),
            audioendtime: meta.audio_end.clone(),
            notes: meta.notes.clone(),
            strokes: paragraph
                .elements
                .elements()
                .iter()
                .map(ElementRecord::from)
                .collect(),
        }
    }
}

impl From<ParagraphRecord> for Paragraph {
    fn from(record: ParagraphRecord) -> Self {
        let meta = ParagraphMeta {
            style: record.style,
            creation_time: record.creationtime,
            edit_time: record.edittime,
            audio_start: record.audiostarttime,
            audio_end: record.audioendtime,
            notes: record.notes,
        };
        let elements = record.strokes.into_iter().map(Element::from).collect();
        Self::from_parts(meta, ElementCollection::from_elements(elements))
    }
}

/// Paragraph records keyed by their position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptDocument {
    /// Paragraphs in document order.
    pub paragraphs: Vec<ParagraphRecord>,
}

impl TranscriptDocument {
    /// Build the document for a sequence of paragraphs.
    #[must_use]
    pub fn from_paragraphs(paragraphs: &[Paragraph]) -> Self {
        Self {
            paragraphs: paragraphs.iter().map(ParagraphRecord::from).collect(),
        }
    }

    /// Convert back into runtime paragraphs.
    #[must_use]
    pub fn into_paragraphs(self) -> Vec<Paragraph> {
        self.paragraphs.into_iter().map(Paragraph::from).collect()
    }
}

impl Serialize for TranscriptDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.paragraphs.len()))?;
        for (number, record) in self.paragraphs.iter().enumerate() {
            map.serialize_entry(&number.to_string(), record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TranscriptDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, ParagraphRecord>::deserialize(deserializer)?;
        let mut numbered: Vec<(usize, ParagraphRecord)> = raw
            .into_iter()
            .filter_map(|(key, record)| match key.parse::<usize>() {
                Ok(number) => Some((number, record)),
                Err(_) => {
                    tracing::warn!(key = %key, "Skipping paragraph with non-numeric key");
                    None
                }
            })
            .collect();
        numbered.sort_by_key(|(number, _)| *number);
        Ok(Self {
            paragraphs: numbered.into_iter().map(|(_, record)| record).collect(),
        })
    }
}

/// Everything persisted next to the paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaDocument {
    /// Paragraph styles.
    #[serde(default)]
    pub styles: StyleSheet,
    /// User field values.
    #[serde(default)]
    pub fields: FieldValues,
    /// Index catalog.
    #[serde(default)]
    pub indices: IndexCatalog,
}

impl MetaDocument {
    /// Copy the catalogs of a document.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        Self {
            styles: document.styles.clone(),
            fields: document.fields.clone(),
            indices: document.indices.clone(),
        }
    }
}

/// Assemble a document from its two persisted halves, repairing dangling
/// style, field and index references.
#[must_use]
pub fn assemble(transcript: TranscriptDocument, meta: MetaDocument) -> Document {
    Document::from_parts(
        transcript.into_paragraphs(),
        meta.styles,
        meta.fields,
        meta.indices,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ELEMENTS: [&str; 6] = [
        r#"{"element":"text","data":"plain","time":"2024-05-01T10:00:00.000"}"#,
        r#"{"element":"stroke","data":" cat","time":"2024-05-01T10:00:01.000","stroke":"KAT","audiotime":"00:00:01.500"}"#,
        r#"{"element":"automatic","data":"Yes","time":"2024-05-01T10:00:02.000","prefix":"A.\t","suffix":""}"#,
        r#"{"element":"field","data":"Smith","time":"2024-05-01T10:00:03.000","name":"WITNESS"}"#,
        r#"{"element":"image","data":"￼","time":"2024-05-01T10:00:04.000","path":"exhibit.png","width":640,"height":480}"#,
        r#"{"element":"index","data":"1","time":"2024-05-01T10:00:05.000","indexname":"Exhibits","prefix":"Exhibit","hidden":false,"description":"Contract"}"#,
    ];

    #[test]
    fn test_elements_reserialize_identically() {
        for json in ELEMENTS {
            let record: ElementRecord = serde_json::from_str(json).expect("valid element");
            let element = Element::from(record);
            let again = serde_json::to_string(&ElementRecord::from(&element)).expect("serialize");
            assert_eq!(again, json);
        }
    }

    #[test]
    fn test_stroke_without_audio_time_omits_field() {
        let element = Element::stroke("KAT", " cat", "t", None);
        let json = serde_json::to_string(&ElementRecord::from(&element)).expect("serialize");
        assert_eq!(json, r#"{"element":"stroke","data":" cat","time":"t","stroke":"KAT"}"#);
    }

    #[test]
    fn test_paragraph_keys_sorted_numerically() {
        let json = r#"{
            "10": {"style": "Normal", "strokes": [{"element": "text", "data": "ten", "time": ""}]},
            "2": {"style": "Normal", "strokes": [{"element": "text", "data": "two", "time": ""}]},
            "notes": {"style": "Normal", "strokes": []},
            "0": {"style": "Normal", "strokes": [{"element": "text", "data": "zero", "time": ""}]}
        }"#;
        let transcript: TranscriptDocument = serde_json::from_str(json).expect("valid transcript");
        let texts: Vec<String> = transcript
            .into_paragraphs()
            .iter()
            .map(Paragraph::text)
            .collect();
        assert_eq!(texts, ["zero", "two", "ten"]);
    }

    #[test]
    fn test_serialize_uses_decimal_keys() {
        let mut first = Paragraph::new("Normal");
        first.elements.push(Element::text("one", "t"));
        let second = Paragraph::new("Normal");
        let transcript = TranscriptDocument::from_paragraphs(&[first, second]);
        let value = serde_json::to_value(&transcript).expect("serialize");
        let object = value.as_object().expect("object");
        assert_eq!(object.keys().collect::<Vec<_>>(), ["0", "1"]);
        assert_eq!(value["0"]["strokes"][0]["data"], "one");
    }

    #[test]
    fn test_assemble_repairs_unknown_style() {
        let json = r#"{"0": {"style": "Deposition", "strokes": [{"element": "field", "data": "Jones", "time": "", "name": "ATTORNEY"}]}}"#;
        let transcript: TranscriptDocument = serde_json::from_str(json).expect("valid transcript");
        let document = assemble(transcript, MetaDocument::default());
        assert_eq!(document.paragraphs()[0].meta.style, "Normal");
        assert_eq!(document.fields["ATTORNEY"], "Jones");
        assert_eq!(document.text(), "Jones");
    }

    #[test]
    fn test_meta_round_trip() {
        let document = Document::new();
        let meta = MetaDocument::from_document(&document);
        let json = serde_json::to_string(&meta).expect("serialize");
        let restored: MetaDocument = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, meta);
        assert_eq!(restored.styles.styles().len(), 3);
    }
}
