//! Stroke streams replayed through the editor.

use scribe_core::{
    AffixPolicy, Cursor, EditorConfig, SpacePlacement, StrokeEvent, StrokeOutcome,
    TranscriptEditor,
};

fn replay(editor: &mut TranscriptEditor, lines: &str) -> Vec<StrokeOutcome> {
    lines
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let event: StrokeEvent = serde_json::from_str(line).expect("valid event line");
            editor.on_stroke(&event).expect("stroke applies")
        })
        .collect()
}

#[test]
fn question_and_answer_paragraphs() {
    let config = EditorConfig {
        affix_policy: AffixPolicy::NewParagraph,
        ..EditorConfig::default()
    };
    let mut editor = TranscriptEditor::new(config);
    editor.set_style(0, "Question").expect("question style");

    replay(
        &mut editor,
        r#"
        {"outline":"TKEUD","text":"Did"}
        {"outline":"U","text":" you"}
        {"outline":"H-F","text":"?\n"}
        {"outline":"KWRE","text":"Yes"}
        {"outline":"TP-PL","text":".\n"}
        "#,
    );

    let document = editor.document();
    assert_eq!(document.text(), "Did you?\nA.\tYes.\n");
    let styles: Vec<&str> = document
        .paragraphs()
        .iter()
        .map(|p| p.meta.style.as_str())
        .collect();
    assert_eq!(styles, ["Question", "Answer", "Question"]);
    assert_eq!(document.paragraphs()[1].elements.unit_len(), 4);

    assert!(editor.undo());
    assert_eq!(editor.document().text(), "Did you?\nA.\tYes");
    assert_eq!(editor.document().paragraph_count(), 2);
}

#[test]
fn retranslation_and_stroke_undo() {
    let mut editor = TranscriptEditor::default();
    replay(
        &mut editor,
        r#"
        {"outline":"-T","text":" the"}
        {"outline":"KOPL","text":" come"}
        {"outline":"PAOEUL","text":" compile","backspaces":5}
        "#,
    );
    let paragraph = &editor.document().paragraphs()[0];
    assert_eq!(paragraph.text(), " the compile");
    let outlines: Vec<Option<&str>> = paragraph
        .elements
        .elements()
        .iter()
        .map(|e| e.outline())
        .collect();
    assert_eq!(outlines, [Some("-T"), Some("KOPL/PAOEUL")]);

    replay(&mut editor, r#"{"outline":"*","backspaces":8}"#);
    assert_eq!(editor.document().text(), " the");
    replay(&mut editor, r#"{"outline":"*","backspaces":4}"#);
    assert_eq!(editor.document().text(), "");
}

#[test]
fn suffix_strokes_combine_into_one_element() {
    let mut editor = TranscriptEditor::default();
    replay(
        &mut editor,
        r#"
        {"outline":"TEFT","text":" test"}
        {"outline":"-G","text":"ing"}
        {"outline":"-S","text":"s"}
        "#,
    );
    let paragraph = &editor.document().paragraphs()[0];
    assert_eq!(paragraph.text(), " testings");
    assert_eq!(paragraph.elements.element_count(), 1);
    assert_eq!(paragraph.elements.elements()[0].outline(), Some("TEFT/-G/-S"));
}

#[test]
fn oversized_erase_is_dropped() {
    let mut editor = TranscriptEditor::default();
    let outcomes = replay(
        &mut editor,
        r#"
        {"outline":"HEU","text":" hi"}
        {"outline":"*","backspaces":100}
        "#,
    );
    assert_eq!(outcomes[1], StrokeOutcome::Dropped);
    assert_eq!(editor.document().text(), " hi");
    assert_eq!(editor.history().undo_depth(), 1);
}

#[test]
fn oversized_erase_does_not_count_paragraph_end_marker() {
    let config = EditorConfig {
        paragraph_end: Some("¶".to_string()),
        ..EditorConfig::default()
    };
    let mut editor = TranscriptEditor::new(config);
    replay(
        &mut editor,
        r#"
        {"outline":"A","text":"A"}
        {"outline":"R-R","text":"\n"}
        "#,
    );
    assert_eq!(editor.document().text(), "A¶\n");
    let before = editor.document().clone();

    let outcomes = replay(&mut editor, r#"{"outline":"*","backspaces":3}"#);
    assert_eq!(outcomes, [StrokeOutcome::Dropped]);
    assert_eq!(editor.document(), &before);
    assert_eq!(editor.history().undo_depth(), 2);

    replay(&mut editor, r#"{"outline":"*","backspaces":2}"#);
    assert_eq!(editor.document().text(), "");
}

#[test]
fn erasing_a_whole_stroke_leaves_no_element() {
    let mut editor = TranscriptEditor::default();
    replay(
        &mut editor,
        r#"
        {"outline":"-T","text":"THE"}
        {"outline":"*","backspaces":3}
        "#,
    );
    let paragraph = &editor.document().paragraphs()[0];
    assert_eq!(paragraph.text(), "");
    assert_eq!(paragraph.elements.element_count(), 0);
}

fn trailing_space_config() -> EditorConfig {
    EditorConfig {
        space_placement: SpacePlacement::After,
        ..EditorConfig::default()
    }
}

#[test]
fn trailing_space_split_undoes_exactly() {
    let mut editor = TranscriptEditor::new(trailing_space_config());
    replay(&mut editor, r#"{"outline":"KWRES","text":"Yes. "}"#);
    let before = editor.document().clone();

    replay(&mut editor, r#"{"outline":"R-R","text":"\n"}"#);
    assert_eq!(editor.document().text(), "Yes.\n");
    assert_eq!(editor.cursor(), Cursor::new(1, 0));

    assert!(editor.undo());
    assert_eq!(editor.document().text(), "Yes. ");
    assert_eq!(editor.document(), &before);
    assert_eq!(editor.cursor(), Cursor::new(0, 5));
}

#[test]
fn trailing_space_split_then_merge_undoes_exactly() {
    let mut editor = TranscriptEditor::new(trailing_space_config());
    replay(&mut editor, r#"{"outline":"KWRES","text":"Yes. "}"#);
    let before = editor.document().clone();

    replay(
        &mut editor,
        r#"
        {"outline":"R-R","text":"\n"}
        {"outline":"TPHO","text":"No"}
        "#,
    );
    assert_eq!(editor.document().text(), "Yes.\nNo");
    editor.merge_with_next(0).expect("merge");
    assert_eq!(editor.document().text(), "Yes. No");

    for _ in 0..3 {
        assert!(editor.undo());
    }
    assert_eq!(editor.document(), &before);
    assert_eq!(editor.document().text(), "Yes. ");
}

#[test]
fn erase_across_paragraph_break_merges() {
    let mut editor = TranscriptEditor::default();
    replay(
        &mut editor,
        r#"
        {"outline":"WUPB","text":" one"}
        {"outline":"R-R","text":"\n"}
        {"outline":"TWO","text":" two"}
        "#,
    );
    assert_eq!(editor.document().text(), " one\n two");
    let before = editor.document().clone();

    replay(&mut editor, r#"{"outline":"*","backspaces":6}"#);
    assert_eq!(editor.document().text(), " on");
    assert_eq!(editor.document().paragraph_count(), 1);

    assert!(editor.undo());
    assert_eq!(editor.document(), &before);
}
