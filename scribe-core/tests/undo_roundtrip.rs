//! Every user edit undoes to the exact prior document and redoes to the
//! same text.

use scribe_core::{
    Cursor, Document, Element, ElementSlice, FieldValues, IndexDefinition, ParagraphProperty,
    Selection, Style, TranscriptEditor,
};

type Step = fn(&mut TranscriptEditor);

#[test]
fn undo_restores_every_stage_and_redo_replays_text() {
    let steps: &[(&str, Step)] = &[
        ("greeting", |e| e.insert_text("Good morning. ").expect("insert")),
        ("question", |e| {
            e.insert_text("Please state your name.").expect("insert");
        }),
        ("split", |e| {
            e.move_cursor(Cursor::new(0, 14));
            e.split_paragraph().expect("split");
        }),
        ("style", |e| e.set_style(1, "Question").expect("style")),
        ("notes", |e| {
            e.set_property(1, ParagraphProperty::Notes("witness sworn".into()))
                .expect("notes");
        }),
        ("media", |e| {
            e.set_property(0, ParagraphProperty::AudioEnd(Some("00:01:02.000".into())))
                .expect("audio end");
        }),
        ("field", |e| {
            e.move_cursor(Cursor::new(1, 23));
            e.insert_field("WITNESS").expect("field");
        }),
        ("field values", |e| {
            e.update_fields(FieldValues::from([(
                "WITNESS".to_string(),
                "Jane Roe".to_string(),
            )]))
            .expect("fields");
        }),
        ("index", |e| {
            e.update_index(
                "Exhibits",
                IndexDefinition {
                    prefix: "Exhibit".into(),
                    ..IndexDefinition::default()
                },
            )
            .expect("index");
        }),
        ("index entry", |e| {
            e.move_cursor(Cursor::new(0, 0));
            e.insert_index_entry("Exhibits", "1", "Contract")
                .expect("entry");
        }),
        ("image", |e| e.insert_image("scan.png", 320, 200).expect("image")),
        ("new style", |e| {
            e.update_style(Style::new("Colloquy").with_indents(10, 5))
                .expect("style definition");
        }),
        ("cut", |e| {
            let slice = e.cut(Selection::within(1, 0, 7)).expect("cut");
            assert_eq!(slice.render(), "Please ");
        }),
        ("paste", |e| {
            e.move_cursor(Cursor::new(0, 2));
            e.paste(ElementSlice::new(vec![Element::text("Please ", "t")]))
                .expect("paste");
        }),
        ("delete", |e| e.delete_range(1, 0, 3).expect("delete")),
        ("merge", |e| e.merge_with_next(0).expect("merge")),
    ];

    let mut editor = TranscriptEditor::default();
    let mut stages: Vec<Document> = vec![editor.document().clone()];
    for (label, step) in steps {
        step(&mut editor);
        assert_ne!(
            editor.document(),
            stages.last().expect("previous stage"),
            "step '{label}' changed nothing"
        );
        stages.push(editor.document().clone());
    }

    let final_text = editor.document().text();
    for expected in stages.iter().rev().skip(1) {
        assert!(editor.undo(), "undo available");
        assert_eq!(editor.document(), expected);
    }
    assert!(!editor.undo());

    for expected in stages.iter().skip(1) {
        assert!(editor.redo(), "redo available");
        assert_eq!(editor.document().text(), expected.text());
    }
    assert_eq!(editor.document().text(), final_text);
    assert!(!editor.redo());
}

#[test]
fn cut_counts_as_one_group_and_paste_as_another() {
    let mut editor = TranscriptEditor::default();
    editor.insert_text("alpha beta").expect("insert");
    let slice = editor.cut(Selection::within(0, 5, 10)).expect("cut");
    editor.move_cursor(Cursor::new(0, 0));
    editor.paste(slice).expect("paste");
    assert_eq!(editor.document().text(), " betaalpha");
    assert_eq!(editor.history().undo_depth(), 3);

    assert!(editor.undo());
    assert_eq!(editor.document().text(), "alpha");
    assert!(editor.undo());
    assert_eq!(editor.document().text(), "alpha beta");
}
