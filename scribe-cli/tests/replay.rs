//! End-to-end replay of event files into a data directory.

use clap::Parser;
use scribe_cli::{run, CliArgs};

const EVENTS: &str = r#"
{"outline":"TKPWAOD","text":"Good","media_time":"00:00:01.000","stroke_time":"2024-05-01T10:00:00.000"}
{"outline":"PHORPBG","text":" morning","media_time":"00:00:01.400","stroke_time":"2024-05-01T10:00:00.400"}
{"outline":"TP-PL","text":".\n","media_time":"00:00:02.000","stroke_time":"2024-05-01T10:00:01.000"}
{"outline":"HEL","text":"Hello","media_time":"00:00:03.000","stroke_time":"2024-05-01T10:00:02.000"}
"#;

fn args(dir: &std::path::Path, rest: &[&str]) -> CliArgs {
    let data_dir = dir.to_str().expect("utf-8 path");
    let mut argv = vec!["scribe", "--data-dir", data_dir];
    argv.extend_from_slice(rest);
    CliArgs::try_parse_from(argv).expect("valid args")
}

#[test]
fn replay_saves_transcript_and_tape() {
    let dir = tempfile::tempdir().expect("tempdir");
    let events = dir.path().join("events.jsonl");
    std::fs::write(&events, EVENTS).expect("write events");
    let events = events.to_str().expect("utf-8 path");

    let printed = run(&args(
        dir.path(),
        &["replay", "--events", events, "--name", "hearing", "--width", "40"],
    ))
    .expect("replay");
    assert_eq!(printed, "1 Good morning.\n2 Hello\n");

    assert!(dir.path().join("hearing.transcript").exists());
    let tape = std::fs::read_to_string(dir.path().join("hearing.tape")).expect("tape");
    let lines: Vec<&str> = tape.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("2024-05-01T10:00:00.000|00:00:01.000|(0,4)|"));
    assert!(lines[3].starts_with("2024-05-01T10:00:02.000|00:00:03.000|(1,5)|"));

    let shown = run(&args(dir.path(), &["show", "--name", "hearing", "--no-numbers"]))
        .expect("show");
    assert_eq!(shown, "Good morning.\nHello\n");
}

#[test]
fn replay_continues_an_existing_transcript() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("first.jsonl");
    let second = dir.path().join("second.jsonl");
    std::fs::write(&first, r#"{"outline":"KAT","text":"cat"}"#).expect("write");
    std::fs::write(&second, r#"{"outline":"TKOG","text":" dog"}"#).expect("write");

    for file in [&first, &second] {
        let file = file.to_str().expect("utf-8 path");
        run(&args(dir.path(), &["replay", "--events", file, "--name", "pets"]))
            .expect("replay");
    }
    let shown = run(&args(dir.path(), &["show", "--name", "pets"])).expect("show");
    assert_eq!(shown, "1 cat dog\n");
}

#[test]
fn malformed_event_names_its_line() {
    let dir = tempfile::tempdir().expect("tempdir");
    let events = dir.path().join("bad.jsonl");
    std::fs::write(&events, "{\"outline\":\"KAT\",\"text\":\"cat\"}\n\nnot json\n").expect("write");
    let events = events.to_str().expect("utf-8 path");

    let err = run(&args(
        dir.path(),
        &["replay", "--events", events, "--name", "broken"],
    ))
    .expect_err("bad line");
    assert!(err.to_string().contains("line 3"), "{err}");
    assert!(!dir.path().join("broken.transcript").exists());
}

#[test]
fn show_missing_transcript_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = run(&args(dir.path(), &["show", "--name", "nothing"])).expect_err("missing");
    assert!(err.to_string().contains("nothing"));
}
