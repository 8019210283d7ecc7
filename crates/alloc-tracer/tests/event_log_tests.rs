use alloc_tracer::event::{read_event_log, EventRecord, ValueType};
use alloc_tracer::utils::error::EventError;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_log(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[test]
fn test_read_event_log() {
    let file = write_log(&[
        "# allocation log",
        r#"{"event":"allocate","object":16,"path":"app.rb","line":3,"type":"string"}"#,
        r#"{"event":"promote","object":16}"#,
        r#"{"event":"gc"}"#,
        r#"{"event":"free","object":16,"type":"T_STRING","size":40,"old":true}"#,
    ]);

    let records = read_event_log(file.path()).unwrap();
    assert_eq!(
        records,
        vec![
            EventRecord::Allocate {
                object: 16,
                path: Some("app.rb".to_string()),
                line: 3,
                value_type: ValueType::String,
                class: None,
            },
            EventRecord::Promote { object: 16 },
            EventRecord::Gc,
            EventRecord::Free {
                object: 16,
                value_type: Some(ValueType::String),
                size: 40,
                old: true,
            },
        ]
    );
}

#[test]
fn test_read_event_log_unknown_type() {
    let file = write_log(&[r#"{"event":"allocate","object":1,"type":"widget"}"#]);

    match read_event_log(file.path()) {
        Err(EventError::InvalidRecord { line, .. }) => assert_eq!(line, 1),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_read_event_log_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_event_log(dir.path().join("missing.jsonl"));
    assert!(matches!(result, Err(EventError::IoError(_))));
}
