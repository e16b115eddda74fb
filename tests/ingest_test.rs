mod helpers;

use helpers::{count_rows, test_db, write_log, write_raw};
use episodic::memory::ingest::{build, LogFileError};
use episodic::memory::store;
use tempfile::TempDir;

#[test]
fn second_build_adds_nothing() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    write_log(tmp.path(), "a/logs.json", &[("s1", 0, "user", "hello world")]);
    write_log(
        tmp.path(),
        "b/nested/logs.json",
        &[("s2", 0, "user", "hello there"), ("s2", 1, "gemini", "hi")],
    );

    let first = build(&mut conn, tmp.path(), "logs.json").unwrap();
    assert_eq!(first.files_scanned, 2);
    assert_eq!(first.files_added, 2);
    assert_eq!(first.records_added, 2);

    let second = build(&mut conn, tmp.path(), "logs.json").unwrap();
    assert_eq!(second.files_scanned, 2);
    assert_eq!(second.files_skipped, 2);
    assert_eq!(second.records_added, 0);
    assert_eq!(count_rows(&conn, "episodes"), 2);
}

#[test]
fn new_files_are_picked_up_incrementally() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    write_log(tmp.path(), "a/logs.json", &[("s1", 0, "user", "first")]);
    build(&mut conn, tmp.path(), "logs.json").unwrap();

    write_log(tmp.path(), "c/logs.json", &[("s3", 0, "user", "second")]);
    let report = build(&mut conn, tmp.path(), "logs.json").unwrap();
    assert_eq!(report.files_skipped, 1);
    assert_eq!(report.files_added, 1);
    assert_eq!(report.records_added, 1);
}

#[test]
fn repeated_message_id_in_one_file_is_stored_once() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    write_log(
        tmp.path(),
        "logs.json",
        &[("s1", 7, "user", "original"), ("s1", 7, "user", "replayed")],
    );

    let report = build(&mut conn, tmp.path(), "logs.json").unwrap();
    assert_eq!(report.records_added, 1);
    assert_eq!(report.duplicates, 1);

    let records = store::all_records(&conn).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message, "original");
    assert_eq!(records[0].message_id, "7");
}

#[test]
fn malformed_files_are_reported_not_fatal() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    write_raw(tmp.path(), "broken/logs.json", "[{\"type\": \"user\"");
    write_raw(tmp.path(), "object/logs.json", r#"{"type": "user", "message": "x"}"#);
    write_log(tmp.path(), "good/logs.json", &[("s1", 0, "user", "still here")]);

    let report = build(&mut conn, tmp.path(), "logs.json").unwrap();
    assert_eq!(report.files_scanned, 3);
    assert_eq!(report.records_added, 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .any(|f| matches!(f.error, LogFileError::Json(_)) && f.path.ends_with("broken/logs.json")));
    assert!(report
        .failures
        .iter()
        .any(|f| matches!(f.error, LogFileError::NotAList) && f.path.ends_with("object/logs.json")));
}

#[test]
fn file_without_user_messages_contributes_nothing() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    write_log(tmp.path(), "logs.json", &[("s1", 0, "gemini", "model output")]);

    let report = build(&mut conn, tmp.path(), "logs.json").unwrap();
    assert_eq!(report.files_scanned, 1);
    assert_eq!(report.files_added, 0);
    assert_eq!(report.records_added, 0);
    assert!(report.failures.is_empty());
}

#[test]
fn source_file_is_the_resolved_path() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    let path = write_log(tmp.path(), "x/logs.json", &[("s1", 0, "user", "hi")]);

    build(&mut conn, tmp.path(), "logs.json").unwrap();
    let processed = store::processed_files(&conn).unwrap();
    let expected = std::fs::canonicalize(path).unwrap();
    assert!(processed.contains(expected.to_string_lossy().as_ref()));
}

#[test]
fn custom_log_file_name() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    write_log(tmp.path(), "a/logs.json", &[("s1", 0, "user", "ignored")]);
    write_log(tmp.path(), "a/chat.json", &[("s1", 0, "user", "picked")]);

    let report = build(&mut conn, tmp.path(), "chat.json").unwrap();
    assert_eq!(report.records_added, 1);
    assert_eq!(store::all_messages(&conn).unwrap(), vec!["picked".to_string()]);
}

#[test]
fn numeric_and_oversized_ids_are_stored() {
    let mut conn = test_db();
    let tmp = TempDir::new().unwrap();
    write_raw(
        tmp.path(),
        "logs.json",
        r#"[
            {"sessionId": "s1", "messageId": 1.0, "type": "user", "message": "float id"},
            {"sessionId": 42, "messageId": 2, "type": "user", "message": "numeric session"},
            {"sessionId": "s1", "messageId": 18446744073709551615, "type": "user", "message": "u64 max id"},
            {"sessionId": "s1", "type": "user", "message": "no id at all"}
        ]"#,
    );

    let report = build(&mut conn, tmp.path(), "logs.json").unwrap();
    assert_eq!(report.records_added, 3);
    assert_eq!(report.skipped_entries, 1);
    assert!(report.failures.is_empty());

    let records = store::all_records(&conn).unwrap();
    let ids: Vec<&str> = records.iter().map(|r| r.message_id.as_str()).collect();
    assert_eq!(ids, vec!["1.0", "2", "18446744073709551615"]);
    assert_eq!(records[1].session_id, "42");
}
