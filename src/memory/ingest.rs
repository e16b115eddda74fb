//! Incremental ingestion of conversation logs.
//!
//! [`build`] walks a directory for log files, skips files that already have
//! rows, parses the rest, and inserts each user message inside one
//! transaction per file. The `(source_file, message_id)` constraint is what
//! actually prevents duplicates; the file-level skip assumes log files are
//! append-only and is never re-checked against file contents.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::memory::store;
use crate::memory::types::NewRecord;

/// Why a single log file could not be ingested. Never fatal for the build.
#[derive(Debug, Error)]
pub enum LogFileError {
    #[error("could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of log entries")]
    NotAList,
}

/// A log file that was skipped, and why.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: LogFileError,
}

/// Outcome of one [`build`] run.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Log files found under the root.
    pub files_scanned: usize,
    /// Files skipped because their rows were already stored.
    pub files_skipped: usize,
    /// New files that contributed at least one record.
    pub files_added: usize,
    pub records_added: usize,
    /// Entries whose `(source_file, message_id)` was already present.
    pub duplicates: usize,
    /// Entries dropped while parsing: non-objects, or user entries with no
    /// usable message or message id.
    pub skipped_entries: usize,
    pub failures: Vec<FileFailure>,
}

/// One entry of a log file. Unknown fields are ignored.
///
/// Metadata fields accept any JSON scalar since writers disagree on whether
/// ids are numbers or strings.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    session_id: Option<Value>,
    message_id: Option<Value>,
    message: Option<Value>,
    timestamp: Option<Value>,
}

/// Text form of a scalar field. Objects, arrays and null have none.
fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Records parsed from one log file.
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub records: Vec<NewRecord>,
    /// Entries that could not be turned into a record.
    pub skipped: usize,
}

/// Ingest every new log file named `log_file_name` under `root`.
pub fn build(conn: &mut Connection, root: &Path, log_file_name: &str) -> Result<BuildReport> {
    ensure!(root.is_dir(), "{} is not a directory", root.display());
    let root = std::fs::canonicalize(root)
        .with_context(|| format!("failed to resolve {}", root.display()))?;

    let discovered = discover_log_files(&root, log_file_name);
    let processed = store::processed_files(conn)?;
    info!(
        found = discovered.len(),
        already_processed = processed.len(),
        "scanning log files"
    );

    let mut report = BuildReport {
        files_scanned: discovered.len(),
        ..Default::default()
    };

    for path in discovered {
        let source_file = path.to_string_lossy().into_owned();
        if processed.contains(&source_file) {
            report.files_skipped += 1;
            continue;
        }

        let parsed = match parse_log_file(&path) {
            Ok(parsed) => parsed,
            Err(error) => {
                warn!(file = %path.display(), %error, "skipping unreadable log file");
                report.failures.push(FileFailure { path, error });
                continue;
            }
        };

        report.skipped_entries += parsed.skipped;
        let (added, duplicates) = insert_file(conn, &parsed.records)
            .with_context(|| format!("failed to store records from {}", path.display()))?;
        debug!(file = %path.display(), added, duplicates, "log file ingested");

        if added > 0 {
            report.files_added += 1;
        }
        report.records_added += added;
        report.duplicates += duplicates;
    }

    info!(
        files_added = report.files_added,
        records_added = report.records_added,
        skipped_entries = report.skipped_entries,
        failures = report.failures.len(),
        "build complete"
    );
    Ok(report)
}

/// Insert all records of one file atomically. Returns `(added, duplicates)`.
fn insert_file(conn: &mut Connection, records: &[NewRecord]) -> Result<(usize, usize)> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut added = 0;
    for record in records {
        if store::insert_record(&tx, record)? {
            added += 1;
        } else {
            warn!(
                file = %record.source_file,
                message_id = %record.message_id,
                "message already stored, skipping"
            );
        }
    }
    tx.commit()?;
    Ok((added, records.len() - added))
}

/// Recursively find files named `file_name`, sorted by path.
///
/// Unreadable directories are logged and skipped.
pub fn discover_log_files(root: &Path, file_name: &str) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
        .collect()
}

/// Extract the user-authored messages from one log file.
///
/// The file must be a JSON array. Entries of other types are ignored; entries
/// that are not objects, and user entries without a message or message id,
/// are counted in [`ParsedLog::skipped`].
pub fn parse_log_file(path: &Path) -> Result<ParsedLog, LogFileError> {
    let contents = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;
    let Value::Array(entries) = value else {
        return Err(LogFileError::NotAList);
    };

    let source_file = path.to_string_lossy().into_owned();
    let mut parsed = ParsedLog::default();
    for (index, raw) in entries.into_iter().enumerate() {
        if !raw.is_object() {
            warn!(file = %source_file, index, "skipping log entry that is not an object");
            parsed.skipped += 1;
            continue;
        }
        let entry: LogEntry = match serde_json::from_value(raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(file = %source_file, index, error = %e, "skipping malformed log entry");
                parsed.skipped += 1;
                continue;
            }
        };
        if entry.kind.as_deref() != Some("user") {
            continue;
        }
        let (Some(message), Some(message_id)) =
            (scalar_text(entry.message), scalar_text(entry.message_id))
        else {
            warn!(file = %source_file, index, "skipping user entry without message or id");
            parsed.skipped += 1;
            continue;
        };
        parsed.records.push(NewRecord {
            timestamp: scalar_text(entry.timestamp).unwrap_or_default(),
            session_id: scalar_text(entry.session_id).unwrap_or_default(),
            message_id,
            message,
            source_file: source_file.clone(),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, contents: &str) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parse_keeps_only_user_messages() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "logs.json",
            r#"[
                {"sessionId": "s1", "messageId": 0, "type": "user", "message": "hello", "timestamp": "2025-07-01T10:00:00Z"},
                {"sessionId": "s1", "messageId": 1, "type": "gemini", "message": "hi!", "timestamp": "2025-07-01T10:00:01Z"},
                {"sessionId": "s1", "messageId": "2", "type": "user", "message": "bye", "timestamp": "2025-07-01T10:00:02Z", "extra": true},
                {"sessionId": "s1", "type": "user", "message": "no id"},
                {"sessionId": "s1", "messageId": 4, "type": "user"},
                "not an object"
            ]"#,
        );

        let parsed = parse_log_file(&path).unwrap();
        assert_eq!(parsed.skipped, 3);
        let records = parsed.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "hello");
        assert_eq!(records[0].message_id, "0");
        assert_eq!(records[0].session_id, "s1");
        assert_eq!(records[1].message_id, "2");
        assert_eq!(records[1].source_file, path.to_string_lossy());
    }

    #[test]
    fn parse_rejects_non_array() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "logs.json", r#"{"type": "user"}"#);
        assert!(matches!(parse_log_file(&path), Err(LogFileError::NotAList)));
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "logs.json", "[{");
        assert!(matches!(parse_log_file(&path), Err(LogFileError::Json(_))));
    }

    #[test]
    fn empty_array_yields_no_records() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), "logs.json", "[]");
        let parsed = parse_log_file(&path).unwrap();
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn discovery_is_recursive_and_name_exact() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b/logs.json", "[]");
        write(tmp.path(), "a/deep/er/logs.json", "[]");
        write(tmp.path(), "a/logs.json.bak", "[]");
        write(tmp.path(), "a/other.json", "[]");

        let found = discover_log_files(tmp.path(), "logs.json");
        assert_eq!(
            found,
            vec![
                tmp.path().join("a/deep/er/logs.json"),
                tmp.path().join("b/logs.json")
            ]
        );
    }

    #[test]
    fn scalar_metadata_of_any_json_type_is_kept() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            "logs.json",
            r#"[
                {"sessionId": 42, "messageId": 1.0, "type": "user", "message": "float id", "timestamp": 1751364000},
                {"sessionId": "s1", "messageId": 18446744073709551615, "type": "user", "message": "huge id"},
                {"sessionId": null, "messageId": true, "type": "user", "message": "bool id"},
                {"sessionId": "s1", "messageId": {"n": 1}, "type": "user", "message": "object id"}
            ]"#,
        );

        let parsed = parse_log_file(&path).unwrap();
        assert_eq!(parsed.skipped, 1);
        let ids: Vec<&str> = parsed.records.iter().map(|r| r.message_id.as_str()).collect();
        assert_eq!(ids, vec!["1.0", "18446744073709551615", "true"]);
        assert_eq!(parsed.records[0].session_id, "42");
        assert_eq!(parsed.records[0].timestamp, "1751364000");
        assert_eq!(parsed.records[2].session_id, "");
    }

    #[test]
    fn build_requires_a_directory() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let tmp = TempDir::new().unwrap();
        assert!(build(&mut conn, &tmp.path().join("missing"), "logs.json").is_err());
    }
}
