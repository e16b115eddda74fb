use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

use crate::db::schema;

/// Summary counts for the `stats` command.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_records: u64,
    pub embedded_records: u64,
    pub pending_embeddings: u64,
    pub source_files: u64,
    pub sessions: u64,
    pub lexicon_words: u64,
    pub db_size_bytes: u64,
    pub schema_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_timestamp: Option<String>,
}

/// Compute store statistics.
///
/// `db_path` is used for file size calculation; pass None for in-memory databases.
pub fn memory_stats(conn: &Connection, db_path: Option<&Path>) -> Result<StatsResponse> {
    let (total_records, embedded_records, source_files, sessions): (i64, i64, i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), COUNT(embedding), COUNT(DISTINCT source_file), COUNT(DISTINCT session_id) \
             FROM episodes",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;
    let lexicon_words: i64 =
        conn.query_row("SELECT COUNT(*) FROM lexicon", [], |row| row.get(0))?;
    let (oldest_timestamp, newest_timestamp): (Option<String>, Option<String>) = conn.query_row(
        "SELECT MIN(timestamp), MAX(timestamp) FROM episodes WHERE timestamp != ''",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(StatsResponse {
        total_records: total_records as u64,
        embedded_records: embedded_records as u64,
        pending_embeddings: (total_records - embedded_records) as u64,
        source_files: source_files as u64,
        sessions: sessions as u64,
        lexicon_words: lexicon_words as u64,
        db_size_bytes,
        schema_version: schema::get_schema_version(conn)?,
        embedding_model: schema::get_embedding_model(conn)?,
        oldest_timestamp,
        newest_timestamp,
    })
}
