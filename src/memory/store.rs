//! Row-level access to the `episodes` and `lexicon` tables.
//!
//! Every function takes a `&Connection`, so callers can pass a plain
//! connection or an open `Transaction` and decide where the commit happens.

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::memory::types::{EmbeddedRecord, NewRecord, PendingEmbedding, Record};
use crate::memory::{bytes_to_embedding, embedding_to_bytes};

const RECORD_COLUMNS: &str = "id, timestamp, session_id, message_id, message, source_file";

/// Insert a record. Returns `false` when `(source_file, message_id)` is already stored.
pub fn insert_record(conn: &Connection, record: &NewRecord) -> Result<bool> {
    let changed = conn.execute(
        "INSERT INTO episodes (timestamp, session_id, message_id, message, source_file) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(source_file, message_id) DO NOTHING",
        params![
            record.timestamp,
            record.session_id,
            record.message_id,
            record.message,
            record.source_file,
        ],
    )?;
    Ok(changed == 1)
}

/// Distinct `source_file` values already present.
pub fn processed_files(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT source_file FROM episodes")?;
    let files = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(files)
}

/// Records whose embedding is still NULL, in insertion order.
pub fn records_missing_embedding(conn: &Connection) -> Result<Vec<PendingEmbedding>> {
    let mut stmt =
        conn.prepare("SELECT id, message FROM episodes WHERE embedding IS NULL ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PendingEmbedding {
                id: row.get(0)?,
                message: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Store an embedding for a record that has none.
///
/// Returns `false` if the record does not exist or already carries a vector;
/// an existing embedding is never overwritten.
pub fn set_embedding(conn: &Connection, id: i64, embedding: &[f32]) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE episodes SET embedding = ?1 WHERE id = ?2 AND embedding IS NULL",
        params![embedding_to_bytes(embedding), id],
    )?;
    Ok(changed == 1)
}

/// Every record with an embedding, decoded, in insertion order.
pub fn all_embedded_records(conn: &Connection) -> Result<Vec<EmbeddedRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS}, embedding FROM episodes WHERE embedding IS NOT NULL ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([], |row| Ok((row_to_record(row)?, row.get::<_, Vec<u8>>(6)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(record, blob)| {
            let embedding = bytes_to_embedding(&blob)
                .map_err(|e| anyhow!("corrupt embedding on record {}: {e}", record.id))?;
            Ok(EmbeddedRecord { record, embedding })
        })
        .collect()
}

/// Every stored record, in insertion order.
pub fn all_records(conn: &Connection) -> Result<Vec<Record>> {
    let mut stmt = conn.prepare(&format!("SELECT {RECORD_COLUMNS} FROM episodes ORDER BY id"))?;
    let rows = stmt
        .query_map([], row_to_record)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Message text of every stored record.
pub fn all_messages(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT message FROM episodes ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Remove every lexicon row.
pub fn clear_lexicon(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM lexicon", [])?)
}

/// Set a word's frequency, replacing any previous value.
pub fn upsert_lexicon(conn: &Connection, word: &str, frequency: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO lexicon (word, frequency) VALUES (?1, ?2) \
         ON CONFLICT(word) DO UPDATE SET frequency = excluded.frequency",
        params![word, frequency as i64],
    )?;
    Ok(())
}

/// Exact lookup; `None` means the word is not in the lexicon.
pub fn get_lexicon(conn: &Connection, word: &str) -> Result<Option<u64>> {
    let frequency = conn
        .query_row(
            "SELECT frequency FROM lexicon WHERE word = ?1",
            params![word],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(frequency.map(|f| f as u64))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        session_id: row.get(2)?,
        message_id: row.get(3)?,
        message: row.get(4)?,
        source_file: row.get(5)?,
    })
}
