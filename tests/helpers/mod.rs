#![allow(dead_code)]

use std::path::{Path, PathBuf};

use episodic::db;
use episodic::embedding::EmbeddingProvider;
use episodic::memory::lexicon::tokenize;
use rusqlite::Connection;
use serde_json::json;

/// Open a fresh in-memory database with the schema applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Dimensions produced by [`StubEmbedder`].
pub const STUB_DIM: usize = 64;

/// Deterministic bag-of-words embedder: each token adds 1.0 to a hashed slot.
///
/// Texts sharing words get positive cosine similarity; texts with no
/// words embed to the zero vector.
pub struct StubEmbedder;

impl EmbeddingProvider for StubEmbedder {
    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        let mut v = vec![0.0f32; STUB_DIM];
        for token in tokenize(text) {
            v[fnv1a(&token) % STUB_DIM] += 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        STUB_DIM
    }
}

fn fnv1a(s: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in s.bytes() {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash as usize
}

/// One log entry: `(session_id, message_id, type, message)`.
pub type Entry<'a> = (&'a str, i64, &'a str, &'a str);

/// Write a `logs.json` file at `root/rel` and return its path.
pub fn write_log(root: &Path, rel: &str, entries: &[Entry<'_>]) -> PathBuf {
    let body: Vec<serde_json::Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (session, id, kind, message))| {
            json!({
                "sessionId": session,
                "messageId": id,
                "type": kind,
                "message": message,
                "timestamp": format!("2025-07-01T10:00:{:02}.000Z", i),
            })
        })
        .collect();
    write_raw(root, rel, &serde_json::to_string_pretty(&body).unwrap())
}

/// Write arbitrary contents to `root/rel`, creating parent directories.
pub fn write_raw(root: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        .unwrap()
}
