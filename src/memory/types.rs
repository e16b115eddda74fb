//! Record types shared by the ingest, embed, search, and lexicon paths.

use serde::{Deserialize, Serialize};

/// A user message extracted from a log file, ready to insert.
///
/// `(source_file, message_id)` identifies it; inserting the same pair twice
/// is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub timestamp: String,
    pub session_id: String,
    pub message_id: String,
    pub message: String,
    /// Path of the log file, as discovered during the directory walk.
    pub source_file: String,
}

/// A stored episode, matching the `episodes` table minus the embedding blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Auto-increment surrogate key; also the insertion order.
    pub id: i64,
    pub timestamp: String,
    pub session_id: String,
    pub message_id: String,
    pub message: String,
    pub source_file: String,
}

/// A record that still needs an embedding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEmbedding {
    pub id: i64,
    pub message: String,
}

/// A stored record together with its decoded embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedRecord {
    pub record: Record,
    pub embedding: Vec<f32>,
}

/// One row of the `lexicon` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexiconEntry {
    pub word: String,
    pub frequency: u64,
}
