pub mod embed;
pub mod ingest;
pub mod lexicon;
pub mod search;
pub mod stats;
pub mod store;
pub mod types;

use anyhow::{ensure, Result};

/// Encode an embedding as little-endian IEEE-754 `f32`s for the `embedding` BLOB column.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`embedding_to_bytes`]. Bit-exact inverse.
pub fn bytes_to_embedding(bytes: &[u8]) -> Result<Vec<f32>> {
    ensure!(
        bytes.len() % 4 == 0,
        "embedding blob length {} is not a multiple of 4",
        bytes.len()
    );
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
